pub type TachieResult<T> = Result<T, TachieError>;

#[derive(thiserror::Error, Debug)]
pub enum TachieError {
    #[error("init error: {0}")]
    Init(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("asset error: {0}")]
    Asset(String),

    #[error("font error: {0}")]
    Font(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("no preview: {0}")]
    NoPreview(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TachieError {
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    pub fn font(msg: impl Into<String>) -> Self {
        Self::Font(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn no_preview(msg: impl Into<String>) -> Self {
        Self::NoPreview(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

/// Closed set of status codes reported across the public boundary.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Success = 1,
    Failed = 0,
    FileNotFound = -1,
    InitFailed = -2,
    ImageInitFailed = -3,
    FontInitFailed = -4,
    UnsupportedFormat = -5,
    JsonParseError = -6,
    TextConfigError = -7,
    NoPreview = -8,
}

impl Status {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

impl From<&TachieError> for Status {
    fn from(err: &TachieError) -> Self {
        match err {
            TachieError::Init(_) => Status::InitFailed,
            TachieError::Parse(_) => Status::JsonParseError,
            TachieError::Serde(_) => Status::TextConfigError,
            TachieError::Asset(_) => Status::FileNotFound,
            TachieError::Font(_) => Status::FontInitFailed,
            TachieError::Render(_) | TachieError::Other(_) => Status::Failed,
            TachieError::NoPreview(_) => Status::NoPreview,
        }
    }
}

impl<T> From<&TachieResult<T>> for Status {
    fn from(res: &TachieResult<T>) -> Self {
        match res {
            Ok(_) => Status::Success,
            Err(e) => Status::from(e),
        }
    }
}
