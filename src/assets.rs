pub mod color;
pub mod decode;
pub mod emoji;
pub mod store;
