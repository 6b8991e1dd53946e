use serde::Deserialize;
use serde_json::{Map, Value};

use crate::assets::color::Rgba8;
use crate::foundation::error::{TachieError, TachieResult};
use crate::text::draw::{DEFAULT_NAME_SIZE, NameRun};

const DEFAULT_ALIGN: &str = "top-left";
const DEFAULT_NAME_FONT: &str = "font3";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentKind {
    Background,
    Character,
    Namebox,
    Text,
    Textbox,
    Extra,
    Other,
}

impl ComponentKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "background" => Self::Background,
            "character" => Self::Character,
            "namebox" => Self::Namebox,
            "text" => Self::Text,
            "textbox" => Self::Textbox,
            "extra" => Self::Extra,
            _ => Self::Other,
        }
    }
}

/// One entry of a scene component list with every field resolved to its default.
///
/// Fields that are missing or have the wrong JSON type take their default, so a sloppy host
/// document still renders.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentDef {
    pub kind: ComponentKind,
    pub type_name: String,
    pub enabled: bool,
    pub use_cache: bool,
    pub overlay: String,
    pub align: String,
    pub offset_x: i32,
    pub offset_y: i32,
    pub scale: f32,

    pub use_fixed_character: bool,
    pub character_name: String,
    pub emotion_index: i64,
    pub scale1: f32,
    pub offset_x1: i32,
    pub offset_y1: i32,

    pub use_fixed_background: bool,

    pub text: String,
    pub font_family: Option<String>,
    pub font_size: Option<u32>,
    pub text_color: Option<Rgba8>,
    pub shadow_color: Option<Rgba8>,
    pub shadow_offset_x: Option<i32>,
    pub shadow_offset_y: Option<i32>,
    pub max_width: u32,

    pub font_name: String,
    pub textcfg: Vec<NameRun>,
}

fn get_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

fn get_num(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(Value::as_f64)
}

fn get_bool(obj: &Map<String, Value>, key: &str) -> Option<bool> {
    match obj.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        _ => None,
    }
}

fn get_i32(obj: &Map<String, Value>, key: &str) -> Option<i32> {
    get_num(obj, key).map(|v| v.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32)
}

fn get_u32(obj: &Map<String, Value>, key: &str) -> Option<u32> {
    get_num(obj, key).map(|v| v.clamp(0.0, f64::from(u32::MAX)) as u32)
}

fn get_color(obj: &Map<String, Value>, key: &str) -> Option<Rgba8> {
    let v = obj.get(key)?;
    match Rgba8::deserialize(v) {
        Ok(c) => Some(c),
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring invalid color");
            None
        }
    }
}

fn name_runs(obj: &Map<String, Value>) -> Vec<NameRun> {
    let Some(items) = obj.get("textcfg").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .map(|run| NameRun {
            text: get_str(run, "text").unwrap_or_default().to_owned(),
            font_size: get_u32(run, "font_size").unwrap_or(DEFAULT_NAME_SIZE),
            color: get_color(run, "font_color").unwrap_or(Rgba8::WHITE),
        })
        .collect()
}

impl ComponentDef {
    pub fn from_json(obj: &Map<String, Value>) -> Self {
        let type_name = get_str(obj, "type").unwrap_or_default().to_owned();
        Self {
            kind: ComponentKind::parse(&type_name),
            type_name,
            enabled: get_bool(obj, "enabled").unwrap_or(true),
            use_cache: get_bool(obj, "use_cache").unwrap_or(false),
            overlay: get_str(obj, "overlay").unwrap_or_default().to_owned(),
            align: get_str(obj, "align").unwrap_or(DEFAULT_ALIGN).to_owned(),
            offset_x: get_i32(obj, "offset_x").unwrap_or(0),
            offset_y: get_i32(obj, "offset_y").unwrap_or(0),
            scale: get_num(obj, "scale").unwrap_or(1.0) as f32,

            use_fixed_character: get_bool(obj, "use_fixed_character").unwrap_or(false),
            character_name: get_str(obj, "character_name")
                .unwrap_or_default()
                .to_owned(),
            emotion_index: get_num(obj, "emotion_index").unwrap_or(1.0) as i64,
            scale1: get_num(obj, "scale1").unwrap_or(1.0) as f32,
            offset_x1: get_i32(obj, "offset_x1").unwrap_or(0),
            offset_y1: get_i32(obj, "offset_y1").unwrap_or(0),

            use_fixed_background: get_bool(obj, "use_fixed_background").unwrap_or(false),

            text: get_str(obj, "text").unwrap_or_default().to_owned(),
            font_family: get_str(obj, "font_family").map(str::to_owned),
            font_size: get_u32(obj, "font_size"),
            text_color: get_color(obj, "text_color"),
            shadow_color: get_color(obj, "shadow_color"),
            shadow_offset_x: get_i32(obj, "shadow_offset_x"),
            shadow_offset_y: get_i32(obj, "shadow_offset_y"),
            max_width: get_u32(obj, "max_width").unwrap_or(0),

            font_name: get_str(obj, "font_name")
                .unwrap_or(DEFAULT_NAME_FONT)
                .to_owned(),
            textcfg: name_runs(obj),
        }
    }

    /// Static components don't react to the per-call character and background selectors, so
    /// they can be cached between renders of the same scene.
    pub fn is_static(&self) -> bool {
        match self.kind {
            ComponentKind::Textbox
            | ComponentKind::Extra
            | ComponentKind::Namebox
            | ComponentKind::Text => true,
            ComponentKind::Character => self.use_fixed_character,
            ComponentKind::Background => self.use_fixed_background,
            ComponentKind::Other => false,
        }
    }
}

/// Parse a component list. Entries that aren't objects are kept as `None` and skipped later.
pub fn parse_components(json: &str) -> TachieResult<Vec<Option<ComponentDef>>> {
    let root: Value = serde_json::from_str(json)
        .map_err(|e| TachieError::parse(format!("invalid component JSON: {e}")))?;
    let Value::Array(items) = root else {
        return Err(TachieError::parse("component JSON root must be an array"));
    };
    Ok(items
        .iter()
        .enumerate()
        .map(|(i, item)| match item.as_object() {
            Some(obj) => Some(ComponentDef::from_json(obj)),
            None => {
                tracing::warn!(index = i, "component entry is not an object");
                None
            }
        })
        .collect())
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
