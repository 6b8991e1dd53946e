use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

use crate::assets::color::Rgba8;
use crate::foundation::core::PxRect;
use crate::foundation::error::{TachieError, TachieResult};
use crate::layout::geometry::{FillMode, HAlign, PasteMode, VAlign};

/// Integer fields accept any JSON number; fractions are truncated like a C cast.
pub(crate) fn de_u32<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let v = f64::deserialize(d)?;
    Ok(v.clamp(0.0, f64::from(u32::MAX)) as u32)
}

pub(crate) fn de_i32<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
    let v = f64::deserialize(d)?;
    Ok(v.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32)
}

/// Where and how a pasted image is placed on the overlay path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasteImageSettings {
    pub align: HAlign,
    pub enabled: PasteMode,
    pub fill_mode: FillMode,
    #[serde(deserialize_with = "de_u32")]
    pub height: u32,
    pub valign: VAlign,
    #[serde(deserialize_with = "de_u32")]
    pub width: u32,
    #[serde(deserialize_with = "de_i32")]
    pub x: i32,
    #[serde(deserialize_with = "de_i32")]
    pub y: i32,
}

impl Default for PasteImageSettings {
    fn default() -> Self {
        Self {
            align: HAlign::Center,
            enabled: PasteMode::Mixed,
            fill_mode: FillMode::Width,
            height: 800,
            valign: VAlign::Middle,
            width: 800,
            x: 1500,
            y: 200,
        }
    }
}

impl PasteImageSettings {
    pub fn region(&self) -> PxRect {
        PxRect::new(self.x, self.y, self.width, self.height)
    }
}

/// Dialogue styling pushed by the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub aspect_ratio: String,
    pub bracket_color: Rgba8,
    pub font_family: String,
    #[serde(deserialize_with = "de_u32")]
    pub font_size: u32,
    pub paste_image_settings: PasteImageSettings,
    pub shadow_color: Rgba8,
    #[serde(deserialize_with = "de_i32")]
    pub shadow_offset_x: i32,
    #[serde(deserialize_with = "de_i32")]
    pub shadow_offset_y: i32,
    pub text_align: HAlign,
    pub text_color: Rgba8,
    pub text_valign: VAlign,
    #[serde(deserialize_with = "de_u32")]
    pub textbox_height: u32,
    #[serde(deserialize_with = "de_u32")]
    pub textbox_width: u32,
    #[serde(deserialize_with = "de_i32")]
    pub textbox_x: i32,
    #[serde(deserialize_with = "de_i32")]
    pub textbox_y: i32,
    pub use_character_color: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: "16:9".to_owned(),
            bracket_color: Rgba8::rgb(0xef, 0x4f, 0x54),
            font_family: "font3".to_owned(),
            font_size: 55,
            paste_image_settings: PasteImageSettings::default(),
            shadow_color: Rgba8::BLACK,
            shadow_offset_x: 0,
            shadow_offset_y: 0,
            text_align: HAlign::Left,
            text_color: Rgba8::WHITE,
            text_valign: VAlign::Top,
            textbox_height: 245,
            textbox_width: 1579,
            textbox_x: 470,
            textbox_y: 1080,
            use_character_color: true,
        }
    }
}

impl StyleConfig {
    pub fn textbox(&self) -> PxRect {
        PxRect::new(
            self.textbox_x,
            self.textbox_y,
            self.textbox_width,
            self.textbox_height,
        )
    }

    /// Color for bracketed spans; plain text color when character coloring is off.
    pub fn highlight_color(&self) -> Rgba8 {
        if self.use_character_color {
            self.bracket_color
        } else {
            self.text_color
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageCompression {
    pub pixel_reduction_enabled: bool,
    /// Percentage of each dimension removed from overlay output, `0..=100`.
    #[serde(deserialize_with = "de_u32")]
    pub pixel_reduction_ratio: u32,
}

impl Default for ImageCompression {
    fn default() -> Self {
        Self {
            pixel_reduction_enabled: false,
            pixel_reduction_ratio: 40,
        }
    }
}

impl ImageCompression {
    /// Scale factor applied to overlay output, or `None` when compression is off.
    pub fn factor(&self) -> Option<f32> {
        if !self.pixel_reduction_enabled || self.pixel_reduction_ratio == 0 {
            return None;
        }
        Some(1.0 - self.pixel_reduction_ratio.min(100) as f32 / 100.0)
    }
}

/// Host GUI settings. Unknown keys are ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiSettings {
    pub image_compression: ImageCompression,
}

/// Everything the engine reads while rendering, guarded by the configuration lock.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub assets_root: PathBuf,
    pub min_image_ratio: f32,
    pub gui: GuiSettings,
    pub style: StyleConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from("assets"),
            min_image_ratio: 0.2,
            gui: GuiSettings::default(),
            style: StyleConfig::default(),
        }
    }
}

/// Recursively overlay `patch` onto `base`. Objects merge key by key; `null` keeps the old value.
fn merge_json(base: &mut serde_json::Value, patch: serde_json::Value) {
    match (base, patch) {
        (serde_json::Value::Object(b), serde_json::Value::Object(p)) => {
            for (k, v) in p {
                if v.is_null() {
                    continue;
                }
                match b.get_mut(&k) {
                    Some(slot) => merge_json(slot, v),
                    None => {
                        b.insert(k, v);
                    }
                }
            }
        }
        (slot, v) => *slot = v,
    }
}

/// Apply a partial JSON document to `current` and return the updated value.
///
/// Fails with a parse error for malformed JSON or a non-object root, and with a serialization
/// error when a field has the wrong type. `current` is never modified.
pub fn apply_partial<T>(current: &T, patch_json: &str) -> TachieResult<T>
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    let patch: serde_json::Value = serde_json::from_str(patch_json)
        .map_err(|e| TachieError::parse(format!("invalid config JSON: {e}")))?;
    if !patch.is_object() {
        return Err(TachieError::parse("config JSON root must be an object"));
    }
    let mut merged =
        serde_json::to_value(current).map_err(|e| TachieError::serde(e.to_string()))?;
    merge_json(&mut merged, patch);
    serde_json::from_value(merged).map_err(|e| TachieError::serde(format!("invalid config: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/config.rs"]
mod tests;
