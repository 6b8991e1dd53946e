use serde::{Deserialize, Serialize};

use crate::foundation::core::PxRect;

/// How a source is fitted into a destination box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    Width,
    Height,
    /// Also chosen for unrecognized names.
    #[default]
    #[serde(other)]
    Fit,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    Center,
    Right,
    #[default]
    #[serde(other)]
    Left,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    Middle,
    Bottom,
    #[default]
    #[serde(other)]
    Top,
}

/// When a pasted image gets its own region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasteMode {
    Off,
    Always,
    #[default]
    #[serde(other)]
    Mixed,
}

/// Size of `src` after fitting it into `dst` with `mode`.
///
/// `Width` and `Height` match one axis and keep the aspect ratio; `Fit` uses the smaller of the
/// two scale factors. Results are truncated toward zero.
pub fn scaled_rect(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32, mode: FillMode) -> (u32, u32) {
    if src_w == 0 || src_h == 0 {
        return (0, 0);
    }
    let (sw, sh) = (src_w as f32, src_h as f32);
    match mode {
        FillMode::Width => {
            let scale = dst_w as f32 / sw;
            (dst_w, (sh * scale) as u32)
        }
        FillMode::Height => {
            let scale = dst_h as f32 / sh;
            ((sw * scale) as u32, dst_h)
        }
        FillMode::Fit => {
            let scale = (dst_w as f32 / sw).min(dst_h as f32 / sh);
            ((sw * scale) as u32, (sh * scale) as u32)
        }
    }
}

/// Place an `item_w x item_h` box inside a container using a free-form anchor string.
///
/// The anchor is matched by substring. Horizontally `right`, `left` and `center` are tried in
/// that order; vertically `bottom`, `middle` and `top`. A `center` that names no vertical edge
/// also centers vertically, so a bare `"center"` is the middle of the container. Anything else
/// means top-left. Offsets are added last and may be negative.
pub fn aligned_position(
    anchor: &str,
    offset_x: i32,
    offset_y: i32,
    container_w: u32,
    container_h: u32,
    item_w: u32,
    item_h: u32,
) -> (i32, i32) {
    let dw = container_w as i64 - item_w as i64;
    let dh = container_h as i64 - item_h as i64;

    let centered = anchor.contains("center");
    let x = if anchor.contains("right") {
        dw
    } else if anchor.contains("left") {
        0
    } else if centered {
        dw / 2
    } else {
        0
    };
    let y = if anchor.contains("bottom") {
        dh
    } else if anchor.contains("middle") {
        dh / 2
    } else if anchor.contains("top") {
        0
    } else if centered {
        dh / 2
    } else {
        0
    };

    (
        saturate_i32(x + i64::from(offset_x)),
        saturate_i32(y + i64::from(offset_y)),
    )
}

/// Top-left corner of an item aligned inside `region`.
pub fn align_in_region(
    region: PxRect,
    item_w: u32,
    item_h: u32,
    align: HAlign,
    valign: VAlign,
) -> (i32, i32) {
    let dw = region.w as i64 - item_w as i64;
    let dh = region.h as i64 - item_h as i64;
    let x = match align {
        HAlign::Left => 0,
        HAlign::Center => dw / 2,
        HAlign::Right => dw,
    };
    let y = match valign {
        VAlign::Top => 0,
        VAlign::Middle => dh / 2,
        VAlign::Bottom => dh,
    };
    (
        saturate_i32(i64::from(region.x) + x),
        saturate_i32(i64::from(region.y) + y),
    )
}

/// Regions used by the overlay draw for text and a pasted image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentRegions {
    pub text: PxRect,
    pub image: PxRect,
}

/// Decide where text and a pasted image go.
///
/// With both present and paste mode `Off`, the text box is split: text on the left, image on the
/// right, the image taking 70% for short texts (estimated under 20 characters) and 50% otherwise.
/// An image alone takes the whole text box unless the mode is `Always`.
pub fn split_content_regions(
    has_text: bool,
    has_image: bool,
    mode: PasteMode,
    textbox: PxRect,
    paste: PxRect,
    text_len_bytes: usize,
    emoji_count: usize,
) -> ContentRegions {
    let mut out = ContentRegions {
        text: textbox,
        image: paste,
    };

    if has_image && has_text {
        if mode == PasteMode::Off {
            // Rough character estimate assuming mostly 3-byte CJK text.
            let approx_chars = text_len_bytes / 3 + emoji_count;
            let image_pct: u64 = if approx_chars < 20 { 70 } else { 50 };
            let text_w = (u64::from(textbox.w) * (100 - image_pct) / 100) as u32;
            out.text = PxRect::new(textbox.x, textbox.y, text_w, textbox.h);
            out.image = PxRect::new(
                saturate_i32(i64::from(textbox.x) + i64::from(text_w)),
                textbox.y,
                textbox.w - text_w,
                textbox.h,
            );
        }
    } else if has_image && mode != PasteMode::Always {
        out.image = textbox;
    }
    out
}

fn saturate_i32(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
#[path = "../../tests/unit/layout/geometry.rs"]
mod tests;
