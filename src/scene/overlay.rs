use serde_json::Value;

use crate::assets::store::AssetResolver;
use crate::foundation::core::Surface;
use crate::foundation::error::TachieResult;
use crate::layout::geometry::{align_in_region, scaled_rect, split_content_regions};
use crate::render::scaler::RendererScaler;
use crate::scene::config::{GuiSettings, StyleConfig};
use crate::text::draw::{Shadow, TextBoxStyle, draw_text_box};
use crate::text::font_cache::FontCache;
use crate::text::segment::segment_text;

/// Emoji clusters located in the overlay text, as sent by the host.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmojiDescriptor {
    pub emojis: Vec<String>,
    /// Byte ranges `[start, end)` into the text.
    pub positions: Vec<(usize, usize)>,
}

impl EmojiDescriptor {
    /// Parse `{"emojis": [...], "positions": [[start, end], ...]}`.
    ///
    /// Anything malformed is dropped: a bad document yields an empty descriptor and bad
    /// entries are skipped individually.
    pub fn parse(json: Option<&str>) -> Self {
        let Some(json) = json.filter(|s| !s.trim().is_empty()) else {
            return Self::default();
        };
        let root: Value = match serde_json::from_str(json) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed emoji descriptor");
                return Self::default();
            }
        };

        let emojis = root
            .get("emojis")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        let positions = root
            .get("positions")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|pair| {
                        let pair = pair.as_array()?;
                        let start = pair.first()?.as_u64()?;
                        let end = pair.get(1)?.as_u64()?;
                        Some((usize::try_from(start).ok()?, usize::try_from(end).ok()?))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { emojis, positions }
    }
}

/// Caller-owned RGBA8 pixels whose rows may be padded.
#[derive(Clone, Copy, Debug)]
pub struct ImageInput<'a> {
    pub data: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub pitch: usize,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct OverlayRequest<'a> {
    pub text: &'a str,
    pub emoji_json: Option<&'a str>,
    pub image: Option<ImageInput<'a>>,
}

/// Draws free text and one pasted image over the last full render.
pub struct OverlayPainter<'a> {
    pub resolver: &'a AssetResolver,
    pub style: &'a StyleConfig,
    pub gui: &'a GuiSettings,
    pub fonts: &'a mut FontCache,
    pub scaler: &'a mut RendererScaler,
}

impl OverlayPainter<'_> {
    #[tracing::instrument(skip_all, fields(text_len = req.text.len(), image = req.image.is_some()))]
    pub fn draw(&mut self, preview: &Surface, req: &OverlayRequest<'_>) -> TachieResult<Surface> {
        let mut canvas = preview.clone();
        let emoji = EmojiDescriptor::parse(req.emoji_json);
        let paste = &self.style.paste_image_settings;

        let image = req.image.filter(|img| img.width > 0 && img.height > 0);
        let has_text = !req.text.is_empty();
        let regions = split_content_regions(
            has_text,
            image.is_some(),
            paste.enabled,
            self.style.textbox(),
            paste.region(),
            req.text.len(),
            emoji.emojis.len(),
        );

        if let Some(img) = image {
            match Surface::from_pitched(img.data, img.width, img.height, img.pitch) {
                Ok(src) => {
                    let (w, h) = scaled_rect(
                        src.width(),
                        src.height(),
                        regions.image.w,
                        regions.image.h,
                        paste.fill_mode,
                    );
                    if w > 0 && h > 0 {
                        let scaled = self.scaler.scale_with_fallback(&src, w, h);
                        let (x, y) =
                            align_in_region(regions.image, w, h, paste.align, paste.valign);
                        canvas.blit_over(&scaled, x, y);
                    }
                }
                Err(e) => tracing::warn!(error = %e, "pasted image rejected"),
            }
        }

        if has_text {
            let style = self.style;
            let segments = segment_text(
                req.text,
                &emoji.positions,
                style.text_color.opaque(),
                style.highlight_color().opaque(),
            );
            let box_style = TextBoxStyle {
                family: style.font_family.clone(),
                max_size: style.font_size,
                align: style.text_align,
                valign: style.text_valign,
                shadow: Shadow::visible(
                    style.shadow_color.opaque(),
                    style.shadow_offset_x,
                    style.shadow_offset_y,
                ),
            };
            if let Err(e) = draw_text_box(
                &mut canvas,
                self.fonts,
                self.resolver,
                req.text,
                &segments,
                regions.text,
                &box_style,
            ) {
                tracing::warn!(error = %e, "overlay text skipped");
            }
        }

        if let Some(factor) = self.gui.image_compression.factor() {
            let w = (canvas.width() as f32 * factor) as u32;
            let h = (canvas.height() as f32 * factor) as u32;
            if w == 0 || h == 0 {
                tracing::warn!(factor, "compression would empty the image; keeping full size");
            } else {
                canvas = self.scaler.scale_with_fallback(&canvas, w, h);
            }
        }
        Ok(canvas)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/overlay.rs"]
mod tests;
