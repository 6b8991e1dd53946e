use crate::assets::color::Rgba8;
use crate::assets::store::AssetResolver;
use crate::foundation::core::{PxRect, Surface};
use crate::foundation::error::{TachieError, TachieResult};
use crate::layout::geometry::{FillMode, HAlign, VAlign, align_in_region, scaled_rect};
use crate::render::raster::Raster;
use crate::text::fit::{MIN_FONT_SIZE, TextLayout, fit_font_size, wrap_segments};
use crate::text::font_cache::{FontCache, FontMetrics};
use crate::text::segment::TextSegment;

/// Emoji are drawn at this fraction of the line height, centered in their unit.
const EMOJI_SCALE: f32 = 0.9;
const EMOJI_FILLER: Rgba8 = Rgba8::rgb(200, 200, 200);
/// Extra gap between wrapped lines of a free text component, as a fraction of the line height.
const WRAPPED_LINE_SPACING: f32 = 0.15;
/// Name box text baseline, as a fraction of the box image height.
const NAME_BASELINE: f32 = 0.65;
/// Horizontal anchor of the first name run, shifted left by half the largest run size.
const NAME_ANCHOR_X: i32 = 270;
const NAME_SHADOW_OFFSET: i32 = 2;
/// Size of a name run that doesn't set one, also used to anchor runs that all report size 0.
pub const DEFAULT_NAME_SIZE: u32 = 92;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shadow {
    pub color: Rgba8,
    pub dx: i32,
    pub dy: i32,
}

impl Shadow {
    /// `None` when the offset is zero, since such a shadow would be hidden under the text.
    pub fn visible(color: Rgba8, dx: i32, dy: i32) -> Option<Self> {
        (dx != 0 || dy != 0).then_some(Self { color, dx, dy })
    }
}

/// Styling for auto-fitted dialogue text.
#[derive(Clone, Debug, PartialEq)]
pub struct TextBoxStyle {
    pub family: String,
    pub max_size: u32,
    pub align: HAlign,
    pub valign: VAlign,
    pub shadow: Option<Shadow>,
}

/// One colored run of a name box label.
#[derive(Clone, Debug, PartialEq)]
pub struct NameRun {
    pub text: String,
    pub font_size: u32,
    pub color: Rgba8,
}

/// Fit `text` into `region`, wrap it, and draw it onto `canvas`.
///
/// Returns the layout that was drawn. Fails only when no font is available at the chosen size.
#[tracing::instrument(skip_all, fields(len = text.len(), region = ?region))]
pub fn draw_text_box(
    canvas: &mut Surface,
    fonts: &mut FontCache,
    resolver: &AssetResolver,
    text: &str,
    segments: &[TextSegment],
    region: PxRect,
    style: &TextBoxStyle,
) -> TachieResult<Option<TextLayout>> {
    if text.is_empty() || segments.is_empty() || region.w == 0 || region.h == 0 {
        return Ok(None);
    }

    let mut metrics = FontMetrics {
        cache: fonts,
        resolver,
        family: &style.family,
    };
    let size = fit_font_size(
        &mut metrics,
        text,
        segments,
        region.w,
        region.h,
        style.max_size,
    );
    let layout = wrap_segments(&mut metrics, text, segments, size, region.w).ok_or_else(|| {
        TachieError::font(format!(
            "font {} unavailable at size {size} (minimum {MIN_FONT_SIZE})",
            style.family
        ))
    })?;
    let handle = fonts.get(resolver, &style.family, size)?;
    let font = fonts.font_data(handle);
    let lh = layout.line_height;

    let mut raster = Raster::new(canvas.width(), canvas.height())?;
    let (_, top) = align_in_region(region, 0, layout.height(), HAlign::Left, style.valign);
    let line_origins: Vec<(i32, i32)> = layout
        .lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let (x, _) = align_in_region(region, line.width, lh, style.align, VAlign::Top);
            (x, top.saturating_add((i as u32 * lh) as i32))
        })
        .collect();

    // All shadows go under all text so a deep offset never covers the previous line.
    if let Some(shadow) = style.shadow {
        for (line, &(x, y)) in layout.lines.iter().zip(&line_origins) {
            let mut cx = x;
            for run in &line.runs {
                if run.is_emoji {
                    cx = cx.saturating_add(lh as i32);
                    continue;
                }
                let run_text = &text[run.range()];
                let glyphs = fonts.layout(handle, run_text, shadow.color);
                raster.draw_layout(
                    &font,
                    &glyphs,
                    f64::from(cx + shadow.dx),
                    f64::from(y + shadow.dy),
                );
                cx = cx.saturating_add(fonts.advance_sum(handle, run_text) as i32);
            }
        }
    }

    for (line, &(x, y)) in layout.lines.iter().zip(&line_origins) {
        let mut cx = x;
        for run in &line.runs {
            let run_text = &text[run.range()];
            if run.is_emoji {
                draw_emoji(&mut raster, resolver, run_text, PxRect::new(cx, y, lh, lh))?;
                cx = cx.saturating_add(lh as i32);
                continue;
            }
            let glyphs = fonts.layout(handle, run_text, run.color);
            raster.draw_layout(&font, &glyphs, f64::from(cx), f64::from(y));
            cx = cx.saturating_add(fonts.advance_sum(handle, run_text) as i32);
        }
    }

    canvas.blit_over(&raster.finish()?, 0, 0);
    tracing::debug!(size, lines = layout.lines.len(), "text box drawn");
    Ok(Some(layout))
}

/// Draw one emoji aspect-fitted and centered in `unit`, or a filler square if it can't be loaded.
fn draw_emoji(
    raster: &mut Raster,
    resolver: &AssetResolver,
    emoji: &str,
    unit: PxRect,
) -> TachieResult<()> {
    let target = ((unit.h as f32) * EMOJI_SCALE) as u32;
    let inset = |outer: u32, inner: u32| ((outer.saturating_sub(inner)) / 2) as i32;

    match resolver.load_emoji(emoji) {
        Ok(img) => {
            let (w, h) = scaled_rect(img.width(), img.height(), target, target, FillMode::Fit);
            let dest = PxRect::new(unit.x + inset(unit.w, w), unit.y + inset(unit.h, h), w, h);
            raster.draw_image(&img, dest)
        }
        Err(e) => {
            tracing::warn!(emoji, error = %e, "emoji image unavailable, drawing filler");
            let dest = PxRect::new(
                unit.x + inset(unit.w, target),
                unit.y + inset(unit.h, target),
                target,
                target,
            );
            raster.fill_rect(dest, EMOJI_FILLER);
            Ok(())
        }
    }
}

/// Render a free text component onto its own transparent surface.
///
/// With `max_width > 0` the text wraps per character inside that width with a small line gap.
/// The surface is exactly `max_width` wide, so a glyph wider than that is clipped, as is any
/// shadow pushed past the edges. Every line's shadow is drawn before any text. Otherwise the text stays on one line and the
/// surface grows by the shadow offset so neither copy is clipped. Empty text yields `None`.
#[allow(clippy::too_many_arguments)]
pub fn render_text_component(
    fonts: &mut FontCache,
    resolver: &AssetResolver,
    text: &str,
    family: &str,
    size: u32,
    color: Rgba8,
    shadow: Option<Shadow>,
    max_width: u32,
) -> TachieResult<Option<Surface>> {
    if text.is_empty() {
        return Ok(None);
    }
    let handle = fonts.get(resolver, family, size)?;
    let font = fonts.font_data(handle);
    let lh = fonts.line_height(handle);

    if max_width > 0 {
        let segments = [TextSegment::text(0, text.len(), color)];
        let mut metrics = FontMetrics {
            cache: fonts,
            resolver,
            family,
        };
        let layout = wrap_segments(&mut metrics, text, &segments, size, max_width)
            .ok_or_else(|| TachieError::font(format!("font {family} unavailable at {size}")))?;
        let spacing = (lh as f32 * WRAPPED_LINE_SPACING) as u32;
        let n = layout.lines.len() as u32;
        let height = n * lh + n.saturating_sub(1) * spacing;
        let mut raster = Raster::new(max_width, height.max(1))?;
        let lines: Vec<(f64, &str)> = layout
            .lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| {
                let range = line_range(line.runs.as_slice())?;
                Some(((i as u32 * (lh + spacing)) as f64, &text[range]))
            })
            .collect();

        if let Some(s) = shadow {
            for &(y, line_text) in &lines {
                let glyphs = fonts.layout(handle, line_text, s.color);
                raster.draw_layout(&font, &glyphs, f64::from(s.dx), y + f64::from(s.dy));
            }
        }
        for &(y, line_text) in &lines {
            let glyphs = fonts.layout(handle, line_text, color);
            raster.draw_layout(&font, &glyphs, 0.0, y);
        }
        return raster.finish().map(Some);
    }

    let width = fonts.measure(handle, text).max(1);
    let (dx, dy) = shadow.map(|s| (s.dx, s.dy)).unwrap_or((0, 0));
    let mut raster = Raster::new(width + dx.unsigned_abs(), lh + dy.unsigned_abs())?;
    if let Some(s) = shadow {
        let glyphs = fonts.layout(handle, text, s.color);
        raster.draw_layout(&font, &glyphs, f64::from(dx.max(0)), f64::from(dy.max(0)));
    }
    let glyphs = fonts.layout(handle, text, color);
    raster.draw_layout(&font, &glyphs, f64::from((-dx).max(0)), f64::from((-dy).max(0)));
    raster.finish().map(Some)
}

fn line_range(runs: &[TextSegment]) -> Option<std::ops::Range<usize>> {
    Some(runs.first()?.start..runs.last()?.end)
}

/// Draw name runs onto a name box image, left to right on a shared baseline.
///
/// Runs with empty text are skipped, as are runs whose font can't be loaded. Each run gets a
/// small black drop shadow.
pub fn draw_name_runs(
    plate: &mut Surface,
    fonts: &mut FontCache,
    resolver: &AssetResolver,
    family: &str,
    runs: &[NameRun],
) -> TachieResult<()> {
    if runs.is_empty() || plate.width() == 0 || plate.height() == 0 {
        return Ok(());
    }
    let baseline = (plate.height() as f32 * NAME_BASELINE) as i32;
    let mut x = name_start_x(runs);

    let mut raster = Raster::new(plate.width(), plate.height())?;
    for run in runs {
        if run.text.is_empty() {
            continue;
        }
        let handle = match fonts.get(resolver, family, run.font_size) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(family, size = run.font_size, error = %e, "skipping name run");
                continue;
            }
        };
        let font = fonts.font_data(handle);
        let top = baseline - fonts.ascent(handle) as i32;

        let shadow = fonts.layout(handle, &run.text, Rgba8::BLACK);
        raster.draw_layout(
            &font,
            &shadow,
            f64::from(x + NAME_SHADOW_OFFSET),
            f64::from(top + NAME_SHADOW_OFFSET),
        );
        let glyphs = fonts.layout(handle, &run.text, run.color);
        raster.draw_layout(&font, &glyphs, f64::from(x), f64::from(top));
        x = x.saturating_add(fonts.measure(handle, &run.text) as i32);
    }
    plate.blit_over(&raster.finish()?, 0, 0);
    Ok(())
}

/// Left edge of the first name run.
fn name_start_x(runs: &[NameRun]) -> i32 {
    let max_size = runs
        .iter()
        .map(|r| r.font_size)
        .max()
        .filter(|&size| size > 0)
        .unwrap_or(DEFAULT_NAME_SIZE);
    NAME_ANCHOR_X.saturating_sub(i32::try_from(max_size / 2).unwrap_or(i32::MAX))
}

#[cfg(test)]
#[path = "../../tests/unit/text/draw.rs"]
mod tests;
