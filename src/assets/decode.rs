use std::path::Path;

use anyhow::Context;

use crate::foundation::core::Surface;
use crate::foundation::error::{TachieError, TachieResult};
use crate::foundation::math::unpremultiply_rgba8_in_place;

/// Largest raster we are willing to produce from an SVG document.
const MAX_SVG_DIM: u32 = 16_384;

/// Decode any raster format the `image` crate understands into straight RGBA8.
pub fn decode_image(bytes: &[u8]) -> TachieResult<Surface> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(Surface::from_image(dyn_img.to_rgba8()))
}

/// Parse an SVG document and rasterize it at its intrinsic size.
pub fn rasterize_svg(bytes: &[u8]) -> TachieResult<Surface> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;

    fn to_px(v: f32) -> TachieResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(TachieError::asset("svg has invalid width/height"));
        }
        Ok((v.ceil() as u32).max(1))
    }

    let size = tree.size();
    let w = to_px(size.width())?;
    let h = to_px(size.height())?;
    if w > MAX_SVG_DIM || h > MAX_SVG_DIM {
        return Err(TachieError::asset(format!(
            "svg raster size too large: {w}x{h} (max {MAX_SVG_DIM}x{MAX_SVG_DIM})"
        )));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(w, h)
        .ok_or_else(|| TachieError::asset("failed to allocate svg pixmap"))?;
    let sx = (w as f32) / size.width();
    let sy = (h as f32) / size.height();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );

    let mut rgba = pixmap.take();
    unpremultiply_rgba8_in_place(&mut rgba);
    Surface::from_rgba(w, h, rgba)
}

/// Read and decode a file, choosing the SVG path by extension.
pub fn load_file(path: &Path) -> TachieResult<Surface> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read asset '{}'", path.display()))?;
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
    if is_svg {
        rasterize_svg(&bytes)
    } else {
        decode_image(&bytes)
    }
}
