use std::sync::Arc;

use vello_cpu::kurbo::{Affine, Rect};

use crate::foundation::core::{Surface, dims_u16};
use crate::foundation::error::{TachieError, TachieResult};

/// Resampler backed by a reusable vector render context.
///
/// The context is created on first use and kept until [`RendererScaler::cleanup`]; it is rebuilt
/// whenever the requested output size changes.
#[derive(Default)]
pub struct RendererScaler {
    ctx: Option<vello_cpu::RenderContext>,
}

impl std::fmt::Debug for RendererScaler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererScaler")
            .field("initialized", &self.ctx.is_some())
            .finish()
    }
}

impl RendererScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.ctx.is_some()
    }

    /// Release the render context. The next scale call recreates it.
    pub fn cleanup(&mut self) {
        if self.ctx.take().is_some() {
            tracing::debug!("scaler context released");
        }
    }

    /// Resample `src` to exactly `width x height` with filtered sampling.
    pub fn scale(&mut self, src: &Surface, width: u32, height: u32) -> TachieResult<Surface> {
        if width == 0 || height == 0 || src.width() == 0 || src.height() == 0 {
            return Err(TachieError::render(format!(
                "cannot scale {}x{} to {width}x{height}",
                src.width(),
                src.height()
            )));
        }
        let (w, h) = dims_u16(width, height)?;

        let reuse = self
            .ctx
            .as_ref()
            .is_some_and(|ctx| ctx.width() == w && ctx.height() == h);
        let ctx = if reuse {
            let ctx = self
                .ctx
                .as_mut()
                .ok_or_else(|| TachieError::init("scaler context vanished"))?;
            ctx.reset();
            ctx
        } else {
            tracing::debug!(width, height, "scaler context created");
            self.ctx.insert(vello_cpu::RenderContext::new(w, h))
        };

        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(src.to_pixmap()?)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        ctx.set_paint_transform(Affine::IDENTITY);
        ctx.set_transform(Affine::scale_non_uniform(
            f64::from(width) / f64::from(src.width()),
            f64::from(height) / f64::from(src.height()),
        ));
        ctx.set_paint(paint);
        ctx.fill_rect(&Rect::new(
            0.0,
            0.0,
            f64::from(src.width()),
            f64::from(src.height()),
        ));

        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);
        Surface::from_pixmap(&pixmap)
    }

    /// Resample with this scaler, falling back to the software path if it fails.
    ///
    /// A zero target size yields an empty surface.
    pub fn scale_with_fallback(&mut self, src: &Surface, width: u32, height: u32) -> Surface {
        if width == 0 || height == 0 || src.width() == 0 || src.height() == 0 {
            return Surface::from_image(image::RgbaImage::new(width, height));
        }
        match self.scale(src, width, height) {
            Ok(out) => out,
            Err(e) => {
                tracing::debug!(error = %e, width, height, "renderer scale failed, using software path");
                software_scale(src, width, height)
            }
        }
    }

    /// Multiply both dimensions by `factor` (truncating). A factor of exactly 1 returns `src`.
    pub fn apply_scale(&mut self, src: Surface, factor: f32) -> Surface {
        if factor == 1.0 || !factor.is_finite() || factor <= 0.0 {
            if factor != 1.0 {
                tracing::warn!(factor, "ignoring invalid scale factor");
            }
            return src;
        }
        let w = (src.width() as f32 * factor) as u32;
        let h = (src.height() as f32 * factor) as u32;
        self.scale_with_fallback(&src, w, h)
    }
}

/// Bilinear resample on the CPU without a render context.
pub fn software_scale(src: &Surface, width: u32, height: u32) -> Surface {
    Surface::from_image(image::imageops::resize(
        src.as_image(),
        width,
        height,
        image::imageops::FilterType::Triangle,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/scaler.rs"]
mod tests;
