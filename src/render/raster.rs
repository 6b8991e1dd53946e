use std::sync::Arc;

use vello_cpu::kurbo::{Affine, Rect};

use crate::assets::color::Rgba8;
use crate::foundation::core::{PxRect, Surface, dims_u16};
use crate::foundation::error::{TachieError, TachieResult};

/// Anti-aliased drawing onto a fresh transparent layer of fixed size.
///
/// Draw calls are recorded in order and rasterized by [`Raster::finish`]; callers then blend the
/// resulting surface over their target.
pub struct Raster {
    ctx: vello_cpu::RenderContext,
    width: u16,
    height: u16,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> TachieResult<Self> {
        if width == 0 || height == 0 {
            return Err(TachieError::render(format!(
                "raster size {width}x{height} must be non-zero"
            )));
        }
        let (w, h) = dims_u16(width, height)?;
        Ok(Self {
            ctx: vello_cpu::RenderContext::new(w, h),
            width: w,
            height: h,
        })
    }

    pub fn width(&self) -> u32 {
        u32::from(self.width)
    }

    pub fn height(&self) -> u32 {
        u32::from(self.height)
    }

    /// Draw every glyph run of `layout` with its brush color, line top at `(x, y)`.
    pub fn draw_layout(
        &mut self,
        font: &vello_cpu::peniko::FontData,
        layout: &parley::Layout<Rgba8>,
        x: f64,
        y: f64,
    ) {
        self.ctx.set_paint_transform(Affine::IDENTITY);
        self.ctx.set_transform(Affine::translate((x, y)));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
    }

    /// Draw `image` stretched into `dest`.
    pub fn draw_image(&mut self, image: &Surface, dest: PxRect) -> TachieResult<()> {
        if image.width() == 0 || image.height() == 0 || dest.w == 0 || dest.h == 0 {
            return Ok(());
        }
        let sx = f64::from(dest.w) / f64::from(image.width());
        let sy = f64::from(dest.h) / f64::from(image.height());
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(image.to_pixmap()?)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };

        self.ctx.set_paint_transform(Affine::IDENTITY);
        self.ctx.set_transform(
            Affine::translate((f64::from(dest.x), f64::from(dest.y))) * Affine::scale_non_uniform(sx, sy),
        );
        self.ctx.set_paint(paint);
        self.ctx.fill_rect(&Rect::new(
            0.0,
            0.0,
            f64::from(image.width()),
            f64::from(image.height()),
        ));
        Ok(())
    }

    pub fn fill_rect(&mut self, rect: PxRect, color: Rgba8) {
        self.ctx.set_paint_transform(Affine::IDENTITY);
        self.ctx.set_transform(Affine::IDENTITY);
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
        self.ctx.fill_rect(&Rect::new(
            f64::from(rect.x),
            f64::from(rect.y),
            f64::from(rect.x) + f64::from(rect.w),
            f64::from(rect.y) + f64::from(rect.h),
        ));
    }

    /// Rasterize everything drawn so far into a straight-alpha surface.
    pub fn finish(mut self) -> TachieResult<Surface> {
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        Surface::from_pixmap(&pixmap)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
