use crate::foundation::error::{TachieError, TachieResult};
use crate::foundation::math::{
    over_straight_px, premultiply_rgba8_in_place, unpremultiply_rgba8_in_place,
};

/// Integer rectangle in canvas pixel space. Position may be negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PxRect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl PxRect {
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

/// Owned straight-alpha RGBA8 raster.
///
/// Rows are tightly packed (`pitch == width * 4`). Handing a surface to a cache moves it.
#[derive(Clone, Debug, PartialEq)]
pub struct Surface {
    img: image::RgbaImage,
}

impl Surface {
    /// Allocate a fully transparent surface.
    pub fn new(width: u32, height: u32) -> TachieResult<Self> {
        byte_len(width, height)?;
        Ok(Self {
            img: image::RgbaImage::new(width, height),
        })
    }

    /// Wrap tightly packed straight-alpha RGBA8 bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> TachieResult<Self> {
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(TachieError::render(format!(
                "rgba byte len mismatch: got {}, expected {expected}",
                data.len()
            )));
        }
        let img = image::RgbaImage::from_raw(width, height, data)
            .ok_or_else(|| TachieError::render("rgba buffer rejected"))?;
        Ok(Self { img })
    }

    /// Copy rows out of a caller buffer whose rows may be padded past `width * 4`.
    pub fn from_pitched(data: &[u8], width: u32, height: u32, pitch: usize) -> TachieResult<Self> {
        let row = (width as usize).saturating_mul(4);
        if pitch < row {
            return Err(TachieError::render("pitch is smaller than one row"));
        }
        let needed = pitch
            .saturating_mul((height as usize).saturating_sub(1))
            .saturating_add(row);
        if height > 0 && data.len() < needed {
            return Err(TachieError::render("pixel buffer shorter than pitch * height"));
        }
        let mut out = Vec::with_capacity(byte_len(width, height)?);
        for y in 0..height as usize {
            out.extend_from_slice(&data[y * pitch..y * pitch + row]);
        }
        Self::from_rgba(width, height, out)
    }

    pub fn from_image(img: image::RgbaImage) -> Self {
        Self { img }
    }

    pub fn width(&self) -> u32 {
        self.img.width()
    }

    pub fn height(&self) -> u32 {
        self.img.height()
    }

    pub fn pitch(&self) -> usize {
        self.img.width() as usize * 4
    }

    pub fn as_raw(&self) -> &[u8] {
        self.img.as_raw()
    }

    pub fn as_image(&self) -> &image::RgbaImage {
        &self.img
    }

    pub fn into_image(self) -> image::RgbaImage {
        self.img
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.img.get_pixel(x, y).0
    }

    /// Return `true` when every pixel has zero alpha.
    pub fn is_transparent(&self) -> bool {
        self.img.as_raw().chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Source-over blend `src` with its top-left corner at `(x, y)`, clipped to this surface.
    pub fn blit_over(&mut self, src: &Surface, x: i32, y: i32) {
        let Some((sx0, sy0, dx0, dy0, w, h)) =
            clip(src.width(), src.height(), self.width(), self.height(), x, y)
        else {
            return;
        };

        let src_pitch = src.pitch();
        let dst_pitch = self.pitch();
        let src_raw = src.img.as_raw();
        let dst_raw: &mut [u8] = &mut self.img;
        for row in 0..h {
            let s = (sy0 + row) * src_pitch + sx0 * 4;
            let d = (dy0 + row) * dst_pitch + dx0 * 4;
            let src_row = &src_raw[s..s + w * 4];
            let dst_row = &mut dst_raw[d..d + w * 4];
            for (dp, sp) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
                let out = over_straight_px(
                    [dp[0], dp[1], dp[2], dp[3]],
                    [sp[0], sp[1], sp[2], sp[3]],
                );
                dp.copy_from_slice(&out);
            }
        }
    }

    /// Overwrite a clipped rectangle with a solid color.
    pub fn fill_rect(&mut self, rect: PxRect, rgba: [u8; 4]) {
        let Some((_, _, dx0, dy0, w, h)) =
            clip(rect.w, rect.h, self.width(), self.height(), rect.x, rect.y)
        else {
            return;
        };
        let pitch = self.pitch();
        let raw: &mut [u8] = &mut self.img;
        for row in 0..h {
            let d = (dy0 + row) * pitch + dx0 * 4;
            for px in raw[d..d + w * 4].chunks_exact_mut(4) {
                px.copy_from_slice(&rgba);
            }
        }
    }

    /// Convert into the premultiplied pixmap the rasterizer works on.
    pub(crate) fn to_pixmap(&self) -> TachieResult<vello_cpu::Pixmap> {
        let (w, h) = dims_u16(self.width(), self.height())?;
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        let dst = pixmap.data_as_u8_slice_mut();
        dst.copy_from_slice(self.img.as_raw());
        premultiply_rgba8_in_place(dst);
        Ok(pixmap)
    }

    /// Convert a premultiplied pixmap back into straight alpha.
    pub(crate) fn from_pixmap(pixmap: &vello_cpu::Pixmap) -> TachieResult<Self> {
        let mut bytes = pixmap.data_as_u8_slice().to_vec();
        unpremultiply_rgba8_in_place(&mut bytes);
        Self::from_rgba(u32::from(pixmap.width()), u32::from(pixmap.height()), bytes)
    }

    /// Move the pixels out into a buffer for the public boundary.
    pub fn into_pixel_buffer(self) -> PixelBuffer {
        let width = self.width();
        let height = self.height();
        PixelBuffer {
            pitch: width as usize * 4,
            width,
            height,
            data: self.img.into_raw(),
        }
    }
}

/// Output pixel buffer: straight-alpha RGBA8 rows of `pitch` bytes each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub pitch: usize,
}

impl PixelBuffer {
    /// Pixel at `(x, y)` as `[r, g, b, a]`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = y as usize * self.pitch + x as usize * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}

pub(crate) fn dims_u16(width: u32, height: u32) -> TachieResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| TachieError::render("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| TachieError::render("pixmap height exceeds u16"))?;
    Ok((w, h))
}

fn byte_len(width: u32, height: u32) -> TachieResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(4))
        .ok_or_else(|| TachieError::render(format!("surface {width}x{height} is too large")))
}

/// Intersect a `w x h` source placed at `(x, y)` with a `dst_w x dst_h` target.
///
/// Returns `(src_x, src_y, dst_x, dst_y, w, h)` or `None` when nothing is visible.
fn clip(
    w: u32,
    h: u32,
    dst_w: u32,
    dst_h: u32,
    x: i32,
    y: i32,
) -> Option<(usize, usize, usize, usize, usize, usize)> {
    let x0 = i64::from(x).max(0);
    let y0 = i64::from(y).max(0);
    let x1 = (i64::from(x) + i64::from(w)).min(i64::from(dst_w));
    let y1 = (i64::from(y) + i64::from(h)).min(i64::from(dst_h));
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some((
        (x0 - i64::from(x)) as usize,
        (y0 - i64::from(y)) as usize,
        x0 as usize,
        y0 as usize,
        (x1 - x0) as usize,
        (y1 - y0) as usize,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
