use std::borrow::Cow;
use std::collections::HashMap;

use crate::assets::color::Rgba8;
use crate::assets::store::AssetResolver;
use crate::foundation::error::{TachieError, TachieResult};
use crate::text::fit::GlyphMetrics;

/// Index of a loaded `(family, size)` pair inside a [`FontCache`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FontHandle(usize);

struct FontFace {
    family: String,
    parley_family: String,
    data: vello_cpu::peniko::FontData,
}

struct FontEntry {
    family: String,
    size: u32,
    face: usize,
    line_height: u32,
    ascent: u32,
    advances: HashMap<char, u32>,
}

/// Loaded fonts keyed by `(family, size)`.
///
/// Font files are read once per family and registered with Parley; each size then gets its own
/// entry with cached line height and per-character advances. Lookup is a linear scan, which is
/// fine for the handful of families and sizes a scene uses. Entries live until [`FontCache::clear`].
pub struct FontCache {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Rgba8>,
    faces: Vec<FontFace>,
    entries: Vec<FontEntry>,
}

impl Default for FontCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FontCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontCache")
            .field("faces", &self.faces.len())
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl FontCache {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            faces: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached size. Registered faces are dropped too, so a changed assets root is
    /// picked up on the next lookup.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.faces.clear();
        self.font_ctx = parley::FontContext::default();
    }

    /// Handle for `family` at `size`, loading `fonts/<family>.*` on first use.
    pub fn get(
        &mut self,
        resolver: &AssetResolver,
        family: &str,
        size: u32,
    ) -> TachieResult<FontHandle> {
        if let Some(i) = self
            .entries
            .iter()
            .position(|e| e.size == size && e.family == family)
        {
            return Ok(FontHandle(i));
        }
        if size == 0 {
            return Err(TachieError::font("font size must be > 0"));
        }

        let face = self.face_for(resolver, family)?;
        let (line_height, ascent) = {
            let layout = self.build_layout(face, size, "国Ag", Rgba8::default());
            let ascent = layout
                .lines()
                .next()
                .map(|line| line.metrics().ascent)
                .unwrap_or(size as f32);
            (layout.height().ceil().max(1.0) as u32, ascent.round().max(0.0) as u32)
        };
        self.entries.push(FontEntry {
            family: family.to_owned(),
            size,
            face,
            line_height,
            ascent,
            advances: HashMap::new(),
        });
        tracing::debug!(family, size, line_height, "font size cached");
        Ok(FontHandle(self.entries.len() - 1))
    }

    fn face_for(&mut self, resolver: &AssetResolver, family: &str) -> TachieResult<usize> {
        if let Some(i) = self.faces.iter().position(|f| f.family == family) {
            return Ok(i);
        }

        let path = resolver.font_path(family)?;
        let bytes = std::fs::read(&path)
            .map_err(|e| TachieError::font(format!("read {}: {e}", path.display())))?;

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| TachieError::font(format!("no font families in {family}")))?;
        let parley_family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| TachieError::font(format!("font family in {family} has no name")))?
            .to_string();

        self.faces.push(FontFace {
            family: family.to_owned(),
            parley_family,
            data: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0),
        });
        Ok(self.faces.len() - 1)
    }

    fn build_layout(
        &mut self,
        face: usize,
        size: u32,
        text: &str,
        brush: Rgba8,
    ) -> parley::Layout<Rgba8> {
        let family_name = self.faces[face].parley_family.clone();
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size as f32));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<Rgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }

    /// Single-line layout of `text` in `color`. Glyph positions are relative to the line top.
    pub fn layout(&mut self, handle: FontHandle, text: &str, color: Rgba8) -> parley::Layout<Rgba8> {
        let (face, size) = {
            let e = &self.entries[handle.0];
            (e.face, e.size)
        };
        self.build_layout(face, size, text, color)
    }

    pub fn font_data(&self, handle: FontHandle) -> vello_cpu::peniko::FontData {
        self.faces[self.entries[handle.0].face].data.clone()
    }

    pub fn line_height(&self, handle: FontHandle) -> u32 {
        self.entries[handle.0].line_height
    }

    /// Distance from the line top to the baseline.
    pub fn ascent(&self, handle: FontHandle) -> u32 {
        self.entries[handle.0].ascent
    }

    pub fn size(&self, handle: FontHandle) -> u32 {
        self.entries[handle.0].size
    }

    /// Horizontal advance of one character, cached per entry.
    pub fn advance(&mut self, handle: FontHandle, ch: char) -> u32 {
        if let Some(w) = self.entries[handle.0].advances.get(&ch) {
            return *w;
        }
        let mut buf = [0u8; 4];
        let w = self.measure(handle, ch.encode_utf8(&mut buf));
        self.entries[handle.0].advances.insert(ch, w);
        w
    }

    /// Width of `text` laid out on one line.
    pub fn measure(&mut self, handle: FontHandle, text: &str) -> u32 {
        if text.is_empty() {
            return 0;
        }
        let layout = self.layout(handle, text, Rgba8::default());
        layout.full_width().ceil().max(0.0) as u32
    }

    /// Summed per-character advances, the same widths the wrapper uses.
    pub fn advance_sum(&mut self, handle: FontHandle, text: &str) -> u32 {
        text.chars()
            .map(|ch| self.advance(handle, ch))
            .fold(0u32, u32::saturating_add)
    }
}

/// [`GlyphMetrics`] for one family, loading sizes on demand.
pub struct FontMetrics<'a> {
    pub cache: &'a mut FontCache,
    pub resolver: &'a AssetResolver,
    pub family: &'a str,
}

impl FontMetrics<'_> {
    fn handle(&mut self, size: u32) -> Option<FontHandle> {
        match self.cache.get(self.resolver, self.family, size) {
            Ok(h) => Some(h),
            Err(e) => {
                tracing::debug!(family = self.family, size, error = %e, "font unavailable");
                None
            }
        }
    }
}

impl GlyphMetrics for FontMetrics<'_> {
    fn line_height(&mut self, size: u32) -> Option<u32> {
        let h = self.handle(size)?;
        Some(self.cache.line_height(h))
    }

    fn advance(&mut self, size: u32, ch: char) -> u32 {
        match self.handle(size) {
            Some(h) => self.cache.advance(h, ch),
            None => 0,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/font_cache.rs"]
mod tests;
