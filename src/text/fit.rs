use crate::text::segment::TextSegment;

/// Smallest font size the fit search will try, and the size used when nothing fits.
pub const MIN_FONT_SIZE: u32 = 12;

/// Per-size glyph measurements used to simulate wrapping.
///
/// `line_height` returns `None` when no font is available at that size.
pub trait GlyphMetrics {
    fn line_height(&mut self, size: u32) -> Option<u32>;
    fn advance(&mut self, size: u32, ch: char) -> u32;
}

/// One materialized line: colored runs in reading order and their summed width.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WrappedLine {
    pub runs: Vec<TextSegment>,
    pub width: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextLayout {
    pub size: u32,
    pub line_height: u32,
    pub lines: Vec<WrappedLine>,
    /// Some unit was wider than the box on a line of its own.
    pub overflow: bool,
}

impl TextLayout {
    pub fn height(&self) -> u32 {
        self.line_height.saturating_mul(self.lines.len() as u32)
    }

    pub fn max_line_width(&self) -> u32 {
        self.lines.iter().map(|l| l.width).max().unwrap_or(0)
    }
}

struct LineBuilder {
    lines: Vec<WrappedLine>,
    current: WrappedLine,
    overflow: bool,
}

impl LineBuilder {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            current: WrappedLine::default(),
            overflow: false,
        }
    }

    fn break_line(&mut self) {
        self.lines.push(std::mem::take(&mut self.current));
    }

    /// Place one unit of width `w` covering `start..end`, starting a new line first if needed.
    fn push_unit(&mut self, seg: &TextSegment, start: usize, end: usize, w: u32, box_w: u32) {
        let line_empty = self.current.runs.is_empty();
        if !line_empty && self.current.width.saturating_add(w) > box_w {
            self.break_line();
        }
        if w > box_w {
            self.overflow = true;
        }

        let line = &mut self.current;
        line.width = line.width.saturating_add(w);
        match line.runs.last_mut() {
            Some(last)
                if !seg.is_emoji
                    && !last.is_emoji
                    && last.color == seg.color
                    && last.end == start =>
            {
                last.end = end;
            }
            _ => line.runs.push(TextSegment {
                start,
                end,
                color: seg.color,
                is_emoji: seg.is_emoji,
            }),
        }
    }

    fn finish(mut self) -> (Vec<WrappedLine>, bool) {
        if !self.current.runs.is_empty() || self.lines.is_empty() {
            self.break_line();
        }
        (self.lines, self.overflow)
    }
}

/// Greedy wrap of `segments` into lines no wider than `box_w` at `size`.
///
/// Text breaks between any two characters; emoji are single units as wide as the line height.
/// A `\n` forces a break and is not part of any run. Returns `None` when the font is missing.
pub fn wrap_segments<M: GlyphMetrics + ?Sized>(
    metrics: &mut M,
    text: &str,
    segments: &[TextSegment],
    size: u32,
    box_w: u32,
) -> Option<TextLayout> {
    let line_height = metrics.line_height(size)?;
    let mut builder = LineBuilder::new();

    for seg in segments {
        if seg.is_emoji {
            builder.push_unit(seg, seg.start, seg.end, line_height, box_w);
            continue;
        }
        for (i, ch) in text[seg.range()].char_indices() {
            let start = seg.start + i;
            if ch == '\n' {
                builder.break_line();
                continue;
            }
            let w = metrics.advance(size, ch);
            builder.push_unit(seg, start, start + ch.len_utf8(), w, box_w);
        }
    }

    let (lines, overflow) = builder.finish();
    Some(TextLayout {
        size,
        line_height,
        lines,
        overflow,
    })
}

/// Whether the text wraps into `box_w x box_h` at `size`. A missing font never fits.
pub fn fits<M: GlyphMetrics + ?Sized>(
    metrics: &mut M,
    text: &str,
    segments: &[TextSegment],
    size: u32,
    box_w: u32,
    box_h: u32,
) -> bool {
    match wrap_segments(metrics, text, segments, size, box_w) {
        Some(layout) => !layout.overflow && layout.height() <= box_h,
        None => false,
    }
}

/// Largest size in `[MIN_FONT_SIZE, max_size]` whose layout fits the box.
///
/// `max_size` is tried first. If nothing fits, `MIN_FONT_SIZE` is returned anyway.
pub fn fit_font_size<M: GlyphMetrics + ?Sized>(
    metrics: &mut M,
    text: &str,
    segments: &[TextSegment],
    box_w: u32,
    box_h: u32,
    max_size: u32,
) -> u32 {
    if max_size <= MIN_FONT_SIZE {
        return MIN_FONT_SIZE;
    }
    if fits(metrics, text, segments, max_size, box_w, box_h) {
        return max_size;
    }

    let mut best = MIN_FONT_SIZE;
    let (mut lo, mut hi) = (MIN_FONT_SIZE, max_size - 1);
    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        if fits(metrics, text, segments, mid, box_w, box_h) {
            best = mid;
            lo = mid + 1;
        } else {
            hi = mid - 1;
        }
    }
    tracing::trace!(best, max_size, box_w, box_h, "font size fitted");
    best
}

#[cfg(test)]
#[path = "../../tests/unit/text/fit.rs"]
mod tests;
