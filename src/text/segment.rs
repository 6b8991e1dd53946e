use std::ops::Range;

use crate::assets::color::Rgba8;

/// Opening and closing tokens that highlight the text between them.
pub const BRACKET_PAIRS: &[(char, char)] = &[
    ('"', '"'),
    ('[', ']'),
    ('<', '>'),
    ('【', '】'),
    ('〔', '〕'),
    ('「', '」'),
    ('『', '』'),
    ('〖', '〗'),
    ('《', '》'),
    ('〈', '〉'),
    ('“', '”'),
];

/// A byte range of the source string drawn in one color, or a single emoji cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextSegment {
    pub start: usize,
    pub end: usize,
    pub color: Rgba8,
    pub is_emoji: bool,
}

impl TextSegment {
    pub fn text(start: usize, end: usize, color: Rgba8) -> Self {
        Self {
            start,
            end,
            color,
            is_emoji: false,
        }
    }

    pub fn emoji(start: usize, end: usize, color: Rgba8) -> Self {
        Self {
            start,
            end,
            color,
            is_emoji: true,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

fn closer_for(open: char) -> Option<char> {
    BRACKET_PAIRS
        .iter()
        .find(|(o, _)| *o == open)
        .map(|(_, c)| *c)
}

/// Highlighted spans inside `range`: for each matched pair, the opener plus interior,
/// then the closer on its own. Only one bracket is tracked at a time, so pairs never nest.
pub fn bracket_spans(text: &str, range: Range<usize>) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut open: Option<(usize, char)> = None;

    for (i, ch) in text[range.clone()].char_indices() {
        let pos = range.start + i;
        match open {
            None => {
                if let Some(closer) = closer_for(ch) {
                    open = Some((pos, closer));
                }
            }
            Some((start, closer)) if ch == closer => {
                out.push(start..pos);
                out.push(pos..pos + ch.len_utf8());
                open = None;
            }
            Some(_) => {}
        }
    }
    out
}

/// Push default-colored and highlighted segments covering `range`.
fn push_text_range(
    out: &mut Vec<TextSegment>,
    text: &str,
    range: Range<usize>,
    text_color: Rgba8,
    bracket_color: Rgba8,
) {
    let mut cursor = range.start;
    for span in bracket_spans(text, range.clone()) {
        if span.start > cursor {
            out.push(TextSegment::text(cursor, span.start, text_color));
        }
        out.push(TextSegment::text(span.start, span.end, bracket_color));
        cursor = span.end;
    }
    if cursor < range.end {
        out.push(TextSegment::text(cursor, range.end, text_color));
    }
}

/// Drop emoji spans that are empty, out of bounds, off a char boundary, or overlapping.
fn valid_emoji_spans(text: &str, spans: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut sorted: Vec<(usize, usize)> = spans.to_vec();
    sorted.sort_by_key(|&(start, _)| start);

    let mut out: Vec<(usize, usize)> = Vec::with_capacity(sorted.len());
    for (start, end) in sorted {
        let in_bounds = start < end
            && end <= text.len()
            && text.is_char_boundary(start)
            && text.is_char_boundary(end);
        let overlaps = out.last().is_some_and(|&(_, prev_end)| start < prev_end);
        if !in_bounds || overlaps {
            tracing::warn!(start, end, len = text.len(), "skipping invalid emoji span");
            continue;
        }
        out.push((start, end));
    }
    out
}

/// Split `text` into colored runs and emoji clusters.
///
/// Text between emoji spans is bracket-scanned on its own; emoji spans are spliced in as atomic
/// segments. The result is sorted, non-overlapping, and covers `0..text.len()` exactly.
pub fn segment_text(
    text: &str,
    emoji_spans: &[(usize, usize)],
    text_color: Rgba8,
    bracket_color: Rgba8,
) -> Vec<TextSegment> {
    let mut out = Vec::new();
    let mut cursor = 0usize;
    for (start, end) in valid_emoji_spans(text, emoji_spans) {
        if start > cursor {
            push_text_range(&mut out, text, cursor..start, text_color, bracket_color);
        }
        out.push(TextSegment::emoji(start, end, text_color));
        cursor = end;
    }
    if cursor < text.len() {
        push_text_range(&mut out, text, cursor..text.len(), text_color, bracket_color);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/text/segment.rs"]
mod tests;
