use super::*;
use crate::assets::color::Rgba8;
use crate::text::segment::segment_text;

const WHITE: Rgba8 = Rgba8::rgb(255, 255, 255);
const RED: Rgba8 = Rgba8::rgb(255, 0, 0);

/// Monospace stand-in: wide glyphs are `size` across, ASCII is half that.
struct Mono {
    missing: Vec<u32>,
}

impl Mono {
    fn new() -> Self {
        Self {
            missing: Vec::new(),
        }
    }
}

impl GlyphMetrics for Mono {
    fn line_height(&mut self, size: u32) -> Option<u32> {
        if self.missing.contains(&size) {
            return None;
        }
        Some((size * 6).div_ceil(5))
    }

    fn advance(&mut self, size: u32, ch: char) -> u32 {
        if ch.is_ascii() { size / 2 } else { size }
    }
}

fn segs(text: &str) -> Vec<TextSegment> {
    segment_text(text, &[], WHITE, RED)
}

#[test]
fn short_text_fits_at_max() {
    let text = "hello";
    let size = fit_font_size(&mut Mono::new(), text, &segs(text), 1000, 200, 55);
    assert_eq!(size, 55);
}

#[test]
fn long_text_shrinks_and_fitted_size_fits() {
    let text = "これはとても長いセリフなので、一行には収まらずに折り返されるはずです。";
    let s = segs(text);
    let mut m = Mono::new();
    let size = fit_font_size(&mut m, text, &s, 400, 120, 80);
    assert!(size < 80);
    assert!(size >= MIN_FONT_SIZE);
    assert!(fits(&mut m, text, &s, size, 400, 120));
    if size < 79 {
        assert!(!fits(&mut m, text, &s, size + 1, 400, 120));
    }
}

#[test]
fn nothing_fits_falls_back_to_minimum() {
    let text = "あいうえおかきくけこさしすせそ";
    let size = fit_font_size(&mut Mono::new(), text, &segs(text), 30, 10, 60);
    assert_eq!(size, MIN_FONT_SIZE);
}

#[test]
fn max_below_minimum_uses_minimum() {
    let text = "x";
    assert_eq!(fit_font_size(&mut Mono::new(), text, &segs(text), 100, 100, 8), 12);
}

#[test]
fn missing_size_counts_as_not_fitting() {
    let text = "abc";
    let mut m = Mono::new();
    m.missing.push(55);
    let size = fit_font_size(&mut m, text, &segs(text), 1000, 1000, 55);
    assert_eq!(size, 54);
}

#[test]
fn fit_is_monotone_over_sizes() {
    let samples = [
        "短い",
        "「括弧つき」の台詞と [brackets] が混ざった、少し長めのテキストです。",
        "ascii only text that should wrap across a few lines at larger sizes",
        "😀 emoji 😀 mixed 😀",
    ];
    for text in samples {
        let spans: Vec<(usize, usize)> = text
            .char_indices()
            .filter(|(_, c)| *c == '😀')
            .map(|(i, c)| (i, i + c.len_utf8()))
            .collect();
        let s = segment_text(text, &spans, WHITE, RED);
        for (w, h) in [(300, 80), (600, 150), (1579, 245)] {
            let mut m = Mono::new();
            let mut seen_fail = None;
            for size in MIN_FONT_SIZE..=80 {
                let ok = fits(&mut m, text, &s, size, w, h);
                if let Some(failed_at) = seen_fail {
                    assert!(
                        !ok,
                        "{text:?} in {w}x{h}: size {size} fits but {failed_at} did not"
                    );
                }
                if !ok && seen_fail.is_none() {
                    seen_fail = Some(size);
                }
            }
        }
    }
}

#[test]
fn wrap_covers_every_character_once() {
    let text = "「甲」は😀を見た。abc def";
    let e = text.find('😀').unwrap();
    let s = segment_text(text, &[(e, e + 4)], WHITE, RED);
    let layout = wrap_segments(&mut Mono::new(), text, &s, 20, 70).unwrap();

    let mut cursor = 0;
    for line in &layout.lines {
        let mut width = 0;
        for run in &line.runs {
            assert_eq!(run.start, cursor);
            cursor = run.end;
            width += if run.is_emoji {
                layout.line_height
            } else {
                text[run.range()]
                    .chars()
                    .map(|c| if c.is_ascii() { 10 } else { 20 })
                    .sum()
            };
        }
        assert_eq!(width, line.width);
        assert!(line.width <= 70);
    }
    assert_eq!(cursor, text.len());
}

#[test]
fn same_color_characters_merge_into_runs() {
    let text = "abcd";
    let layout = wrap_segments(&mut Mono::new(), text, &segs(text), 20, 1000).unwrap();
    assert_eq!(layout.lines.len(), 1);
    assert_eq!(layout.lines[0].runs, vec![TextSegment::text(0, 4, WHITE)]);
    assert_eq!(layout.lines[0].width, 40);
}

#[test]
fn narrow_box_puts_one_character_per_line() {
    let text = "あいう";
    let layout = wrap_segments(&mut Mono::new(), text, &segs(text), 20, 20).unwrap();
    assert_eq!(layout.lines.len(), 3);
    assert!(!layout.overflow);
    assert!(layout.lines.iter().all(|l| l.width == 20));
}

#[test]
fn oversized_unit_overflows() {
    let text = "あ";
    let s = segs(text);
    let layout = wrap_segments(&mut Mono::new(), text, &s, 40, 20).unwrap();
    assert!(layout.overflow);
    assert!(!fits(&mut Mono::new(), text, &s, 40, 20, 1000));
}

#[test]
fn newline_forces_break() {
    let text = "ab\ncd";
    let layout = wrap_segments(&mut Mono::new(), text, &segs(text), 20, 1000).unwrap();
    assert_eq!(layout.lines.len(), 2);
    assert_eq!(layout.lines[0].runs[0].range(), 0..2);
    assert_eq!(layout.lines[1].runs[0].range(), 3..5);
}

#[test]
fn emoji_unit_is_line_height_wide() {
    let text = "😀";
    let s = segment_text(text, &[(0, 4)], WHITE, RED);
    let layout = wrap_segments(&mut Mono::new(), text, &s, 50, 1000).unwrap();
    assert_eq!(layout.line_height, 60);
    assert_eq!(layout.lines[0].width, 60);
    assert!(layout.lines[0].runs[0].is_emoji);
}
