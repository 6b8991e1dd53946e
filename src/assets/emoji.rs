//! Emoji cluster to asset file-name mapping.
//!
//! Files follow the `emoji_u<hex>[_<hex>...].png` convention: one lowercase,
//! zero-padded (at least 4 digits) hex component per code point.

fn is_modifier(cp: u32) -> bool {
    matches!(cp, 0xFE0E | 0xFE0F | 0x1F3FB..=0x1F3FF)
}

fn file_name(code_points: &[u32]) -> String {
    let parts: Vec<String> = code_points.iter().map(|cp| format!("{cp:04x}")).collect();
    format!("emoji_u{}.png", parts.join("_"))
}

/// Exact file name for an emoji cluster. NUL code points are skipped.
pub fn emoji_file_name(emoji: &str) -> String {
    let cps: Vec<u32> = emoji.chars().map(u32::from).filter(|&cp| cp != 0).collect();
    file_name(&cps)
}

/// File names to try, most specific first.
///
/// After the exact name come the name with trailing variation selectors and skin-tone
/// modifiers removed, and the name with the last component dropped.
pub fn emoji_file_candidates(emoji: &str) -> Vec<String> {
    let cps: Vec<u32> = emoji.chars().map(u32::from).filter(|&cp| cp != 0).collect();
    let mut out = vec![file_name(&cps)];

    let mut trimmed = cps.as_slice();
    while let [rest @ .., last] = trimmed {
        if !is_modifier(*last) || rest.is_empty() {
            break;
        }
        trimmed = rest;
    }
    if trimmed.len() != cps.len() {
        out.push(file_name(trimmed));
    }

    if cps.len() > 1 {
        let dropped = file_name(&cps[..cps.len() - 1]);
        if !out.contains(&dropped) {
            out.push(dropped);
        }
    }
    out
}
