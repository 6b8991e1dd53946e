use std::io::Cursor;

use super::*;

fn temp_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "tachie_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn write_png(path: &std::path::Path, w: u32, h: u32, rgba: [u8; 4]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, &buf).unwrap();
}

#[test]
fn asset_names_reject_traversal() {
    assert!(check_asset_name("a/b").is_ok());
    assert!(check_asset_name("").is_err());
    assert!(check_asset_name("../x").is_err());
    assert!(check_asset_name("a\\..\\x").is_err());
    assert!(check_asset_name("/abs").is_err());
}

#[test]
fn strip_extension_only_touches_file_part() {
    assert_eq!(strip_extension("box.png"), "box");
    assert_eq!(strip_extension("box"), "box");
    assert_eq!(strip_extension("dir.v2/box"), "dir.v2/box");
    assert_eq!(strip_extension("a.b.webp"), "a.b");
}

#[test]
fn character_path_uses_emotion_suffix() {
    let tmp = temp_dir("store_character");
    write_png(&tmp.join("chara/alice/alice (2).png"), 2, 3, [1, 2, 3, 255]);

    let resolver = AssetResolver::new(&tmp);
    let s = resolver.load_character("alice", 2).unwrap();
    assert_eq!((s.width(), s.height()), (2, 3));
    assert!(resolver.load_character("alice", 3).is_err());

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn background_falls_back_to_shader_dir() {
    let tmp = temp_dir("store_background");
    write_png(&tmp.join("shader/c3.png"), 1, 1, [0, 0, 0, 255]);

    let resolver = AssetResolver::new(&tmp);
    assert!(resolver.background_path("c3").unwrap().ends_with("shader/c3.png"));

    write_png(&tmp.join("background/c3.png"), 1, 1, [0, 0, 0, 255]);
    assert!(
        resolver
            .background_path("c3")
            .unwrap()
            .ends_with("background/c3.png")
    );

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn extension_priority_prefers_earlier_entries() {
    let tmp = temp_dir("store_ext_priority");
    write_png(&tmp.join("shader/frame.png"), 1, 1, [0, 0, 0, 255]);
    std::fs::write(tmp.join("shader/frame.bmp"), b"junk").unwrap();

    let resolver = AssetResolver::new(&tmp);
    assert!(
        resolver
            .overlay_path("frame.bmp")
            .unwrap()
            .ends_with("shader/frame.png")
    );

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn emoji_falls_back_to_base_file() {
    let tmp = temp_dir("store_emoji");
    write_png(&tmp.join("emoji/emoji_u1f596.png"), 4, 4, [255, 255, 0, 255]);

    let resolver = AssetResolver::new(&tmp);
    let s = resolver.load_emoji("\u{1F596}\u{1F3FD}").unwrap();
    assert_eq!(s.width(), 4);
    assert!(resolver.load_emoji("\u{1F600}").is_err());

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn missing_font_is_a_font_error() {
    let tmp = temp_dir("store_font");
    std::fs::create_dir_all(&tmp).unwrap();
    let resolver = AssetResolver::new(&tmp);
    assert!(matches!(
        resolver.font_path("font3"),
        Err(TachieError::Font(_))
    ));
    std::fs::remove_dir_all(&tmp).ok();
}
