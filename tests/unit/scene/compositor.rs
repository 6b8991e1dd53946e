use std::io::Cursor;
use std::path::{Path, PathBuf};

use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "tachie_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn write_png(path: &Path, w: u32, h: u32, rgba: [u8; 4]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, &buf).unwrap();
}

fn assets(name: &str) -> AssetResolver {
    let root = temp_dir(name);
    write_png(&root.join("background/c1.png"), 40, 30, [10, 20, 30, 255]);
    write_png(&root.join("background/sky.png"), 20, 20, [0, 0, 200, 255]);
    write_png(&root.join("shader/frame.png"), 10, 10, [255, 0, 0, 255]);
    write_png(&root.join("chara/amy/amy (2).png"), 8, 8, [0, 255, 0, 255]);
    write_png(&root.join("shader/glass_a.png"), 40, 30, [200, 10, 90, 100]);
    write_png(&root.join("shader/glass_b.png"), 40, 30, [30, 180, 60, 77]);
    AssetResolver::new(root)
}

fn render(
    resolver: &AssetResolver,
    layers: &mut StaticLayerCache,
    json: &str,
    character: &str,
) -> TachieResult<Surface> {
    let style = StyleConfig::default();
    let mut fonts = FontCache::new();
    let mut scaler = RendererScaler::new();
    let mut c = Compositor {
        resolver,
        style: &style,
        fonts: &mut fonts,
        scaler: &mut scaler,
    };
    c.compose(
        &FrameRequest {
            width: 40,
            height: 30,
            components_json: json,
            character_name: character,
            emotion_index: 2,
            background_index: 1,
        },
        layers,
    )
}

#[test]
fn empty_list_is_transparent() {
    let r = assets("comp_empty");
    let mut layers = StaticLayerCache::new();
    let out = render(&r, &mut layers, "[]", "").unwrap();
    assert!(out.is_transparent());
    assert!(layers.is_empty());
}

#[test]
fn zero_canvas_is_an_error() {
    let r = assets("comp_zero");
    let style = StyleConfig::default();
    let mut fonts = FontCache::new();
    let mut scaler = RendererScaler::new();
    let mut c = Compositor {
        resolver: &r,
        style: &style,
        fonts: &mut fonts,
        scaler: &mut scaler,
    };
    let req = FrameRequest {
        width: 0,
        height: 10,
        components_json: "[]",
        character_name: "",
        emotion_index: 1,
        background_index: 1,
    };
    assert!(c.compose(&req, &mut StaticLayerCache::new()).is_err());
}

#[test]
fn background_index_and_overlay_alignment() {
    let r = assets("comp_bg");
    let mut layers = StaticLayerCache::new();
    let out = render(
        &r,
        &mut layers,
        r#"[{"type": "background"},
            {"type": "extra", "overlay": "frame.png", "align": "bottom-right", "offset_x": -1}]"#,
        "",
    )
    .unwrap();
    assert_eq!(out.pixel(0, 0), [10, 20, 30, 255]);
    assert_eq!(out.pixel(38, 29), [255, 0, 0, 255]);
    assert_eq!(out.pixel(39, 29), [10, 20, 30, 255]);
    assert_eq!(out.pixel(28, 19), [10, 20, 30, 255]);
}

#[test]
fn character_uses_call_selection_and_scale() {
    let r = assets("comp_chara");
    let mut layers = StaticLayerCache::new();
    let out = render(
        &r,
        &mut layers,
        r#"[{"type": "character", "scale": 2, "scale1": 0.5, "offset_x": 1, "offset_x1": 2}]"#,
        "amy",
    )
    .unwrap();
    assert_eq!(out.pixel(3, 0), [0, 255, 0, 255]);
    assert_eq!(out.pixel(10, 7), [0, 255, 0, 255]);
    assert_eq!(out.pixel(2, 0)[3], 0);
    assert_eq!(out.pixel(11, 0)[3], 0);
}

#[test]
fn failed_components_are_skipped() {
    let r = assets("comp_skip");
    let mut layers = StaticLayerCache::new();
    let out = render(
        &r,
        &mut layers,
        r#"[{"type": "character"}, {"type": "extra", "overlay": "missing.png"},
            7, {"type": "background", "overlay": "sky.webp", "enabled": false},
            {"type": "namebox"}, {"type": "extra", "overlay": "frame"}]"#,
        "",
    )
    .unwrap();
    assert_eq!(out.pixel(0, 0), [255, 0, 0, 255]);
    assert_eq!(out.pixel(20, 20)[3], 0);
}

#[test]
fn static_runs_become_segments() {
    let r = assets("comp_segments");
    let mut layers = StaticLayerCache::new();
    render(
        &r,
        &mut layers,
        r#"[{"type": "background", "overlay": "sky", "use_fixed_background": true},
            {"type": "extra", "overlay": "frame"},
            {"type": "character"},
            {"type": "extra", "overlay": "frame", "align": "bottom-right"}]"#,
        "amy",
    )
    .unwrap();
    assert_eq!(layers.len(), 2);

    let first = layers.next_segment().unwrap().clone();
    assert_eq!(first.pixel(0, 0), [255, 0, 0, 255]);
    assert_eq!(first.pixel(15, 15), [0, 0, 200, 255]);
    let second = layers.next_segment().unwrap();
    assert_eq!(second.pixel(39, 29), [255, 0, 0, 255]);
    assert_eq!(second.pixel(0, 0)[3], 0);
}

#[test]
fn markers_replay_cached_segments() {
    let r = assets("comp_replay");
    let mut layers = StaticLayerCache::new();
    let full = render(
        &r,
        &mut layers,
        r#"[{"type": "background", "overlay": "sky", "use_fixed_background": true},
            {"type": "extra", "overlay": "frame"},
            {"type": "character"}]"#,
        "amy",
    )
    .unwrap();
    assert_eq!(layers.len(), 1);

    let replayed = render(
        &r,
        &mut layers,
        r#"[{"use_cache": true}, {"type": "character"}]"#,
        "amy",
    )
    .unwrap();
    assert_eq!(full, replayed);
    assert_eq!(layers.len(), 1);
}

#[test]
fn translucent_static_layers_replay_exactly() {
    let r = assets("comp_glass");
    let mut layers = StaticLayerCache::new();
    let full = render(
        &r,
        &mut layers,
        r#"[{"type": "background"},
            {"type": "extra", "overlay": "glass_a"},
            {"type": "extra", "overlay": "glass_b"}]"#,
        "",
    )
    .unwrap();
    assert_eq!(layers.len(), 1);
    assert!(full.pixel(5, 5)[0] > 10, "{:?}", full.pixel(5, 5));

    let replayed = render(
        &r,
        &mut layers,
        r#"[{"type": "background"}, {"use_cache": true}]"#,
        "",
    )
    .unwrap();
    assert_eq!(full, replayed);
}

#[test]
fn extra_markers_draw_nothing() {
    let r = assets("comp_exhaust");
    let mut layers = StaticLayerCache::new();
    render(&r, &mut layers, r#"[{"type": "extra", "overlay": "frame"}]"#, "").unwrap();
    let out = render(
        &r,
        &mut layers,
        r#"[{"use_cache": true}, {"use_cache": true}]"#,
        "",
    )
    .unwrap();
    assert_eq!(out.pixel(0, 0), [255, 0, 0, 255]);
    assert_eq!(out.pixel(20, 20)[3], 0);
}

#[test]
fn malformed_json_aborts() {
    let r = assets("comp_badjson");
    let mut layers = StaticLayerCache::new();
    assert!(matches!(
        render(&r, &mut layers, "{}", ""),
        Err(TachieError::Parse(_))
    ));
}
