use super::*;
use crate::layout::geometry::PasteMode;
use crate::scene::config::ImageCompression;

fn painter_parts() -> (AssetResolver, FontCache, RendererScaler) {
    let root = std::env::temp_dir().join(format!("tachie_overlay_{}", std::process::id()));
    (
        AssetResolver::new(root),
        FontCache::new(),
        RendererScaler::new(),
    )
}

fn small_style(mode: PasteMode) -> StyleConfig {
    let mut style = StyleConfig {
        textbox_x: 0,
        textbox_y: 0,
        textbox_width: 20,
        textbox_height: 10,
        ..StyleConfig::default()
    };
    style.paste_image_settings.enabled = mode;
    style
}

/// A 4x2 opaque red image stored with padded rows.
fn padded_red() -> Vec<u8> {
    let pitch = 20;
    let mut data = vec![0u8; pitch * 2];
    for y in 0..2 {
        for x in 0..4 {
            let i = y * pitch + x * 4;
            data[i..i + 4].copy_from_slice(&[255, 0, 0, 255]);
        }
    }
    data
}

#[test]
fn emoji_descriptor_parses_lists() {
    let d = EmojiDescriptor::parse(Some(
        r#"{"emojis":["😀","👍"],"positions":[[0,4],[5,9]]}"#,
    ));
    assert_eq!(d.emojis, vec!["😀".to_owned(), "👍".to_owned()]);
    assert_eq!(d.positions, vec![(0, 4), (5, 9)]);
}

#[test]
fn emoji_descriptor_is_lenient() {
    assert_eq!(EmojiDescriptor::parse(None), EmojiDescriptor::default());
    assert_eq!(EmojiDescriptor::parse(Some("  ")), EmojiDescriptor::default());
    assert_eq!(
        EmojiDescriptor::parse(Some("{not json")),
        EmojiDescriptor::default()
    );

    let d = EmojiDescriptor::parse(Some(
        r#"{"emojis":["a",3,null],"positions":[[1],"x",[2,6],[-1,2]]}"#,
    ));
    assert_eq!(d.emojis, vec!["a".to_owned()]);
    assert_eq!(d.positions, vec![(2, 6)]);
}

#[test]
fn text_without_font_leaves_preview_untouched() {
    let (resolver, mut fonts, mut scaler) = painter_parts();
    let style = small_style(PasteMode::Mixed);
    let gui = GuiSettings::default();
    let mut preview = Surface::new(40, 30).unwrap();
    preview.fill_rect(crate::foundation::core::PxRect::new(0, 0, 40, 30), [9, 9, 9, 255]);

    let out = OverlayPainter {
        resolver: &resolver,
        style: &style,
        gui: &gui,
        fonts: &mut fonts,
        scaler: &mut scaler,
    }
    .draw(
        &preview,
        &OverlayRequest {
            text: "hello",
            ..OverlayRequest::default()
        },
    )
    .unwrap();
    assert_eq!(out, preview);
}

#[test]
fn image_alone_fills_text_box_width() {
    let (resolver, mut fonts, mut scaler) = painter_parts();
    let style = small_style(PasteMode::Mixed);
    let gui = GuiSettings::default();
    let preview = Surface::new(40, 30).unwrap();
    let data = padded_red();

    let out = OverlayPainter {
        resolver: &resolver,
        style: &style,
        gui: &gui,
        fonts: &mut fonts,
        scaler: &mut scaler,
    }
    .draw(
        &preview,
        &OverlayRequest {
            image: Some(ImageInput {
                data: &data,
                width: 4,
                height: 2,
                pitch: 20,
            }),
            ..OverlayRequest::default()
        },
    )
    .unwrap();

    assert_eq!((out.width(), out.height()), (40, 30));
    let px = out.pixel(10, 5);
    assert!(px[0] > 200 && px[3] > 200, "{px:?}");
    assert_eq!(out.pixel(30, 20)[3], 0);
}

#[test]
fn split_mode_puts_image_on_the_right() {
    let (resolver, mut fonts, mut scaler) = painter_parts();
    let style = small_style(PasteMode::Off);
    let gui = GuiSettings::default();
    let preview = Surface::new(40, 30).unwrap();
    let data = padded_red();

    let out = OverlayPainter {
        resolver: &resolver,
        style: &style,
        gui: &gui,
        fonts: &mut fonts,
        scaler: &mut scaler,
    }
    .draw(
        &preview,
        &OverlayRequest {
            text: "hi",
            emoji_json: None,
            image: Some(ImageInput {
                data: &data,
                width: 4,
                height: 2,
                pitch: 20,
            }),
        },
    )
    .unwrap();

    // Short text: the image takes 70% of the 20px box, starting at x = 6.
    let px = out.pixel(13, 4);
    assert!(px[0] > 200 && px[3] > 200, "{px:?}");
    assert_eq!(out.pixel(2, 4)[3], 0);
}

#[test]
fn zero_sized_image_is_ignored() {
    let (resolver, mut fonts, mut scaler) = painter_parts();
    let style = small_style(PasteMode::Mixed);
    let gui = GuiSettings::default();
    let preview = Surface::new(8, 8).unwrap();

    let out = OverlayPainter {
        resolver: &resolver,
        style: &style,
        gui: &gui,
        fonts: &mut fonts,
        scaler: &mut scaler,
    }
    .draw(
        &preview,
        &OverlayRequest {
            image: Some(ImageInput {
                data: &[],
                width: 0,
                height: 3,
                pitch: 0,
            }),
            ..OverlayRequest::default()
        },
    )
    .unwrap();
    assert!(out.is_transparent());
}

#[test]
fn compression_shrinks_output() {
    let (resolver, mut fonts, mut scaler) = painter_parts();
    let style = small_style(PasteMode::Mixed);
    let gui = GuiSettings {
        image_compression: ImageCompression {
            pixel_reduction_enabled: true,
            pixel_reduction_ratio: 50,
        },
    };
    let preview = Surface::new(40, 30).unwrap();

    let out = OverlayPainter {
        resolver: &resolver,
        style: &style,
        gui: &gui,
        fonts: &mut fonts,
        scaler: &mut scaler,
    }
    .draw(&preview, &OverlayRequest::default())
    .unwrap();
    assert_eq!((out.width(), out.height()), (20, 15));
}

#[test]
fn full_compression_keeps_size() {
    let (resolver, mut fonts, mut scaler) = painter_parts();
    let style = small_style(PasteMode::Mixed);
    let gui = GuiSettings {
        image_compression: ImageCompression {
            pixel_reduction_enabled: true,
            pixel_reduction_ratio: 100,
        },
    };
    let preview = Surface::new(40, 30).unwrap();

    let out = OverlayPainter {
        resolver: &resolver,
        style: &style,
        gui: &gui,
        fonts: &mut fonts,
        scaler: &mut scaler,
    }
    .draw(&preview, &OverlayRequest::default())
    .unwrap();
    assert_eq!((out.width(), out.height()), (40, 30));
}
