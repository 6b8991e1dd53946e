use super::*;

fn one(json: &str) -> ComponentDef {
    parse_components(json).unwrap().remove(0).unwrap()
}

#[test]
fn defaults_fill_missing_fields() {
    let c = one(r#"[{"type": "extra"}]"#);
    assert_eq!(c.kind, ComponentKind::Extra);
    assert!(c.enabled);
    assert!(!c.use_cache);
    assert_eq!(c.align, "top-left");
    assert_eq!(c.scale, 1.0);
    assert_eq!(c.emotion_index, 1);
    assert_eq!(c.font_name, "font3");
    assert!(c.font_family.is_none());
    assert!(c.textcfg.is_empty());
}

#[test]
fn wrong_types_fall_back_to_defaults() {
    let c = one(r#"[{"type": "text", "enabled": "no", "scale": "2", "offset_x": 12.7,
                     "text_color": 5, "font_size": 30.2}]"#);
    assert!(c.enabled);
    assert_eq!(c.scale, 1.0);
    assert_eq!(c.offset_x, 12);
    assert_eq!(c.text_color, None);
    assert_eq!(c.font_size, Some(30));
}

#[test]
fn numeric_bools_are_accepted() {
    let c = one(r#"[{"type": "background", "enabled": 0, "use_fixed_background": 1}]"#);
    assert!(!c.enabled);
    assert!(c.use_fixed_background);
}

#[test]
fn static_classification() {
    let list = parse_components(
        r#"[{"type": "textbox"}, {"type": "extra"}, {"type": "namebox"}, {"type": "text"},
            {"type": "character"}, {"type": "character", "use_fixed_character": true},
            {"type": "background"}, {"type": "background", "use_fixed_background": true},
            {"type": "sparkle"}]"#,
    )
    .unwrap();
    let flags: Vec<bool> = list.iter().map(|c| c.as_ref().unwrap().is_static()).collect();
    assert_eq!(
        flags,
        vec![true, true, true, true, false, true, false, true, false]
    );
}

#[test]
fn name_runs_parse_with_defaults() {
    let c = one(r##"[{"type": "namebox", "overlay": "nb.png", "font_name": "f",
                     "textcfg": [{"text": "A", "font_color": "#ff0000"},
                                 {"text": "B", "font_size": 60, "font_color": [0, 0, 255]},
                                 7]}]"##);
    assert_eq!(c.font_name, "f");
    assert_eq!(c.textcfg.len(), 2);
    assert_eq!(c.textcfg[0].font_size, 92);
    assert_eq!(c.textcfg[0].color, Rgba8::rgb(255, 0, 0));
    assert_eq!(c.textcfg[1].font_size, 60);
    assert_eq!(c.textcfg[1].color, Rgba8::rgb(0, 0, 255));
}

#[test]
fn non_object_entries_are_none() {
    let list = parse_components(r#"[1, {"type": "extra"}, "x"]"#).unwrap();
    assert_eq!(list.len(), 3);
    assert!(list[0].is_none() && list[2].is_none());
    assert!(list[1].is_some());
}

#[test]
fn root_must_be_an_array() {
    assert!(matches!(
        parse_components(r#"{"type": "extra"}"#),
        Err(TachieError::Parse(_))
    ));
    assert!(matches!(parse_components("[{"), Err(TachieError::Parse(_))));
    assert!(parse_components("[]").unwrap().is_empty());
}
