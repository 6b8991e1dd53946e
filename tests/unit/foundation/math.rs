use super::*;

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}

#[test]
fn premultiply_then_unpremultiply_keeps_opaque_and_clears_transparent() {
    let mut px = vec![10u8, 20, 30, 255, 200, 100, 50, 0];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[..4], &[10, 20, 30, 255]);
    assert_eq!(&px[4..], &[0, 0, 0, 0]);
    unpremultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[..4], &[10, 20, 30, 255]);
}

#[test]
fn unpremultiply_half_alpha_is_close_to_source() {
    let mut px = vec![200u8, 100, 50, 128];
    premultiply_rgba8_in_place(&mut px);
    unpremultiply_rgba8_in_place(&mut px);
    assert!((i32::from(px[0]) - 200).abs() <= 2);
    assert!((i32::from(px[1]) - 100).abs() <= 2);
    assert!((i32::from(px[2]) - 50).abs() <= 2);
    assert_eq!(px[3], 128);
}

#[test]
fn over_fast_paths() {
    let dst = [1, 2, 3, 255];
    assert_eq!(over_straight_px(dst, [9, 9, 9, 0]), dst);
    assert_eq!(over_straight_px(dst, [9, 8, 7, 255]), [9, 8, 7, 255]);
    assert_eq!(over_straight_px([0, 0, 0, 0], [9, 8, 7, 64]), [9, 8, 7, 64]);
}

#[test]
fn over_half_alpha_on_opaque_blends_colors() {
    let out = over_straight_px([0, 0, 0, 255], [255, 255, 255, 128]);
    assert_eq!(out[3], 255);
    assert!((i32::from(out[0]) - 128).abs() <= 1);
}
