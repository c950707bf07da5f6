use super::*;

#[test]
fn mul_div255_rounds_to_nearest() {
    assert_eq!(mul_div255_u8(255, 255), 255);
    assert_eq!(mul_div255_u8(255, 0), 0);
    assert_eq!(mul_div255_u8(128, 255), 128);
    assert_eq!(mul_div255_u8(255, 128), 128);
}

#[test]
fn premultiply_scales_color_by_alpha() {
    let mut px = vec![200u8, 100, 50, 128, 10, 20, 30, 0, 1, 2, 3, 255];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[0..4], &[100, 50, 25, 128]);
    assert_eq!(&px[4..8], &[0, 0, 0, 0]);
    assert_eq!(&px[8..12], &[1, 2, 3, 255]);
}

#[test]
fn over_with_transparent_source_keeps_destination() {
    let mut dst = vec![10u8, 20, 30, 255];
    assert!(premul_over_in_place(&mut dst, &[0, 0, 0, 0]));
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn over_with_opaque_source_replaces_destination() {
    let mut dst = vec![10u8, 20, 30, 255];
    assert!(premul_over_in_place(&mut dst, &[200, 100, 0, 255]));
    assert_eq!(dst, vec![200, 100, 0, 255]);
}

#[test]
fn half_black_over_white_is_mid_gray() {
    let mut dst = vec![255u8, 255, 255, 255];
    assert!(premul_over_in_place(&mut dst, &[0, 0, 0, 128]));
    assert_eq!(dst, vec![127, 127, 127, 255]);
}

#[test]
fn over_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(!premul_over_in_place(&mut dst, &[0u8; 4]));
}

#[test]
fn flatten_alpha_0_returns_bg() {
    let mut dst = vec![0u8; 4];
    assert!(flatten_premul_over_bg(&mut dst, &[0, 0, 0, 0], [10, 20, 30]));
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    assert!(flatten_premul_over_bg(&mut dst, &src, [10, 20, 30]));
    assert_eq!(dst, src);
}
