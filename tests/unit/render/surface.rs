use super::*;

fn dims(w: u32, h: u32) -> FrameDimensions {
    FrameDimensions::from_native(w, h).unwrap()
}

fn solid_frame(w: u32, h: u32, rgba: [u8; 4]) -> SourceFrame {
    SourceFrame {
        pts_sec: 0.0,
        width: w,
        height: h,
        rgba: rgba.repeat((w * h) as usize),
    }
}

#[test]
fn new_surface_is_transparent() {
    let s = RasterSurface::new(dims(4, 2)).unwrap();
    assert_eq!(s.data().len(), 4 * 2 * 4);
    assert!(s.data().iter().all(|&b| b == 0));
}

#[test]
fn same_size_blit_copies_and_premultiplies() {
    let mut s = RasterSurface::new(dims(2, 2)).unwrap();
    s.blit_scaled(&solid_frame(2, 2, [200, 100, 50, 128])).unwrap();
    for px in s.data().chunks_exact(4) {
        assert_eq!(px, &[100, 50, 25, 128]);
    }
}

#[test]
fn odd_sized_frame_is_scaled_to_even_surface() {
    let mut s = RasterSurface::new(dims(4, 4)).unwrap();
    s.blit_scaled(&solid_frame(5, 5, [40, 80, 120, 255])).unwrap();
    for px in s.data().chunks_exact(4) {
        assert_eq!(px[3], 255);
        assert!((i32::from(px[0]) - 40).abs() <= 2);
        assert!((i32::from(px[1]) - 80).abs() <= 2);
        assert!((i32::from(px[2]) - 120).abs() <= 2);
    }
}

#[test]
fn downscaled_blit_covers_surface() {
    let mut s = RasterSurface::new(dims(8, 6)).unwrap();
    s.blit_scaled(&solid_frame(32, 18, [255, 255, 255, 255])).unwrap();
    assert!(s.data().chunks_exact(4).all(|px| px[3] >= 250));
}

#[test]
fn blit_rejects_short_frame() {
    let mut s = RasterSurface::new(dims(2, 2)).unwrap();
    let mut f = solid_frame(2, 2, [0, 0, 0, 255]);
    f.rgba.pop();
    assert!(s.blit_scaled(&f).is_err());
}

#[test]
fn clear_resets_pixels() {
    let mut s = RasterSurface::new(dims(2, 2)).unwrap();
    s.blit_scaled(&solid_frame(2, 2, [9, 9, 9, 255])).unwrap();
    s.clear();
    assert!(s.data().iter().all(|&b| b == 0));
}
