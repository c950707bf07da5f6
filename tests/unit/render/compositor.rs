use super::*;
use crate::text::fonts::FontFace;

fn test_fonts() -> FontSet {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/fonts");
    FontSet::new(
        FontFace::from_path(&dir.join("DejaVuSans.ttf")).unwrap(),
        FontFace::from_path(&dir.join("DejaVuSans-Bold.ttf")).unwrap(),
    )
}

fn solid(w: u32, h: u32, rgba: [u8; 4], pts_sec: f64) -> SourceFrame {
    SourceFrame {
        pts_sec,
        width: w,
        height: h,
        rgba: rgba.repeat((w * h) as usize),
    }
}

#[test]
fn frame_above_banner_is_source_pixels() {
    let dims = FrameDimensions::from_native(90, 160).unwrap();
    let cfg = OverlayConfig::new("Shop 12, MG Road\nPune - 411001", "+91 98765 43210");
    let (plan, mut comp) = FrameCompositor::prepare(dims, &cfg, &test_fonts()).unwrap();

    comp.composite(&solid(90, 160, [200, 30, 60, 255], 0.0)).unwrap();
    let data = comp.surface().data();
    let above = plan.banner_first_row() as usize * 90 * 4;
    assert!(above > 0);
    assert!(
        data[..above]
            .chunks_exact(4)
            .all(|px| px == [200, 30, 60, 255])
    );
    assert_eq!(comp.frames_composited(), 1);
}

#[test]
fn banner_darkens_bottom_rows() {
    let dims = FrameDimensions::from_native(64, 128).unwrap();
    let (_, mut comp) =
        FrameCompositor::prepare(dims, &OverlayConfig::new("", ""), &test_fonts()).unwrap();

    comp.composite(&solid(64, 128, [255, 255, 255, 255], 0.0)).unwrap();
    let data = comp.surface().data();
    let last_row = &data[data.len() - 64 * 4..];
    assert!(last_row.chunks_exact(4).all(|px| px[0] < 20 && px[3] == 255));
}

#[test]
fn overlay_is_identical_across_frames() {
    let dims = FrameDimensions::from_native(64, 128).unwrap();
    let cfg = OverlayConfig::new("MG Road", "123");
    let (_, mut comp) = FrameCompositor::prepare(dims, &cfg, &test_fonts()).unwrap();

    comp.composite(&solid(64, 128, [10, 20, 30, 255], 0.0)).unwrap();
    let first = comp.surface().data().to_vec();
    comp.composite(&solid(64, 128, [90, 90, 90, 255], 0.033)).unwrap();
    comp.composite(&solid(64, 128, [10, 20, 30, 255], 0.066)).unwrap();
    assert_eq!(comp.surface().data(), first.as_slice());
    assert_eq!(comp.frames_composited(), 3);
}

#[test]
fn odd_source_is_scaled_into_even_surface() {
    let dims = FrameDimensions::from_native(33, 65).unwrap();
    assert_eq!((dims.width, dims.height), (32, 64));
    let (_, mut comp) =
        FrameCompositor::prepare(dims, &OverlayConfig::new("a", "b"), &test_fonts()).unwrap();
    comp.composite(&solid(33, 65, [0, 0, 255, 255], 0.0)).unwrap();
    assert_eq!(comp.surface().data().len(), 32 * 64 * 4);
    assert_eq!(&comp.surface().data()[..4], &[0, 0, 255, 255]);
}
