use super::*;
use crate::config::OverlayConfig;
use crate::layout::geometry::plan_layout;
use crate::text::fonts::{FontFace, FontSet};

fn test_shaper() -> TextShaper {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/fonts");
    let fonts = FontSet::new(
        FontFace::from_path(&dir.join("DejaVuSans.ttf")).unwrap(),
        FontFace::from_path(&dir.join("DejaVuSans-Bold.ttf")).unwrap(),
    );
    TextShaper::new(&fonts).unwrap()
}

fn plan_for(cfg: &OverlayConfig, w: u32, h: u32, shaper: &mut TextShaper) -> LayoutPlan {
    let dims = FrameDimensions::from_native(w, h).unwrap();
    plan_layout(dims, cfg, shaper).unwrap()
}

#[test]
fn gradient_hits_every_stop() {
    for (t, a) in GRADIENT_STOPS {
        assert!((gradient_alpha_at(t) - a).abs() < 1e-6, "stop {t}");
    }
    assert!((gradient_alpha_at(0.1) - 0.3).abs() < 1e-6);
    assert!((gradient_alpha_at(0.4) - 0.725).abs() < 1e-6);
    assert_eq!(gradient_alpha_at(-3.0), 0.0);
    assert!((gradient_alpha_at(7.0) - 0.95).abs() < 1e-6);
    assert_eq!(gradient_alpha_at(f32::NAN), 0.0);
}

#[test]
fn gradient_is_monotonic() {
    let mut prev = 0.0;
    for i in 0..=100 {
        let a = gradient_alpha_at(i as f32 / 100.0);
        assert!(a >= prev);
        prev = a;
    }
}

#[test]
fn band_covers_banner_rows_only() {
    let mut shaper = test_shaper();
    let cfg = OverlayConfig::new("Shop 12, MG Road\nPune - 411001", "+91 98765 43210");
    let plan = plan_for(&cfg, 216, 384, &mut shaper);
    let band = OverlayLayer::render(&plan, &mut shaper).unwrap();

    assert_eq!(band.top(), plan.banner_first_row());
    assert_eq!(band.top() + band.height(), 384);
    assert_eq!(band.pixels().len(), 216 * band.height() as usize * 4);
}

#[test]
fn band_without_text_is_pure_gradient() {
    let mut shaper = test_shaper();
    let plan = plan_for(&OverlayConfig::new("", ""), 64, 128, &mut shaper);
    let band = OverlayLayer::render(&plan, &mut shaper).unwrap();

    let row_len = 64 * 4;
    let first = &band.pixels()[..row_len];
    let last = &band.pixels()[band.pixels().len() - row_len..];
    assert!(first.chunks_exact(4).all(|px| px == [0, 0, 0, first[3]]));
    assert!(first[3] < 16);
    assert!(last.chunks_exact(4).all(|px| px[..3] == [0, 0, 0] && px[3] >= 235));
}

#[test]
fn band_contains_white_text_over_dark_shadow() {
    let mut shaper = test_shaper();
    let cfg = OverlayConfig::new("MG Road", "98765");
    let plan = plan_for(&cfg, 270, 480, &mut shaper);
    let band = OverlayLayer::render(&plan, &mut shaper).unwrap();

    let bright = band
        .pixels()
        .chunks_exact(4)
        .filter(|px| px[3] == 255 && px[0] > 240 && px[1] > 240 && px[2] > 240)
        .count();
    assert!(bright > 20, "expected solid white glyph pixels, got {bright}");
}

#[test]
fn text_is_horizontally_centered() {
    let mut shaper = test_shaper();
    let cfg = OverlayConfig::new("", "88888");
    let plan = plan_for(&cfg, 200, 400, &mut shaper);
    let band = OverlayLayer::render(&plan, &mut shaper).unwrap();

    let w = 200usize;
    let (mut min_x, mut max_x) = (usize::MAX, 0usize);
    for (i, px) in band.pixels().chunks_exact(4).enumerate() {
        if px[0] > 128 {
            let x = i % w;
            min_x = min_x.min(x);
            max_x = max_x.max(x);
        }
    }
    assert!(min_x < max_x);
    let left = min_x as i32;
    let right = (w - 1 - max_x) as i32;
    assert!((left - right).abs() <= 4, "left {left} right {right}");
}

#[test]
fn composite_leaves_rows_above_band_untouched() {
    let mut shaper = test_shaper();
    let cfg = OverlayConfig::new("Pune", "1");
    let plan = plan_for(&cfg, 32, 64, &mut shaper);
    let band = OverlayLayer::render(&plan, &mut shaper).unwrap();

    let mut frame = [255u8, 255, 255, 255].repeat(32 * 64);
    band.composite_onto(&mut frame, plan.dims).unwrap();

    let split = band.top() as usize * 32 * 4;
    assert!(frame[..split].iter().all(|&b| b == 255));
    let last_row = &frame[frame.len() - 32 * 4..];
    assert!(last_row.chunks_exact(4).any(|px| px[0] < 64));
    assert!(frame.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn composite_rejects_wrong_frame_size() {
    let mut shaper = test_shaper();
    let plan = plan_for(&OverlayConfig::new("a", "b"), 32, 64, &mut shaper);
    let band = OverlayLayer::render(&plan, &mut shaper).unwrap();
    let mut frame = vec![0u8; 16 * 16 * 4];
    let other = FrameDimensions::from_native(16, 16).unwrap();
    assert!(band.composite_onto(&mut frame, other).is_err());
}
