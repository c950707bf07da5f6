use super::*;
use crate::config::OverlayConfig;
use crate::encode::recorder::{EncodedArtifact, FrameDelivery, Recorder};
use crate::foundation::core::{Fps, FrameDimensions};
use crate::media::source::{InMemorySource, SourceFrame, SourceInfo};
use crate::text::fonts::{FontFace, FontSet};
use std::sync::{Arc, Mutex};

fn test_fonts() -> FontSet {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/fonts");
    FontSet::new(
        FontFace::from_path(&dir.join("DejaVuSans.ttf")).unwrap(),
        FontFace::from_path(&dir.join("DejaVuSans-Bold.ttf")).unwrap(),
    )
}

struct CountingRecorder(Arc<Mutex<Vec<u8>>>);

impl Recorder for CountingRecorder {
    fn media_type(&self) -> &str {
        "video/test"
    }

    fn push_frame(&mut self, rgba8_premul: &[u8]) -> BrandResult<FrameDelivery> {
        self.0.lock().unwrap().push(rgba8_premul[0]);
        Ok(FrameDelivery::Accepted)
    }

    fn stop(self: Box<Self>) -> BrandResult<EncodedArtifact> {
        Ok(EncodedArtifact {
            bytes: self.0.lock().unwrap().clone(),
            media_type: "video/test".to_string(),
        })
    }

    fn abort(self: Box<Self>) {}
}

fn frames(n: u32, fps: f64, w: u32, h: u32) -> Vec<SourceFrame> {
    (0..n)
        .map(|i| SourceFrame {
            pts_sec: f64::from(i) / fps,
            width: w,
            height: h,
            rgba: [(i * 8) as u8, 0, 0, 255].repeat((w * h) as usize),
        })
        .collect()
}

struct Rig {
    compositor: FrameCompositor,
    capture: CaptureStream,
    pushed: Arc<Mutex<Vec<u8>>>,
}

fn rig(w: u32, h: u32) -> Rig {
    let dims = FrameDimensions::from_native(w, h).unwrap();
    let (_, compositor) =
        FrameCompositor::prepare(dims, &OverlayConfig::new("", ""), &test_fonts()).unwrap();
    let pushed = Arc::new(Mutex::new(Vec::new()));
    let capture = CaptureStream::new(
        Box::new(CountingRecorder(Arc::clone(&pushed))),
        Fps::new(30, 1).unwrap(),
    );
    Rig {
        compositor,
        capture,
        pushed,
    }
}

#[test]
fn composites_every_frame_and_reports_progress() {
    let mut r = rig(16, 32);
    let mut src = InMemorySource::new(SourceInfo::new(16, 32, Some(1.0)), frames(30, 30.0, 16, 32));
    src.play().unwrap();
    let mut progress = ProgressTracker::new(src.info().known_duration());
    let mut samples = Vec::new();
    let out = drive_playback(
        &mut src,
        &mut r.compositor,
        &mut r.capture,
        &mut progress,
        &mut |p| samples.push(p),
    )
    .unwrap();

    assert_eq!(out.frames, 30);
    assert!((out.end_time - 1.0).abs() < 1e-9);
    assert_eq!(r.compositor.frames_composited(), 30);
    assert_eq!(samples.len(), 30);
    assert_eq!(samples[0], 0);
    assert!(samples.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*samples.last().unwrap(), 97);
    // Ticks before the last frame are emitted; the rest wait for the end-of-media flush.
    assert_eq!(r.pushed.lock().unwrap().len(), 29);
}

#[test]
fn capture_samples_previous_composite() {
    let mut r = rig(16, 32);
    let mut src = InMemorySource::new(SourceInfo::new(16, 32, None), frames(3, 10.0, 16, 32));
    src.play().unwrap();
    let mut progress = ProgressTracker::new(None);
    let out = drive_playback(
        &mut src,
        &mut r.compositor,
        &mut r.capture,
        &mut progress,
        &mut |p| assert_eq!(p, 0),
    )
    .unwrap();
    assert!((out.end_time - (0.2 + 1.0 / 30.0)).abs() < 1e-9);
    let pushed = r.pushed.lock().unwrap().clone();
    // First pixel sits above the banner so it carries the source red channel.
    assert_eq!(pushed, vec![0, 0, 0, 8, 8, 8]);
}

#[test]
fn media_error_carries_code_and_message() {
    let mut r = rig(16, 32);
    let mut src = InMemorySource::new(SourceInfo::new(16, 32, Some(1.0)), frames(2, 30.0, 16, 32))
        .failing_after_frames(Some(3), "decode failed");
    src.play().unwrap();
    let mut progress = ProgressTracker::new(Some(1.0));
    let err = drive_playback(
        &mut src,
        &mut r.compositor,
        &mut r.capture,
        &mut progress,
        &mut |_| {},
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "media error: Code 3: decode failed");
    assert_eq!(r.compositor.frames_composited(), 2);
}

#[test]
fn empty_source_is_unsupported() {
    let mut r = rig(16, 32);
    let mut src = InMemorySource::new(SourceInfo::new(16, 32, Some(1.0)), Vec::new());
    src.play().unwrap();
    let mut progress = ProgressTracker::new(Some(1.0));
    let err = drive_playback(
        &mut src,
        &mut r.compositor,
        &mut r.capture,
        &mut progress,
        &mut |_| {},
    )
    .unwrap_err();
    assert!(matches!(err, BrandError::UnsupportedInput(_)));
}

#[test]
fn backwards_timestamps_are_clamped() {
    let mut r = rig(16, 32);
    let mut fs = frames(3, 10.0, 16, 32);
    fs[2].pts_sec = 0.05;
    let mut src = InMemorySource::new(SourceInfo::new(16, 32, Some(0.3)), fs);
    src.play().unwrap();
    let mut progress = ProgressTracker::new(Some(0.3));
    let mut samples = Vec::new();
    drive_playback(
        &mut src,
        &mut r.compositor,
        &mut r.capture,
        &mut progress,
        &mut |p| samples.push(p),
    )
    .unwrap();
    assert_eq!(samples, vec![0, 33, 33]);
}

#[test]
fn overstated_duration_does_not_pad_output() {
    let mut r = rig(16, 32);
    let mut src = InMemorySource::new(SourceInfo::new(16, 32, Some(60.0)), frames(3, 30.0, 16, 32));
    src.play().unwrap();
    let mut progress = ProgressTracker::new(src.info().known_duration());
    let out = drive_playback(
        &mut src,
        &mut r.compositor,
        &mut r.capture,
        &mut progress,
        &mut |_| {},
    )
    .unwrap();
    assert!((out.end_time - 0.1).abs() < 1e-9);
    let (_, stats) = r.capture.finish(out.end_time, r.compositor.surface().data()).unwrap();
    assert_eq!(stats.frames_captured, 3);
}

#[test]
fn understated_hold_uses_duration() {
    let mut r = rig(16, 32);
    let mut info = SourceInfo::new(16, 32, Some(0.25));
    info.fps = Some(Fps::new(10, 1).unwrap());
    let mut src = InMemorySource::new(info, frames(3, 10.0, 16, 32));
    src.play().unwrap();
    let mut progress = ProgressTracker::new(Some(0.25));
    let out = drive_playback(
        &mut src,
        &mut r.compositor,
        &mut r.capture,
        &mut progress,
        &mut |_| {},
    )
    .unwrap();
    assert!((out.end_time - 0.25).abs() < 1e-9);
}
