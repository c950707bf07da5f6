use super::*;
use crate::audio::router::{AudioFeed, AudioTap};
use crate::encode::capability::StaticCapabilities;
use crate::encode::recorder::{FrameDelivery, Recorder};
use crate::media::source::{InMemorySource, SourceFrame, SourceInfo};
use crate::text::fonts::FontFace;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn test_fonts() -> FontSet {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/fonts");
    FontSet::new(
        FontFace::from_path(&dir.join("DejaVuSans.ttf")).unwrap(),
        FontFace::from_path(&dir.join("DejaVuSans-Bold.ttf")).unwrap(),
    )
}

#[derive(Default)]
struct Counters {
    opened: AtomicUsize,
    stopped: AtomicUsize,
    aborted: AtomicUsize,
    taps_closed: AtomicUsize,
}

struct FakeRecorder(Arc<Counters>);

impl Recorder for FakeRecorder {
    fn media_type(&self) -> &str {
        "video/fake"
    }

    fn push_frame(&mut self, _rgba8_premul: &[u8]) -> BrandResult<FrameDelivery> {
        Ok(FrameDelivery::Accepted)
    }

    fn stop(self: Box<Self>) -> BrandResult<EncodedArtifact> {
        self.0.stopped.fetch_add(1, Ordering::SeqCst);
        Ok(EncodedArtifact {
            bytes: vec![1, 2, 3],
            media_type: "video/fake".to_string(),
        })
    }

    fn abort(self: Box<Self>) {
        self.0.aborted.fetch_add(1, Ordering::SeqCst);
    }
}

struct FakeBackend(Arc<Counters>);

impl RecorderBackend for FakeBackend {
    fn open(&self, _params: &RecorderParams) -> BrandResult<Box<dyn Recorder>> {
        self.0.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeRecorder(Arc::clone(&self.0))))
    }
}

struct FakeTap(AudioFeed, Arc<Counters>);

impl AudioTap for FakeTap {
    fn feed(&self) -> &AudioFeed {
        &self.0
    }

    fn close(&mut self) -> BrandResult<()> {
        self.1.taps_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeRouter(Arc<Counters>);

impl AudioRouter for FakeRouter {
    fn route(&self, _source: &SourceInfo) -> BrandResult<Box<dyn AudioTap>> {
        let feed = AudioFeed {
            path: PathBuf::from("/nonexistent/audio.f32le"),
            sample_rate: 48_000,
            channels: 2,
        };
        Ok(Box::new(FakeTap(feed, Arc::clone(&self.0))))
    }
}

fn source(n: u32, with_audio: bool) -> InMemorySource {
    let mut info = SourceInfo::new(32, 64, Some(f64::from(n) / 30.0));
    info.has_audio = with_audio;
    let frames = (0..n)
        .map(|i| SourceFrame {
            pts_sec: f64::from(i) / 30.0,
            width: 32,
            height: 64,
            rgba: [40, 80, 120, 255].repeat(32 * 64),
        })
        .collect();
    InMemorySource::new(info, frames)
}

#[test]
fn completed_job_walks_every_state() {
    let counters = Arc::new(Counters::default());
    let fonts = test_fonts();
    let caps = StaticCapabilities::default();
    let backend = FakeBackend(Arc::clone(&counters));
    let router = FakeRouter(Arc::clone(&counters));
    let mut job = BrandingJob::new(&fonts, &caps, &backend, &router);
    let mut src = source(6, true);

    let out = job
        .run(&mut src, &OverlayConfig::new("MG Road", "123"), &mut |_| {})
        .unwrap();
    assert_eq!(
        job.history(),
        &[
            JobState::Idle,
            JobState::Armed,
            JobState::Running,
            JobState::Completed
        ]
    );
    assert!(job.state().is_terminal());
    assert_eq!(out.report.frames_composited, 6);
    assert_eq!(out.report.frames_captured, 6);
    assert!(out.report.audio_attached);
    assert_eq!(out.report.media_type, "video/fake");
    assert_eq!(counters.stopped.load(Ordering::SeqCst), 1);
    assert_eq!(counters.aborted.load(Ordering::SeqCst), 0);
    assert_eq!(counters.taps_closed.load(Ordering::SeqCst), 1);
    assert!(!src.is_playing());
}

#[test]
fn job_runs_only_once() {
    let counters = Arc::new(Counters::default());
    let fonts = test_fonts();
    let caps = StaticCapabilities::default();
    let backend = FakeBackend(Arc::clone(&counters));
    let mut job = BrandingJob::new(&fonts, &caps, &backend, &crate::audio::router::DisabledAudio);
    job.run(&mut source(2, false), &OverlayConfig::new("a", "b"), &mut |_| {})
        .unwrap();
    let err = job
        .run(&mut source(2, false), &OverlayConfig::new("a", "b"), &mut |_| {})
        .unwrap_err();
    assert!(matches!(err, BrandError::Validation(_)));
    assert_eq!(job.state(), JobState::Completed);
    assert_eq!(counters.opened.load(Ordering::SeqCst), 1);
}

#[test]
fn invalid_config_fails_from_idle() {
    let counters = Arc::new(Counters::default());
    let fonts = test_fonts();
    let caps = StaticCapabilities::default();
    let backend = FakeBackend(Arc::clone(&counters));
    let router = FakeRouter(Arc::clone(&counters));
    let mut job = BrandingJob::new(&fonts, &caps, &backend, &router);
    let cfg = OverlayConfig::new("a", "b").with_scales(0.0, 1.0);
    let err = job.run(&mut source(2, true), &cfg, &mut |_| {}).unwrap_err();
    assert!(matches!(err, BrandError::Validation(_)));
    assert_eq!(job.history(), &[JobState::Idle, JobState::Failed]);
    assert_eq!(counters.opened.load(Ordering::SeqCst), 0);
}

#[test]
fn media_error_releases_everything() {
    let counters = Arc::new(Counters::default());
    let fonts = test_fonts();
    let caps = StaticCapabilities::default();
    let backend = FakeBackend(Arc::clone(&counters));
    let router = FakeRouter(Arc::clone(&counters));
    let mut job = BrandingJob::new(&fonts, &caps, &backend, &router);
    let mut src = source(3, true).failing_after_frames(Some(4), "network");

    let err = job
        .run(&mut src, &OverlayConfig::new("a", "b"), &mut |_| {})
        .unwrap_err();
    assert!(err.to_string().contains("Code 4: network"));
    assert_eq!(
        job.history(),
        &[
            JobState::Idle,
            JobState::Armed,
            JobState::Running,
            JobState::Failed
        ]
    );
    assert_eq!(counters.aborted.load(Ordering::SeqCst), 1);
    assert_eq!(counters.stopped.load(Ordering::SeqCst), 0);
    assert_eq!(counters.taps_closed.load(Ordering::SeqCst), 1);
    assert!(!src.is_playing());
}

#[test]
fn source_without_audio_skips_routing() {
    let counters = Arc::new(Counters::default());
    let fonts = test_fonts();
    let caps = StaticCapabilities::default();
    let backend = FakeBackend(Arc::clone(&counters));
    let router = FakeRouter(Arc::clone(&counters));
    let mut job = BrandingJob::new(&fonts, &caps, &backend, &router);
    let out = job
        .run(&mut source(2, false), &OverlayConfig::new("a", "b"), &mut |_| {})
        .unwrap();
    assert!(!out.report.audio_attached);
    assert_eq!(counters.taps_closed.load(Ordering::SeqCst), 0);
}
