use std::path::Path;

use crate::audio::router::{AudioGuard, AudioRouter, FfmpegAudioRouter, route_best_effort};
use crate::config::{JobSettings, OverlayConfig};
use crate::encode::capability::{
    CODEC_CANDIDATES, CapabilityProbe, FfmpegCapabilities, select_encoder,
};
use crate::encode::capture::CaptureStream;
use crate::encode::ffmpeg::FfmpegRecorderBackend;
use crate::encode::recorder::{EncodedArtifact, RecorderBackend, RecorderParams, open_recorder};
use crate::foundation::core::FrameDimensions;
use crate::foundation::error::{BrandError, BrandResult};
use crate::media::ffmpeg::FfmpegSource;
use crate::media::source::MediaSource;
use crate::pipeline::progress::ProgressTracker;
use crate::pipeline::scheduler::drive_playback;
use crate::render::compositor::FrameCompositor;
use crate::text::fonts::FontSet;

/// Lifecycle of a [`BrandingJob`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    /// Constructed, not started.
    Idle,
    /// Surface, encoder and audio are set up; playback has not begun.
    Armed,
    /// Playback and compositing in progress.
    Running,
    /// Terminal: the artifact was produced.
    Completed,
    /// Terminal: the job failed and its resources were released.
    Failed,
}

impl JobState {
    /// Whether no further transitions can happen.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Counters and choices recorded by a completed job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobReport {
    /// Output frame size.
    pub dimensions: FrameDimensions,
    /// Source frames composited.
    pub frames_composited: u64,
    /// Capture ticks delivered to the encoder.
    pub frames_captured: u64,
    /// Capture ticks the recorder dropped.
    pub frames_dropped: u64,
    /// Whether an audio feed was attached to the encoder.
    pub audio_attached: bool,
    /// Negotiated media type of the artifact.
    pub media_type: String,
}

/// Result of a successful job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrandingOutput {
    /// Encoded video.
    pub artifact: EncodedArtifact,
    /// What the job did.
    pub report: JobReport,
}

/// One end-to-end branding run over a single source.
///
/// Collaborators are injected so the pipeline can run against fakes. A job runs once; every
/// started job ends in exactly one of [`JobState::Completed`] or [`JobState::Failed`], and the
/// audio tap and recorder are released before that state is entered.
pub struct BrandingJob<'a> {
    settings: JobSettings,
    fonts: &'a FontSet,
    capabilities: &'a dyn CapabilityProbe,
    recorders: &'a dyn RecorderBackend,
    audio: &'a dyn AudioRouter,
    state: JobState,
    history: Vec<JobState>,
}

impl<'a> BrandingJob<'a> {
    /// Job with default [`JobSettings`].
    pub fn new(
        fonts: &'a FontSet,
        capabilities: &'a dyn CapabilityProbe,
        recorders: &'a dyn RecorderBackend,
        audio: &'a dyn AudioRouter,
    ) -> Self {
        Self {
            settings: JobSettings::default(),
            fonts,
            capabilities,
            recorders,
            audio,
            state: JobState::Idle,
            history: vec![JobState::Idle],
        }
    }

    /// Replace the capture/encoder settings.
    pub fn with_settings(mut self, settings: JobSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Current state.
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Every state entered so far, starting with `Idle`.
    pub fn history(&self) -> &[JobState] {
        &self.history
    }

    /// Brand `source` with `config`, reporting percent progress once per composited frame.
    ///
    /// The source is stopped on every path.
    #[tracing::instrument(skip_all)]
    pub fn run(
        &mut self,
        source: &mut dyn MediaSource,
        config: &OverlayConfig,
        on_progress: &mut dyn FnMut(u8),
    ) -> BrandResult<BrandingOutput> {
        if self.state != JobState::Idle {
            return Err(BrandError::validation(format!(
                "job already started (state {:?})",
                self.state
            )));
        }

        let result = self.execute(source, config, on_progress);
        source.stop();
        match &result {
            Ok(out) => {
                tracing::info!(
                    frames = out.report.frames_composited,
                    captured = out.report.frames_captured,
                    dropped = out.report.frames_dropped,
                    bytes = out.artifact.bytes.len(),
                    media_type = %out.report.media_type,
                    "branding job completed"
                );
                self.enter(JobState::Completed);
            }
            Err(e) => {
                tracing::warn!(error = %e, state = ?self.state, "branding job failed");
                self.enter(JobState::Failed);
            }
        }
        result
    }

    fn enter(&mut self, next: JobState) {
        tracing::debug!(from = ?self.state, to = ?next, "job transition");
        self.state = next;
        self.history.push(next);
    }

    fn execute(
        &mut self,
        source: &mut dyn MediaSource,
        config: &OverlayConfig,
        on_progress: &mut dyn FnMut(u8),
    ) -> BrandResult<BrandingOutput> {
        config.validate()?;
        self.settings.validate()?;
        if !config.scales_within_recommended_range() {
            tracing::debug!(
                address_scale = config.address_scale,
                mobile_scale = config.mobile_scale,
                "scale outside the recommended range"
            );
        }

        let info = source.info().clone();
        let dims = info.dimensions()?;
        let (_, mut compositor) = FrameCompositor::prepare(dims, config, self.fonts)?;

        let mut audio = AudioGuard::new(if info.has_audio {
            route_best_effort(self.audio, &info)
        } else {
            tracing::info!("source has no audio track; encoding video only");
            None
        });

        let selection = select_encoder(
            self.capabilities,
            &CODEC_CANDIDATES,
            Some(self.settings.bitrate),
        );
        let params = RecorderParams {
            dims,
            fps: self.settings.capture_fps,
            selection,
            audio: audio.feed(),
            writer_queue: self.settings.writer_queue,
            drop_when_busy: self.settings.drop_when_busy,
        };
        let recorder = open_recorder(self.recorders, &params)?;
        let mut capture = CaptureStream::new(recorder, self.settings.capture_fps);
        self.enter(JobState::Armed);
        tracing::debug!(
            width = dims.width,
            height = dims.height,
            media_type = capture.media_type(),
            audio = audio.is_attached(),
            "job armed"
        );

        source.play()?;
        self.enter(JobState::Running);

        let mut progress = ProgressTracker::new(info.known_duration());
        let outcome = drive_playback(
            source,
            &mut compositor,
            &mut capture,
            &mut progress,
            on_progress,
        )?;

        let (artifact, stats) = capture.finish(outcome.end_time, compositor.surface().data())?;
        if stats.frames_dropped > 0 {
            tracing::warn!(
                dropped = stats.frames_dropped,
                "encoder fell behind; frames were dropped"
            );
        }
        let audio_attached = audio.is_attached();
        audio.release();

        let report = JobReport {
            dimensions: dims,
            frames_composited: compositor.frames_composited(),
            frames_captured: stats.frames_captured,
            frames_dropped: stats.frames_dropped,
            audio_attached,
            media_type: artifact.media_type.clone(),
        };
        Ok(BrandingOutput { artifact, report })
    }
}

/// Brand the video at `path` using `ffmpeg` for decode and encode and system fonts for text.
pub fn brand_video(
    path: &Path,
    config: &OverlayConfig,
    settings: &JobSettings,
    mut on_progress: impl FnMut(u8),
) -> BrandResult<BrandingOutput> {
    let fonts = FontSet::discover(&[])?;
    let mut source = FfmpegSource::open(path)?;
    let capabilities = FfmpegCapabilities::query();
    let recorders = FfmpegRecorderBackend::default();
    let audio = FfmpegAudioRouter::default();
    BrandingJob::new(&fonts, &capabilities, &recorders, &audio)
        .with_settings(settings.clone())
        .run(&mut source, config, &mut on_progress)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/job.rs"]
mod tests;
