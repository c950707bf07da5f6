use std::collections::VecDeque;
use std::path::PathBuf;

use crate::foundation::core::{Fps, FrameDimensions};
use crate::foundation::error::BrandResult;

/// Metadata of a playable source, known before playback starts.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceInfo {
    /// File backing the source, when there is one.
    pub path: Option<PathBuf>,
    /// Native width in pixels.
    pub width: u32,
    /// Native height in pixels.
    pub height: u32,
    /// Total duration in seconds; `None` when unknown or not a positive finite value.
    pub duration_sec: Option<f64>,
    /// Native frame rate, when known.
    pub fps: Option<Fps>,
    /// Whether the source carries an audio track.
    pub has_audio: bool,
}

impl SourceInfo {
    /// Create metadata, normalizing unusable durations to `None`.
    pub fn new(width: u32, height: u32, duration_sec: Option<f64>) -> Self {
        Self {
            path: None,
            width,
            height,
            duration_sec: duration_sec.filter(|d| d.is_finite() && *d > 0.0),
            fps: None,
            has_audio: false,
        }
    }

    /// Even output dimensions derived from the native size.
    pub fn dimensions(&self) -> BrandResult<FrameDimensions> {
        FrameDimensions::from_native(self.width, self.height)
    }

    /// Duration, if it is a positive finite value.
    pub fn known_duration(&self) -> Option<f64> {
        self.duration_sec.filter(|d| d.is_finite() && *d > 0.0)
    }
}

/// One decoded frame, straight-alpha RGBA8, tightly packed.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceFrame {
    /// Presentation timestamp in seconds.
    pub pts_sec: f64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes.
    pub rgba: Vec<u8>,
}

/// What a source reports when the scheduler asks for the next event.
#[derive(Debug)]
pub enum MediaEvent {
    /// A frame is ready for presentation.
    Frame(SourceFrame),
    /// Playback reached the end of the media.
    Ended,
    /// Playback or decoding failed.
    Error {
        /// Platform error code, when available.
        code: Option<i32>,
        /// Failure description.
        message: String,
    },
}

/// A playable media source.
///
/// `next_event` blocks until the next frame is due at the source's presentation timing, so the
/// caller suspends instead of polling.
pub trait MediaSource: Send {
    /// Metadata known before playback.
    fn info(&self) -> &SourceInfo;
    /// Begin playback from the start.
    fn play(&mut self) -> BrandResult<()>;
    /// Wait for the next event. After `Ended` or `Error` the source stays finished.
    fn next_event(&mut self) -> MediaEvent;
    /// Presentation time of the last delivered frame.
    fn current_time(&self) -> f64;
    /// Stop playback and release decoding resources. Idempotent.
    fn stop(&mut self);
}

/// Source replaying pre-decoded frames without pacing.
///
/// Useful for tests and for callers that decode elsewhere.
#[derive(Debug)]
pub struct InMemorySource {
    info: SourceInfo,
    frames: VecDeque<SourceFrame>,
    trailing_error: Option<(Option<i32>, String)>,
    playing: bool,
    finished: bool,
    current_time: f64,
}

impl InMemorySource {
    /// Replay `frames` in order, then report `Ended`.
    pub fn new(info: SourceInfo, frames: Vec<SourceFrame>) -> Self {
        Self {
            info,
            frames: frames.into(),
            trailing_error: None,
            playing: false,
            finished: false,
            current_time: 0.0,
        }
    }

    /// Report an error instead of `Ended` once the frames run out.
    pub fn failing_after_frames(mut self, code: Option<i32>, message: impl Into<String>) -> Self {
        self.trailing_error = Some((code, message.into()));
        self
    }

    /// Whether `play` was called and `stop` was not.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Frames not yet delivered.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl MediaSource for InMemorySource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    fn play(&mut self) -> BrandResult<()> {
        self.playing = true;
        Ok(())
    }

    fn next_event(&mut self) -> MediaEvent {
        if !self.playing || self.finished {
            return MediaEvent::Ended;
        }
        if let Some(frame) = self.frames.pop_front() {
            self.current_time = frame.pts_sec;
            return MediaEvent::Frame(frame);
        }
        self.finished = true;
        match self.trailing_error.take() {
            Some((code, message)) => MediaEvent::Error { code, message },
            None => MediaEvent::Ended,
        }
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn stop(&mut self) {
        self.playing = false;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/source.rs"]
mod tests;
