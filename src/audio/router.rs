use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::error::{BrandError, BrandResult};
use crate::media::source::SourceInfo;

/// Sample rate of routed PCM audio.
pub const ROUTED_SAMPLE_RATE: u32 = 48_000;
/// Channel count of routed PCM audio.
pub const ROUTED_CHANNELS: u16 = 2;

/// Raw PCM audio the encoder consumes as a second input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioFeed {
    /// Path to interleaved `f32le` PCM data.
    pub path: PathBuf,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
}

/// A connected audio route owned by one job.
pub trait AudioTap: Send {
    /// Feed the encoder should read.
    fn feed(&self) -> &AudioFeed;
    /// Tear the route down. Must be called at most once.
    fn close(&mut self) -> BrandResult<()>;
}

/// Builds audio routes for sources.
pub trait AudioRouter {
    /// Tap the audio of `source`. Failures are absorbed by the caller, which continues
    /// video-only.
    fn route(&self, source: &SourceInfo) -> BrandResult<Box<dyn AudioTap>>;
}

/// Router that never attaches audio.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledAudio;

impl AudioRouter for DisabledAudio {
    fn route(&self, _source: &SourceInfo) -> BrandResult<Box<dyn AudioTap>> {
        Err(BrandError::resource("audio routing is disabled"))
    }
}

/// Router that decodes the source audio track to a private PCM temp file with `ffmpeg`.
#[derive(Clone, Debug)]
pub struct FfmpegAudioRouter {
    scratch_dir: PathBuf,
    sample_rate: u32,
}

impl Default for FfmpegAudioRouter {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl FfmpegAudioRouter {
    /// Route into temp files under `scratch_dir`.
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            sample_rate: ROUTED_SAMPLE_RATE,
        }
    }
}

static TAP_SEQ: AtomicU64 = AtomicU64::new(0);

impl AudioRouter for FfmpegAudioRouter {
    #[tracing::instrument(level = "debug", skip_all)]
    fn route(&self, source: &SourceInfo) -> BrandResult<Box<dyn AudioTap>> {
        if !source.has_audio {
            return Err(BrandError::unsupported_input("source has no audio track"));
        }
        let input = source
            .path
            .as_deref()
            .ok_or_else(|| BrandError::unsupported_input("source has no backing file"))?;

        std::fs::create_dir_all(&self.scratch_dir).map_err(|e| {
            BrandError::resource(format!(
                "create audio scratch dir '{}': {e}",
                self.scratch_dir.display()
            ))
        })?;
        let path = self.scratch_dir.join(format!(
            "reelbrand-audio-{}-{}.f32le",
            std::process::id(),
            TAP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        let feed = AudioFeed {
            path,
            sample_rate: self.sample_rate,
            channels: ROUTED_CHANNELS,
        };
        // Own the file before ffmpeg creates it so every failure path removes it.
        let tap = PcmFileTap::new(feed);
        decode_pcm_to_file(input, tap.feed())?;

        let len = std::fs::metadata(&tap.feed().path)
            .map(|m| m.len())
            .unwrap_or(0);
        if len == 0 {
            return Err(BrandError::resource("audio track decoded to no samples"));
        }
        tracing::debug!(bytes = len, "audio routed");
        Ok(Box::new(tap))
    }
}

fn decode_pcm_to_file(input: &Path, feed: &AudioFeed) -> BrandResult<()> {
    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-nostdin", "-y", "-i"])
        .arg(input)
        .args([
            "-vn",
            "-map",
            "0:a:0",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            &feed.channels.to_string(),
            "-ar",
            &feed.sample_rate.to_string(),
        ])
        .arg(&feed.path)
        .output()
        .map_err(|e| BrandError::resource(format!("failed to run ffmpeg for audio decode: {e}")))?;
    if !out.status.success() {
        return Err(BrandError::resource(format!(
            "ffmpeg audio decode failed for '{}': {}",
            input.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(())
}

/// Tap backed by a PCM file that is deleted when the tap closes or drops.
#[derive(Debug)]
pub struct PcmFileTap {
    feed: AudioFeed,
    closed: bool,
}

impl PcmFileTap {
    /// Take ownership of the file at `feed.path`.
    pub fn new(feed: AudioFeed) -> Self {
        Self {
            feed,
            closed: false,
        }
    }

    /// Whether the tap has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl AudioTap for PcmFileTap {
    fn feed(&self) -> &AudioFeed {
        &self.feed
    }

    fn close(&mut self) -> BrandResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match std::fs::remove_file(&self.feed.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BrandError::resource(format!(
                "remove audio scratch file '{}': {e}",
                self.feed.path.display()
            ))),
        }
    }
}

impl Drop for PcmFileTap {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Route audio for `source`, downgrading any failure to a video-only job.
pub fn route_best_effort(router: &dyn AudioRouter, source: &SourceInfo) -> Option<Box<dyn AudioTap>> {
    match router.route(source) {
        Ok(tap) => Some(tap),
        Err(e) => {
            tracing::warn!(error = %e, "audio routing unavailable; continuing video-only");
            None
        }
    }
}

/// Holds a job's audio tap and closes it exactly once, on every exit path.
pub(crate) struct AudioGuard {
    tap: Option<Box<dyn AudioTap>>,
}

impl AudioGuard {
    pub(crate) fn new(tap: Option<Box<dyn AudioTap>>) -> Self {
        Self { tap }
    }

    pub(crate) fn feed(&self) -> Option<AudioFeed> {
        self.tap.as_ref().map(|t| t.feed().clone())
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.tap.is_some()
    }

    /// Close the tap now, logging rather than failing on teardown errors.
    pub(crate) fn release(&mut self) {
        if let Some(mut tap) = self.tap.take()
            && let Err(e) = tap.close()
        {
            tracing::warn!(error = %e, "audio tap teardown failed");
        }
    }
}

impl Drop for AudioGuard {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/router.rs"]
mod tests;
