use crate::encode::recorder::{EncodedArtifact, FrameDelivery, Recorder};
use crate::foundation::core::Fps;
use crate::foundation::error::{BrandError, BrandResult};

/// Ticks closer than this to a frame boundary count as belonging to the new frame.
const TICK_EPSILON: f64 = 1e-9;

/// Fixed-rate sampling clock on the media timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureClock {
    fps: Fps,
    next_tick: u64,
}

impl CaptureClock {
    /// Clock at `fps`, with its first tick at t = 0.
    pub fn new(fps: Fps) -> Self {
        Self { fps, next_tick: 0 }
    }

    /// Media time of tick `k`.
    pub fn tick_time(&self, k: u64) -> f64 {
        self.fps.frames_to_secs(k)
    }

    /// Consume every tick strictly before `t` and return how many there were.
    pub fn take_due_before(&mut self, t: f64) -> u64 {
        if !t.is_finite() {
            return 0;
        }
        let mut due = 0;
        while self.tick_time(self.next_tick) < t - TICK_EPSILON {
            self.next_tick += 1;
            due += 1;
        }
        due
    }

    /// Ticks emitted so far.
    pub fn ticks_emitted(&self) -> u64 {
        self.next_tick
    }
}

/// Counters reported by the capture layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Ticks whose frame reached the encoder queue.
    pub frames_captured: u64,
    /// Ticks whose frame the recorder dropped.
    pub frames_dropped: u64,
}

/// Samples the composited surface on a [`CaptureClock`] and feeds a recorder.
///
/// Dropping an unfinished stream aborts its recorder.
pub struct CaptureStream {
    clock: CaptureClock,
    recorder: Option<Box<dyn Recorder>>,
    stats: CaptureStats,
}

impl CaptureStream {
    /// Start capturing into `recorder` at `fps`.
    pub fn new(recorder: Box<dyn Recorder>, fps: Fps) -> Self {
        Self {
            clock: CaptureClock::new(fps),
            recorder: Some(recorder),
            stats: CaptureStats::default(),
        }
    }

    /// Media type of the armed recorder.
    pub fn media_type(&self) -> &str {
        self.recorder.as_ref().map(|r| r.media_type()).unwrap_or_default()
    }

    /// Counters so far.
    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    /// Emit `surface` for every pending tick before media time `t`.
    pub fn advance_to(&mut self, t: f64, surface: &[u8]) -> BrandResult<()> {
        let due = self.clock.take_due_before(t);
        let recorder = self
            .recorder
            .as_mut()
            .ok_or_else(|| BrandError::encode("capture stream already finished"))?;
        for _ in 0..due {
            match recorder.push_frame(surface)? {
                FrameDelivery::Accepted => self.stats.frames_captured += 1,
                FrameDelivery::Dropped => self.stats.frames_dropped += 1,
            }
        }
        Ok(())
    }

    /// Flush ticks up to `end_time` and stop the recorder.
    pub fn finish(
        mut self,
        end_time: f64,
        surface: &[u8],
    ) -> BrandResult<(EncodedArtifact, CaptureStats)> {
        self.advance_to(end_time, surface)?;
        let recorder = self
            .recorder
            .take()
            .ok_or_else(|| BrandError::encode("capture stream already finished"))?;
        let artifact = recorder.stop()?;
        Ok((artifact, self.stats))
    }

    /// Discard the recording.
    pub fn abort(mut self) {
        if let Some(recorder) = self.recorder.take() {
            recorder.abort();
        }
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            tracing::debug!("capture stream dropped before finishing; aborting recorder");
            recorder.abort();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/capture.rs"]
mod tests;
