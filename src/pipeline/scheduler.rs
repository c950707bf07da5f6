use crate::config::CAPTURE_FPS;
use crate::encode::capture::CaptureStream;
use crate::foundation::error::{BrandError, BrandResult};
use crate::media::source::{MediaEvent, MediaSource};
use crate::pipeline::progress::ProgressTracker;
use crate::render::compositor::FrameCompositor;

/// How a playback run ended.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackOutcome {
    /// Source frames composited.
    pub frames: u64,
    /// Media time up to which capture ticks should be flushed: one source frame interval past
    /// the last frame, or the reported duration when that ends sooner.
    pub end_time: f64,
}

/// Composite every frame `source` delivers until end-of-media.
///
/// The source must already be playing. Blocks on [`MediaSource::next_event`] between frames, so
/// pacing follows the source's own presentation clock. Before a new frame is composited, the
/// capture stream samples the surface for every tick that falls before it.
#[tracing::instrument(skip_all)]
pub fn drive_playback(
    source: &mut dyn MediaSource,
    compositor: &mut FrameCompositor,
    capture: &mut CaptureStream,
    progress: &mut ProgressTracker,
    on_progress: &mut dyn FnMut(u8),
) -> BrandResult<PlaybackOutcome> {
    let mut frames = 0u64;
    let mut last_pts = 0.0f64;
    loop {
        match source.next_event() {
            MediaEvent::Frame(frame) => {
                let pts = if frame.pts_sec.is_finite() {
                    frame.pts_sec.max(last_pts)
                } else {
                    last_pts
                };
                if pts > frame.pts_sec {
                    tracing::debug!(pts = frame.pts_sec, clamped = pts, "non-monotonic frame timestamp");
                }
                capture.advance_to(pts, compositor.surface().data())?;
                compositor.composite(&frame)?;
                frames += 1;
                last_pts = pts;
                on_progress(progress.sample(pts));
            }
            MediaEvent::Ended => break,
            MediaEvent::Error { code, message } => {
                return Err(BrandError::media(code, message));
            }
        }
    }

    if frames == 0 {
        return Err(BrandError::unsupported_input(
            "source ended before producing a frame",
        ));
    }

    // The last frame is held for one source interval; duration metadata may only shorten that.
    let info = source.info();
    let held_until = last_pts + info.fps.unwrap_or(CAPTURE_FPS).frame_duration_secs();
    let end_time = match info.known_duration() {
        Some(d) if d > last_pts => d.min(held_until),
        _ => held_until,
    };
    tracing::debug!(frames, end_time, "playback ended");
    Ok(PlaybackOutcome { frames, end_time })
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/scheduler.rs"]
mod tests;
