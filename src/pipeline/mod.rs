//! Job orchestration: playback scheduling, progress and the job state machine.

/// `BrandingJob` state machine and the `brand_video` entry point.
pub mod job;
/// Monotonic percent progress.
pub mod progress;
/// Frame-by-frame playback loop.
pub mod scheduler;
