//! Best-effort routing of the source audio track into the encoder.

/// Router contract, ffmpeg-backed router and audio taps.
pub mod router;
