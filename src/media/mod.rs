//! Media sources: decoded frames delivered at the source's own presentation timing.

/// `ffprobe`/`ffmpeg`-backed source.
pub mod ffmpeg;
/// Source contract and in-memory source.
pub mod source;
