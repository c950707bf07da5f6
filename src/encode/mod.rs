//! Output encoding: codec selection, recorders and the fixed-rate capture clock.
//!
//! The capture clock samples the compositor surface at 30 fps and hands frames to a
//! [`recorder::Recorder`], which produces the encoded artifact when stopped.

/// Codec/container candidates and capability probing.
pub mod capability;
/// Fixed-rate sampling of the composited surface.
pub mod capture;
/// `ffmpeg`-backed recorder.
pub mod ffmpeg;
/// Recorder contract, fallback policy and chunk buffering.
pub mod recorder;
