//! Reelbrand stamps a branding overlay onto short videos and re-encodes them.
//!
//! A job reads a source video, draws a darkened banner with an address block and a mobile
//! number over every frame, captures the result at a fixed 30 fps and hands back one encoded
//! artifact:
//!
//! - Describe the overlay with an [`OverlayConfig`]
//! - Run a [`BrandingJob`] against any [`MediaSource`], or call [`brand_video`] for a file
//! - Receive a [`BrandingOutput`] holding the bytes and its negotiated media type
//!
//! Decoding and encoding go through the `ffmpeg` binary; compositing runs on the CPU.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Audio routing into the encoder.
pub mod audio;
/// Overlay configuration and job settings.
pub mod config;
/// Codec selection, recorders and fixed-rate capture.
pub mod encode;
/// Text wrapping and banner geometry.
pub mod layout;
/// Media sources.
pub mod media;
/// Job orchestration.
pub mod pipeline;
/// CPU compositing.
pub mod render;
/// Fonts and shaping.
pub mod text;

pub use crate::foundation::core::{Affine, Fps, FrameDimensions, Rect};
pub use crate::foundation::error::{BrandError, BrandResult};

pub use crate::audio::router::{AudioRouter, AudioTap, DisabledAudio, FfmpegAudioRouter};
pub use crate::config::{JobSettings, OverlayConfig};
pub use crate::encode::capability::{
    CapabilityProbe, EncoderSelection, FfmpegCapabilities, StaticCapabilities,
};
pub use crate::encode::ffmpeg::FfmpegRecorderBackend;
pub use crate::encode::recorder::{EncodedArtifact, Recorder, RecorderBackend};
pub use crate::layout::geometry::{LayoutPlan, plan_layout};
pub use crate::media::ffmpeg::FfmpegSource;
pub use crate::media::source::{InMemorySource, MediaEvent, MediaSource, SourceFrame, SourceInfo};
pub use crate::pipeline::job::{BrandingJob, BrandingOutput, JobReport, JobState, brand_video};
pub use crate::render::compositor::FrameCompositor;
pub use crate::text::fonts::{FontFace, FontSet};
