use std::sync::{Arc, Mutex};

use crate::audio::router::AudioFeed;
use crate::encode::capability::EncoderSelection;
use crate::foundation::core::{Fps, FrameDimensions};
use crate::foundation::error::{BrandError, BrandResult};

/// Everything a backend needs to start recording.
#[derive(Clone, Debug, PartialEq)]
pub struct RecorderParams {
    /// Output frame size.
    pub dims: FrameDimensions,
    /// Capture rate.
    pub fps: Fps,
    /// Chosen output format.
    pub selection: EncoderSelection,
    /// Routed audio, if any.
    pub audio: Option<AudioFeed>,
    /// Frames buffered before the recorder starts dropping.
    pub writer_queue: usize,
    /// Drop frames instead of blocking when the queue is full.
    pub drop_when_busy: bool,
}

/// The encoded output of a job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedArtifact {
    /// Container bytes, in encode order.
    pub bytes: Vec<u8>,
    /// Negotiated media type.
    pub media_type: String,
}

impl EncodedArtifact {
    /// Conventional file extension for the media type.
    pub fn file_extension(&self) -> &'static str {
        let base = self
            .media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        match base {
            "video/mp4" => "mp4",
            "video/webm" => "webm",
            "video/x-matroska" => "mkv",
            _ => "bin",
        }
    }
}

/// Outcome of handing one captured frame to a recorder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameDelivery {
    /// Queued for encoding.
    Accepted,
    /// Content dropped because the encoder could not keep up. The recorder still emits a
    /// frame for the tick by repeating the previous one.
    Dropped,
}

/// An armed recorder consuming captured frames.
pub trait Recorder: Send {
    /// Media type the output will carry.
    fn media_type(&self) -> &str;
    /// Submit one premultiplied RGBA8 frame of the configured size.
    fn push_frame(&mut self, rgba8_premul: &[u8]) -> BrandResult<FrameDelivery>;
    /// Finish encoding and return the concatenated output.
    fn stop(self: Box<Self>) -> BrandResult<EncodedArtifact>;
    /// Discard the recording and release all resources.
    fn abort(self: Box<Self>);
}

/// Constructs recorders.
pub trait RecorderBackend {
    /// Start a recorder for `params`.
    fn open(&self, params: &RecorderParams) -> BrandResult<Box<dyn Recorder>>;
}

/// Open a recorder, retrying once with platform defaults when the preferred format fails.
pub fn open_recorder(
    backend: &dyn RecorderBackend,
    params: &RecorderParams,
) -> BrandResult<Box<dyn Recorder>> {
    match backend.open(params) {
        Ok(rec) => Ok(rec),
        Err(e) if !params.selection.is_platform_default() => {
            tracing::warn!(
                error = %e,
                preferred = params.selection.mime_or_codec_id(),
                "preferred encoder failed; retrying with platform defaults"
            );
            let fallback = RecorderParams {
                selection: EncoderSelection::platform_default(),
                ..params.clone()
            };
            backend.open(&fallback).map_err(|e2| {
                BrandError::resource(format!(
                    "encoder unavailable: {e}; platform default also failed: {e2}"
                ))
            })
        }
        Err(e) => Err(BrandError::resource(format!("encoder unavailable: {e}"))),
    }
}

/// Ordered, shareable buffer of encoded chunks.
///
/// Writers append in delivery order; the artifact is the concatenation.
#[derive(Clone, Debug, Default)]
pub struct ChunkBuffer {
    chunks: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl ChunkBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk; empty chunks are ignored.
    pub fn push(&self, chunk: Vec<u8>) {
        if chunk.is_empty() {
            return;
        }
        self.chunks
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(chunk);
    }

    /// Number of chunks received.
    pub fn len(&self) -> usize {
        self.chunks.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Whether no chunk was received.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes received.
    pub fn total_bytes(&self) -> usize {
        self.chunks
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .map(Vec::len)
            .sum()
    }

    /// Drain all chunks into one contiguous buffer.
    pub fn take_concat(&self) -> Vec<u8> {
        let chunks = std::mem::take(&mut *self.chunks.lock().unwrap_or_else(|p| p.into_inner()));
        chunks.concat()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/recorder.rs"]
mod tests;
