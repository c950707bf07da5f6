use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};
use std::thread::JoinHandle;

use crate::encode::recorder::{
    ChunkBuffer, EncodedArtifact, FrameDelivery, Recorder, RecorderBackend, RecorderParams,
};
use crate::foundation::core::{FrameDimensions, Fps};
use crate::foundation::error::{BrandError, BrandResult};
use crate::foundation::math::flatten_premul_over_bg;
use crate::media::ffmpeg::is_ffmpeg_on_path;

/// Background the captured frames are flattened over.
const CAPTURE_BG_RGB: [u8; 3] = [0, 0, 0];
/// Read size for the encoded output drain.
const CHUNK_READ_SIZE: usize = 64 * 1024;
/// Length of the synthetic clip used to validate an encoder configuration.
const TRIAL_SECONDS: &str = "0.2";

/// Backend that records through the system `ffmpeg`.
#[derive(Clone, Copy, Debug)]
pub struct FfmpegRecorderBackend {
    /// Validate codec and bitrate with a short synthetic encode before recording.
    pub trial_encode: bool,
}

impl Default for FfmpegRecorderBackend {
    fn default() -> Self {
        Self { trial_encode: true }
    }
}

impl RecorderBackend for FfmpegRecorderBackend {
    #[tracing::instrument(level = "debug", skip_all, fields(container = params.selection.container()))]
    fn open(&self, params: &RecorderParams) -> BrandResult<Box<dyn Recorder>> {
        validate_params(params)?;
        if !is_ffmpeg_on_path() {
            return Err(BrandError::resource(
                "ffmpeg is required for encoding, but was not found on PATH",
            ));
        }
        if self.trial_encode {
            trial_encode(params)?;
        }
        Ok(Box::new(FfmpegRecorder::spawn(params)?))
    }
}

fn validate_params(params: &RecorderParams) -> BrandResult<()> {
    Fps::new(params.fps.num, params.fps.den)?;
    let FrameDimensions { width, height } = params.dims;
    if width == 0 || height == 0 || !width.is_multiple_of(2) || !height.is_multiple_of(2) {
        return Err(BrandError::validation(format!(
            "recorder dimensions must be even and non-zero (got {width}x{height})"
        )));
    }
    if params.writer_queue == 0 {
        return Err(BrandError::validation("writer_queue must be > 0"));
    }
    if let Some(audio) = params.audio.as_ref()
        && (audio.sample_rate == 0 || audio.channels == 0)
    {
        return Err(BrandError::validation(
            "audio sample_rate and channels must be non-zero when audio is attached",
        ));
    }
    Ok(())
}

/// Encoder arguments shared by the trial and the real recording.
fn push_output_args(cmd: &mut Command, params: &RecorderParams, with_audio: bool) {
    let sel = &params.selection;
    if let Some(codec) = sel.candidate.and_then(|c| c.video_codec) {
        cmd.args(["-c:v", codec]);
    }
    cmd.args(["-pix_fmt", "yuv420p"]);
    if let Some(bitrate) = sel.bitrate {
        cmd.args(["-b:v", &bitrate.to_string()]);
    }
    if with_audio {
        if let Some(codec) = sel.candidate.and_then(|c| c.audio_codec) {
            cmd.args(["-c:a", codec]);
        }
    } else {
        cmd.arg("-an");
    }
    let container = sel.container();
    if container == "mp4" {
        // A pipe is not seekable; fragmented MP4 needs no trailing moov rewrite.
        cmd.args(["-movflags", "frag_keyframe+empty_moov+default_base_moof"]);
    }
    cmd.args(["-f", container, "pipe:1"]);
}

fn trial_encode(params: &RecorderParams) -> BrandResult<()> {
    let FrameDimensions { width, height } = params.dims;
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-hide_banner", "-loglevel", "error", "-nostdin"])
        .args([
            "-f",
            "lavfi",
            "-i",
            &format!(
                "color=c=black:s={width}x{height}:r={}/{}:d={TRIAL_SECONDS}",
                params.fps.num, params.fps.den
            ),
        ]);
    let with_audio = params.audio.is_some();
    if with_audio {
        cmd.args([
            "-f",
            "lavfi",
            "-i",
            &format!("anullsrc=r=48000:cl=stereo:d={TRIAL_SECONDS}"),
        ]);
    }
    push_output_args(&mut cmd, params, with_audio);

    let out = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| BrandError::resource(format!("failed to run ffmpeg trial encode: {e}")))?;
    if !out.status.success() {
        return Err(BrandError::encode(format!(
            "trial encode for '{}' failed: {}",
            params.selection.media_type(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(())
}

/// One unit of work for the stdin writer thread.
#[derive(Debug)]
struct WriterMsg {
    /// Ticks dropped since the previous frame; the previous frame is written again for each.
    repeat_last: u64,
    /// Next frame, or `None` when only repeats are pending.
    frame: Option<Vec<u8>>,
}

/// Write queued frames to `out`, filling dropped ticks with the last written frame so the
/// fixed-rate input keeps its timeline. Returns the number of frames written.
fn write_frames(rx: Receiver<WriterMsg>, out: &mut impl Write) -> std::io::Result<u64> {
    let mut last: Option<Vec<u8>> = None;
    let mut written = 0u64;
    for msg in rx {
        if let Some(prev) = last.as_deref() {
            for _ in 0..msg.repeat_last {
                out.write_all(prev)?;
                written += 1;
            }
        }
        if let Some(frame) = msg.frame {
            out.write_all(&frame)?;
            written += 1;
            last = Some(frame);
        }
    }
    out.flush()?;
    Ok(written)
}

/// Recorder that pipes raw frames into `ffmpeg` and collects the container from stdout.
///
/// Frames go through a bounded queue to a writer thread, so a slow encoder never blocks the
/// caller. When the queue is full the frame's content is dropped (or the caller waits, if the
/// params disable dropping); the writer repeats the previous frame in its place so the output
/// duration still matches the number of capture ticks.
pub struct FfmpegRecorder {
    media_type: String,
    frame_len: usize,
    drop_when_busy: bool,
    child: Option<Child>,
    frame_tx: Option<SyncSender<WriterMsg>>,
    writer: Option<JoinHandle<std::io::Result<u64>>>,
    stdout_drain: Option<JoinHandle<std::io::Result<()>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    chunks: ChunkBuffer,
    dropped: u64,
    pending_repeats: u64,
}

impl FfmpegRecorder {
    fn spawn(params: &RecorderParams) -> BrandResult<Self> {
        let FrameDimensions { width, height } = params.dims;
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Input 0: raw RGBA frames, already flattened to opaque.
        cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{width}x{height}"),
            "-r",
            &format!("{}/{}", params.fps.num, params.fps.den),
            "-i",
            "pipe:0",
        ]);
        // Input 1: routed PCM audio.
        if let Some(audio) = params.audio.as_ref() {
            cmd.args([
                "-f",
                "f32le",
                "-ar",
                &audio.sample_rate.to_string(),
                "-ac",
                &audio.channels.to_string(),
                "-i",
            ])
            .arg(&audio.path)
            .args(["-map", "0:v:0", "-map", "1:a:0"]);
        }
        push_output_args(&mut cmd, params, params.audio.is_some());

        let mut child = cmd.spawn().map_err(|e| {
            BrandError::resource(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| BrandError::resource("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| BrandError::resource("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| BrandError::resource("failed to open ffmpeg stderr (unexpected)"))?;

        let chunks = ChunkBuffer::new();
        let sink = chunks.clone();
        let stdout_drain = std::thread::spawn(move || {
            let mut buf = vec![0u8; CHUNK_READ_SIZE];
            loop {
                let n = stdout.read(&mut buf)?;
                if n == 0 {
                    return Ok(());
                }
                sink.push(buf[..n].to_vec());
            }
        });
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        let (frame_tx, frame_rx) = sync_channel::<WriterMsg>(params.writer_queue);
        let writer = std::thread::spawn(move || write_frames(frame_rx, &mut stdin));

        tracing::debug!(media_type = params.selection.media_type(), "ffmpeg recorder started");
        Ok(Self {
            media_type: params.selection.media_type().to_string(),
            frame_len: params.dims.rgba8_len(),
            drop_when_busy: params.drop_when_busy,
            child: Some(child),
            frame_tx: Some(frame_tx),
            writer: Some(writer),
            stdout_drain: Some(stdout_drain),
            stderr_drain: Some(stderr_drain),
            chunks,
            dropped: 0,
            pending_repeats: 0,
        })
    }

    fn kill_and_reap(&mut self) {
        drop(self.frame_tx.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.writer.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.stdout_drain.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
    }
}

impl Recorder for FfmpegRecorder {
    fn media_type(&self) -> &str {
        &self.media_type
    }

    fn push_frame(&mut self, rgba8_premul: &[u8]) -> BrandResult<FrameDelivery> {
        if rgba8_premul.len() != self.frame_len {
            return Err(BrandError::validation(format!(
                "frame has {} bytes, recorder expects {}",
                rgba8_premul.len(),
                self.frame_len
            )));
        }
        let tx = self
            .frame_tx
            .as_ref()
            .ok_or_else(|| BrandError::encode("recorder is already finalized"))?;

        let mut opaque = vec![0u8; self.frame_len];
        flatten_premul_over_bg(&mut opaque, rgba8_premul, CAPTURE_BG_RGB);
        let msg = WriterMsg {
            repeat_last: self.pending_repeats,
            frame: Some(opaque),
        };

        if !self.drop_when_busy {
            tx.send(msg)
                .map_err(|_| BrandError::encode("ffmpeg writer stopped accepting frames"))?;
            self.pending_repeats = 0;
            return Ok(FrameDelivery::Accepted);
        }
        match tx.try_send(msg) {
            Ok(()) => {
                self.pending_repeats = 0;
                Ok(FrameDelivery::Accepted)
            }
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                self.pending_repeats += 1;
                if self.dropped.is_power_of_two() {
                    tracing::warn!(dropped = self.dropped, "encoder is behind; dropping frames");
                }
                Ok(FrameDelivery::Dropped)
            }
            Err(TrySendError::Disconnected(_)) => {
                Err(BrandError::encode("ffmpeg writer stopped accepting frames"))
            }
        }
    }

    fn stop(mut self: Box<Self>) -> BrandResult<EncodedArtifact> {
        if let Some(tx) = self.frame_tx.take()
            && self.pending_repeats > 0
        {
            // Blocking is fine here: capture is over.
            let _ = tx.send(WriterMsg {
                repeat_last: self.pending_repeats,
                frame: None,
            });
            self.pending_repeats = 0;
        }
        let write_result = match self.writer.take() {
            Some(h) => h
                .join()
                .map_err(|_| BrandError::encode("ffmpeg writer thread panicked"))?,
            None => Ok(0),
        };

        let mut child = self
            .child
            .take()
            .ok_or_else(|| BrandError::encode("recorder is already finalized"))?;
        let status = child
            .wait()
            .map_err(|e| BrandError::encode(format!("failed to wait for ffmpeg to finish: {e}")))?;

        if let Some(h) = self.stdout_drain.take() {
            h.join()
                .map_err(|_| BrandError::encode("ffmpeg stdout drain thread panicked"))?
                .map_err(|e| BrandError::encode(format!("ffmpeg stdout read failed: {e}")))?;
        }
        let stderr_bytes = match self.stderr_drain.take() {
            Some(h) => h
                .join()
                .map_err(|_| BrandError::encode("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| BrandError::encode(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if !status.success() {
            return Err(BrandError::encode(format!(
                "ffmpeg exited with status {status}: {}",
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        let frames_written = write_result
            .map_err(|e| BrandError::encode(format!("failed to write frames to ffmpeg: {e}")))?;

        let bytes = self.chunks.take_concat();
        if bytes.is_empty() {
            return Err(BrandError::encode("ffmpeg produced no output"));
        }
        tracing::debug!(
            bytes = bytes.len(),
            frames_written,
            dropped = self.dropped,
            "ffmpeg recorder finished"
        );
        Ok(EncodedArtifact {
            bytes,
            media_type: self.media_type.clone(),
        })
    }

    fn abort(mut self: Box<Self>) {
        self.kill_and_reap();
    }
}

impl Drop for FfmpegRecorder {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.kill_and_reap();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
