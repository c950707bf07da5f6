use std::io::{ErrorKind, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::foundation::core::Fps;
use crate::foundation::error::{BrandError, BrandResult};
use crate::media::source::{MediaEvent, MediaSource, SourceFrame, SourceInfo};

/// Frame rate assumed when the container does not report one.
pub const FALLBACK_SOURCE_FPS: Fps = Fps { num: 30, den: 1 };

/// Decoded frames buffered ahead of the playback clock.
const DECODE_QUEUE: usize = 3;

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    tool_on_path("ffmpeg")
}

/// Return `true` when `ffprobe` can be invoked from `PATH`.
pub fn is_ffprobe_on_path() -> bool {
    tool_on_path("ffprobe")
}

fn tool_on_path(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[derive(serde::Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
    #[serde(default)]
    side_data_list: Vec<ProbeSideData>,
    tags: Option<ProbeTags>,
}

#[derive(serde::Deserialize)]
struct ProbeSideData {
    rotation: Option<f64>,
}

#[derive(serde::Deserialize)]
struct ProbeTags {
    rotate: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(serde::Deserialize)]
struct ProbeOut {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

impl ProbeStream {
    /// Display rotation in degrees: display matrix side data first, then the legacy tag.
    fn rotation_degrees(&self) -> Option<f64> {
        self.side_data_list
            .iter()
            .find_map(|sd| sd.rotation)
            .or_else(|| {
                self.tags
                    .as_ref()
                    .and_then(|t| t.rotate.as_deref())
                    .and_then(|r| r.trim().parse::<f64>().ok())
            })
            .filter(|r| r.is_finite())
    }
}

/// Probe source metadata through `ffprobe`.
///
/// Width and height are the displayed size: `ffmpeg` applies rotation metadata while decoding,
/// so a quarter-turn swaps the stored dimensions.
pub fn probe_source(path: &Path) -> BrandResult<SourceInfo> {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| BrandError::resource(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(BrandError::unsupported_input(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    source_info_from_probe_json(path, &out.stdout)
}

/// Parse captured `ffprobe -print_format json -show_streams -show_format` output.
pub fn source_info_from_probe_json(path: &Path, json: &[u8]) -> BrandResult<SourceInfo> {
    let parsed: ProbeOut = serde_json::from_slice(json)
        .map_err(|e| BrandError::serde(format!("ffprobe json parse failed: {e}")))?;
    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            BrandError::unsupported_input(format!("no video stream in '{}'", path.display()))
        })?;
    let (mut width, mut height) = match (video.width, video.height) {
        (Some(w), Some(h)) => (w, h),
        _ => {
            return Err(BrandError::unsupported_input(
                "video stream has no dimensions",
            ));
        }
    };
    let rotation = video.rotation_degrees();
    if let Some(r) = rotation
        && matches!((r.round() as i64).rem_euclid(360), 90 | 270)
    {
        std::mem::swap(&mut width, &mut height);
    }

    let parse_secs = |s: &Option<String>| s.as_deref().and_then(|v| v.trim().parse::<f64>().ok());
    let duration = parsed
        .format
        .as_ref()
        .and_then(|f| parse_secs(&f.duration))
        .or_else(|| parse_secs(&video.duration));
    let fps = video
        .avg_frame_rate
        .as_deref()
        .and_then(Fps::parse_rational)
        .or_else(|| video.r_frame_rate.as_deref().and_then(Fps::parse_rational));

    let mut info = SourceInfo::new(width, height, duration);
    info.path = Some(path.to_path_buf());
    info.fps = fps;
    info.has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));
    tracing::debug!(
        width,
        height,
        rotation = ?rotation,
        duration = ?info.duration_sec,
        fps = ?info.fps,
        has_audio = info.has_audio,
        "probed source"
    );
    Ok(info)
}

/// Decode the single frame presented at `time_sec`.
pub fn decode_frame_at(info: &SourceInfo, time_sec: f64) -> BrandResult<SourceFrame> {
    let path = info
        .path
        .as_deref()
        .ok_or_else(|| BrandError::validation("source has no backing file"))?;
    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-nostdin", "-ss", &format!("{:.6}", time_sec.max(0.0))])
        .arg("-i")
        .arg(path)
        .args([
            "-frames:v",
            "1",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .output()
        .map_err(|e| BrandError::resource(format!("failed to run ffmpeg for frame decode: {e}")))?;
    if !out.status.success() {
        return Err(BrandError::media(
            out.status.code(),
            format!(
                "frame decode failed for '{}': {}",
                path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            ),
        ));
    }

    let expected_len = (info.width as usize) * (info.height as usize) * 4;
    if expected_len == 0 || out.stdout.len() < expected_len {
        return Err(BrandError::media(
            None,
            format!("no frame decoded at {time_sec:.3}s"),
        ));
    }
    let mut rgba = out.stdout;
    rgba.truncate(expected_len);
    Ok(SourceFrame {
        pts_sec: time_sec,
        width: info.width,
        height: info.height,
        rgba,
    })
}

enum DecoderMsg {
    Frame(SourceFrame),
    Eof,
    Failed(String),
}

/// Source that decodes a file with an `ffmpeg` child and releases frames in real time.
///
/// A reader thread pulls raw RGBA frames from the child, sleeps until each frame's
/// presentation time on a wall clock started at playback, and hands it over through a small
/// bounded channel.
pub struct FfmpegSource {
    info: SourceInfo,
    fps: Fps,
    child: Option<Child>,
    frames: Option<Receiver<DecoderMsg>>,
    reader: Option<JoinHandle<()>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    finished: bool,
    current_time: f64,
}

impl FfmpegSource {
    /// Probe `path` and prepare a source for it. Decoding starts on [`MediaSource::play`].
    pub fn open(path: &Path) -> BrandResult<Self> {
        Ok(Self::from_info(probe_source(path)?))
    }

    /// Build from previously probed metadata.
    pub fn from_info(info: SourceInfo) -> Self {
        let fps = info.fps.unwrap_or(FALLBACK_SOURCE_FPS);
        Self {
            info,
            fps,
            child: None,
            frames: None,
            reader: None,
            stderr_drain: None,
            finished: false,
            current_time: 0.0,
        }
    }

    fn finish_decoder(&mut self) -> MediaEvent {
        self.finished = true;
        drop(self.frames.take());
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        let status = match self.child.take() {
            Some(mut child) => child.wait().ok(),
            None => None,
        };
        let stderr = self.take_stderr();

        match status {
            Some(s) if s.success() => MediaEvent::Ended,
            Some(s) => MediaEvent::Error {
                code: s.code(),
                message: if stderr.is_empty() {
                    format!("ffmpeg decoder exited with status {s}")
                } else {
                    stderr
                },
            },
            None => MediaEvent::Error {
                code: None,
                message: "ffmpeg decoder vanished".to_string(),
            },
        }
    }

    fn take_stderr(&mut self) -> String {
        match self.stderr_drain.take().map(|h| h.join()) {
            Some(Ok(Ok(bytes))) => String::from_utf8_lossy(&bytes).trim().to_string(),
            _ => String::new(),
        }
    }
}

impl MediaSource for FfmpegSource {
    fn info(&self) -> &SourceInfo {
        &self.info
    }

    #[tracing::instrument(level = "debug", skip(self))]
    fn play(&mut self) -> BrandResult<()> {
        if self.child.is_some() || self.finished {
            return Err(BrandError::validation("source playback was already started"));
        }
        let path = self
            .info
            .path
            .clone()
            .ok_or_else(|| BrandError::validation("source has no backing file"))?;

        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(&path)
            .args([
                "-map",
                "0:v:0",
                "-an",
                "-vf",
                &format!("fps={}/{}", self.fps.num, self.fps.den),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                BrandError::resource(format!(
                    "failed to spawn ffmpeg decoder (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BrandError::resource("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| BrandError::resource("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        let (tx, rx) = sync_channel(DECODE_QUEUE);
        let (width, height, fps) = (self.info.width, self.info.height, self.fps);
        let reader = std::thread::Builder::new()
            .name("reelbrand-decode".to_string())
            .spawn(move || pace_decoded_frames(stdout, tx, width, height, fps))
            .map_err(|e| BrandError::resource(format!("failed to spawn decode thread: {e}")))?;

        self.child = Some(child);
        self.frames = Some(rx);
        self.reader = Some(reader);
        self.stderr_drain = Some(stderr_drain);
        Ok(())
    }

    fn next_event(&mut self) -> MediaEvent {
        if self.finished {
            return MediaEvent::Ended;
        }
        let Some(rx) = self.frames.as_ref() else {
            return MediaEvent::Ended;
        };
        match rx.recv() {
            Ok(DecoderMsg::Frame(frame)) => {
                self.current_time = frame.pts_sec;
                MediaEvent::Frame(frame)
            }
            Ok(DecoderMsg::Failed(message)) => {
                self.stop();
                self.finished = true;
                MediaEvent::Error {
                    code: None,
                    message,
                }
            }
            Ok(DecoderMsg::Eof) | Err(_) => self.finish_decoder(),
        }
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn stop(&mut self) {
        drop(self.frames.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        let _ = self.take_stderr();
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn pace_decoded_frames(
    mut stdout: impl Read,
    tx: SyncSender<DecoderMsg>,
    width: u32,
    height: u32,
    fps: Fps,
) {
    let frame_len = (width as usize) * (height as usize) * 4;
    let clock = Instant::now();
    let mut index: u64 = 0;
    loop {
        let mut rgba = vec![0u8; frame_len];
        match read_full_frame(&mut stdout, &mut rgba) {
            Ok(true) => {}
            Ok(false) => {
                let _ = tx.send(DecoderMsg::Eof);
                return;
            }
            Err(e) => {
                let _ = tx.send(DecoderMsg::Failed(format!("read decoded frame: {e}")));
                return;
            }
        }

        let pts_sec = fps.frames_to_secs(index);
        let due = clock + Duration::from_secs_f64(pts_sec);
        let now = Instant::now();
        if due > now {
            std::thread::sleep(due - now);
        }

        let frame = SourceFrame {
            pts_sec,
            width,
            height,
            rgba,
        };
        if tx.send(DecoderMsg::Frame(frame)).is_err() {
            return;
        }
        index += 1;
    }
}

/// Fill `buf` completely. Returns `Ok(false)` when the stream ends first.
fn read_full_frame(r: &mut impl Read, buf: &mut [u8]) -> std::io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => return Ok(false),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

#[cfg(test)]
#[path = "../../tests/unit/media/ffmpeg.rs"]
mod tests;
