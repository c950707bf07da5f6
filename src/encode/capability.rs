use std::collections::BTreeSet;
use std::process::Command;

/// One preferred output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecCandidate {
    /// MIME-style identifier, also used as the negotiated media type.
    pub mime: &'static str,
    /// Muxer name.
    pub container: &'static str,
    /// Video encoder; `None` uses the container default.
    pub video_codec: Option<&'static str>,
    /// Audio encoder; `None` uses the container default.
    pub audio_codec: Option<&'static str>,
}

/// Preference-ordered output formats.
pub const CODEC_CANDIDATES: [CodecCandidate; 3] = [
    CodecCandidate {
        mime: "video/mp4;codecs=avc1",
        container: "mp4",
        video_codec: Some("libx264"),
        audio_codec: Some("aac"),
    },
    CodecCandidate {
        mime: "video/webm;codecs=vp9",
        container: "webm",
        video_codec: Some("libvpx-vp9"),
        audio_codec: Some("libopus"),
    },
    CodecCandidate {
        mime: "video/webm",
        container: "webm",
        video_codec: None,
        audio_codec: None,
    },
];

/// Container used when no candidate is selected.
pub const DEFAULT_CONTAINER: &str = "matroska";
/// Media type reported for [`DEFAULT_CONTAINER`] output.
pub const DEFAULT_MEDIA_TYPE: &str = "video/x-matroska";

/// Host encoding capabilities.
pub trait CapabilityProbe {
    /// Whether the host can write `container`.
    fn supports_container(&self, container: &str) -> bool;
    /// Whether the host has the encoder `codec`.
    fn supports_encoder(&self, codec: &str) -> bool;
}

impl CodecCandidate {
    /// Whether every part of this candidate is available on `probe`.
    pub fn is_supported_by(&self, probe: &dyn CapabilityProbe) -> bool {
        probe.supports_container(self.container)
            && self.video_codec.is_none_or(|c| probe.supports_encoder(c))
            && self.audio_codec.is_none_or(|c| probe.supports_encoder(c))
    }
}

/// The output format chosen for a job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderSelection {
    /// Selected candidate; `None` lets the platform default decide.
    pub candidate: Option<CodecCandidate>,
    /// Target video bitrate; `None` uses the encoder default.
    pub bitrate: Option<u32>,
}

impl EncoderSelection {
    /// Unqualified platform default: no explicit codecs, no bitrate.
    pub fn platform_default() -> Self {
        Self {
            candidate: None,
            bitrate: None,
        }
    }

    /// Whether this is the unqualified default.
    pub fn is_platform_default(&self) -> bool {
        self.candidate.is_none() && self.bitrate.is_none()
    }

    /// Candidate id, or `""` for the platform default.
    pub fn mime_or_codec_id(&self) -> &'static str {
        self.candidate.map(|c| c.mime).unwrap_or("")
    }

    /// Muxer to use.
    pub fn container(&self) -> &'static str {
        self.candidate.map(|c| c.container).unwrap_or(DEFAULT_CONTAINER)
    }

    /// Media type of the produced artifact.
    pub fn media_type(&self) -> &'static str {
        self.candidate.map(|c| c.mime).unwrap_or(DEFAULT_MEDIA_TYPE)
    }
}

/// Pick the first candidate supported by `probe`, or the platform default when none is.
pub fn select_encoder(
    probe: &dyn CapabilityProbe,
    candidates: &[CodecCandidate],
    bitrate: Option<u32>,
) -> EncoderSelection {
    match candidates.iter().find(|c| c.is_supported_by(probe)) {
        Some(c) => {
            tracing::debug!(mime = c.mime, "selected encoder candidate");
            EncoderSelection {
                candidate: Some(*c),
                bitrate,
            }
        }
        None => {
            tracing::warn!("no preferred codec is supported; using the platform default");
            EncoderSelection::platform_default()
        }
    }
}

/// Fixed capability table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticCapabilities {
    containers: BTreeSet<String>,
    encoders: BTreeSet<String>,
}

impl StaticCapabilities {
    /// Build from explicit container and encoder names.
    pub fn new<'a>(
        containers: impl IntoIterator<Item = &'a str>,
        encoders: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            containers: containers.into_iter().map(str::to_string).collect(),
            encoders: encoders.into_iter().map(str::to_string).collect(),
        }
    }
}

impl CapabilityProbe for StaticCapabilities {
    fn supports_container(&self, container: &str) -> bool {
        self.containers.contains(container)
    }

    fn supports_encoder(&self, codec: &str) -> bool {
        self.encoders.contains(codec)
    }
}

/// Capabilities of the `ffmpeg` on `PATH`, queried once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FfmpegCapabilities {
    table: StaticCapabilities,
}

impl FfmpegCapabilities {
    /// Run `ffmpeg -muxers` and `ffmpeg -encoders`. An unavailable ffmpeg yields an empty
    /// table, which selects the platform default.
    pub fn query() -> Self {
        let muxers = run_listing("-muxers");
        let encoders = run_listing("-encoders");
        Self::from_listings(&muxers, &encoders)
    }

    /// Parse captured `-muxers` and `-encoders` listings.
    pub fn from_listings(muxers: &str, encoders: &str) -> Self {
        Self {
            table: StaticCapabilities {
                containers: parse_listing(muxers),
                encoders: parse_listing(encoders),
            },
        }
    }
}

impl CapabilityProbe for FfmpegCapabilities {
    fn supports_container(&self, container: &str) -> bool {
        self.table.supports_container(container)
    }

    fn supports_encoder(&self, codec: &str) -> bool {
        self.table.supports_encoder(codec)
    }
}

fn run_listing(flag: &str) -> String {
    match Command::new("ffmpeg").args(["-hide_banner", flag]).output() {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).into_owned(),
        Ok(out) => {
            tracing::warn!(flag, status = %out.status, "ffmpeg capability listing failed");
            String::new()
        }
        Err(e) => {
            tracing::warn!(flag, error = %e, "ffmpeg is not available for capability probing");
            String::new()
        }
    }
}

/// Names from an ffmpeg `-muxers`/`-encoders` table: every row after the `--` separator is
/// `<flags> <name[,alias...]> <description>`.
fn parse_listing(listing: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let mut in_table = false;
    for line in listing.lines() {
        let trimmed = line.trim();
        if !in_table {
            in_table = trimmed.starts_with("--");
            continue;
        }
        let mut cols = trimmed.split_whitespace();
        let (Some(_flags), Some(name)) = (cols.next(), cols.next()) else {
            continue;
        };
        names.extend(name.split(',').filter(|n| !n.is_empty()).map(str::to_string));
    }
    names
}

#[cfg(test)]
#[path = "../../tests/unit/encode/capability.rs"]
mod tests;
