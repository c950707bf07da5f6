//! Per-job configuration: the overlay record supplied by the caller and the fixed capture
//! settings.

use std::ops::RangeInclusive;
use std::path::Path;

use crate::foundation::core::Fps;
use crate::foundation::error::{BrandError, BrandResult};

/// Fixed capture frame rate of the output stream.
pub const CAPTURE_FPS: Fps = Fps { num: 30, den: 1 };
/// Target video bitrate in bits per second.
pub const TARGET_BITRATE: u32 = 8_000_000;
/// Default depth of the encoder writer queue, in frames.
pub const DEFAULT_WRITER_QUEUE: usize = 8;
/// Environment variable naming an extra font directory for discovery.
pub const FONT_DIR_ENV: &str = "REELBRAND_FONT_DIR";
/// Scale range offered by interactive front-ends. The pipeline accepts any positive scale.
pub const RECOMMENDED_SCALE_RANGE: RangeInclusive<f32> = 0.5..=2.0;

fn default_scale() -> f32 {
    1.0
}

/// Branding text and per-field scale factors for one job.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OverlayConfig {
    /// Address block; `\n` starts a new paragraph.
    #[serde(default)]
    pub address_text: String,
    /// Phone number, rendered on a single line.
    #[serde(default)]
    pub mobile_text: String,
    /// Multiplier applied to the frame-relative address font size.
    #[serde(default = "default_scale")]
    pub address_scale: f32,
    /// Multiplier applied to the frame-relative mobile font size.
    #[serde(default = "default_scale")]
    pub mobile_scale: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self::new("", "")
    }
}

impl OverlayConfig {
    /// Create a config with both scales at 1.0.
    pub fn new(address_text: impl Into<String>, mobile_text: impl Into<String>) -> Self {
        Self {
            address_text: address_text.into(),
            mobile_text: mobile_text.into(),
            address_scale: default_scale(),
            mobile_scale: default_scale(),
        }
    }

    /// Replace both scale factors.
    pub fn with_scales(mut self, address_scale: f32, mobile_scale: f32) -> Self {
        self.address_scale = address_scale;
        self.mobile_scale = mobile_scale;
        self
    }

    /// Check that both scales are finite and strictly positive.
    pub fn validate(&self) -> BrandResult<()> {
        for (name, v) in [
            ("addressScale", self.address_scale),
            ("mobileScale", self.mobile_scale),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(BrandError::validation(format!(
                    "{name} must be finite and > 0 (got {v})"
                )));
            }
        }
        Ok(())
    }

    /// Return `true` when both scales fall inside [`RECOMMENDED_SCALE_RANGE`].
    pub fn scales_within_recommended_range(&self) -> bool {
        RECOMMENDED_SCALE_RANGE.contains(&self.address_scale)
            && RECOMMENDED_SCALE_RANGE.contains(&self.mobile_scale)
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(s: &str) -> BrandResult<Self> {
        let cfg: Self = serde_json::from_str(s).map_err(|e| BrandError::serde(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_path(path: &Path) -> BrandResult<Self> {
        use anyhow::Context as _;
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read overlay config '{}'", path.display()))?;
        Self::from_json_str(&s)
    }
}

/// Capture and encoder settings for one job.
#[derive(Clone, Debug, PartialEq)]
pub struct JobSettings {
    /// Output capture rate.
    pub capture_fps: Fps,
    /// Target video bitrate in bits per second.
    pub bitrate: u32,
    /// Frames buffered between the capture clock and the encoder before frames are dropped.
    pub writer_queue: usize,
    /// Drop frames when the writer queue is full instead of waiting for the encoder.
    ///
    /// Real-time sources keep this on so a slow encoder never stalls playback.
    pub drop_when_busy: bool,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            capture_fps: CAPTURE_FPS,
            bitrate: TARGET_BITRATE,
            writer_queue: DEFAULT_WRITER_QUEUE,
            drop_when_busy: true,
        }
    }
}

impl JobSettings {
    /// Check that rates and queue depth are usable.
    pub fn validate(&self) -> BrandResult<()> {
        Fps::new(self.capture_fps.num, self.capture_fps.den)?;
        if self.bitrate == 0 {
            return Err(BrandError::validation("bitrate must be > 0"));
        }
        if self.writer_queue == 0 {
            return Err(BrandError::validation("writer_queue must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
