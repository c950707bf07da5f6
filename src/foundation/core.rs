use crate::foundation::error::{BrandError, BrandResult};

pub use kurbo::{Affine, Rect};

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> BrandResult<Self> {
        if den == 0 {
            return Err(BrandError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(BrandError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Convert frame count to seconds.
    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Parse an ffprobe-style rational such as `30000/1001` or `25`.
    ///
    /// Returns `None` for `0/0` and other degenerate values.
    pub fn parse_rational(s: &str) -> Option<Self> {
        let s = s.trim();
        let (num, den) = match s.split_once('/') {
            Some((n, d)) => (n.trim().parse().ok()?, d.trim().parse().ok()?),
            None => (s.parse().ok()?, 1),
        };
        Self::new(num, den).ok()
    }
}

/// Output raster dimensions in pixels.
///
/// Both sides are always even and at least 2, as required by 4:2:0 encoders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameDimensions {
    /// Largest supported side length (raster surfaces address pixels with `u16`).
    pub const MAX_SIDE: u32 = u16::MAX as u32;

    /// Derive output dimensions from a source's native size by rounding each side down to the
    /// nearest even value.
    pub fn from_native(width: u32, height: u32) -> BrandResult<Self> {
        let even_w = width - (width % 2);
        let even_h = height - (height % 2);
        if even_w < 2 || even_h < 2 {
            return Err(BrandError::unsupported_input(format!(
                "source dimensions {width}x{height} are too small to encode"
            )));
        }
        if even_w > Self::MAX_SIDE || even_h > Self::MAX_SIDE {
            return Err(BrandError::unsupported_input(format!(
                "source dimensions {width}x{height} exceed the {} pixel limit",
                Self::MAX_SIDE
            )));
        }
        Ok(Self {
            width: even_w,
            height: even_h,
        })
    }

    /// Width as `f32` for layout math.
    pub fn width_f32(self) -> f32 {
        self.width as f32
    }

    /// Height as `f32` for layout math.
    pub fn height_f32(self) -> f32 {
        self.height as f32
    }

    /// Number of bytes in one RGBA8 frame of this size.
    pub fn rgba8_len(self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }

    pub(crate) fn width_u16(self) -> u16 {
        self.width as u16
    }

    pub(crate) fn height_u16(self) -> u16 {
        self.height as u16
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
