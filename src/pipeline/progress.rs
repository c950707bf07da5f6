/// Integer percent progress that never decreases within one job.
///
/// Reports 0 until a usable duration is known.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressTracker {
    duration_sec: Option<f64>,
    last: u8,
}

impl ProgressTracker {
    /// Track progress against `duration_sec`; unusable durations are ignored.
    pub fn new(duration_sec: Option<f64>) -> Self {
        Self {
            duration_sec: duration_sec.filter(|d| d.is_finite() && *d > 0.0),
            last: 0,
        }
    }

    /// Percent complete at media time `t`, clamped to `[0, 100]` and to the previous sample.
    pub fn sample(&mut self, t: f64) -> u8 {
        let Some(duration) = self.duration_sec else {
            return self.last;
        };
        if !t.is_finite() {
            return self.last;
        }
        let pct = ((t / duration) * 100.0).round().clamp(0.0, 100.0) as u8;
        self.last = self.last.max(pct);
        self.last
    }

    /// Most recent sample.
    pub fn last(&self) -> u8 {
        self.last
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/progress.rs"]
mod tests;
