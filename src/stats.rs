//! Timing accumulation for the transfer probes.
//!
//! Durations are kept as whole microseconds and reported as fractional
//! milliseconds.

use std::fmt;
use std::time::Duration;

/// Converts a duration to the millisecond value printed by the probes.
pub fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_micros() as f64 / 1000.0
}

/// Timings of one host→device, device→host, device→device pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassTimings {
    /// `UpdateSubresource` of the whole texture.
    pub host_to_device: Duration,
    /// `CopyResource` into the staging texture.
    pub download_copy: Duration,
    /// `Map` of the staging texture for reading.
    pub download_map: Duration,
    /// `CopyResource` between two default-usage textures.
    pub device_to_device: Duration,
}

impl PassTimings {
    /// Copy plus map.
    pub fn download_total(&self) -> Duration {
        self.download_copy + self.download_map
    }
}

impl fmt::Display for PassTimings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "HOST -> GPU")?;
        writeln!(f, "\tUpdateSubresource: {}ms", as_millis_f64(self.host_to_device))?;
        writeln!(f, "GPU -> HOST")?;
        writeln!(f, "\tCopyResource: {}ms", as_millis_f64(self.download_copy))?;
        writeln!(f, "\tMap: {}ms", as_millis_f64(self.download_map))?;
        writeln!(f, "\tsum: {}ms", as_millis_f64(self.download_total()))?;
        writeln!(f, "GPU -> GPU")?;
        writeln!(f, "\tCopyResource: {}ms", as_millis_f64(self.device_to_device))
    }
}

/// Running per-stage totals for one adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageTotals {
    host_to_device_us: u64,
    download_total_us: u64,
    download_copy_us: u64,
    download_map_us: u64,
    device_to_device_us: u64,
    passes: u64,
}

impl StageTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Adds one pass to the totals.
    pub fn record(&mut self, pass: &PassTimings) {
        self.host_to_device_us += pass.host_to_device.as_micros() as u64;
        self.download_copy_us += pass.download_copy.as_micros() as u64;
        self.download_map_us += pass.download_map.as_micros() as u64;
        self.download_total_us += pass.download_total().as_micros() as u64;
        self.device_to_device_us += pass.device_to_device.as_micros() as u64;
        self.passes += 1;
    }

    /// Number of passes recorded since the last reset.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn host_to_device_us(&self) -> u64 {
        self.host_to_device_us
    }

    pub fn download_total_us(&self) -> u64 {
        self.download_total_us
    }

    pub fn download_copy_us(&self) -> u64 {
        self.download_copy_us
    }

    pub fn download_map_us(&self) -> u64 {
        self.download_map_us
    }

    pub fn device_to_device_us(&self) -> u64 {
        self.device_to_device_us
    }

    /// Per-pass averages over the recorded passes, zero when none were.
    pub fn averages(&self) -> StageAverages {
        let n = self.passes;
        let avg = |total: u64| {
            if n == 0 {
                0.0
            } else {
                total as f64 / n as f64 / 1000.0
            }
        };
        StageAverages {
            passes: n,
            host_to_device_ms: avg(self.host_to_device_us),
            download_total_ms: avg(self.download_total_us),
            download_copy_ms: avg(self.download_copy_us),
            download_map_ms: avg(self.download_map_us),
            device_to_device_ms: avg(self.device_to_device_us),
        }
    }
}

/// Averaged stage timings in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageAverages {
    pub passes: u64,
    pub host_to_device_ms: f64,
    pub download_total_ms: f64,
    pub download_copy_ms: f64,
    pub download_map_ms: f64,
    pub device_to_device_ms: f64,
}

impl StageAverages {
    /// The five report lines as `(label, milliseconds)`.
    pub fn lines(&self) -> [(&'static str, f64); 5] {
        [
            ("HOST -> GPU", self.host_to_device_ms),
            ("GPU -> HOST", self.download_total_ms),
            ("GPU -> HOST (copy)", self.download_copy_ms),
            ("GPU -> HOST (map)", self.download_map_ms),
            ("GPU -> GPU", self.device_to_device_ms),
        ]
    }
}

impl fmt::Display for StageAverages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, ms) in self.lines() {
            writeln!(f, "{label}: {ms}ms")?;
        }
        Ok(())
    }
}
