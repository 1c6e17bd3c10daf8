//! Error types for the probes.
//!
//! Every probe reports failure through [`ProbeError`]: failing driver and
//! shell calls, readback corruption, descriptor mismatches and usage errors
//! all share the one type and propagate with `?`.

use std::fmt;
#[cfg(windows)]
use std::panic::Location;

use thiserror::Error;

/// First byte of a readback that did not match the upload pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadbackMismatch {
    /// Texture row of the offending byte.
    pub row: u32,
    /// Byte column within the row (not the pixel column).
    pub col: u32,
    /// Value the pattern expects at this position.
    pub expected: u8,
    /// Value read back, or `None` when the mapped data ended early.
    pub actual: Option<u8>,
}

impl ReadbackMismatch {
    pub fn new(row: u32, col: u32, expected: u8, actual: u8) -> Self {
        Self {
            row,
            col,
            expected,
            actual: Some(actual),
        }
    }

    /// Mismatch caused by a buffer too short to hold `(row, col)`.
    pub fn truncated(row: u32, col: u32, expected: u8) -> Self {
        Self {
            row,
            col,
            expected,
            actual: None,
        }
    }
}

impl fmt::Display for ReadbackMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.actual {
            Some(actual) => write!(
                f,
                "row {} byte {}: expected 0x{:02X}, got 0x{:02X}",
                self.row, self.col, self.expected, actual
            ),
            None => write!(
                f,
                "row {} byte {}: expected 0x{:02X}, buffer ended",
                self.row, self.col, self.expected
            ),
        }
    }
}

/// Unified error type for dxprobe operations.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// A Win32, DXGI or D3D11 call returned a failure code.
    #[error("{call} failed at line {line}: {message} (hr 0x{code:08X})")]
    Driver {
        call: &'static str,
        code: i32,
        message: String,
        line: u32,
    },

    /// Data read back from the GPU differs from what was uploaded.
    #[error("read data mismatch: {0}")]
    ReadbackMismatch(ReadbackMismatch),

    /// A texture opened through a shared handle has the wrong size.
    #[error("shared texture is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}")]
    DescriptorMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// No adapter matched the request.
    #[error("no adapter found for vendor {vendor}")]
    NoAdapter { vendor: String },

    /// The wallpaper read back after the restore step is not the original.
    #[error("wallpaper not restored: expected {expected:?}, got {actual:?}")]
    WallpaperNotRestored { expected: String, actual: String },

    /// Some adapters failed a probe that runs on every adapter.
    #[error("{failed} of {total} adapters failed")]
    AdapterFailures { failed: usize, total: usize },

    /// Invalid command-line arguments.
    #[error("{0}")]
    Usage(String),

    /// The probe needs an API this platform does not provide.
    #[error("{0} requires Windows")]
    Unsupported(&'static str),
}

impl From<ReadbackMismatch> for ProbeError {
    fn from(mismatch: ReadbackMismatch) -> Self {
        ProbeError::ReadbackMismatch(mismatch)
    }
}

impl ProbeError {
    /// Builds a [`ProbeError::Driver`] for `call`, recording the caller's line.
    #[cfg(windows)]
    #[track_caller]
    pub fn driver(call: &'static str, err: windows::core::Error) -> Self {
        let line = Location::caller().line();
        ProbeError::Driver {
            call,
            code: err.code().0,
            message: err.message().trim_end().to_string(),
            line,
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProbeError::Usage(_) => -1,
            _ => 1,
        }
    }
}

/// `map_err` adapter: `.map_err(driver_call("CreateTexture2D"))?`.
///
/// The line reported is the line of the `driver_call` invocation.
#[cfg(windows)]
#[track_caller]
pub fn driver_call(call: &'static str) -> impl FnOnce(windows::core::Error) -> ProbeError {
    let line = Location::caller().line();
    move |err| ProbeError::Driver {
        call,
        code: err.code().0,
        message: err.message().trim_end().to_string(),
        line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readback_mismatch_new() {
        let m = ReadbackMismatch::new(3, 7, 10, 11);
        assert_eq!(m.row, 3);
        assert_eq!(m.col, 7);
        assert_eq!(m.expected, 10);
        assert_eq!(m.actual, Some(11));
    }

    #[test]
    fn test_readback_mismatch_display() {
        let msg = ReadbackMismatch::new(1, 2, 0x03, 0xFF).to_string();
        assert!(msg.contains("row 1"));
        assert!(msg.contains("0x03"));
        assert!(msg.contains("0xFF"));

        let msg = ReadbackMismatch::truncated(4, 0, 0x04).to_string();
        assert!(msg.contains("buffer ended"));
    }

    #[test]
    fn test_driver_error_display() {
        let err = ProbeError::Driver {
            call: "Map",
            code: 0x887A0005u32 as i32,
            message: "The GPU device instance has been suspended.".to_string(),
            line: 42,
        };
        let msg = err.to_string();
        assert!(msg.contains("Map failed"));
        assert!(msg.contains("line 42"));
        assert!(msg.contains("0x887A0005"));
        assert!(msg.contains("suspended"));
    }

    #[test]
    fn test_descriptor_mismatch_display() {
        let err = ProbeError::DescriptorMismatch {
            expected_width: 1920,
            expected_height: 1080,
            actual_width: 640,
            actual_height: 480,
        };
        let msg = err.to_string();
        assert!(msg.contains("640x480"));
        assert!(msg.contains("1920x1080"));
    }

    #[test]
    fn test_mismatch_into_probe_error() {
        let err: ProbeError = ReadbackMismatch::new(0, 0, 1, 2).into();
        assert!(matches!(err, ProbeError::ReadbackMismatch(_)));
        assert!(err.to_string().starts_with("read data mismatch"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ProbeError::Usage("bad".into()).exit_code(), -1);
        assert_eq!(ProbeError::Unsupported("transfer").exit_code(), 1);
        assert_eq!(
            ProbeError::NoAdapter {
                vendor: "AMD".into()
            }
            .exit_code(),
            1
        );
    }

    #[test]
    fn test_adapter_failures_display() {
        let err = ProbeError::AdapterFailures {
            failed: 1,
            total: 3,
        };
        assert_eq!(err.to_string(), "1 of 3 adapters failed");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_unsupported_display() {
        let err = ProbeError::Unsupported("wallpaper");
        assert_eq!(err.to_string(), "wallpaper requires Windows");
    }
}
