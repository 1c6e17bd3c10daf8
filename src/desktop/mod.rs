//! Desktop configuration probes.
//!
//! Read and write the wallpaper path and the desktop background colour
//! through the shell configuration API, pausing between steps so the
//! change can be watched.

pub mod color;
#[cfg(windows)]
pub mod shell;

use crate::error::ProbeError;

pub use color::{Rgb, DEFAULT_SHIFT};
#[cfg(windows)]
pub use shell::{run_sys_color_probe, run_wallpaper_probe};

/// Checks that the wallpaper read back after the restore step is the one
/// read at the start.
pub fn check_restored(expected: &str, actual: &str) -> Result<(), ProbeError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ProbeError::WallpaperNotRestored {
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}
