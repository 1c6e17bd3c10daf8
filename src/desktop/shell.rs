//! Win32 wallpaper and system-colour calls.

use std::ffi::c_void;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use log::{debug, info};
use windows::Win32::Foundation::{COLORREF, MAX_PATH};
use windows::Win32::Graphics::Gdi::{GetSysColor, SetSysColors, COLOR_BACKGROUND, COLOR_DESKTOP};
use windows::Win32::UI::WindowsAndMessaging::{
    SystemParametersInfoW, SPI_GETDESKWALLPAPER, SPI_SETDESKWALLPAPER,
    SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS,
};

use super::check_restored;
use super::color::{Rgb, DEFAULT_SHIFT};
use crate::adapter::decode_wide;
use crate::error::{driver_call, ProbeError};

/// Changes apply to the session only; nothing is written to the profile.
const NO_PERSIST: SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS = SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS(0);

/// Returns the current wallpaper path; empty when none is set.
pub fn wallpaper() -> Result<String, ProbeError> {
    let mut buf = [0u16; MAX_PATH as usize];
    unsafe {
        SystemParametersInfoW(
            SPI_GETDESKWALLPAPER,
            buf.len() as u32,
            Some(buf.as_mut_ptr().cast::<c_void>()),
            NO_PERSIST,
        )
    }
    .map_err(driver_call("SystemParametersInfoW(SPI_GETDESKWALLPAPER)"))?;
    Ok(decode_wide(&buf))
}

/// Sets the wallpaper to `path`, or clears it when `path` is `None`.
pub fn set_wallpaper(path: Option<&str>) -> Result<(), ProbeError> {
    let mut wide: Option<Vec<u16>> =
        path.map(|p| p.encode_utf16().chain(std::iter::once(0)).collect());
    let param = wide.as_mut().map(|w| w.as_mut_ptr().cast::<c_void>());

    debug!("SPI_SETDESKWALLPAPER {:?}", path);
    unsafe { SystemParametersInfoW(SPI_SETDESKWALLPAPER, 0, param, NO_PERSIST) }
        .map_err(driver_call("SystemParametersInfoW(SPI_SETDESKWALLPAPER)"))
}

/// Reads the desktop colour.
pub fn desktop_color() -> Rgb {
    Rgb::from_colorref(unsafe { GetSysColor(COLOR_DESKTOP) })
}

/// Writes the desktop background colour.
pub fn set_background_color(color: Rgb) -> Result<(), ProbeError> {
    let elements = [COLOR_BACKGROUND.0 as i32];
    let values = [COLORREF(color.to_colorref())];
    unsafe { SetSysColors(1, elements.as_ptr(), values.as_ptr()) }
        .map_err(driver_call("SetSysColors"))
}

/// Wallpaper probe: optionally show `image`, clear the wallpaper, then put
/// the original back and check it reads back unchanged.
pub fn run_wallpaper_probe(image: Option<&Path>, delay: Duration) -> Result<(), ProbeError> {
    let original = wallpaper()?;
    println!("{original}");

    if let Some(image) = image {
        println!("set to {}", image.display());
        set_wallpaper(Some(&image.to_string_lossy()))?;
        sleep(delay);
    }

    println!("set to NULL");
    set_wallpaper(None)?;
    sleep(delay);

    println!("set to old");
    set_wallpaper(Some(&original))?;

    let restored = wallpaper()?;
    check_restored(&original, &restored)?;
    info!("wallpaper restored to {:?}", restored);
    println!("wallpaper: OK");
    Ok(())
}

/// System-colour probe: shift the desktop background colour, then restore it.
pub fn run_sys_color_probe(delay: Duration) -> Result<(), ProbeError> {
    let original = desktop_color();
    println!("GetSysColor: {original}");
    sleep(delay);

    let shifted = original.shifted(DEFAULT_SHIFT);
    set_background_color(shifted)?;
    println!("SetSysColors: {shifted}");
    sleep(delay);

    set_background_color(original)?;
    println!("restored: {original}");
    Ok(())
}
