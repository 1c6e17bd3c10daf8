//! System colour values.

use std::fmt;

/// Shift applied by the colour probe, per channel.
pub const DEFAULT_SHIFT: (u8, u8, u8) = (0x20, 0x40, 0x60);

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Unpacks a Win32 `COLORREF` (`0x00BBGGRR`).
    pub fn from_colorref(value: u32) -> Self {
        Self::new(
            (value & 0xFF) as u8,
            ((value >> 8) & 0xFF) as u8,
            ((value >> 16) & 0xFF) as u8,
        )
    }

    /// Packs into a Win32 `COLORREF`.
    pub fn to_colorref(self) -> u32 {
        u32::from(self.r) | (u32::from(self.g) << 8) | (u32::from(self.b) << 16)
    }

    /// Adds the deltas channel by channel, wrapping at 256.
    pub fn shifted(self, (dr, dg, db): (u8, u8, u8)) -> Self {
        Self {
            r: self.r.wrapping_add(dr),
            g: self.g.wrapping_add(dg),
            b: self.b.wrapping_add(db),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{0x{:x}, 0x{:x}, 0x{:x}}}", self.r, self.g, self.b)
    }
}
