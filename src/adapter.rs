//! Adapter identification: vendors, LUIDs and printable descriptions.
//!
//! Enumeration itself lives in the platform module; this module holds the
//! parts that are plain data.

use std::fmt;

use bytesize::ByteSize;
use clap::ValueEnum;

/// GPU vendors the sharing probe can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Vendor {
    Amd,
    Intel,
    Nvidia,
}

impl Vendor {
    /// PCI vendor ID reported in the DXGI adapter descriptor.
    pub fn id(self) -> u32 {
        match self {
            Vendor::Amd => 0x1002,
            Vendor::Intel => 0x8086,
            Vendor::Nvidia => 0x10DE,
        }
    }

    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0x1002 => Some(Vendor::Amd),
            0x8086 => Some(Vendor::Intel),
            0x10DE => Some(Vendor::Nvidia),
            _ => None,
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&vendor_name(self.id()))
    }
}

/// Convert vendor ID to human-readable name.
pub fn vendor_name(vendor_id: u32) -> String {
    match vendor_id {
        0x1002 => "AMD".to_string(),
        0x1010 => "ImgTec".to_string(),
        0x10DE => "NVIDIA".to_string(),
        0x13B5 => "ARM".to_string(),
        0x1414 => "Microsoft".to_string(),
        0x5143 => "Qualcomm".to_string(),
        0x8086 => "Intel".to_string(),
        _ => format!("Unknown (0x{:04X})", vendor_id),
    }
}

/// Locally-unique adapter identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Luid {
    pub high: i32,
    pub low: u32,
}

impl Luid {
    pub fn new(high: i32, low: u32) -> Self {
        Self { high, low }
    }
}

impl fmt::Display for Luid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}:{:08X}", self.high, self.low)
    }
}

/// Information about an enumerated adapter.
#[derive(Debug, Clone)]
pub struct AdapterInfo {
    /// Index in the enumeration order.
    pub index: u32,
    /// Driver-reported description (e.g., "AMD Radeon RX 7900 XTX").
    pub name: String,
    pub vendor_id: u32,
    pub device_id: u32,
    pub luid: Luid,
    /// Dedicated VRAM in bytes.
    pub dedicated_video_memory: u64,
    /// Software rasterizer such as WARP or the basic render driver.
    pub software: bool,
}

impl AdapterInfo {
    pub fn vendor(&self) -> Option<Vendor> {
        Vendor::from_id(self.vendor_id)
    }
}

impl fmt::Display for AdapterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}, luid {}, {}",
            self.index,
            self.name,
            vendor_name(self.vendor_id),
            self.luid,
            ByteSize::b(self.dedicated_video_memory)
        )?;
        if self.software {
            write!(f, ", software")?;
        }
        write!(f, ")")
    }
}

/// Decodes a NUL-terminated UTF-16 buffer such as `DXGI_ADAPTER_DESC1::Description`.
pub fn decode_wide(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}
