//! DXGI adapter enumeration.

use log::debug;
use windows::Win32::Graphics::Dxgi::{
    CreateDXGIFactory1, IDXGIAdapter1, IDXGIFactory1, DXGI_ADAPTER_DESC1,
    DXGI_ADAPTER_FLAG_SOFTWARE, DXGI_ERROR_NOT_FOUND,
};

use crate::adapter::{decode_wide, AdapterInfo, Luid, Vendor};
use crate::error::{driver_call, ProbeError};

/// An enumerated adapter together with its description.
#[derive(Clone)]
pub struct Adapter {
    pub handle: IDXGIAdapter1,
    pub info: AdapterInfo,
}

fn adapter_info(index: u32, desc: &DXGI_ADAPTER_DESC1) -> AdapterInfo {
    AdapterInfo {
        index,
        name: decode_wide(&desc.Description),
        vendor_id: desc.VendorId,
        device_id: desc.DeviceId,
        luid: Luid::new(desc.AdapterLuid.HighPart, desc.AdapterLuid.LowPart),
        dedicated_video_memory: desc.DedicatedVideoMemory as u64,
        software: desc.Flags & DXGI_ADAPTER_FLAG_SOFTWARE.0 as u32 != 0,
    }
}

/// Enumerate all adapters in DXGI order.
///
/// Enumeration stops at `DXGI_ERROR_NOT_FOUND`; any other failure is
/// returned.
pub fn enumerate_adapters() -> Result<Vec<Adapter>, ProbeError> {
    let factory: IDXGIFactory1 =
        unsafe { CreateDXGIFactory1() }.map_err(driver_call("CreateDXGIFactory1"))?;

    let mut adapters = Vec::new();
    for index in 0u32.. {
        let handle = match unsafe { factory.EnumAdapters1(index) } {
            Ok(handle) => handle,
            Err(e) if e.code() == DXGI_ERROR_NOT_FOUND => break,
            Err(e) => return Err(ProbeError::driver("EnumAdapters1", e)),
        };
        let desc = unsafe { handle.GetDesc1() }.map_err(driver_call("GetDesc1"))?;
        let info = adapter_info(index, &desc);
        debug!("adapter {} device 0x{:04X}", info, info.device_id);
        adapters.push(Adapter { handle, info });
    }
    Ok(adapters)
}

/// Adapters whose PCI vendor ID matches `vendor`, in enumeration order.
pub fn adapters_for_vendor(vendor: Vendor) -> Result<Vec<Adapter>, ProbeError> {
    Ok(enumerate_adapters()?
        .into_iter()
        .filter(|a| a.info.vendor_id == vendor.id())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerate_adapters_returns_list() {
        // WARP is always present on desktop Windows, but CI images vary.
        let adapters = enumerate_adapters().unwrap();
        for (i, adapter) in adapters.iter().enumerate() {
            assert_eq!(adapter.info.index as usize, i);
            assert!(!adapter.info.name.is_empty());
        }
    }

    #[test]
    fn test_vendor_filter() {
        for vendor in [Vendor::Amd, Vendor::Intel, Vendor::Nvidia] {
            for adapter in adapters_for_vendor(vendor).unwrap() {
                assert_eq!(adapter.info.vendor(), Some(vendor));
            }
        }
    }
}
