//! D3D11 device creation.

use log::debug;
use windows::core::Interface;
use windows::Win32::Foundation::{E_FAIL, HMODULE, TRUE};
use windows::Win32::Graphics::Direct3D::{
    D3D_DRIVER_TYPE_HARDWARE, D3D_DRIVER_TYPE_UNKNOWN, D3D_FEATURE_LEVEL, D3D_FEATURE_LEVEL_10_0,
    D3D_FEATURE_LEVEL_10_1, D3D_FEATURE_LEVEL_11_0, D3D_FEATURE_LEVEL_11_1, D3D_FEATURE_LEVEL_9_1,
    D3D_FEATURE_LEVEL_9_2, D3D_FEATURE_LEVEL_9_3,
};
use windows::Win32::Graphics::Direct3D11::{
    D3D11CreateDevice, ID3D11Device, ID3D11DeviceContext, ID3D11Multithread,
    D3D11_CREATE_DEVICE_BGRA_SUPPORT, D3D11_SDK_VERSION,
};
use windows::Win32::Graphics::Dxgi::{IDXGIAdapter, IDXGIAdapter1};

use crate::error::{driver_call, ProbeError};

const FEATURE_LEVELS: [D3D_FEATURE_LEVEL; 7] = [
    D3D_FEATURE_LEVEL_11_1,
    D3D_FEATURE_LEVEL_11_0,
    D3D_FEATURE_LEVEL_10_1,
    D3D_FEATURE_LEVEL_10_0,
    D3D_FEATURE_LEVEL_9_3,
    D3D_FEATURE_LEVEL_9_2,
    D3D_FEATURE_LEVEL_9_1,
];

/// A device and its immediate context.
#[derive(Clone)]
pub struct DeviceContext {
    pub device: ID3D11Device,
    pub context: ID3D11DeviceContext,
    pub feature_level: D3D_FEATURE_LEVEL,
}

/// Creates a device on `adapter`, or on the default hardware adapter when
/// `adapter` is `None`.
///
/// With an explicit adapter the driver type must be UNKNOWN; without one it
/// is HARDWARE.
pub fn create_device(adapter: Option<&IDXGIAdapter1>) -> Result<DeviceContext, ProbeError> {
    let adapter: Option<IDXGIAdapter> = adapter
        .map(|a| a.cast())
        .transpose()
        .map_err(driver_call("QueryInterface(IDXGIAdapter)"))?;
    let driver_type = if adapter.is_some() {
        D3D_DRIVER_TYPE_UNKNOWN
    } else {
        D3D_DRIVER_TYPE_HARDWARE
    };

    let mut device = None;
    let mut context = None;
    let mut feature_level = D3D_FEATURE_LEVEL::default();
    unsafe {
        D3D11CreateDevice(
            adapter.as_ref(),
            driver_type,
            HMODULE::default(),
            D3D11_CREATE_DEVICE_BGRA_SUPPORT,
            Some(&FEATURE_LEVELS[..]),
            D3D11_SDK_VERSION,
            Some(&mut device),
            Some(&mut feature_level),
            Some(&mut context),
        )
    }
    .map_err(driver_call("D3D11CreateDevice"))?;

    let (Some(device), Some(context)) = (device, context) else {
        return Err(ProbeError::Driver {
            call: "D3D11CreateDevice",
            code: E_FAIL.0,
            message: "no device returned".to_string(),
            line: line!(),
        });
    };
    debug!("created device, feature level 0x{:X}", feature_level.0);

    Ok(DeviceContext {
        device,
        context,
        feature_level,
    })
}

/// Serialises access to the device's immediate context across threads.
///
/// Required before a device takes part in resource sharing.
pub fn enable_multithread_protection(device: &ID3D11Device) -> Result<(), ProbeError> {
    let mt: ID3D11Multithread = device
        .cast()
        .map_err(driver_call("QueryInterface(ID3D11Multithread)"))?;

    let was_protected = unsafe { mt.SetMultithreadProtected(TRUE) };
    if !was_protected.as_bool() && !unsafe { mt.GetMultithreadProtected() }.as_bool() {
        return Err(ProbeError::Driver {
            call: "SetMultithreadProtected",
            code: E_FAIL.0,
            message: "multithread protection could not be enabled".to_string(),
            line: line!(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::d3d11::adapter::enumerate_adapters;

    #[test]
    fn test_create_device_on_each_adapter() {
        let adapters = enumerate_adapters().unwrap();
        if adapters.is_empty() {
            println!("No adapter available, skipping device creation test");
            return;
        }

        for adapter in &adapters {
            let dc = create_device(Some(&adapter.handle)).unwrap();
            assert!(dc.feature_level.0 >= D3D_FEATURE_LEVEL_9_1.0);
            enable_multithread_protection(&dc.device).unwrap();
        }
    }
}
