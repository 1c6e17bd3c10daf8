//! Cross-device texture sharing through legacy shared handles.

use log::{debug, info, warn};
use windows::core::Interface;
use windows::Win32::Graphics::Direct3D11::ID3D11Texture2D;
use windows::Win32::Graphics::Dxgi::IDXGIResource;

use super::adapter::{adapters_for_vendor, Adapter};
use super::device::{create_device, enable_multithread_protection};
use super::texture::{create_texture, shared_desc, texture_extent};
use crate::adapter::Vendor;
use crate::error::{driver_call, ProbeError};
use crate::share::{check_shared_extent, ShareOutcome, ShareStep, SHARED_EXTENT};

/// Creates a shared texture on a device on `producer`, opens it on a
/// device on `consumer` and checks the size the consumer sees.
pub fn probe_pair(
    step: ShareStep,
    producer: &Adapter,
    consumer: &Adapter,
) -> Result<ShareOutcome, ProbeError> {
    let dev1 = create_device(Some(&producer.handle))?;
    enable_multithread_protection(&dev1.device)?;
    let dev2 = create_device(Some(&consumer.handle))?;
    enable_multithread_protection(&dev2.device)?;

    let texture = create_texture(&dev1.device, &shared_desc(SHARED_EXTENT))?;
    let resource: IDXGIResource = texture
        .cast()
        .map_err(driver_call("QueryInterface(IDXGIResource)"))?;
    let handle = unsafe { resource.GetSharedHandle() }.map_err(driver_call("GetSharedHandle"))?;
    debug!("shared handle {:?} from {}", handle, producer.info.name);

    let opened: ID3D11Texture2D = unsafe { dev2.device.OpenSharedResource(handle) }
        .map_err(driver_call("OpenSharedResource"))?;
    let extent = texture_extent(&opened);
    check_shared_extent(SHARED_EXTENT, extent)?;

    let outcome = ShareOutcome {
        step,
        producer: producer.info.luid,
        consumer: consumer.info.luid,
        extent,
    };
    info!(
        "{}: {} texture opened on {}",
        step.label(),
        outcome.extent,
        consumer.info.name
    );
    Ok(outcome)
}

/// Runs the sharing probe over the adapters of `vendor`.
///
/// Every adapter shares with itself, then the first adapter of two
/// separate enumerations share with each other. With two or more adapters
/// the first and second are tried as well; that step is allowed to fail.
pub fn run_share_probe(vendor: Vendor) -> Result<(), ProbeError> {
    let first = adapters_for_vendor(vendor)?;
    let second = adapters_for_vendor(vendor)?;
    if first.is_empty() || second.is_empty() {
        return Err(ProbeError::NoAdapter {
            vendor: vendor.to_string(),
        });
    }
    info!("{} {} adapter(s)", first.len(), vendor);

    for adapter in &first {
        let outcome = probe_pair(ShareStep::SameAdapter, adapter, adapter)?;
        println!("{outcome}");
    }

    println!("same luid");
    let outcome = probe_pair(ShareStep::SameLuid, &first[0], &second[0])?;
    println!("{outcome}");

    if let Some(other) = second.get(1) {
        println!("different luid");
        let step = ShareStep::DifferentLuid;
        match probe_pair(step, &first[0], other) {
            Ok(outcome) => println!("{outcome}"),
            Err(e) if step.failure_expected() => {
                warn!("cross-adapter share failed: {}", e);
                println!("{}: failed as expected: {e}", step.label());
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
