//! D3D11 immediate context as a [`TransferDevice`].

use log::debug;
use windows::Win32::Graphics::Direct3D11::{
    ID3D11Device, ID3D11DeviceContext, ID3D11Texture2D, D3D11_BOX, D3D11_TEXTURE2D_DESC,
};

use super::adapter::{enumerate_adapters, Adapter};
use super::device::create_device;
use super::texture::{create_texture, staging_desc, transfer_desc, MappedTexture};
use crate::config::Extent;
use crate::error::ProbeError;
use crate::traits::TransferDevice;

/// Transfer benchmark target on one adapter.
pub struct D3d11Transfer {
    device: ID3D11Device,
    context: ID3D11DeviceContext,
    source: ID3D11Texture2D,
    desc: D3D11_TEXTURE2D_DESC,
    extent: Extent,
    name: String,
}

impl D3d11Transfer {
    /// Creates a device on `adapter` (default hardware adapter for `None`)
    /// and a default-usage source texture of `extent`.
    pub fn new(adapter: Option<&Adapter>, extent: Extent) -> Result<Self, ProbeError> {
        let dc = create_device(adapter.map(|a| &a.handle))?;
        let desc = transfer_desc(extent);
        let source = create_texture(&dc.device, &desc)?;
        let name = adapter.map_or_else(
            || "default hardware adapter".to_string(),
            |a| a.info.name.clone(),
        );
        debug!("transfer target {} ready, {}", name, extent);

        Ok(Self {
            device: dc.device,
            context: dc.context,
            source,
            desc,
            extent,
            name,
        })
    }
}

impl TransferDevice for D3d11Transfer {
    type Texture = ID3D11Texture2D;
    type Mapping = MappedTexture;

    fn description(&self) -> String {
        format!("{} ({})", self.name, self.extent)
    }

    fn extent(&self) -> Extent {
        self.extent
    }

    fn source(&self) -> &ID3D11Texture2D {
        &self.source
    }

    fn update_source(&self, data: &[u8], row_pitch: u32) -> Result<(), ProbeError> {
        let region = D3D11_BOX {
            left: 0,
            top: 0,
            front: 0,
            right: self.extent.width,
            bottom: self.extent.height,
            back: 1,
        };
        unsafe {
            self.context.UpdateSubresource(
                &self.source,
                0,
                Some(&region),
                data.as_ptr().cast(),
                row_pitch,
                data.len() as u32,
            )
        };
        Ok(())
    }

    fn create_staging(&self) -> Result<ID3D11Texture2D, ProbeError> {
        create_texture(&self.device, &staging_desc(&self.desc))
    }

    fn create_peer(&self) -> Result<ID3D11Texture2D, ProbeError> {
        create_texture(&self.device, &self.desc)
    }

    fn copy(&self, dst: &ID3D11Texture2D, src: &ID3D11Texture2D) -> Result<(), ProbeError> {
        unsafe { self.context.CopyResource(dst, src) };
        Ok(())
    }

    fn map_read(&self, staging: &ID3D11Texture2D) -> Result<MappedTexture, ProbeError> {
        MappedTexture::map_read(&self.context, staging, self.extent)
    }
}

/// Adapters a transfer probe runs on: every enumerated adapter when `all`
/// is set, otherwise just the default one (`None`).
pub fn transfer_targets(all: bool) -> Result<Vec<Option<Adapter>>, ProbeError> {
    if !all {
        return Ok(vec![None]);
    }
    Ok(enumerate_adapters()?.into_iter().map(Some).collect())
}
