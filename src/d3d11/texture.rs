//! Texture descriptors, creation and CPU mapping.

use log::debug;
use windows::Win32::Foundation::E_POINTER;
use windows::Win32::Graphics::Direct3D11::{
    ID3D11Device, ID3D11DeviceContext, ID3D11Texture2D, D3D11_BIND_RENDER_TARGET,
    D3D11_BIND_SHADER_RESOURCE, D3D11_CPU_ACCESS_READ, D3D11_MAPPED_SUBRESOURCE, D3D11_MAP_READ,
    D3D11_RESOURCE_MISC_SHARED, D3D11_TEXTURE2D_DESC, D3D11_USAGE_DEFAULT, D3D11_USAGE_STAGING,
};
use windows::Win32::Graphics::Dxgi::Common::{
    DXGI_FORMAT, DXGI_FORMAT_B8G8R8A8_UNORM, DXGI_FORMAT_R8G8B8A8_UNORM, DXGI_SAMPLE_DESC,
};

use crate::config::{Extent, BYTES_PER_PIXEL};
use crate::error::{driver_call, ProbeError};
use crate::traits::MappedView;

fn base_desc(extent: Extent, format: DXGI_FORMAT) -> D3D11_TEXTURE2D_DESC {
    D3D11_TEXTURE2D_DESC {
        Width: extent.width,
        Height: extent.height,
        MipLevels: 1,
        ArraySize: 1,
        Format: format,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Usage: D3D11_USAGE_DEFAULT,
        BindFlags: D3D11_BIND_SHADER_RESOURCE.0 as u32,
        CPUAccessFlags: 0,
        MiscFlags: 0,
    }
}

/// Default-usage RGBA texture used as the transfer source.
pub fn transfer_desc(extent: Extent) -> D3D11_TEXTURE2D_DESC {
    base_desc(extent, DXGI_FORMAT_R8G8B8A8_UNORM)
}

/// BGRA render target that other devices may open through a shared handle.
pub fn shared_desc(extent: Extent) -> D3D11_TEXTURE2D_DESC {
    D3D11_TEXTURE2D_DESC {
        BindFlags: (D3D11_BIND_SHADER_RESOURCE.0 | D3D11_BIND_RENDER_TARGET.0) as u32,
        MiscFlags: D3D11_RESOURCE_MISC_SHARED.0 as u32,
        ..base_desc(extent, DXGI_FORMAT_B8G8R8A8_UNORM)
    }
}

/// CPU-readable staging variant of `desc`: same size and format, no binding.
pub fn staging_desc(desc: &D3D11_TEXTURE2D_DESC) -> D3D11_TEXTURE2D_DESC {
    D3D11_TEXTURE2D_DESC {
        Usage: D3D11_USAGE_STAGING,
        CPUAccessFlags: D3D11_CPU_ACCESS_READ.0 as u32,
        BindFlags: 0,
        MiscFlags: 0,
        ..*desc
    }
}

pub fn create_texture(
    device: &ID3D11Device,
    desc: &D3D11_TEXTURE2D_DESC,
) -> Result<ID3D11Texture2D, ProbeError> {
    let mut texture = None;
    unsafe { device.CreateTexture2D(desc, None, Some(&mut texture)) }
        .map_err(driver_call("CreateTexture2D"))?;
    debug!(
        "created {}x{} texture, usage {}",
        desc.Width, desc.Height, desc.Usage.0
    );
    texture.ok_or_else(|| ProbeError::Driver {
        call: "CreateTexture2D",
        code: E_POINTER.0,
        message: "no texture returned".to_string(),
        line: line!(),
    })
}

/// Size of `texture` as reported by its descriptor.
pub fn texture_extent(texture: &ID3D11Texture2D) -> Extent {
    let mut desc = D3D11_TEXTURE2D_DESC::default();
    unsafe { texture.GetDesc(&mut desc) };
    Extent::new(desc.Width, desc.Height)
}

/// A staging texture mapped for reading. Unmapped on drop.
pub struct MappedTexture {
    context: ID3D11DeviceContext,
    texture: ID3D11Texture2D,
    data: *const u8,
    len: usize,
    row_pitch: usize,
}

impl MappedTexture {
    /// Maps subresource 0 of `texture` with `D3D11_MAP_READ`.
    ///
    /// Blocks until the GPU has finished writing the texture.
    pub fn map_read(
        context: &ID3D11DeviceContext,
        texture: &ID3D11Texture2D,
        extent: Extent,
    ) -> Result<Self, ProbeError> {
        let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
        unsafe { context.Map(texture, 0, D3D11_MAP_READ, 0, Some(&mut mapped)) }
            .map_err(driver_call("Map"))?;

        let row_pitch = mapped.RowPitch as usize;
        // The last row is only guaranteed to hold its texels, not a full pitch.
        let len = match extent.height as usize {
            0 => 0,
            rows => row_pitch * (rows - 1) + (extent.width * BYTES_PER_PIXEL) as usize,
        };

        Ok(Self {
            context: context.clone(),
            texture: texture.clone(),
            data: mapped.pData as *const u8,
            len,
            row_pitch,
        })
    }
}

impl MappedView for MappedTexture {
    fn bytes(&self) -> &[u8] {
        if self.data.is_null() {
            return &[];
        }
        // SAFETY: the subresource stays mapped until `self` drops, and the
        // driver maps at least `len` bytes for a texture of this extent.
        unsafe { std::slice::from_raw_parts(self.data, self.len) }
    }

    fn row_pitch(&self) -> usize {
        self.row_pitch
    }
}

impl Drop for MappedTexture {
    fn drop(&mut self) {
        unsafe { self.context.Unmap(&self.texture, 0) };
    }
}
