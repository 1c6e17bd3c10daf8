//! Direct3D11/DXGI implementation of the probes.
//!
//! Everything here calls straight into the driver through the `windows`
//! crate. COM interfaces release themselves on drop; mapped textures are
//! unmapped by [`texture::MappedTexture`].

pub mod adapter;
pub mod device;
pub mod share;
pub mod texture;
pub mod transfer;

pub use adapter::enumerate_adapters;
pub use share::run_share_probe;
pub use transfer::{transfer_targets, D3d11Transfer};
