//! Core traits for the transfer probes.
//!
//! The benchmark logic in [`crate::transfer`] drives a device through
//! [`TransferDevice`]; the D3D11 immediate context implements it on Windows.

use crate::config::Extent;
use crate::error::ProbeError;

/// CPU view of a mapped staging texture. Unmaps when dropped.
pub trait MappedView {
    /// Mapped bytes. Every row but the last spans `row_pitch()` bytes; the
    /// last holds only its texels.
    fn bytes(&self) -> &[u8];

    /// Distance in bytes between the starts of consecutive rows.
    fn row_pitch(&self) -> usize;
}

/// A device that owns one default-usage source texture and can move data
/// between it, the host and other textures it creates.
///
/// Each method wraps exactly one driver call (or one resource creation) so
/// callers can time the calls in isolation.
pub trait TransferDevice {
    /// Texture handle type.
    type Texture;
    /// Mapped staging texture.
    type Mapping: MappedView;

    /// Human-readable description of the device.
    fn description(&self) -> String;

    /// Size of the source texture.
    fn extent(&self) -> Extent;

    /// The default-usage texture every transfer starts from.
    fn source(&self) -> &Self::Texture;

    /// Writes `data` over the whole source texture.
    fn update_source(&self, data: &[u8], row_pitch: u32) -> Result<(), ProbeError>;

    /// Creates a CPU-readable staging texture matching the source.
    fn create_staging(&self) -> Result<Self::Texture, ProbeError>;

    /// Creates a second default-usage texture with the source's descriptor.
    fn create_peer(&self) -> Result<Self::Texture, ProbeError>;

    /// Copies `src` into `dst` on the device.
    fn copy(&self, dst: &Self::Texture, src: &Self::Texture) -> Result<(), ProbeError>;

    /// Maps a staging texture for reading.
    fn map_read(&self, staging: &Self::Texture) -> Result<Self::Mapping, ProbeError>;
}
