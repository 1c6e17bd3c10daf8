//! Cross-device texture sharing: probe steps and their results.
//!
//! A texture created with the shared flag on one device is opened through
//! its shared handle on a second device. The steps differ only in which
//! adapters the two devices sit on.

use std::fmt;

use crate::adapter::Luid;
use crate::config::Extent;
use crate::error::ProbeError;

/// Size of the shared texture.
pub const SHARED_EXTENT: Extent = Extent {
    width: 1920,
    height: 1080,
};

/// Which pairing of adapters a probe step uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareStep {
    /// Both devices on the same adapter object.
    SameAdapter,
    /// Same physical adapter, taken from two separate enumerations.
    SameLuid,
    /// Two different physical adapters of one vendor.
    DifferentLuid,
}

impl ShareStep {
    pub fn label(self) -> &'static str {
        match self {
            ShareStep::SameAdapter => "SameAdapter",
            ShareStep::SameLuid | ShareStep::DifferentLuid => "LuidAdapter",
        }
    }

    /// Whether a failure of this step is the expected outcome.
    ///
    /// Legacy shared handles generally do not open across adapters.
    pub fn failure_expected(self) -> bool {
        matches!(self, ShareStep::DifferentLuid)
    }
}

/// Successful share between two devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareOutcome {
    pub step: ShareStep,
    /// Adapter of the device that created the texture.
    pub producer: Luid,
    /// Adapter of the device that opened it.
    pub consumer: Luid,
    /// Size of the texture as seen by the consumer.
    pub extent: Extent,
}

impl fmt::Display for ShareOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.step {
            ShareStep::SameAdapter => {
                write!(f, "{}: OK, luid: {}", self.step.label(), self.producer.low)
            }
            _ => write!(
                f,
                "{}: OK, luid: {},{}",
                self.step.label(),
                self.producer.low,
                self.consumer.low
            ),
        }
    }
}

/// Checks the size of a texture opened through a shared handle.
pub fn check_shared_extent(expected: Extent, actual: Extent) -> Result<(), ProbeError> {
    if expected == actual {
        return Ok(());
    }
    Err(ProbeError::DescriptorMismatch {
        expected_width: expected.width,
        expected_height: expected.height,
        actual_width: actual.width,
        actual_height: actual.height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_labels() {
        assert_eq!(ShareStep::SameAdapter.label(), "SameAdapter");
        assert_eq!(ShareStep::SameLuid.label(), "LuidAdapter");
        assert_eq!(ShareStep::DifferentLuid.label(), "LuidAdapter");
    }

    #[test]
    fn test_only_cross_adapter_may_fail() {
        assert!(!ShareStep::SameAdapter.failure_expected());
        assert!(!ShareStep::SameLuid.failure_expected());
        assert!(ShareStep::DifferentLuid.failure_expected());
    }

    #[test]
    fn test_outcome_display() {
        let same = ShareOutcome {
            step: ShareStep::SameAdapter,
            producer: Luid::new(0, 51234),
            consumer: Luid::new(0, 51234),
            extent: SHARED_EXTENT,
        };
        assert_eq!(same.to_string(), "SameAdapter: OK, luid: 51234");

        let cross = ShareOutcome {
            step: ShareStep::SameLuid,
            consumer: Luid::new(0, 777),
            ..same
        };
        assert_eq!(cross.to_string(), "LuidAdapter: OK, luid: 51234,777");
    }

    #[test]
    fn test_check_shared_extent() {
        assert!(check_shared_extent(SHARED_EXTENT, Extent::new(1920, 1080)).is_ok());

        let err = check_shared_extent(SHARED_EXTENT, Extent::new(1920, 1088)).unwrap_err();
        assert!(matches!(
            err,
            ProbeError::DescriptorMismatch {
                actual_height: 1088,
                ..
            }
        ));
    }
}
