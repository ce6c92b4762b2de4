// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use raw_window_handle::HandleError;
use std::fmt;
use thiserror::Error;

pub type Result<T, E = BootstrapError> = std::result::Result<T, E>;

/// What kind of driver-reported name went missing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    InstanceExtension,
    ValidationLayer,
    DeviceExtension,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Capability::InstanceExtension => "instance extension",
            Capability::ValidationLayer => "validation layer",
            Capability::DeviceExtension => "device extension",
        })
    }
}

/// Coarse classification of a [`BootstrapError`]. None of them are retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    CapabilityMissing,
    EnumerationEmpty,
    SelectionFailed,
    DriverCallFailed,
    InvalidConfig,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("required {capability} `{name}` is not available")]
    CapabilityMissing {
        capability: Capability,
        name: String,
    },
    #[error("failed to find a device with Vulkan support (no Vulkan-capable device)")]
    NoVulkanDevice,
    #[error("surface reports no {0}")]
    EmptySurfaceSupport(&'static str),
    #[error("failed to find a suitable GPU")]
    NoSuitableDevice,
    #[error("{call} failed: {result}")]
    DriverCall {
        call: &'static str,
        result: vk::Result,
    },
    #[error("failed to load the Vulkan library: {0}")]
    Loader(#[from] ash::LoadingError),
    #[error("window handle unavailable: {0}")]
    WindowHandle(#[from] HandleError),
    #[error("invalid application name: {0}")]
    InvalidApplicationName(#[from] std::ffi::NulError),
}

impl BootstrapError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BootstrapError::CapabilityMissing { .. } => ErrorKind::CapabilityMissing,
            BootstrapError::NoVulkanDevice | BootstrapError::EmptySurfaceSupport(_) => {
                ErrorKind::EnumerationEmpty
            }
            BootstrapError::NoSuitableDevice => ErrorKind::SelectionFailed,
            BootstrapError::DriverCall { .. }
            | BootstrapError::Loader(_)
            | BootstrapError::WindowHandle(_) => ErrorKind::DriverCallFailed,
            BootstrapError::InvalidApplicationName(_) => ErrorKind::InvalidConfig,
        }
    }
}

/// Tags a raw driver result with the entry point that produced it.
pub(crate) trait DriverCallExt<T> {
    fn during(self, call: &'static str) -> Result<T>;
}

impl<T> DriverCallExt<T> for std::result::Result<T, vk::Result> {
    fn during(self, call: &'static str) -> Result<T> {
        self.map_err(|result| BootstrapError::DriverCall { call, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_failures_carry_the_call_name() {
        let err = Err::<(), _>(vk::Result::ERROR_INITIALIZATION_FAILED)
            .during("vkCreateDevice")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DriverCallFailed);
        assert!(err.to_string().starts_with("vkCreateDevice failed"));
    }

    #[test]
    fn missing_capability_names_what_is_missing() {
        let err = BootstrapError::CapabilityMissing {
            capability: Capability::ValidationLayer,
            name: "VK_LAYER_KHRONOS_validation".into(),
        };
        assert_eq!(err.kind(), ErrorKind::CapabilityMissing);
        assert_eq!(
            err.to_string(),
            "required validation layer `VK_LAYER_KHRONOS_validation` is not available"
        );
    }

    #[test]
    fn selection_errors_are_classified() {
        assert_eq!(BootstrapError::NoVulkanDevice.kind(), ErrorKind::EnumerationEmpty);
        assert_eq!(
            BootstrapError::EmptySurfaceSupport("present modes").kind(),
            ErrorKind::EnumerationEmpty
        );
        assert_eq!(BootstrapError::NoSuitableDevice.kind(), ErrorKind::SelectionFailed);
    }
}
