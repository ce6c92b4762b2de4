// SPDX-License-Identifier: CEPL-1.0
//! Physical device selection: first device that passes every check wins.

use crate::error::{BootstrapError, Result};
use crate::probe::{has_name, DeviceProbe};
use ash::vk;
use std::ffi::CStr;
use tracing::{debug, info};

pub const REQUIRED_DEVICE_EXTENSIONS: [&CStr; 1] = [ash::khr::swapchain::NAME];

/// Queue family roles discovered so far; either may still be missing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }

    pub fn resolve(&self) -> Option<QueueFamilies> {
        Some(QueueFamilies {
            graphics: self.graphics?,
            present: self.present?,
        })
    }
}

/// Complete queue family assignment. Both roles may name the same family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueFamilies {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilies {
    pub fn is_shared(&self) -> bool {
        self.graphics == self.present
    }

    /// Distinct families, graphics first.
    pub fn unique(&self) -> Vec<u32> {
        if self.is_shared() {
            vec![self.graphics]
        } else {
            vec![self.graphics, self.present]
        }
    }
}

/// Scans families in index order and stops as soon as both roles are filled.
pub fn find_queue_families(
    probe: &impl DeviceProbe,
    phys: vk::PhysicalDevice,
) -> Result<QueueFamilyIndices> {
    let mut indices = QueueFamilyIndices::default();
    for (i, family) in probe.queue_families(phys).iter().enumerate() {
        let i = i as u32;
        if indices.graphics.is_none() && family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
            indices.graphics = Some(i);
        }
        if indices.present.is_none() && probe.supports_present(phys, i)? {
            indices.present = Some(i);
        }
        if indices.is_complete() {
            break;
        }
    }
    Ok(indices)
}

#[derive(Clone, Debug)]
pub struct SwapChainSupport {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapChainSupport {
    pub fn query(probe: &impl DeviceProbe, phys: vk::PhysicalDevice) -> Result<Self> {
        Ok(Self {
            capabilities: probe.surface_capabilities(phys)?,
            formats: probe.surface_formats(phys)?,
            present_modes: probe.present_modes(phys)?,
        })
    }

    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Facts derived for one enumerated device. Recomputed per selection run.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub physical: vk::PhysicalDevice,
    pub name: String,
    pub indices: QueueFamilyIndices,
    pub extensions_supported: bool,
    /// Only queried once the required extensions are known to be present.
    pub swap_chain: Option<SwapChainSupport>,
    pub portability_subset: bool,
}

impl Candidate {
    pub fn evaluate(probe: &impl DeviceProbe, phys: vk::PhysicalDevice) -> Result<Self> {
        let indices = find_queue_families(probe, phys)?;

        let available = probe.device_extensions(phys)?;
        let extensions_supported = REQUIRED_DEVICE_EXTENSIONS
            .iter()
            .all(|&name| has_name(&available, name));

        let swap_chain = if extensions_supported {
            Some(SwapChainSupport::query(probe, phys)?)
        } else {
            None
        };

        Ok(Self {
            physical: phys,
            name: probe.device_name(phys),
            indices,
            extensions_supported,
            swap_chain,
            portability_subset: has_name(&available, ash::khr::portability_subset::NAME),
        })
    }

    /// Why this device cannot be used, if it cannot.
    pub fn rejection(&self) -> Option<&'static str> {
        if !self.indices.is_complete() {
            return Some("no graphics or present queue family");
        }
        if !self.extensions_supported {
            return Some("missing required device extensions");
        }
        match &self.swap_chain {
            Some(support) if support.is_adequate() => None,
            _ => Some("no surface formats or present modes"),
        }
    }

    pub fn is_suitable(&self) -> bool {
        self.rejection().is_none()
    }
}

/// The device chosen for the rest of the bootstrap. Not owned: physical
/// devices are enumerated, never created or destroyed.
#[derive(Clone, Debug)]
pub struct SelectedDevice {
    pub physical: vk::PhysicalDevice,
    pub name: String,
    pub families: QueueFamilies,
    pub portability_subset: bool,
}

pub fn pick_physical_device(probe: &impl DeviceProbe) -> Result<SelectedDevice> {
    let devices = probe.physical_devices()?;
    if devices.is_empty() {
        return Err(BootstrapError::NoVulkanDevice);
    }

    for phys in devices {
        let candidate = Candidate::evaluate(probe, phys)?;
        if let Some(reason) = candidate.rejection() {
            debug!("skipping GPU `{}`: {reason}", candidate.name);
            continue;
        }
        let Some(families) = candidate.indices.resolve() else {
            continue;
        };
        info!(
            "selected GPU `{}` (graphics family {}, present family {})",
            candidate.name, families.graphics, families.present
        );
        return Ok(SelectedDevice {
            physical: candidate.physical,
            name: candidate.name,
            families,
            portability_subset: candidate.portability_subset,
        });
    }

    Err(BootstrapError::NoSuitableDevice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{family, FakeDriver, FakeFamily, FakeGpu};
    use vk::QueueFlags as Q;

    fn indices_for(families: Vec<FakeFamily>) -> QueueFamilyIndices {
        let driver = FakeDriver::with_gpus(vec![FakeGpu::capable("gpu").with_families(families)]);
        find_queue_families(&driver, FakeDriver::handle(0)).unwrap()
    }

    #[test]
    fn picks_first_family_for_each_role() {
        let indices = indices_for(vec![
            family(Q::COMPUTE, true),
            family(Q::GRAPHICS, false),
            family(Q::GRAPHICS, true),
        ]);
        assert_eq!(indices.graphics, Some(1));
        assert_eq!(indices.present, Some(0));
        assert!(indices.is_complete());
    }

    #[test]
    fn no_graphics_family_is_incomplete() {
        let indices = indices_for(vec![family(Q::COMPUTE, true), family(Q::TRANSFER, true)]);
        assert_eq!(indices.graphics, None);
        assert!(!indices.is_complete());
        assert!(indices.resolve().is_none());
    }

    #[test]
    fn scan_stops_once_complete() {
        let driver = FakeDriver::with_gpus(vec![FakeGpu::capable("gpu").with_families(vec![
            family(Q::GRAPHICS, true),
            family(Q::GRAPHICS, true),
            family(Q::GRAPHICS, true),
        ])]);
        let indices = find_queue_families(&driver, FakeDriver::handle(0)).unwrap();
        assert_eq!(indices.resolve(), Some(QueueFamilies { graphics: 0, present: 0 }));
        assert_eq!(driver.present_queries.get(), 1);
    }

    #[test]
    fn completeness_matches_table_contents() {
        // Every table of up to three families built from {graphics?} x {present?}.
        let kinds = [
            family(Q::empty(), false),
            family(Q::empty(), true),
            family(Q::GRAPHICS, false),
            family(Q::GRAPHICS, true),
        ];
        let mut tables: Vec<Vec<FakeFamily>> = vec![vec![]];
        let mut frontier = tables.clone();
        for _ in 0..3 {
            frontier = frontier
                .iter()
                .flat_map(|t| {
                    kinds.iter().map(move |k| {
                        let mut t = t.clone();
                        t.push(*k);
                        t
                    })
                })
                .collect();
            tables.extend(frontier.iter().cloned());
        }

        for table in tables {
            let first_graphics = table.iter().position(|f| f.flags.contains(Q::GRAPHICS));
            let first_present = table.iter().position(|f| f.present);
            let indices = indices_for(table.clone());
            assert_eq!(
                indices.is_complete(),
                first_graphics.is_some() && first_present.is_some(),
                "{table:?}"
            );
            if indices.is_complete() {
                assert_eq!(indices.graphics, first_graphics.map(|i| i as u32));
                assert_eq!(indices.present, first_present.map(|i| i as u32));
            }
        }
    }

    #[test]
    fn unique_families_deduplicate_shared_role() {
        let shared = QueueFamilies { graphics: 2, present: 2 };
        assert!(shared.is_shared());
        assert_eq!(shared.unique(), vec![2]);
        let split = QueueFamilies { graphics: 0, present: 1 };
        assert_eq!(split.unique(), vec![0, 1]);
    }

    #[test]
    fn swap_chain_support_skipped_without_extensions() {
        let driver = FakeDriver::with_gpus(vec![FakeGpu::capable("old").with_extensions(&[])]);
        let candidate = Candidate::evaluate(&driver, FakeDriver::handle(0)).unwrap();
        assert!(!candidate.extensions_supported);
        assert!(candidate.swap_chain.is_none());
        assert!(!candidate.is_suitable());
    }

    #[test]
    fn empty_present_modes_make_device_ineligible() {
        let driver = FakeDriver::with_gpus(vec![FakeGpu::capable("gpu").with_modes(vec![])]);
        let candidate = Candidate::evaluate(&driver, FakeDriver::handle(0)).unwrap();
        assert!(candidate.indices.is_complete());
        assert_eq!(
            candidate.rejection(),
            Some("no surface formats or present modes")
        );
    }

    #[test]
    fn no_devices_is_an_error() {
        let err = pick_physical_device(&FakeDriver::default()).unwrap_err();
        assert!(matches!(err, BootstrapError::NoVulkanDevice));
        assert_eq!(err.kind(), ErrorKind::EnumerationEmpty);
    }

    #[test]
    fn no_suitable_device_is_an_error() {
        let driver = FakeDriver::with_gpus(vec![
            FakeGpu::capable("compute-only").with_families(vec![family(Q::COMPUTE, true)]),
            FakeGpu::capable("no-formats").with_formats(vec![]),
        ]);
        let err = pick_physical_device(&driver).unwrap_err();
        assert!(matches!(err, BootstrapError::NoSuitableDevice));
        assert_eq!(err.kind(), ErrorKind::SelectionFailed);
    }

    fn mixed_driver() -> FakeDriver {
        FakeDriver::with_gpus(vec![
            FakeGpu::capable("headless").with_families(vec![family(Q::GRAPHICS, false)]),
            FakeGpu::capable("no-swapchain").with_extensions(&[]),
            FakeGpu::capable("no-formats").with_formats(vec![]),
            FakeGpu::capable("first-good").with_families(vec![
                family(Q::GRAPHICS, false),
                family(Q::TRANSFER, true),
            ]),
            FakeGpu::capable("second-good"),
        ])
    }

    #[test]
    fn first_suitable_device_wins() {
        let selected = pick_physical_device(&mixed_driver()).unwrap();
        assert_eq!(selected.name, "first-good");
        assert_eq!(selected.physical, FakeDriver::handle(3));
        assert_eq!(selected.families, QueueFamilies { graphics: 0, present: 1 });
        assert!(!selected.portability_subset);
    }

    #[test]
    fn selection_is_deterministic() {
        let driver = mixed_driver();
        let a = pick_physical_device(&driver).unwrap();
        let b = pick_physical_device(&driver).unwrap();
        assert_eq!(a.physical, b.physical);
        assert_eq!(a.families, b.families);
    }

    #[test]
    fn portability_subset_is_detected() {
        let driver = FakeDriver::with_gpus(vec![FakeGpu::capable("moltenvk").with_extensions(&[
            ash::khr::swapchain::NAME,
            ash::khr::portability_subset::NAME,
        ])]);
        assert!(pick_physical_device(&driver).unwrap().portability_subset);
    }
}
