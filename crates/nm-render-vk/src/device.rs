// SPDX-License-Identifier: CEPL-1.0
use crate::error::{DriverCallExt, Result};
use crate::select::{QueueFamilies, SelectedDevice, REQUIRED_DEVICE_EXTENSIONS};
use ash::{vk, Instance};
use std::ffi::CStr;
use std::os::raw::c_char;
use tracing::debug;

static QUEUE_PRIORITIES: [f32; 1] = [1.0];

pub struct LogicalDevice {
    pub device: ash::Device,
    pub graphics_queue: vk::Queue,
    pub present_queue: vk::Queue,
}

/// One single-queue request per distinct family, not per role.
pub fn queue_create_infos(families: &QueueFamilies) -> Vec<vk::DeviceQueueCreateInfo<'static>> {
    families
        .unique()
        .into_iter()
        .map(|index| {
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(index)
                .queue_priorities(&QUEUE_PRIORITIES)
        })
        .collect()
}

pub fn device_extensions(selected: &SelectedDevice) -> Vec<&'static CStr> {
    let mut exts = REQUIRED_DEVICE_EXTENSIONS.to_vec();
    if selected.portability_subset {
        exts.push(ash::khr::portability_subset::NAME);
    }
    exts
}

/// # Safety
/// `selected.physical` must have been enumerated from `instance`.
pub(crate) unsafe fn create_logical_device(
    instance: &Instance,
    selected: &SelectedDevice,
) -> Result<LogicalDevice> {
    let queue_infos = queue_create_infos(&selected.families);
    let ext_ptrs: Vec<*const c_char> = device_extensions(selected)
        .iter()
        .map(|e| e.as_ptr())
        .collect();
    let features = vk::PhysicalDeviceFeatures::default();

    let create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_infos)
        .enabled_extension_names(&ext_ptrs)
        .enabled_features(&features);

    let device = unsafe { instance.create_device(selected.physical, &create_info, None) }
        .during("vkCreateDevice")?;
    debug!("logical device created with {} queue(s)", queue_infos.len());

    // Only queue 0 was requested per family, so a shared family yields the same queue twice.
    let graphics_queue = unsafe { device.get_device_queue(selected.families.graphics, 0) };
    let present_queue = unsafe { device.get_device_queue(selected.families.present, 0) };

    Ok(LogicalDevice {
        device,
        graphics_queue,
        present_queue,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDriver;

    fn selected(graphics: u32, present: u32, portability_subset: bool) -> SelectedDevice {
        SelectedDevice {
            physical: FakeDriver::handle(0),
            name: "gpu".into(),
            families: QueueFamilies { graphics, present },
            portability_subset,
        }
    }

    #[test]
    fn shared_family_requests_one_queue() {
        let infos = queue_create_infos(&QueueFamilies { graphics: 1, present: 1 });
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].queue_family_index, 1);
        assert_eq!(infos[0].queue_count, 1);
    }

    #[test]
    fn split_families_request_one_queue_each() {
        let infos = queue_create_infos(&QueueFamilies { graphics: 0, present: 2 });
        let families: Vec<u32> = infos.iter().map(|i| i.queue_family_index).collect();
        assert_eq!(families, vec![0, 2]);
        for info in &infos {
            assert_eq!(info.queue_count, 1);
            let priority = unsafe { *info.p_queue_priorities };
            assert_eq!(priority, 1.0);
        }
    }

    #[test]
    fn swapchain_extension_always_enabled() {
        assert_eq!(device_extensions(&selected(0, 0, false)), vec![ash::khr::swapchain::NAME]);
        assert_eq!(
            device_extensions(&selected(0, 1, true)),
            vec![ash::khr::swapchain::NAME, ash::khr::portability_subset::NAME]
        );
    }
}
