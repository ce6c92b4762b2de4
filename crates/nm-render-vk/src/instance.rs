// SPDX-License-Identifier: CEPL-1.0
use crate::debug;
use crate::error::{DriverCallExt, Result};
use crate::negotiate::InstanceConfig;
use ash::{vk, Entry, Instance};
use std::os::raw::c_char;

pub(crate) const ENGINE_NAME: &std::ffi::CStr = c"No Engine";

/// # Safety
/// `entry` must outlive the returned instance.
pub(crate) unsafe fn create_instance(entry: &Entry, cfg: &InstanceConfig) -> Result<Instance> {
    let app_info = vk::ApplicationInfo::default()
        .application_name(cfg.application_name())
        .application_version(vk::make_api_version(0, 1, 0, 0))
        .engine_name(ENGINE_NAME)
        .engine_version(vk::make_api_version(0, 1, 0, 0))
        .api_version(vk::API_VERSION_1_0);

    let ext_ptrs: Vec<*const c_char> = cfg.extensions().iter().map(|e| e.as_ptr()).collect();
    let layer_ptrs: Vec<*const c_char> = cfg.layers().iter().map(|l| l.as_ptr()).collect();

    let mut debug_info = debug::messenger_create_info();
    let mut create_info = vk::InstanceCreateInfo::default()
        .flags(vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR)
        .application_info(&app_info)
        .enabled_extension_names(&ext_ptrs)
        .enabled_layer_names(&layer_ptrs);
    if cfg.diagnostics() {
        create_info = create_info.push_next(&mut debug_info);
    }

    unsafe { entry.create_instance(&create_info, None) }.during("vkCreateInstance")
}
