// SPDX-License-Identifier: CEPL-1.0
//! Diagnostic messenger: validation output is forwarded to `tracing`.

use crate::error::{DriverCallExt, Result};
use ash::ext::debug_utils;
use ash::vk;
use std::ffi::CStr;
use tracing::Level;

pub(crate) fn level_for(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> Level {
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        Level::ERROR
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        Level::WARN
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        Level::INFO
    } else {
        Level::TRACE
    }
}

unsafe extern "system" fn forward_to_tracing(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    types: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if data.is_null() {
        return vk::FALSE;
    }
    let p_message = unsafe { (*data).p_message };
    if p_message.is_null() {
        return vk::FALSE;
    }
    let msg = unsafe { CStr::from_ptr(p_message) }.to_string_lossy();

    let level = level_for(severity);
    if level == Level::ERROR {
        tracing::error!(target: "vulkan", ?types, "{msg}");
    } else if level == Level::WARN {
        tracing::warn!(target: "vulkan", ?types, "{msg}");
    } else if level == Level::INFO {
        tracing::info!(target: "vulkan", ?types, "{msg}");
    } else {
        tracing::trace!(target: "vulkan", ?types, "{msg}");
    }
    vk::FALSE
}

/// Shared by the messenger itself and the instance create-info chain, so
/// messages emitted during instance creation are captured too.
pub fn messenger_create_info() -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
    vk::DebugUtilsMessengerCreateInfoEXT {
        message_severity: vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
            | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        message_type: vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        pfn_user_callback: Some(forward_to_tracing),
        ..Default::default()
    }
}

/// # Safety
/// The loader's instance must have been created with `VK_EXT_debug_utils`.
pub(crate) unsafe fn create_messenger(
    loader: &debug_utils::Instance,
) -> Result<vk::DebugUtilsMessengerEXT> {
    let info = messenger_create_info();
    unsafe { loader.create_debug_utils_messenger(&info, None) }
        .during("vkCreateDebugUtilsMessengerEXT")
}
