// SPDX-License-Identifier: CEPL-1.0
use crate::error::{DriverCallExt, Result};
use ash::{vk, Entry, Instance};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::ffi::CStr;

/// Platform WSI extensions the loader needs to create a surface for `display`.
pub fn required_surface_extensions(display: RawDisplayHandle) -> Result<Vec<&'static CStr>> {
    let names = ash_window::enumerate_required_extensions(display)
        .during("enumerate_required_extensions")?;
    // SAFETY: ash-window hands out pointers to static, NUL-terminated names.
    Ok(names.iter().map(|&p| unsafe { CStr::from_ptr(p) }).collect())
}

/// # Safety
/// `display` and `window` must stay valid for the lifetime of the surface and
/// the instance must have been created with [`required_surface_extensions`].
pub(crate) unsafe fn create_surface(
    entry: &Entry,
    instance: &Instance,
    display: RawDisplayHandle,
    window: RawWindowHandle,
) -> Result<vk::SurfaceKHR> {
    unsafe { ash_window::create_surface(entry, instance, display, window, None) }
        .during("vkCreateSurfaceKHR")
}
