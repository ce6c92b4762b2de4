// SPDX-License-Identifier: CEPL-1.0
//! Read-only capability queries.
//!
//! Selection policy never talks to `ash` directly; it goes through these two
//! traits so the same code runs against the driver and against scripted tables.

use crate::error::{DriverCallExt, Result};
use ash::khr::surface;
use ash::{vk, Entry, Instance};
use std::ffi::{CStr, CString};

/// Queries that only need the loader.
pub trait InstanceProbe {
    fn instance_extensions(&self) -> Result<Vec<CString>>;
    fn instance_layers(&self) -> Result<Vec<CString>>;
}

/// Per-device queries, answered against one instance and one surface.
pub trait DeviceProbe {
    fn physical_devices(&self) -> Result<Vec<vk::PhysicalDevice>>;
    fn device_name(&self, phys: vk::PhysicalDevice) -> String;
    fn queue_families(&self, phys: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties>;
    fn supports_present(&self, phys: vk::PhysicalDevice, family: u32) -> Result<bool>;
    fn device_extensions(&self, phys: vk::PhysicalDevice) -> Result<Vec<CString>>;
    fn surface_capabilities(&self, phys: vk::PhysicalDevice)
        -> Result<vk::SurfaceCapabilitiesKHR>;
    fn surface_formats(&self, phys: vk::PhysicalDevice) -> Result<Vec<vk::SurfaceFormatKHR>>;
    fn present_modes(&self, phys: vk::PhysicalDevice) -> Result<Vec<vk::PresentModeKHR>>;
}

pub(crate) fn has_name(available: &[CString], name: &CStr) -> bool {
    available.iter().any(|a| a.as_c_str() == name)
}

pub struct EntryProbe<'a> {
    entry: &'a Entry,
}

impl<'a> EntryProbe<'a> {
    pub fn new(entry: &'a Entry) -> Self {
        Self { entry }
    }
}

impl InstanceProbe for EntryProbe<'_> {
    fn instance_extensions(&self) -> Result<Vec<CString>> {
        let props = unsafe { self.entry.enumerate_instance_extension_properties(None) }
            .during("vkEnumerateInstanceExtensionProperties")?;
        Ok(props
            .iter()
            .filter_map(|p| p.extension_name_as_c_str().ok().map(CStr::to_owned))
            .collect())
    }

    fn instance_layers(&self) -> Result<Vec<CString>> {
        let props = unsafe { self.entry.enumerate_instance_layer_properties() }
            .during("vkEnumerateInstanceLayerProperties")?;
        Ok(props
            .iter()
            .filter_map(|p| p.layer_name_as_c_str().ok().map(CStr::to_owned))
            .collect())
    }
}

/// Answers [`DeviceProbe`] for a live instance and surface.
///
/// Both handles must outlive the probe and `surface` must belong to `instance`;
/// the context only builds one between surface creation and device selection.
pub struct SurfaceProbe<'a> {
    instance: &'a Instance,
    surface_loader: &'a surface::Instance,
    surface: vk::SurfaceKHR,
}

impl<'a> SurfaceProbe<'a> {
    pub(crate) fn new(
        instance: &'a Instance,
        surface_loader: &'a surface::Instance,
        surface: vk::SurfaceKHR,
    ) -> Self {
        Self {
            instance,
            surface_loader,
            surface,
        }
    }
}

impl DeviceProbe for SurfaceProbe<'_> {
    fn physical_devices(&self) -> Result<Vec<vk::PhysicalDevice>> {
        unsafe { self.instance.enumerate_physical_devices() }.during("vkEnumeratePhysicalDevices")
    }

    fn device_name(&self, phys: vk::PhysicalDevice) -> String {
        let props = unsafe { self.instance.get_physical_device_properties(phys) };
        props
            .device_name_as_c_str()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "<unnamed>".to_owned())
    }

    fn queue_families(&self, phys: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties> {
        unsafe {
            self.instance
                .get_physical_device_queue_family_properties(phys)
        }
    }

    fn supports_present(&self, phys: vk::PhysicalDevice, family: u32) -> Result<bool> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_support(phys, family, self.surface)
        }
        .during("vkGetPhysicalDeviceSurfaceSupportKHR")
    }

    fn device_extensions(&self, phys: vk::PhysicalDevice) -> Result<Vec<CString>> {
        let props = unsafe { self.instance.enumerate_device_extension_properties(phys) }
            .during("vkEnumerateDeviceExtensionProperties")?;
        Ok(props
            .iter()
            .filter_map(|p| p.extension_name_as_c_str().ok().map(CStr::to_owned))
            .collect())
    }

    fn surface_capabilities(
        &self,
        phys: vk::PhysicalDevice,
    ) -> Result<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(phys, self.surface)
        }
        .during("vkGetPhysicalDeviceSurfaceCapabilitiesKHR")
    }

    fn surface_formats(&self, phys: vk::PhysicalDevice) -> Result<Vec<vk::SurfaceFormatKHR>> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_formats(phys, self.surface)
        }
        .during("vkGetPhysicalDeviceSurfaceFormatsKHR")
    }

    fn present_modes(&self, phys: vk::PhysicalDevice) -> Result<Vec<vk::PresentModeKHR>> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_present_modes(phys, self.surface)
        }
        .during("vkGetPhysicalDeviceSurfacePresentModesKHR")
    }
}
