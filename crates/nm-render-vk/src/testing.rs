// SPDX-License-Identifier: CEPL-1.0
//! Scripted driver tables for unit tests.

use crate::error::Result;
use crate::probe::{DeviceProbe, InstanceProbe};
use ash::vk::{self, Handle};
use std::cell::Cell;
use std::ffi::{CStr, CString};

#[derive(Clone, Copy, Debug)]
pub(crate) struct FakeFamily {
    pub flags: vk::QueueFlags,
    pub present: bool,
}

pub(crate) fn family(flags: vk::QueueFlags, present: bool) -> FakeFamily {
    FakeFamily { flags, present }
}

#[derive(Clone, Debug)]
pub(crate) struct FakeGpu {
    pub name: &'static str,
    pub families: Vec<FakeFamily>,
    pub extensions: Vec<CString>,
    pub caps: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub modes: Vec<vk::PresentModeKHR>,
}

impl FakeGpu {
    /// One graphics+present family, swapchain support, one sRGB format, FIFO only.
    pub fn capable(name: &'static str) -> Self {
        Self {
            name,
            families: vec![family(vk::QueueFlags::GRAPHICS, true)],
            extensions: vec![ash::khr::swapchain::NAME.to_owned()],
            caps: vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 0,
                current_extent: vk::Extent2D {
                    width: 800,
                    height: 600,
                },
                ..Default::default()
            },
            formats: vec![vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }],
            modes: vec![vk::PresentModeKHR::FIFO],
        }
    }

    pub fn with_families(mut self, families: Vec<FakeFamily>) -> Self {
        self.families = families;
        self
    }

    pub fn with_extensions(mut self, extensions: &[&CStr]) -> Self {
        self.extensions = extensions.iter().map(|&e| e.to_owned()).collect();
        self
    }

    pub fn with_formats(mut self, formats: Vec<vk::SurfaceFormatKHR>) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_modes(mut self, modes: Vec<vk::PresentModeKHR>) -> Self {
        self.modes = modes;
        self
    }
}

#[derive(Default)]
pub(crate) struct FakeDriver {
    pub instance_extensions: Vec<CString>,
    pub layers: Vec<CString>,
    pub gpus: Vec<FakeGpu>,
    /// Number of present-support queries answered so far.
    pub present_queries: Cell<usize>,
}

impl FakeDriver {
    pub fn with_gpus(gpus: Vec<FakeGpu>) -> Self {
        Self {
            gpus,
            ..Default::default()
        }
    }

    pub fn with_instance(extensions: &[&CStr], layers: &[&CStr]) -> Self {
        Self {
            instance_extensions: extensions.iter().map(|&e| e.to_owned()).collect(),
            layers: layers.iter().map(|&l| l.to_owned()).collect(),
            ..Default::default()
        }
    }

    pub fn handle(index: usize) -> vk::PhysicalDevice {
        vk::PhysicalDevice::from_raw(index as u64 + 1)
    }

    fn gpu(&self, phys: vk::PhysicalDevice) -> &FakeGpu {
        &self.gpus[(phys.as_raw() - 1) as usize]
    }
}

impl InstanceProbe for FakeDriver {
    fn instance_extensions(&self) -> Result<Vec<CString>> {
        Ok(self.instance_extensions.clone())
    }

    fn instance_layers(&self) -> Result<Vec<CString>> {
        Ok(self.layers.clone())
    }
}

impl DeviceProbe for FakeDriver {
    fn physical_devices(&self) -> Result<Vec<vk::PhysicalDevice>> {
        Ok((0..self.gpus.len()).map(Self::handle).collect())
    }

    fn device_name(&self, phys: vk::PhysicalDevice) -> String {
        self.gpu(phys).name.to_owned()
    }

    fn queue_families(&self, phys: vk::PhysicalDevice) -> Vec<vk::QueueFamilyProperties> {
        self.gpu(phys)
            .families
            .iter()
            .map(|f| vk::QueueFamilyProperties {
                queue_flags: f.flags,
                queue_count: 1,
                ..Default::default()
            })
            .collect()
    }

    fn supports_present(&self, phys: vk::PhysicalDevice, family: u32) -> Result<bool> {
        self.present_queries.set(self.present_queries.get() + 1);
        Ok(self.gpu(phys).families[family as usize].present)
    }

    fn device_extensions(&self, phys: vk::PhysicalDevice) -> Result<Vec<CString>> {
        Ok(self.gpu(phys).extensions.clone())
    }

    fn surface_capabilities(
        &self,
        phys: vk::PhysicalDevice,
    ) -> Result<vk::SurfaceCapabilitiesKHR> {
        Ok(self.gpu(phys).caps)
    }

    fn surface_formats(&self, phys: vk::PhysicalDevice) -> Result<Vec<vk::SurfaceFormatKHR>> {
        Ok(self.gpu(phys).formats.clone())
    }

    fn present_modes(&self, phys: vk::PhysicalDevice) -> Result<Vec<vk::PresentModeKHR>> {
        Ok(self.gpu(phys).modes.clone())
    }
}
