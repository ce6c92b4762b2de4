// SPDX-License-Identifier: CEPL-1.0
//! Swap chain parameter policy and creation.

use crate::error::{BootstrapError, DriverCallExt, Result};
use crate::select::{QueueFamilies, SwapChainSupport};
use ash::khr::swapchain;
use ash::vk;
use nm_render::RenderSize;
use tracing::info;

pub const PREFERRED_FORMAT: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
    format: vk::Format::B8G8R8A8_SRGB,
    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
};

/// BGRA8 sRGB if offered, else whatever the surface lists first.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .copied()
        .find(|f| {
            f.format == PREFERRED_FORMAT.format && f.color_space == PREFERRED_FORMAT.color_space
        })
        .or_else(|| formats.first().copied())
}

/// MAILBOX if offered. FIFO otherwise; every surface must support it.
pub fn choose_present_mode(modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

fn is_caller_defined(extent: vk::Extent2D) -> bool {
    extent.width == u32::MAX && extent.height == u32::MAX
}

/// `framebuffer` is only consulted when the surface leaves the extent to us.
pub fn choose_extent(
    caps: &vk::SurfaceCapabilitiesKHR,
    framebuffer: impl FnOnce() -> RenderSize,
) -> vk::Extent2D {
    if !is_caller_defined(caps.current_extent) {
        return caps.current_extent;
    }
    let want = framebuffer();
    let (min, max) = (caps.min_image_extent, caps.max_image_extent);
    vk::Extent2D {
        width: want.width.max(min.width).min(max.width),
        height: want.height.max(min.height).min(max.height),
    }
}

/// One more than the minimum; `max_image_count == 0` means no upper bound.
pub fn choose_image_count(caps: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = caps.min_image_count + 1;
    if caps.max_image_count == 0 {
        count
    } else {
        count.min(caps.max_image_count)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sharing {
    Exclusive,
    /// Graphics family first, then present.
    Concurrent([u32; 2]),
}

impl Sharing {
    pub fn for_families(families: &QueueFamilies) -> Self {
        if families.is_shared() {
            Sharing::Exclusive
        } else {
            Sharing::Concurrent([families.graphics, families.present])
        }
    }

    pub fn mode(&self) -> vk::SharingMode {
        match self {
            Sharing::Exclusive => vk::SharingMode::EXCLUSIVE,
            Sharing::Concurrent(_) => vk::SharingMode::CONCURRENT,
        }
    }

    pub fn family_indices(&self) -> &[u32] {
        match self {
            Sharing::Exclusive => &[],
            Sharing::Concurrent(indices) => indices.as_slice(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SwapChainConfig {
    pub format: vk::Format,
    pub color_space: vk::ColorSpaceKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub image_count: u32,
    pub sharing: Sharing,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
}

impl SwapChainConfig {
    pub fn choose(
        support: &SwapChainSupport,
        families: &QueueFamilies,
        framebuffer: impl FnOnce() -> RenderSize,
    ) -> Result<Self> {
        let surface_format = choose_surface_format(&support.formats)
            .ok_or(BootstrapError::EmptySurfaceSupport("surface formats"))?;
        if support.present_modes.is_empty() {
            return Err(BootstrapError::EmptySurfaceSupport("present modes"));
        }
        let caps = &support.capabilities;

        Ok(Self {
            format: surface_format.format,
            color_space: surface_format.color_space,
            present_mode: choose_present_mode(&support.present_modes),
            extent: choose_extent(caps, framebuffer),
            image_count: choose_image_count(caps),
            sharing: Sharing::for_families(families),
            pre_transform: caps.current_transform,
        })
    }

    pub fn create_info(&self, surface: vk::SurfaceKHR) -> vk::SwapchainCreateInfoKHR<'_> {
        vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(self.image_count)
            .image_format(self.format)
            .image_color_space(self.color_space)
            .image_extent(self.extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(self.sharing.mode())
            .queue_family_indices(self.sharing.family_indices())
            .pre_transform(self.pre_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(self.present_mode)
            .clipped(true)
    }
}

/// 2D, identity swizzle, one mip level, one array layer.
pub fn image_view_info(image: vk::Image, format: vk::Format) -> vk::ImageViewCreateInfo<'static> {
    vk::ImageViewCreateInfo {
        image,
        view_type: vk::ImageViewType::TYPE_2D,
        format,
        components: vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        },
        subresource_range: vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        },
        ..Default::default()
    }
}

/// # Safety
/// `surface` must belong to the instance `loader` was built from.
pub(crate) unsafe fn create_swap_chain(
    loader: &swapchain::Device,
    surface: vk::SurfaceKHR,
    config: &SwapChainConfig,
) -> Result<vk::SwapchainKHR> {
    info!(
        "swapchain {}x{}, {} images, {:?}/{:?}, {:?}, {:?}",
        config.extent.width,
        config.extent.height,
        config.image_count,
        config.format,
        config.color_space,
        config.present_mode,
        config.sharing,
    );
    let create_info = config.create_info(surface);
    unsafe { loader.create_swapchain(&create_info, None) }.during("vkCreateSwapchainKHR")
}

pub(crate) unsafe fn swap_chain_images(
    loader: &swapchain::Device,
    handle: vk::SwapchainKHR,
) -> Result<Vec<vk::Image>> {
    unsafe { loader.get_swapchain_images(handle) }.during("vkGetSwapchainImagesKHR")
}

pub(crate) unsafe fn create_image_view(
    device: &ash::Device,
    image: vk::Image,
    format: vk::Format,
) -> Result<vk::ImageView> {
    let info = image_view_info(image, format);
    unsafe { device.create_image_view(&info, None) }.during("vkCreateImageView")
}
