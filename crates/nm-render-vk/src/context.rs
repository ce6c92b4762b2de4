// SPDX-License-Identifier: CEPL-1.0
//! The render context: one synchronous bootstrap, one ordered teardown.

use crate::device::{self, LogicalDevice};
use crate::error::Result;
use crate::negotiate::negotiate;
use crate::probe::{EntryProbe, SurfaceProbe};
use crate::select::{pick_physical_device, QueueFamilies, SelectedDevice, SwapChainSupport};
use crate::swapchain::{self, SwapChainConfig};
use crate::teardown::{Ledger, Owned, Release, ResourceKind};
use crate::{debug, instance, surface};

use ash::ext::debug_utils;
use ash::khr::{surface as khr_surface, swapchain as khr_swapchain};
use ash::{vk, Entry, Instance};
use nm_render::{BootstrapConfig, PresentTarget};
use tracing::{debug, info, warn};

/// Bootstrap progress. Every transition is taken exactly once, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Uninitialized,
    WindowReady,
    InstanceReady,
    SurfaceReady,
    DeviceReady,
    SwapChainReady,
    Running,
    TornDown,
}

impl Stage {
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Uninitialized => Some(Stage::WindowReady),
            Stage::WindowReady => Some(Stage::InstanceReady),
            Stage::InstanceReady => Some(Stage::SurfaceReady),
            Stage::SurfaceReady => Some(Stage::DeviceReady),
            Stage::DeviceReady => Some(Stage::SwapChainReady),
            Stage::SwapChainReady => Some(Stage::Running),
            Stage::Running => Some(Stage::TornDown),
            Stage::TornDown => None,
        }
    }
}

/// Function tables needed to destroy what the ledger records.
struct Loaders {
    entry: Entry,
    instance: Option<Instance>,
    debug_utils: Option<debug_utils::Instance>,
    surface: Option<khr_surface::Instance>,
    device: Option<ash::Device>,
    swapchain: Option<khr_swapchain::Device>,
}

fn no_loader(res: Owned) {
    warn!("no loader available to release {:?}", res);
}

impl Release for Loaders {
    unsafe fn release(&mut self, res: Owned) {
        match res {
            Owned::ImageView(view) => match &self.device {
                Some(d) => unsafe { d.destroy_image_view(view, None) },
                None => return no_loader(res),
            },
            Owned::SwapChain(handle) => match &self.swapchain {
                Some(l) => unsafe { l.destroy_swapchain(handle, None) },
                None => return no_loader(res),
            },
            Owned::Surface(handle) => match &self.surface {
                Some(l) => unsafe { l.destroy_surface(handle, None) },
                None => return no_loader(res),
            },
            Owned::Device => {
                self.swapchain = None;
                match self.device.take() {
                    Some(d) => unsafe { d.destroy_device(None) },
                    None => return no_loader(res),
                }
            }
            Owned::DebugMessenger(handle) => match &self.debug_utils {
                Some(l) => unsafe { l.destroy_debug_utils_messenger(handle, None) },
                None => return no_loader(res),
            },
            Owned::Instance => {
                self.surface = None;
                self.debug_utils = None;
                match self.instance.take() {
                    Some(i) => unsafe { i.destroy_instance(None) },
                    None => return no_loader(res),
                }
            }
        }
        debug!("released {:?}", res.kind());
    }
}

/// Sole owner of every created handle. Dropping it tears down whatever the
/// bootstrap reached, including a bootstrap that failed half way.
struct Owner {
    stage: Stage,
    ledger: Ledger,
    loaders: Loaders,
}

impl Owner {
    fn new(entry: Entry) -> Self {
        Self {
            stage: Stage::Uninitialized,
            ledger: Ledger::default(),
            loaders: Loaders {
                entry,
                instance: None,
                debug_utils: None,
                surface: None,
                device: None,
                swapchain: None,
            },
        }
    }

    fn advance(&mut self, to: Stage) {
        debug_assert_eq!(self.stage.next(), Some(to), "bootstrap stage skipped");
        debug!("stage {:?} -> {:?}", self.stage, to);
        self.stage = to;
    }
}

impl Drop for Owner {
    fn drop(&mut self) {
        if self.stage != Stage::Running {
            warn!("releasing partial render context (reached {:?})", self.stage);
        }
        if let Some(d) = &self.loaders.device {
            unsafe { d.device_wait_idle() }.ok();
        }
        // SAFETY: every recorded handle was created through these loaders and
        // nothing else destroys them.
        unsafe { self.ledger.release_all(&mut self.loaders) };
        self.stage = Stage::TornDown;
        debug!("render context torn down");
    }
}

pub struct RenderContext {
    instance: Instance,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
    surface: vk::SurfaceKHR,
    physical_device: SelectedDevice,
    device: ash::Device,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
    swap_chain: vk::SwapchainKHR,
    swap_chain_config: SwapChainConfig,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    owner: Owner,
}

impl RenderContext {
    /// Runs the whole bootstrap against `target`. On error every resource
    /// created so far has already been released.
    pub fn new(target: &dyn PresentTarget, config: &BootstrapConfig) -> Result<Self> {
        let display = target.display_handle()?.as_raw();
        let window = target.window_handle()?.as_raw();

        // SAFETY: the loaded library lives in `Owner` until teardown finishes.
        let entry = unsafe { Entry::load()? };
        let mut owner = Owner::new(entry.clone());
        owner.advance(Stage::WindowReady);

        // --- Instance (+ optional messenger) ---
        let surface_exts = surface::required_surface_extensions(display)?;
        let instance_cfg = negotiate(
            &EntryProbe::new(&entry),
            &surface_exts,
            &config.application_name,
            config.diagnostics,
        )?;
        let instance = unsafe { instance::create_instance(&entry, &instance_cfg)? };
        owner.loaders.instance = Some(instance.clone());
        owner.ledger.record(Owned::Instance);

        let debug_messenger = if instance_cfg.diagnostics() {
            let loader = debug_utils::Instance::new(&entry, &instance);
            let messenger = unsafe { debug::create_messenger(&loader)? };
            owner.loaders.debug_utils = Some(loader);
            owner.ledger.record(Owned::DebugMessenger(messenger));
            Some(messenger)
        } else {
            None
        };
        owner.advance(Stage::InstanceReady);

        // --- Surface ---
        let surface_loader = khr_surface::Instance::new(&entry, &instance);
        owner.loaders.surface = Some(surface_loader.clone());
        let surface = unsafe { surface::create_surface(&entry, &instance, display, window)? };
        owner.ledger.record(Owned::Surface(surface));
        owner.advance(Stage::SurfaceReady);

        // --- Physical + logical device ---
        let probe = SurfaceProbe::new(&instance, &surface_loader, surface);
        let physical_device = pick_physical_device(&probe)?;
        let LogicalDevice {
            device,
            graphics_queue,
            present_queue,
        } = unsafe { device::create_logical_device(&instance, &physical_device)? };
        owner.loaders.device = Some(device.clone());
        owner.ledger.record(Owned::Device);
        owner.advance(Stage::DeviceReady);

        // --- Swap chain + image views ---
        let support = SwapChainSupport::query(&probe, physical_device.physical)?;
        let swap_chain_config = SwapChainConfig::choose(&support, &physical_device.families, || {
            target.framebuffer_size()
        })?;
        let swapchain_loader = khr_swapchain::Device::new(&instance, &device);
        owner.loaders.swapchain = Some(swapchain_loader.clone());
        let swap_chain =
            unsafe { swapchain::create_swap_chain(&swapchain_loader, surface, &swap_chain_config)? };
        owner.ledger.record(Owned::SwapChain(swap_chain));

        let images = unsafe { swapchain::swap_chain_images(&swapchain_loader, swap_chain)? };
        let mut image_views = Vec::with_capacity(images.len());
        for &image in &images {
            let view =
                unsafe { swapchain::create_image_view(&device, image, swap_chain_config.format)? };
            owner.ledger.record(Owned::ImageView(view));
            image_views.push(view);
        }
        owner.advance(Stage::SwapChainReady);

        owner.advance(Stage::Running);
        info!(
            "render context ready on `{}` ({} swapchain images)",
            physical_device.name,
            images.len()
        );

        Ok(Self {
            instance,
            debug_messenger,
            surface,
            physical_device,
            device,
            graphics_queue,
            present_queue,
            swap_chain,
            swap_chain_config,
            images,
            image_views,
            owner,
        })
    }

    pub fn stage(&self) -> Stage {
        self.owner.stage
    }

    pub fn owns(&self, kind: ResourceKind) -> bool {
        self.owner.ledger.contains(kind)
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn debug_messenger(&self) -> Option<vk::DebugUtilsMessengerEXT> {
        self.debug_messenger
    }

    pub fn surface(&self) -> vk::SurfaceKHR {
        self.surface
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device.physical
    }

    pub fn device_name(&self) -> &str {
        &self.physical_device.name
    }

    pub fn queue_families(&self) -> QueueFamilies {
        self.physical_device.families
    }

    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    pub fn present_queue(&self) -> vk::Queue {
        self.present_queue
    }

    pub fn swap_chain(&self) -> vk::SwapchainKHR {
        self.swap_chain
    }

    pub fn swap_chain_config(&self) -> &SwapChainConfig {
        &self.swap_chain_config
    }

    /// Owned by the swap chain; never destroyed individually.
    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }

    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }
}
