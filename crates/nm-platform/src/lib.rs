// SPDX-License-Identifier: CEPL-1.0
pub use winit;

use anyhow::{anyhow, Result};
use nm_render::{BootstrapConfig, PresentTarget, RenderSize};
use tracing::info;
use winit::{
    dpi::LogicalSize,
    event_loop::ActiveEventLoop,
    raw_window_handle::{
        DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle,
    },
    window::{Window, WindowId},
};

/// The single, fixed-size application window.
pub struct AppWindow {
    window: Window,
}

impl AppWindow {
    pub fn create(event_loop: &ActiveEventLoop, cfg: &BootstrapConfig) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(cfg.application_name.clone())
            .with_inner_size(LogicalSize::new(cfg.size.width, cfg.size.height))
            .with_resizable(false);
        let window = event_loop
            .create_window(attrs)
            .map_err(|e| anyhow!("create_window: {e}"))?;

        let size = window.inner_size();
        info!("window ready ({}x{} px)", size.width, size.height);
        Ok(Self { window })
    }

    pub fn id(&self) -> WindowId {
        self.window.id()
    }
}

impl HasWindowHandle for AppWindow {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        self.window.window_handle()
    }
}

impl HasDisplayHandle for AppWindow {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        self.window.display_handle()
    }
}

impl PresentTarget for AppWindow {
    fn framebuffer_size(&self) -> RenderSize {
        let size = self.window.inner_size();
        RenderSize {
            width: size.width,
            height: size.height,
        }
    }
}
