// SPDX-License-Identifier: CEPL-1.0
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderSize {
    pub width: u32,
    pub height: u32,
}

/// Everything the bootstrap needs from the caller besides a window.
#[derive(Clone, Debug)]
pub struct BootstrapConfig {
    pub size: RenderSize,
    pub application_name: String,
    /// Enables the validation layer and the diagnostic messenger.
    pub diagnostics: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        BootstrapConfig {
            size: RenderSize {
                width: 800,
                height: 600,
            },
            application_name: "Not Minecraft".to_owned(),
            diagnostics: cfg!(debug_assertions),
        }
    }
}

/// A window the renderer can present into.
pub trait PresentTarget: HasWindowHandle + HasDisplayHandle {
    /// Current drawable size in pixels (not logical units).
    fn framebuffer_size(&self) -> RenderSize;
}
