// SPDX-License-Identifier: CEPL-1.0
//! Vulkan bootstrap: capability negotiation, device selection, swap chain
//! setup and ordered teardown, built on `ash`.
#![deny(unsafe_op_in_unsafe_fn)]

mod context;
mod debug;
pub mod device;
mod error;
mod instance;
pub mod negotiate;
pub mod probe;
pub mod select;
mod surface;
pub mod swapchain;
pub mod teardown;

#[cfg(test)]
mod testing;

pub use context::{RenderContext, Stage};
pub use error::{BootstrapError, Capability, ErrorKind, Result};
pub use surface::required_surface_extensions;
