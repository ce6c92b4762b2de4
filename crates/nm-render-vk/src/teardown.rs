// SPDX-License-Identifier: CEPL-1.0
//! Ownership ledger for everything the bootstrap creates.
//!
//! Resources are recorded as they are created and released in a single fixed
//! order, whichever stage the bootstrap reached.

use ash::vk;

/// Resource categories, declared in release order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    ImageView,
    SwapChain,
    Surface,
    Device,
    DebugMessenger,
    Instance,
}

/// An owned driver object. Device and instance are held by their loaders,
/// so only the fact that they exist is recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Owned {
    ImageView(vk::ImageView),
    SwapChain(vk::SwapchainKHR),
    Surface(vk::SurfaceKHR),
    Device,
    DebugMessenger(vk::DebugUtilsMessengerEXT),
    Instance,
}

impl Owned {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Owned::ImageView(_) => ResourceKind::ImageView,
            Owned::SwapChain(_) => ResourceKind::SwapChain,
            Owned::Surface(_) => ResourceKind::Surface,
            Owned::Device => ResourceKind::Device,
            Owned::DebugMessenger(_) => ResourceKind::DebugMessenger,
            Owned::Instance => ResourceKind::Instance,
        }
    }
}

/// Destroys one resource. Called exactly once per recorded resource.
pub trait Release {
    /// # Safety
    /// `res` must have been recorded in the ledger and not released yet, and
    /// everything ahead of it in release order must already be gone.
    unsafe fn release(&mut self, res: Owned);
}

#[derive(Debug, Default)]
pub struct Ledger {
    owned: Vec<Owned>,
}

impl Ledger {
    pub fn record(&mut self, res: Owned) {
        debug_assert!(
            res.kind() == ResourceKind::ImageView
                || !self.owned.iter().any(|o| o.kind() == res.kind()),
            "{:?} recorded twice",
            res.kind()
        );
        tracing::trace!("recorded {:?}", res);
        self.owned.push(res);
    }

    pub fn contains(&self, kind: ResourceKind) -> bool {
        self.owned.iter().any(|o| o.kind() == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.owned.is_empty()
    }

    /// Empties the ledger, returning resources in release order. Image views
    /// go newest first.
    pub fn drain_in_release_order(&mut self) -> Vec<Owned> {
        let mut order: Vec<Owned> = self.owned.drain(..).rev().collect();
        order.sort_by_key(Owned::kind);
        order
    }

    /// # Safety
    /// Every recorded handle must still be alive and owned by `sink`'s loaders.
    pub unsafe fn release_all(&mut self, sink: &mut impl Release) {
        for res in self.drain_in_release_order() {
            unsafe { sink.release(res) };
        }
    }
}
