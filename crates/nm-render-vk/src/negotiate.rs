// SPDX-License-Identifier: CEPL-1.0
//! Instance extension and layer negotiation.

use crate::error::{BootstrapError, Capability, Result};
use crate::probe::{has_name, InstanceProbe};
use std::ffi::{CStr, CString};
use tracing::{debug, info};

pub const VALIDATION_LAYERS: [&CStr; 1] = [c"VK_LAYER_KHRONOS_validation"];

/// Validated instance parameters. Only [`negotiate`] produces one, so an
/// instance is never created with a name the driver did not report.
#[derive(Clone, Debug)]
pub struct InstanceConfig {
    application_name: CString,
    extensions: Vec<&'static CStr>,
    layers: Vec<&'static CStr>,
    diagnostics: bool,
}

impl InstanceConfig {
    pub fn application_name(&self) -> &CStr {
        &self.application_name
    }

    pub fn extensions(&self) -> &[&'static CStr] {
        &self.extensions
    }

    pub fn layers(&self) -> &[&'static CStr] {
        &self.layers
    }

    pub fn diagnostics(&self) -> bool {
        self.diagnostics
    }
}

/// Surface extensions first, then portability enumeration, then debug utils.
pub fn required_instance_extensions(
    surface_extensions: &[&'static CStr],
    diagnostics: bool,
) -> Vec<&'static CStr> {
    let mut exts = surface_extensions.to_vec();
    exts.push(ash::khr::portability_enumeration::NAME);
    if diagnostics {
        exts.push(ash::ext::debug_utils::NAME);
    }
    exts
}

fn require_all(required: &[&CStr], available: &[CString], capability: Capability) -> Result<()> {
    for &name in required {
        if !has_name(available, name) {
            return Err(BootstrapError::CapabilityMissing {
                capability,
                name: name.to_string_lossy().into_owned(),
            });
        }
        debug!("found required {capability} `{}`", name.to_string_lossy());
    }
    Ok(())
}

pub fn check_validation_support(probe: &impl InstanceProbe, diagnostics: bool) -> Result<()> {
    if !diagnostics {
        return Ok(());
    }
    let layers = probe.instance_layers()?;
    require_all(&VALIDATION_LAYERS, &layers, Capability::ValidationLayer)
}

pub fn negotiate(
    probe: &impl InstanceProbe,
    surface_extensions: &[&'static CStr],
    application_name: &str,
    diagnostics: bool,
) -> Result<InstanceConfig> {
    let application_name = CString::new(application_name)?;

    let extensions = required_instance_extensions(surface_extensions, diagnostics);
    let available = probe.instance_extensions()?;
    require_all(&extensions, &available, Capability::InstanceExtension)?;

    check_validation_support(probe, diagnostics)?;
    let layers = if diagnostics {
        info!("validation layers enabled");
        VALIDATION_LAYERS.to_vec()
    } else {
        Vec::new()
    };

    Ok(InstanceConfig {
        application_name,
        extensions,
        layers,
        diagnostics,
    })
}
