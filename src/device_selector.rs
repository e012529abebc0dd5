use std::collections::BTreeSet;

use ash::vk;
use tracing::{debug, info, warn};

use crate::{
    backend::{Backend, DeviceRequest},
    config::VALIDATION_LAYER_NAME,
    error::LifecycleError,
    registry::Registry,
};

/// What a single queue family can do for us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueFamilySupport {
    pub has_queues: bool,
    pub presents: bool,
    pub graphics: bool,
}

impl QueueFamilySupport {
    pub fn new(family: &vk::QueueFamilyProperties, presents: bool) -> Self {
        Self {
            has_queues: family.queue_count > 0,
            presents,
            graphics: family.queue_flags.contains(vk::QueueFlags::GRAPHICS),
        }
    }

    pub fn is_graphics_capable(&self) -> bool {
        self.has_queues && self.graphics
    }

    pub fn is_presentation_capable(&self) -> bool {
        self.has_queues && self.presents
    }
}

/// Tests each required extension against the available ones by exact name.
/// When the available list couldn't be read, every requirement fails.
pub fn test_extensions(available: Option<&[String]>, required: &[String]) -> Vec<bool> {
    required
        .iter()
        .map(|wanted| available.map_or(false, |available| available.contains(wanted)))
        .collect()
}

/// Queue family indices usable for both graphics and presentation, lowest
/// first.
///
/// Only a family that does both is accepted; separate graphics and present
/// queues are not requested.
pub fn shared_queue_families(support: &[QueueFamilySupport]) -> Vec<u32> {
    let graphics = support
        .iter()
        .enumerate()
        .filter(|(_, family)| family.is_graphics_capable())
        .map(|(index, _)| index as u32)
        .collect::<BTreeSet<_>>();
    let presentation = support
        .iter()
        .enumerate()
        .filter(|(_, family)| family.is_presentation_capable())
        .map(|(index, _)| index as u32)
        .collect::<BTreeSet<_>>();
    graphics.intersection(&presentation).copied().collect()
}

pub fn is_usable(shared_families: &[u32], extension_test: &[bool]) -> bool {
    !shared_families.is_empty() && extension_test.iter().all(|usable| *usable)
}

/// Tries to create a logical device from `devices[offset]`.
///
/// Returns `Ok(false)` when the device can't satisfy the requirements or the
/// native creation fails. Out-of-range offsets, a missing instance/surface
/// and an already selected device are misuse and return an error.
pub fn try_select<B: Backend>(
    backend: &mut B,
    registry: &mut Registry<B>,
    offset: usize,
    required_extensions: &[String],
    required_layers: &[String],
    debug: bool,
) -> Result<bool, LifecycleError> {
    let devices = registry.physical_devices.require()?;
    let device = devices
        .get(offset)
        .ok_or(LifecycleError::DeviceOffsetOutOfRange {
            offset,
            count: devices.len(),
        })?;
    registry.logical_device.ensure_vacant()?;
    let instance = registry.instance.require()?;
    let surface = registry.surface.require()?;

    let name = device.name();
    debug!("Trying to pick '{}' at devices[{}]", name, offset);

    let available = match backend.device_extensions(instance, device.handle()) {
        Ok(available) => Some(available),
        Err(error) => {
            warn!("Can't get device extensions, continuing: {}", error);
            None
        }
    };
    let extension_test = test_extensions(available.as_deref(), required_extensions);
    for (wanted, usable) in required_extensions.iter().zip(&extension_test) {
        debug!("Device extension usable? '{}': {}", wanted, usable);
    }

    let support = device
        .queue_families()
        .iter()
        .enumerate()
        .map(|(index, family)| {
            debug!("Checking for support at queue index {}...", index);
            let presents = backend
                .surface_support(instance, surface, device.handle(), index as u32)
                .unwrap_or_else(|error| {
                    warn!(
                        "Can't query presentation support of queue index {}: {}",
                        index, error
                    );
                    false
                });
            QueueFamilySupport::new(family, presents)
        })
        .collect::<Vec<_>>();
    let shared_families = shared_queue_families(&support);

    if !is_usable(&shared_families, &extension_test) {
        warn!(
            "Couldn't pick physical device '{}' at offset {}: no shared graphics/present queue or missing extensions",
            name, offset
        );
        return Ok(false);
    }

    let mut layers = required_layers.to_vec();
    if debug {
        info!("Enabling Vulkan device debug layers.");
        if !layers.iter().any(|layer| layer == VALIDATION_LAYER_NAME) {
            layers.push(VALIDATION_LAYER_NAME.to_owned());
        }
    }
    let request = DeviceRequest {
        queue_family_index: shared_families[0],
        queue_priorities: vec![1.0],
        extensions: required_extensions.to_vec(),
        layers,
    };

    match backend.create_device(instance, device.handle(), &request) {
        Ok(logical_device) => {
            info!("Using Vulkan device '{}'.", name);
            registry.logical_device.fill(logical_device)?;
            registry.selected_device = Some(offset);
            Ok(true)
        }
        Err(error) => {
            warn!(
                "Couldn't pick physical device '{}' at offset {}: {}",
                name, offset, error
            );
            Ok(false)
        }
    }
}
