use std::ffi::CStr;

use ash::vk;
use tracing::{debug, info, warn};

use crate::backend::Backend;

/// Snapshot of a physical device taken once at enumeration time.
///
/// Surface queries are allowed to fail: a device without surface capabilities
/// simply can't host a swap chain.
pub struct PhysicalDeviceInfo<B: Backend> {
    handle: B::PhysicalDevice,
    properties: vk::PhysicalDeviceProperties,
    features: vk::PhysicalDeviceFeatures,
    queue_families: Vec<vk::QueueFamilyProperties>,
    surface_capabilities: Option<vk::SurfaceCapabilitiesKHR>,
    present_modes: Vec<vk::PresentModeKHR>,
    surface_formats: Vec<vk::SurfaceFormatKHR>,
}

impl<B: Backend> PhysicalDeviceInfo<B> {
    pub fn inspect(
        backend: &B,
        instance: &B::Instance,
        surface: &B::Surface,
        handle: B::PhysicalDevice,
    ) -> Self {
        let properties = backend.physical_device_properties(instance, handle);
        let name = device_name(&properties);
        debug!("Got properties of device '{}'", name);
        let features = backend.physical_device_features(instance, handle);
        debug!("Got features of device '{}'", name);
        let queue_families = backend.queue_family_properties(instance, handle);
        debug!(
            "Got {} queue families of device '{}'",
            queue_families.len(),
            name
        );

        debug!("Getting potential surface capabilities of device '{}'", name);
        let surface_capabilities = match backend.surface_capabilities(instance, surface, handle) {
            Ok(capabilities) => {
                info!("Got surface capabilities of device '{}'.", name);
                Some(capabilities)
            }
            Err(error) => {
                warn!(
                    "Unable to get surface capabilities of device '{}', is it not a GPU? {}",
                    name, error
                );
                None
            }
        };

        let present_modes = match backend.surface_present_modes(instance, surface, handle) {
            Ok(present_modes) => {
                info!("Got presentation modes of device '{}'.", name);
                present_modes
            }
            Err(error) => {
                warn!(
                    "Unable to get presentation modes of device '{}': {}",
                    name, error
                );
                vec![]
            }
        };

        let surface_formats = match backend.surface_formats(instance, surface, handle) {
            Ok(formats) => {
                info!("Got surface formats of device '{}'.", name);
                formats
            }
            Err(error) => {
                warn!("Unable to get surface formats of device '{}': {}", name, error);
                vec![]
            }
        };

        info!("Enumerated Vulkan device '{}'", name);

        Self {
            handle,
            properties,
            features,
            queue_families,
            surface_capabilities,
            present_modes,
            surface_formats,
        }
    }

    pub fn handle(&self) -> B::PhysicalDevice {
        self.handle
    }

    pub fn name(&self) -> String {
        device_name(&self.properties)
    }

    pub fn properties(&self) -> &vk::PhysicalDeviceProperties {
        &self.properties
    }

    pub fn features(&self) -> &vk::PhysicalDeviceFeatures {
        &self.features
    }

    pub fn queue_families(&self) -> &[vk::QueueFamilyProperties] {
        &self.queue_families
    }

    pub fn surface_capabilities(&self) -> Option<&vk::SurfaceCapabilitiesKHR> {
        self.surface_capabilities.as_ref()
    }

    pub fn present_modes(&self) -> &[vk::PresentModeKHR] {
        &self.present_modes
    }

    pub fn surface_formats(&self) -> &[vk::SurfaceFormatKHR] {
        &self.surface_formats
    }
}

fn device_name(properties: &vk::PhysicalDeviceProperties) -> String {
    // device_name is a fixed-size, nul-terminated array
    unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}
