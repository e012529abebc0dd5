use ash::vk;
use tracing::{debug, info, warn};

use crate::{
    backend::{Backend, SwapchainRequest},
    error::{LifecycleError, Resource},
    registry::Registry,
};

/// The surface format, color space and present mode every swap chain should
/// use. Set once per registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapChainConfig {
    pub format: vk::Format,
    pub color_space: vk::ColorSpaceKHR,
    pub present_mode: vk::PresentModeKHR,
}

impl SwapChainConfig {
    /// Makes this the configuration for `registry`. Only the first call
    /// takes effect; later ones are logged and ignored.
    pub fn use_globally<B: Backend>(&self, registry: &mut Registry<B>) -> bool {
        if registry.swap_config.is_some() {
            warn!("Swapchain config already set, refusing to set again...");
            return false;
        }
        registry.swap_config = Some(*self);
        info!("Swapchain config has been globally set");
        true
    }
}

/// Which parts of a [`SwapChainConfig`] the device supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintSupport {
    pub format: bool,
    pub color_space: bool,
    pub present_mode: bool,
}

impl ConstraintSupport {
    pub fn check(
        config: &SwapChainConfig,
        formats: &[vk::SurfaceFormatKHR],
        present_modes: &[vk::PresentModeKHR],
    ) -> Self {
        Self {
            format: formats.iter().any(|format| format.format == config.format),
            color_space: formats
                .iter()
                .any(|format| format.color_space == config.color_space),
            present_mode: present_modes.contains(&config.present_mode),
        }
    }

    pub fn all(&self) -> bool {
        self.format && self.color_space && self.present_mode
    }

    fn unmet(&self) -> Vec<&'static str> {
        [
            (self.format, "format"),
            (self.color_space, "colorspace"),
            (self.present_mode, "presentmode"),
        ]
        .into_iter()
        .filter(|(met, _)| !met)
        .map(|(_, name)| name)
        .collect()
    }
}

/// Uses the surface's current extent when it reports one, otherwise clamps the
/// requested size into the allowed range. Inverted bounds pick the maximum
/// rather than panicking.
pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    requested: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    vk::Extent2D {
        width: requested
            .width
            .max(capabilities.min_image_extent.width)
            .min(capabilities.max_image_extent.width),
        height: requested
            .height
            .max(capabilities.min_image_extent.height)
            .min(capabilities.max_image_extent.height),
    }
}

/// One more than the minimum, capped by the maximum. A maximum of zero means
/// there is no cap.
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let image_count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 && image_count > capabilities.max_image_count {
        return capabilities.max_image_count;
    }
    image_count
}

/// Builds the swap chain and one image view per swap image for the selected
/// device.
///
/// Unmet device constraints and native failures return `Ok(false)`. Whatever
/// was created before a failure stays registered and is released at teardown.
pub fn build<B: Backend>(
    backend: &mut B,
    registry: &mut Registry<B>,
) -> Result<bool, LifecycleError> {
    let config = registry
        .swap_config
        .ok_or(LifecycleError::Missing(Resource::SwapChainConfig))?;
    registry.swap_chain.ensure_vacant()?;
    registry.images.ensure_vacant()?;
    registry.image_views.ensure_vacant()?;
    let device_info = registry
        .selected_device
        .and_then(|index| registry.physical_devices.peek()?.get(index))
        .ok_or(LifecycleError::Missing(Resource::LogicalDevice))?;
    let logical_device = registry.logical_device.require()?;
    let surface = registry.surface.require()?;

    let Some(capabilities) = device_info.surface_capabilities().copied() else {
        warn!("Device doesn't have valid surface capabilities.");
        return Ok(false);
    };

    let extent = choose_extent(&capabilities, registry.requested_extent);
    info!("Using {}x{} swap extent.", extent.width, extent.height);
    let image_count = choose_image_count(&capabilities);
    info!("Using {} swap images.", image_count);

    let support = ConstraintSupport::check(
        &config,
        device_info.surface_formats(),
        device_info.present_modes(),
    );
    info!("swapchain constraint format: {}", support.format);
    info!("swapchain constraint colorspace: {}", support.color_space);
    info!("swapchain constraint presentmode: {}", support.present_mode);
    if !support.all() {
        warn!(
            "Device swapchain constraints selected are incompatible: {} unsupported.",
            support.unmet().join(", ")
        );
        return Ok(false);
    }

    let request = SwapchainRequest {
        min_image_count: image_count,
        format: config.format,
        color_space: config.color_space,
        present_mode: config.present_mode,
        extent,
        pre_transform: capabilities.current_transform,
    };
    let swap_chain = match backend.create_swapchain(logical_device, surface, &request) {
        Ok(swap_chain) => swap_chain,
        Err(error) => {
            warn!("Failed to create a swapchain and images: {}", error);
            return Ok(false);
        }
    };
    info!("Created a swapchain.");

    let images = match backend.swapchain_images(logical_device, &swap_chain) {
        Ok(images) => images,
        Err(error) => {
            warn!("Failed to get the swapchain images: {}", error);
            registry.swap_chain.fill(swap_chain)?;
            return Ok(false);
        }
    };
    info!("Implementation wants {} images", images.len());

    let mut image_views = Vec::with_capacity(images.len());
    let mut failures = 0;
    for (index, image) in images.iter().enumerate() {
        debug!("Creating image view {}", index);
        match backend.create_image_view(logical_device, *image, config.format) {
            Ok(image_view) => image_views.push(Some(image_view)),
            Err(error) => {
                warn!("Failed to create image view {}: {}", index, error);
                image_views.push(None);
                failures += 1;
            }
        }
    }

    registry.swap_chain.fill(swap_chain)?;
    registry.images.fill(images)?;
    registry.image_views.fill(image_views)?;

    if failures > 0 {
        return Ok(false);
    }
    info!("Successfully created all image views.");
    Ok(true)
}
