use ash::vk;
use tracing::{debug, error, info, warn};

use crate::{
    backend::{Backend, InstanceRequest, PolledEvent},
    config::{InitRequest, DEBUG_UTILS_EXTENSION_NAME, VALIDATION_LAYER_NAME},
    device_selector,
    error::{LifecycleError, Resource},
    physical_device::PhysicalDeviceInfo,
    registry::Registry,
    swap_chain,
};

/// How far the bring-up sequence has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Uninitialized,
    WindowCreated,
    InstanceCreated,
    SurfaceCreated,
    DevicesEnumerated,
    DeviceSelected,
    SwapChainBuilt,
}

/// Extensions and layers for instance creation: the caller's, then the debug
/// facilities, then whatever the window system still needs.
pub fn merge_instance_names(
    request: &InitRequest,
    window_required: &[String],
) -> (Vec<String>, Vec<String>) {
    let mut extensions = request.extensions.clone();
    let mut layers = request.layers.clone();
    if request.debug {
        layers.push(VALIDATION_LAYER_NAME.to_owned());
        extensions.push(DEBUG_UTILS_EXTENSION_NAME.to_owned());
    }
    for required in window_required {
        if !extensions.contains(required) {
            extensions.push(required.clone());
        }
    }
    (extensions, layers)
}

/// Owns the backend and the registry, and sequences creation and
/// destruction of everything in it.
pub struct Orchestrator<B: Backend> {
    backend: B,
    registry: Registry<B>,
    stage: Stage,
}

impl<B: Backend> Orchestrator<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            registry: Registry::new(),
            stage: Stage::Uninitialized,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn registry(&self) -> &Registry<B> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry<B> {
        &mut self.registry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Window, instance (and debug messenger), surface, then device
    /// enumeration. Any failure here aborts the bring-up.
    pub fn init(&mut self, request: &InitRequest) -> Result<(), LifecycleError> {
        self.registry.instance.ensure_vacant()?;
        self.registry.window.ensure_vacant()?;
        self.registry.surface.ensure_vacant()?;
        self.registry.debug_messenger.ensure_vacant()?;
        self.registry.physical_devices.ensure_vacant()?;

        let title = request.window_title();
        let window = self
            .backend
            .create_window(&title, request.width, request.height, request.fullscreen)
            .map_err(|source| fatal("Vulkan window creation", source))?;
        self.registry.window.fill(window)?;
        self.registry.requested_extent = vk::Extent2D {
            width: u32::from(request.width),
            height: u32::from(request.height),
        };
        self.stage = Stage::WindowCreated;
        debug!("Created window '{}'", title);

        let window = self.registry.window.require()?;
        let window_required = self
            .backend
            .required_instance_extensions(window)
            .map_err(|source| fatal("Gathering required Vulkan instance extensions", source))?;
        let (extensions, layers) = merge_instance_names(request, &window_required);
        debug!("Debug facilities: {}", request.debug);
        if request.debug {
            info!("Enabling Vulkan debug layers and extensions.");
        }
        debug!("Instance extensions: {:?}", extensions);
        debug!("Instance layers: {:?}", layers);

        let instance_request = InstanceRequest {
            application_name: request.application_name.clone(),
            application_version: request.application_version,
            extensions,
            layers,
            debug: request.debug,
        };
        let instance = self
            .backend
            .create_instance(&instance_request)
            .map_err(|source| fatal("Vulkan instance creation", source))?;
        self.registry.instance.fill(instance)?;
        self.stage = Stage::InstanceCreated;

        let instance = self.registry.instance.require()?;
        if request.debug {
            match self.backend.create_debug_messenger(instance) {
                Ok(messenger) => self.registry.debug_messenger.fill(messenger)?,
                Err(error) => warn!("Can't create the Vulkan debug messenger: {}", error),
            }
        }

        let window = self.registry.window.require()?;
        let surface = self
            .backend
            .create_surface(instance, window)
            .map_err(|source| fatal("Vulkan surface creation", source))?;
        self.registry.surface.fill(surface)?;
        self.stage = Stage::SurfaceCreated;

        debug!("Enumerating Vulkan devices...");
        let surface = self.registry.surface.require()?;
        let handles = self
            .backend
            .enumerate_physical_devices(instance)
            .map_err(|source| fatal("Vulkan device enumeration", source))?;
        let devices = handles
            .into_iter()
            .map(|handle| PhysicalDeviceInfo::inspect(&self.backend, instance, surface, handle))
            .collect::<Vec<_>>();
        self.registry.physical_devices.fill(devices)?;
        self.stage = Stage::DevicesEnumerated;

        info!("Engine is started.");
        Ok(())
    }

    /// Tries `devices[offset]` as the logical device and builds its swap
    /// chain. True only when both succeed.
    pub fn try_use_device(
        &mut self,
        offset: usize,
        extensions: &[String],
        layers: &[String],
        debug: bool,
    ) -> Result<bool, LifecycleError> {
        if !device_selector::try_select(
            &mut self.backend,
            &mut self.registry,
            offset,
            extensions,
            layers,
            debug,
        )? {
            return Ok(false);
        }
        self.stage = Stage::DeviceSelected;

        if !swap_chain::build(&mut self.backend, &mut self.registry)? {
            warn!("Couldn't pick physical device {}", offset);
            return Ok(false);
        }
        self.stage = Stage::SwapChainBuilt;
        Ok(true)
    }

    pub fn poll_event(&mut self) -> Option<PolledEvent> {
        let window = self.registry.window.get()?;
        self.backend.poll_event(window)
    }

    /// Tears everything down in reverse dependency order.
    ///
    /// Surface, instance and window must all exist; nothing is destroyed if
    /// any of them is missing. Swap chain, device and debug messenger may be
    /// absent.
    pub fn deinit(&mut self) -> Result<(), LifecycleError> {
        for (filled, resource) in [
            (self.registry.surface.is_filled(), Resource::Surface),
            (self.registry.instance.is_filled(), Resource::Instance),
            (self.registry.window.is_filled(), Resource::Window),
        ] {
            if !filled {
                return Err(LifecycleError::AlreadyDestroyed(resource));
            }
        }
        self.release_all();
        info!("Engine is stopped.");
        Ok(())
    }

    fn release_all(&mut self) {
        let registry = &mut self.registry;
        let backend = &mut self.backend;

        let image_views = registry.image_views.release();
        let swap_chain = registry.swap_chain.release();
        registry.images.release();
        match registry.logical_device.release() {
            Some(device) => {
                for image_view in image_views.into_iter().flatten().flatten() {
                    backend.destroy_image_view(&device, image_view);
                }
                if let Some(swap_chain) = swap_chain {
                    backend.destroy_swapchain(&device, swap_chain);
                }
                backend.destroy_device(device);
                debug!("Destroyed the logical device");
            }
            None if image_views.is_some() || swap_chain.is_some() => {
                error!("Swap chain resources outlived their logical device, leaking them");
            }
            None => {}
        }
        registry.physical_devices.release();
        registry.selected_device = None;

        match registry.instance.release() {
            Some(instance) => {
                if let Some(surface) = registry.surface.release() {
                    backend.destroy_surface(&instance, surface);
                }
                if let Some(messenger) = registry.debug_messenger.release() {
                    backend.destroy_debug_messenger(&instance, messenger);
                    debug!("Freed the debug messenger");
                }
                backend.destroy_instance(instance);
            }
            None if registry.surface.is_filled() || registry.debug_messenger.is_filled() => {
                error!("Instance children outlived their instance, leaking them");
            }
            None => {}
        }

        if let Some(window) = registry.window.release() {
            backend.destroy_window(window);
        }
        self.stage = Stage::Uninitialized;
    }
}

impl<B: Backend> Drop for Orchestrator<B> {
    fn drop(&mut self) {
        if !self.registry.is_empty() {
            warn!("Graphics stack was not torn down, releasing what is left");
            self.release_all();
        }
    }
}

fn fatal(step: &'static str, source: anyhow::Error) -> LifecycleError {
    error!("{} failed: {:#}", step, source);
    LifecycleError::native(step, source)
}
