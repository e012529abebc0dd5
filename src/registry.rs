use ash::vk;
use tracing::warn;

use crate::{
    backend::Backend,
    error::{LifecycleError, Resource},
    physical_device::PhysicalDeviceInfo,
    swap_chain::SwapChainConfig,
};

/// Exclusive owner of at most one native resource.
///
/// Filling an occupied slot and taking from an empty slot are both treated as
/// misuse; there is no silent replacement.
pub struct Slot<T> {
    resource: Resource,
    value: Option<T>,
}

impl<T> Slot<T> {
    pub const fn empty(resource: Resource) -> Self {
        Self {
            resource,
            value: None,
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn is_filled(&self) -> bool {
        self.value.is_some()
    }

    /// Errors if the slot is occupied. Lets callers refuse before creating
    /// anything native.
    pub fn ensure_vacant(&self) -> Result<(), LifecycleError> {
        match self.value {
            Some(_) => Err(LifecycleError::AlreadyInitialized(self.resource)),
            None => Ok(()),
        }
    }

    pub fn fill(&mut self, value: T) -> Result<(), LifecycleError> {
        self.ensure_vacant()?;
        self.value = Some(value);
        Ok(())
    }

    pub fn take(&mut self) -> Result<T, LifecycleError> {
        self.value
            .take()
            .ok_or(LifecycleError::AlreadyDestroyed(self.resource))
    }

    /// Empties the slot, tolerating it already being empty.
    pub fn release(&mut self) -> Option<T> {
        self.value.take()
    }

    /// Current occupant. Warns when empty since that is usually a call made
    /// out of order.
    pub fn get(&self) -> Option<&T> {
        if self.value.is_none() {
            warn!(
                "The Vulkan {} is currently null. Are you sure you want to do this?",
                self.resource
            );
        }
        self.value.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    /// Current occupant, without the warning.
    pub fn peek(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn require(&self) -> Result<&T, LifecycleError> {
        self.value.as_ref().ok_or(LifecycleError::Missing(self.resource))
    }
}

/// Every long-lived handle of the graphics stack.
///
/// Fields are declared dependents first so that an implicit drop releases
/// owned guards in reverse creation order. Single-threaded only: callers must
/// not share a registry across threads.
pub struct Registry<B: Backend> {
    /// Parallel to `images`; `None` where creating that view failed
    pub(crate) image_views: Slot<Vec<Option<B::ImageView>>>,
    pub(crate) images: Slot<Vec<B::Image>>,
    pub(crate) swap_chain: Slot<B::Swapchain>,
    pub(crate) logical_device: Slot<B::Device>,
    pub(crate) physical_devices: Slot<Vec<PhysicalDeviceInfo<B>>>,
    pub(crate) surface: Slot<B::Surface>,
    pub(crate) debug_messenger: Slot<B::DebugMessenger>,
    pub(crate) instance: Slot<B::Instance>,
    pub(crate) window: Slot<B::Window>,
    pub(crate) swap_config: Option<SwapChainConfig>,
    pub(crate) selected_device: Option<usize>,
    pub(crate) requested_extent: vk::Extent2D,
}

impl<B: Backend> Registry<B> {
    pub fn new() -> Self {
        Self {
            image_views: Slot::empty(Resource::ImageViews),
            images: Slot::empty(Resource::Images),
            swap_chain: Slot::empty(Resource::SwapChain),
            logical_device: Slot::empty(Resource::LogicalDevice),
            physical_devices: Slot::empty(Resource::PhysicalDevices),
            surface: Slot::empty(Resource::Surface),
            debug_messenger: Slot::empty(Resource::DebugMessenger),
            instance: Slot::empty(Resource::Instance),
            window: Slot::empty(Resource::Window),
            swap_config: None,
            selected_device: None,
            requested_extent: vk::Extent2D::default(),
        }
    }

    pub fn window(&self) -> Option<&B::Window> {
        self.window.get()
    }

    pub fn instance(&self) -> Option<&B::Instance> {
        self.instance.get()
    }

    pub fn debug_messenger(&self) -> Option<&B::DebugMessenger> {
        self.debug_messenger.peek()
    }

    pub fn surface(&self) -> Option<&B::Surface> {
        self.surface.get()
    }

    pub fn physical_devices(&self) -> Option<&[PhysicalDeviceInfo<B>]> {
        self.physical_devices.get().map(Vec::as_slice)
    }

    pub fn logical_device(&self) -> Option<&B::Device> {
        self.logical_device.get()
    }

    pub fn swap_chain(&self) -> Option<&B::Swapchain> {
        self.swap_chain.get()
    }

    pub fn images(&self) -> Option<&[B::Image]> {
        self.images.get().map(Vec::as_slice)
    }

    pub fn image_views(&self) -> Option<&[Option<B::ImageView>]> {
        self.image_views.get().map(Vec::as_slice)
    }

    pub fn swap_config(&self) -> Option<&SwapChainConfig> {
        self.swap_config.as_ref()
    }

    /// The device list entry the logical device was created from.
    pub fn selected_device(&self) -> Option<&PhysicalDeviceInfo<B>> {
        let index = self.selected_device?;
        self.physical_devices.peek()?.get(index)
    }

    pub fn device_count(&self) -> usize {
        self.physical_devices.peek().map_or(0, Vec::len)
    }

    pub fn has_logical_device(&self) -> bool {
        self.logical_device.is_filled()
    }

    /// True when no native resource is registered.
    pub fn is_empty(&self) -> bool {
        !(self.image_views.is_filled()
            || self.images.is_filled()
            || self.swap_chain.is_filled()
            || self.logical_device.is_filled()
            || self.physical_devices.is_filled()
            || self.surface.is_filled()
            || self.debug_messenger.is_filled()
            || self.instance.is_filled()
            || self.window.is_filled())
    }
}

impl<B: Backend> Default for Registry<B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;

    #[test]
    fn filling_twice_is_rejected_and_keeps_the_first_value() {
        let mut slot = Slot::empty(Resource::Instance);
        slot.fill(1).unwrap();
        let error = slot.fill(2).unwrap_err();
        assert!(matches!(
            error,
            LifecycleError::AlreadyInitialized(Resource::Instance)
        ));
        assert_eq!(slot.peek(), Some(&1));
    }

    #[test]
    fn taking_twice_is_rejected() {
        let mut slot = Slot::empty(Resource::Window);
        slot.fill("window").unwrap();
        assert_eq!(slot.take().unwrap(), "window");
        assert!(matches!(
            slot.take(),
            Err(LifecycleError::AlreadyDestroyed(Resource::Window))
        ));
        assert_eq!(slot.release(), None);
    }

    #[test]
    fn require_reports_the_missing_resource() {
        let slot: Slot<u32> = Slot::empty(Resource::Surface);
        assert!(matches!(
            slot.require(),
            Err(LifecycleError::Missing(Resource::Surface))
        ));
        assert_eq!(slot.get(), None);
    }

    #[test]
    fn independent_registries_do_not_share_state() {
        let mut first: Registry<MockBackend> = Registry::new();
        let second: Registry<MockBackend> = Registry::new();
        first.window.fill(7).unwrap();
        assert_eq!(first.window(), Some(&7));
        assert_eq!(second.window(), None);
        assert!(!first.is_empty());
        assert!(second.is_empty());
    }
}
