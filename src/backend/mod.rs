#[cfg(test)]
pub(crate) mod mock;

use anyhow::Result;
use ash::vk;

/// Parameters for instance creation, already merged by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRequest {
    pub application_name: String,
    pub application_version: u32,
    pub extensions: Vec<String>,
    pub layers: Vec<String>,
    /// Chain a debug messenger create info into instance creation
    pub debug: bool,
}

/// Parameters for logical device creation. Always exactly one queue.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRequest {
    pub queue_family_index: u32,
    pub queue_priorities: Vec<f32>,
    pub extensions: Vec<String>,
    pub layers: Vec<String>,
}

/// Negotiated swap chain parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainRequest {
    pub min_image_count: u32,
    pub format: vk::Format,
    pub color_space: vk::ColorSpaceKHR,
    pub present_mode: vk::PresentModeKHR,
    pub extent: vk::Extent2D,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolledEvent {
    Quit,
    Other,
}

/// The native windowing and graphics calls the bring-up sequence is built
/// from. Each resource is an owned associated type; destroy calls consume it.
pub trait Backend {
    type Window;
    type Instance;
    type DebugMessenger;
    type Surface;
    type PhysicalDevice: Copy;
    type Device;
    type Swapchain;
    type Image: Copy;
    type ImageView;

    fn create_window(
        &mut self,
        title: &str,
        width: u16,
        height: u16,
        fullscreen: bool,
    ) -> Result<Self::Window>;

    /// Instance extensions the window system needs to present to `window`.
    fn required_instance_extensions(&self, window: &Self::Window) -> Result<Vec<String>>;

    fn create_instance(&mut self, request: &InstanceRequest) -> Result<Self::Instance>;

    fn create_debug_messenger(&mut self, instance: &Self::Instance)
        -> Result<Self::DebugMessenger>;

    fn create_surface(
        &mut self,
        instance: &Self::Instance,
        window: &Self::Window,
    ) -> Result<Self::Surface>;

    fn enumerate_physical_devices(
        &self,
        instance: &Self::Instance,
    ) -> Result<Vec<Self::PhysicalDevice>>;

    fn queue_family_properties(
        &self,
        instance: &Self::Instance,
        physical_device: Self::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties>;

    fn physical_device_properties(
        &self,
        instance: &Self::Instance,
        physical_device: Self::PhysicalDevice,
    ) -> vk::PhysicalDeviceProperties;

    fn physical_device_features(
        &self,
        instance: &Self::Instance,
        physical_device: Self::PhysicalDevice,
    ) -> vk::PhysicalDeviceFeatures;

    fn surface_capabilities(
        &self,
        instance: &Self::Instance,
        surface: &Self::Surface,
        physical_device: Self::PhysicalDevice,
    ) -> Result<vk::SurfaceCapabilitiesKHR>;

    fn surface_present_modes(
        &self,
        instance: &Self::Instance,
        surface: &Self::Surface,
        physical_device: Self::PhysicalDevice,
    ) -> Result<Vec<vk::PresentModeKHR>>;

    fn surface_formats(
        &self,
        instance: &Self::Instance,
        surface: &Self::Surface,
        physical_device: Self::PhysicalDevice,
    ) -> Result<Vec<vk::SurfaceFormatKHR>>;

    fn surface_support(
        &self,
        instance: &Self::Instance,
        surface: &Self::Surface,
        physical_device: Self::PhysicalDevice,
        queue_family_index: u32,
    ) -> Result<bool>;

    fn device_extensions(
        &self,
        instance: &Self::Instance,
        physical_device: Self::PhysicalDevice,
    ) -> Result<Vec<String>>;

    fn create_device(
        &mut self,
        instance: &Self::Instance,
        physical_device: Self::PhysicalDevice,
        request: &DeviceRequest,
    ) -> Result<Self::Device>;

    fn create_swapchain(
        &mut self,
        device: &Self::Device,
        surface: &Self::Surface,
        request: &SwapchainRequest,
    ) -> Result<Self::Swapchain>;

    fn swapchain_images(
        &self,
        device: &Self::Device,
        swapchain: &Self::Swapchain,
    ) -> Result<Vec<Self::Image>>;

    fn create_image_view(
        &mut self,
        device: &Self::Device,
        image: Self::Image,
        format: vk::Format,
    ) -> Result<Self::ImageView>;

    fn poll_event(&mut self, window: &Self::Window) -> Option<PolledEvent>;

    fn destroy_image_view(&mut self, device: &Self::Device, image_view: Self::ImageView);
    fn destroy_swapchain(&mut self, device: &Self::Device, swapchain: Self::Swapchain);
    fn destroy_device(&mut self, device: Self::Device);
    fn destroy_surface(&mut self, instance: &Self::Instance, surface: Self::Surface);
    fn destroy_debug_messenger(
        &mut self,
        instance: &Self::Instance,
        messenger: Self::DebugMessenger,
    );
    fn destroy_instance(&mut self, instance: Self::Instance);
    fn destroy_window(&mut self, window: Self::Window);
}
