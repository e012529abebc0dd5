mod instance_guard;
mod logical_device_guard;
mod window_guard;

use std::{
    ffi::{CStr, CString},
    mem::MaybeUninit,
    ptr,
};

use anyhow::{anyhow, Result};
use ash::{
    vk::{
        self, ComponentMapping, ComponentSwizzle, CompositeAlphaFlagsKHR, ImageAspectFlags,
        ImageSubresourceRange, ImageUsageFlags, ImageViewCreateInfo, ImageViewType, SharingMode,
        SwapchainCreateInfoKHR,
    },
    Entry,
};
use glfw::{fail_on_errors, Glfw};

pub use self::{
    instance_guard::InstanceGuard, logical_device_guard::LogicalDeviceGuard,
    window_guard::WindowGuard,
};
use crate::{
    backend::{Backend, DeviceRequest, InstanceRequest, PolledEvent, SwapchainRequest},
    logging::debug_messenger_create_info,
};

pub(crate) fn to_c_strings(names: &[String]) -> Result<Vec<CString>> {
    Ok(names
        .iter()
        .map(|name| CString::new(name.as_str()))
        .collect::<Result<_, _>>()?)
}

/// The production backend: Vulkan through a runtime-loaded `ash` entry and
/// windows, surfaces and events through GLFW.
pub struct NativeBackend {
    entry: Entry,
    glfw: Glfw,
}

impl NativeBackend {
    pub fn try_new() -> Result<Self> {
        let entry = unsafe { Entry::load()? };
        let glfw = glfw::init(fail_on_errors!())?;
        if !glfw.vulkan_supported() {
            return Err(anyhow!("GLFW can't find a Vulkan loader"));
        }
        Ok(Self { entry, glfw })
    }
}

impl Backend for NativeBackend {
    type Window = WindowGuard;
    type Instance = InstanceGuard;
    type DebugMessenger = vk::DebugUtilsMessengerEXT;
    type Surface = vk::SurfaceKHR;
    type PhysicalDevice = vk::PhysicalDevice;
    type Device = LogicalDeviceGuard;
    type Swapchain = vk::SwapchainKHR;
    type Image = vk::Image;
    type ImageView = vk::ImageView;

    fn create_window(
        &mut self,
        title: &str,
        width: u16,
        height: u16,
        fullscreen: bool,
    ) -> Result<WindowGuard> {
        WindowGuard::try_new(&mut self.glfw, title, width, height, fullscreen)
    }

    fn required_instance_extensions(&self, _window: &WindowGuard) -> Result<Vec<String>> {
        self.glfw
            .get_required_instance_extensions()
            .ok_or(anyhow!("GLFW can't present to Vulkan surfaces"))
    }

    fn create_instance(&mut self, request: &InstanceRequest) -> Result<InstanceGuard> {
        InstanceGuard::try_new(&self.entry, request)
    }

    fn create_debug_messenger(
        &mut self,
        instance: &InstanceGuard,
    ) -> Result<vk::DebugUtilsMessengerEXT> {
        let create_info = debug_messenger_create_info();
        Ok(unsafe {
            instance
                .debug_utils
                .create_debug_utils_messenger(&create_info, None)?
        })
    }

    fn create_surface(
        &mut self,
        instance: &InstanceGuard,
        window: &WindowGuard,
    ) -> Result<vk::SurfaceKHR> {
        let mut surface: MaybeUninit<vk::SurfaceKHR> = MaybeUninit::uninit();
        window
            .window
            .create_window_surface(instance.handle(), ptr::null(), surface.as_mut_ptr())
            .result()?;
        Ok(unsafe { surface.assume_init() })
    }

    fn enumerate_physical_devices(
        &self,
        instance: &InstanceGuard,
    ) -> Result<Vec<vk::PhysicalDevice>> {
        Ok(unsafe { instance.enumerate_physical_devices()? })
    }

    fn queue_family_properties(
        &self,
        instance: &InstanceGuard,
        physical_device: vk::PhysicalDevice,
    ) -> Vec<vk::QueueFamilyProperties> {
        unsafe { instance.get_physical_device_queue_family_properties(physical_device) }
    }

    fn physical_device_properties(
        &self,
        instance: &InstanceGuard,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceProperties {
        unsafe { instance.get_physical_device_properties(physical_device) }
    }

    fn physical_device_features(
        &self,
        instance: &InstanceGuard,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceFeatures {
        unsafe { instance.get_physical_device_features(physical_device) }
    }

    fn surface_capabilities(
        &self,
        instance: &InstanceGuard,
        surface: &vk::SurfaceKHR,
        physical_device: vk::PhysicalDevice,
    ) -> Result<vk::SurfaceCapabilitiesKHR> {
        Ok(unsafe {
            instance
                .surface_fn
                .get_physical_device_surface_capabilities(physical_device, *surface)
        }?)
    }

    fn surface_present_modes(
        &self,
        instance: &InstanceGuard,
        surface: &vk::SurfaceKHR,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Vec<vk::PresentModeKHR>> {
        Ok(unsafe {
            instance
                .surface_fn
                .get_physical_device_surface_present_modes(physical_device, *surface)
        }?)
    }

    fn surface_formats(
        &self,
        instance: &InstanceGuard,
        surface: &vk::SurfaceKHR,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Vec<vk::SurfaceFormatKHR>> {
        Ok(unsafe {
            instance
                .surface_fn
                .get_physical_device_surface_formats(physical_device, *surface)
        }?)
    }

    fn surface_support(
        &self,
        instance: &InstanceGuard,
        surface: &vk::SurfaceKHR,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
    ) -> Result<bool> {
        Ok(unsafe {
            instance.surface_fn.get_physical_device_surface_support(
                physical_device,
                queue_family_index,
                *surface,
            )
        }?)
    }

    fn device_extensions(
        &self,
        instance: &InstanceGuard,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Vec<String>> {
        let properties = unsafe { instance.enumerate_device_extension_properties(physical_device)? };
        Ok(properties
            .iter()
            .map(|extension| {
                unsafe { CStr::from_ptr(extension.extension_name.as_ptr()) }
                    .to_string_lossy()
                    .into_owned()
            })
            .collect())
    }

    fn create_device(
        &mut self,
        instance: &InstanceGuard,
        physical_device: vk::PhysicalDevice,
        request: &DeviceRequest,
    ) -> Result<LogicalDeviceGuard> {
        LogicalDeviceGuard::try_new(instance, physical_device, request)
    }

    fn create_swapchain(
        &mut self,
        device: &LogicalDeviceGuard,
        surface: &vk::SurfaceKHR,
        request: &SwapchainRequest,
    ) -> Result<vk::SwapchainKHR> {
        let swap_chain_creation_info = SwapchainCreateInfoKHR::builder()
            .surface(*surface)
            .min_image_count(request.min_image_count)
            .image_format(request.format)
            .image_color_space(request.color_space)
            .image_extent(request.extent)
            .image_array_layers(1)
            .image_usage(ImageUsageFlags::COLOR_ATTACHMENT)
            // one queue family does both graphics and presentation
            .image_sharing_mode(SharingMode::EXCLUSIVE)
            .pre_transform(request.pre_transform)
            // ignore alpha channel
            .composite_alpha(CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(request.present_mode)
            .clipped(true);
        Ok(unsafe {
            device
                .swapchain_fn
                .create_swapchain(&swap_chain_creation_info, None)
        }?)
    }

    fn swapchain_images(
        &self,
        device: &LogicalDeviceGuard,
        swapchain: &vk::SwapchainKHR,
    ) -> Result<Vec<vk::Image>> {
        Ok(unsafe { device.swapchain_fn.get_swapchain_images(*swapchain) }?)
    }

    fn create_image_view(
        &mut self,
        device: &LogicalDeviceGuard,
        image: vk::Image,
        format: vk::Format,
    ) -> Result<vk::ImageView> {
        let image_view_create_info = ImageViewCreateInfo::builder()
            .image(image)
            .view_type(ImageViewType::TYPE_2D)
            .format(format)
            .components(ComponentMapping {
                r: ComponentSwizzle::IDENTITY,
                g: ComponentSwizzle::IDENTITY,
                b: ComponentSwizzle::IDENTITY,
                a: ComponentSwizzle::IDENTITY,
            })
            .subresource_range(
                ImageSubresourceRange::builder()
                    .aspect_mask(ImageAspectFlags::COLOR)
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1)
                    .build(),
            );
        Ok(unsafe { device.create_image_view(&image_view_create_info, None) }?)
    }

    fn poll_event(&mut self, window: &WindowGuard) -> Option<PolledEvent> {
        window.poll_event(&mut self.glfw)
    }

    fn destroy_image_view(&mut self, device: &LogicalDeviceGuard, image_view: vk::ImageView) {
        unsafe { device.destroy_image_view(image_view, None) }
    }

    fn destroy_swapchain(&mut self, device: &LogicalDeviceGuard, swapchain: vk::SwapchainKHR) {
        unsafe { device.swapchain_fn.destroy_swapchain(swapchain, None) }
    }

    fn destroy_device(&mut self, device: LogicalDeviceGuard) {
        drop(device);
    }

    fn destroy_surface(&mut self, instance: &InstanceGuard, surface: vk::SurfaceKHR) {
        unsafe { instance.surface_fn.destroy_surface(surface, None) }
    }

    fn destroy_debug_messenger(
        &mut self,
        instance: &InstanceGuard,
        messenger: vk::DebugUtilsMessengerEXT,
    ) {
        unsafe {
            instance
                .debug_utils
                .destroy_debug_utils_messenger(messenger, None)
        }
    }

    fn destroy_instance(&mut self, instance: InstanceGuard) {
        drop(instance);
    }

    fn destroy_window(&mut self, window: WindowGuard) {
        drop(window);
    }
}
