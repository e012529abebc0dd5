use std::ops::Deref;

use anyhow::Result;
use ash::{
    extensions::khr::Swapchain,
    vk::{DeviceCreateInfo, DeviceQueueCreateInfo, PhysicalDevice},
    Device,
};
use tracing::debug;

use crate::backend::DeviceRequest;

use super::{instance_guard::InstanceGuard, to_c_strings};

/// RAII for logical device, plus its swap chain function table
pub struct LogicalDeviceGuard {
    device: Device,
    pub swapchain_fn: Swapchain,
}

impl LogicalDeviceGuard {
    pub fn try_new(
        instance: &InstanceGuard,
        physical_device: PhysicalDevice,
        request: &DeviceRequest,
    ) -> Result<Self> {
        let device_queue_create_infos = [DeviceQueueCreateInfo::builder()
            .queue_family_index(request.queue_family_index)
            .queue_priorities(&request.queue_priorities)
            .build()];

        let device_extension_names = to_c_strings(&request.extensions)?;
        let device_extension_name_ptrs = device_extension_names
            .iter()
            .map(|device_extension| device_extension.as_ptr())
            .collect::<Vec<_>>();
        let layer_names = to_c_strings(&request.layers)?;
        let layer_name_ptrs = layer_names
            .iter()
            .map(|layer_name| layer_name.as_ptr())
            .collect::<Vec<_>>();

        // device layers are ignored by current loaders, older ones still want them
        #[allow(deprecated)]
        let device_create_info = DeviceCreateInfo::builder()
            .queue_create_infos(&device_queue_create_infos)
            .enabled_extension_names(&device_extension_name_ptrs)
            .enabled_layer_names(&layer_name_ptrs);
        let device = unsafe { instance.create_device(physical_device, &device_create_info, None)? };
        let swapchain_fn = Swapchain::new(instance, &device);

        Ok(Self {
            device,
            swapchain_fn,
        })
    }
}

impl Deref for LogicalDeviceGuard {
    type Target = Device;

    fn deref(&self) -> &Self::Target {
        &self.device
    }
}

impl Drop for LogicalDeviceGuard {
    fn drop(&mut self) {
        debug!("Dropping LogicalDeviceGuard");
        unsafe { self.device.destroy_device(None) }
    }
}
