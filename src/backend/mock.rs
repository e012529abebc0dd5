use std::{
    cell::RefCell,
    collections::{BTreeMap, VecDeque},
    io,
    rc::Rc,
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, bail, Result};
use ash::vk;

use super::{Backend, DeviceRequest, InstanceRequest, PolledEvent, SwapchainRequest};

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut captured) = self.0.lock() {
            captured.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a subscriber that records every event, and returns the
/// formatted output.
pub fn capture_logs(f: impl FnOnce()) -> String {
    let captured = CapturedLogs::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = captured.0.lock().map(|bytes| bytes.clone()).unwrap_or_default();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Calls and violations, shared so they outlive the backend.
#[derive(Debug, Default)]
pub struct MockRecord {
    pub journal: Vec<String>,
    pub violations: Vec<String>,
}

impl MockRecord {
    /// Journal entries for destroy calls, in order.
    pub fn destroy_calls(&self) -> Vec<String> {
        self.journal
            .iter()
            .filter(|entry| entry.starts_with("destroy_"))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct MockQueueFamily {
    pub queue_count: u32,
    pub flags: vk::QueueFlags,
    pub presents: bool,
}

impl MockQueueFamily {
    pub fn new(queue_count: u32, flags: vk::QueueFlags, presents: bool) -> Self {
        Self {
            queue_count,
            flags,
            presents,
        }
    }
}

/// A fake physical device. `None` on a query field makes that query fail.
#[derive(Debug, Clone)]
pub struct MockDevice {
    pub name: &'static str,
    pub queue_families: Vec<MockQueueFamily>,
    pub extensions: Option<Vec<String>>,
    pub capabilities: Option<vk::SurfaceCapabilitiesKHR>,
    pub formats: Option<Vec<vk::SurfaceFormatKHR>>,
    pub present_modes: Option<Vec<vk::PresentModeKHR>>,
    pub fail_device_creation: bool,
    pub fail_swapchain_creation: bool,
    pub swapchain_image_count: u32,
    pub failing_image_views: Vec<usize>,
}

impl MockDevice {
    /// A GPU with one graphics + present family and swap chain support.
    pub fn capable(name: &'static str) -> Self {
        Self {
            name,
            queue_families: vec![MockQueueFamily::new(
                1,
                vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER,
                true,
            )],
            extensions: Some(vec!["VK_KHR_swapchain".to_owned()]),
            capabilities: Some(vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 3,
                current_extent: vk::Extent2D {
                    width: 1280,
                    height: 720,
                },
                min_image_extent: vk::Extent2D {
                    width: 1,
                    height: 1,
                },
                max_image_extent: vk::Extent2D {
                    width: 4096,
                    height: 4096,
                },
                ..Default::default()
            }),
            formats: Some(vec![vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }]),
            present_modes: Some(vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX]),
            fail_device_creation: false,
            fail_swapchain_creation: false,
            swapchain_image_count: 3,
            failing_image_views: vec![],
        }
    }

    /// A software rasterizer that can't talk to the surface at all.
    pub fn headless(name: &'static str) -> Self {
        Self {
            queue_families: vec![MockQueueFamily::new(1, vk::QueueFlags::GRAPHICS, false)],
            capabilities: None,
            formats: None,
            present_modes: None,
            ..Self::capable(name)
        }
    }
}

/// In-memory backend that journals every call and checks destroy ordering.
#[derive(Debug, Default)]
pub struct MockBackend {
    pub devices: Vec<MockDevice>,
    pub window_extensions: Vec<String>,
    pub fail_window: bool,
    pub fail_window_extensions: bool,
    pub fail_instance: bool,
    pub fail_debug_messenger: bool,
    pub fail_surface: bool,
    pub events: VecDeque<PolledEvent>,
    pub record: Rc<RefCell<MockRecord>>,
    pub instance_requests: Vec<InstanceRequest>,
    pub device_requests: Vec<DeviceRequest>,
    pub swapchain_requests: Vec<SwapchainRequest>,
    live: BTreeMap<u64, &'static str>,
    next_handle: u64,
}

impl MockBackend {
    pub fn with_devices(devices: Vec<MockDevice>) -> Self {
        Self {
            devices,
            window_extensions: vec![
                "VK_KHR_surface".to_owned(),
                "VK_KHR_xlib_surface".to_owned(),
            ],
            ..Default::default()
        }
    }

    pub fn live_count(&self, kind: &str) -> usize {
        self.live.values().filter(|live| **live == kind).count()
    }

    pub fn journal(&self) -> Vec<String> {
        self.record.borrow().journal.clone()
    }

    pub fn violations(&self) -> Vec<String> {
        self.record.borrow().violations.clone()
    }

    pub fn destroy_calls(&self) -> Vec<String> {
        self.record.borrow().destroy_calls()
    }

    fn allocate(&mut self, kind: &'static str) -> u64 {
        self.next_handle += 1;
        self.live.insert(self.next_handle, kind);
        self.record.borrow_mut().journal.push(format!("create_{kind}"));
        self.next_handle
    }

    fn release(&mut self, handle: u64, kind: &'static str, dependents: &[&'static str]) {
        let mut record = self.record.borrow_mut();
        record.journal.push(format!("destroy_{kind}"));
        for dependent in dependents {
            if self.live.values().any(|live| live == dependent) {
                record
                    .violations
                    .push(format!("{kind} destroyed while a {dependent} is alive"));
            }
        }
        if self.live.remove(&handle) != Some(kind) {
            record
                .violations
                .push(format!("{kind} {handle} destroyed but was not alive"));
        }
    }

    fn device(&self, physical_device: usize) -> Result<&MockDevice> {
        self.devices
            .get(physical_device)
            .ok_or_else(|| anyhow!("unknown physical device {physical_device}"))
    }
}

fn device_name(name: &str) -> [std::os::raw::c_char; vk::MAX_PHYSICAL_DEVICE_NAME_SIZE] {
    let mut device_name = [0; vk::MAX_PHYSICAL_DEVICE_NAME_SIZE];
    for (slot, byte) in device_name.iter_mut().zip(name.bytes()) {
        *slot = byte as std::os::raw::c_char;
    }
    device_name
}

impl Backend for MockBackend {
    type Window = u64;
    type Instance = u64;
    type DebugMessenger = u64;
    type Surface = u64;
    type PhysicalDevice = usize;
    type Device = u64;
    type Swapchain = u64;
    type Image = u64;
    type ImageView = u64;

    fn create_window(&mut self, _: &str, _: u16, _: u16, _: bool) -> Result<u64> {
        if self.fail_window {
            bail!("no display available");
        }
        Ok(self.allocate("window"))
    }

    fn required_instance_extensions(&self, _: &u64) -> Result<Vec<String>> {
        if self.fail_window_extensions {
            bail!("window system has no Vulkan support");
        }
        Ok(self.window_extensions.clone())
    }

    fn create_instance(&mut self, request: &InstanceRequest) -> Result<u64> {
        self.instance_requests.push(request.clone());
        if self.fail_instance {
            bail!("ERROR_INCOMPATIBLE_DRIVER");
        }
        Ok(self.allocate("instance"))
    }

    fn create_debug_messenger(&mut self, _: &u64) -> Result<u64> {
        if self.fail_debug_messenger {
            bail!("ERROR_EXTENSION_NOT_PRESENT");
        }
        Ok(self.allocate("debug_messenger"))
    }

    fn create_surface(&mut self, _: &u64, _: &u64) -> Result<u64> {
        if self.fail_surface {
            bail!("ERROR_NATIVE_WINDOW_IN_USE_KHR");
        }
        Ok(self.allocate("surface"))
    }

    fn enumerate_physical_devices(&self, _: &u64) -> Result<Vec<usize>> {
        Ok((0..self.devices.len()).collect())
    }

    fn queue_family_properties(&self, _: &u64, physical_device: usize) -> Vec<vk::QueueFamilyProperties> {
        self.devices[physical_device]
            .queue_families
            .iter()
            .map(|family| vk::QueueFamilyProperties {
                queue_flags: family.flags,
                queue_count: family.queue_count,
                ..Default::default()
            })
            .collect()
    }

    fn physical_device_properties(&self, _: &u64, physical_device: usize) -> vk::PhysicalDeviceProperties {
        vk::PhysicalDeviceProperties {
            device_name: device_name(self.devices[physical_device].name),
            ..Default::default()
        }
    }

    fn physical_device_features(&self, _: &u64, _: usize) -> vk::PhysicalDeviceFeatures {
        vk::PhysicalDeviceFeatures::default()
    }

    fn surface_capabilities(&self, _: &u64, _: &u64, physical_device: usize) -> Result<vk::SurfaceCapabilitiesKHR> {
        self.device(physical_device)?
            .capabilities
            .ok_or_else(|| anyhow!("ERROR_SURFACE_LOST_KHR"))
    }

    fn surface_present_modes(&self, _: &u64, _: &u64, physical_device: usize) -> Result<Vec<vk::PresentModeKHR>> {
        self.device(physical_device)?
            .present_modes
            .clone()
            .ok_or_else(|| anyhow!("ERROR_SURFACE_LOST_KHR"))
    }

    fn surface_formats(&self, _: &u64, _: &u64, physical_device: usize) -> Result<Vec<vk::SurfaceFormatKHR>> {
        self.device(physical_device)?
            .formats
            .clone()
            .ok_or_else(|| anyhow!("ERROR_SURFACE_LOST_KHR"))
    }

    fn surface_support(&self, _: &u64, _: &u64, physical_device: usize, queue_family_index: u32) -> Result<bool> {
        self.device(physical_device)?
            .queue_families
            .get(queue_family_index as usize)
            .map(|family| family.presents)
            .ok_or_else(|| anyhow!("queue family {queue_family_index} out of range"))
    }

    fn device_extensions(&self, _: &u64, physical_device: usize) -> Result<Vec<String>> {
        self.device(physical_device)?
            .extensions
            .clone()
            .ok_or_else(|| anyhow!("ERROR_INITIALIZATION_FAILED"))
    }

    fn create_device(&mut self, _: &u64, physical_device: usize, request: &DeviceRequest) -> Result<u64> {
        self.device_requests.push(request.clone());
        if self.device(physical_device)?.fail_device_creation {
            bail!("ERROR_DEVICE_LOST");
        }
        Ok(self.allocate("device"))
    }

    fn create_swapchain(&mut self, _: &u64, _: &u64, request: &SwapchainRequest) -> Result<u64> {
        self.swapchain_requests.push(*request);
        let fails = self.devices.iter().any(|device| device.fail_swapchain_creation);
        if fails {
            bail!("ERROR_OUT_OF_DEVICE_MEMORY");
        }
        Ok(self.allocate("swapchain"))
    }

    fn swapchain_images(&self, _: &u64, _: &u64) -> Result<Vec<u64>> {
        let count = self
            .devices
            .iter()
            .map(|device| device.swapchain_image_count)
            .max()
            .unwrap_or(0);
        Ok((0..u64::from(count)).map(|image| 1000 + image).collect())
    }

    fn create_image_view(&mut self, _: &u64, image: u64, _: vk::Format) -> Result<u64> {
        let index = (image - 1000) as usize;
        if self
            .devices
            .iter()
            .any(|device| device.failing_image_views.contains(&index))
        {
            bail!("ERROR_OUT_OF_HOST_MEMORY");
        }
        Ok(self.allocate("image_view"))
    }

    fn poll_event(&mut self, _: &u64) -> Option<PolledEvent> {
        self.events.pop_front()
    }

    fn destroy_image_view(&mut self, _: &u64, image_view: u64) {
        self.release(image_view, "image_view", &[]);
    }

    fn destroy_swapchain(&mut self, _: &u64, swapchain: u64) {
        self.release(swapchain, "swapchain", &["image_view"]);
    }

    fn destroy_device(&mut self, device: u64) {
        self.release(device, "device", &["swapchain", "image_view"]);
    }

    fn destroy_surface(&mut self, _: &u64, surface: u64) {
        self.release(surface, "surface", &["swapchain"]);
    }

    fn destroy_debug_messenger(&mut self, _: &u64, messenger: u64) {
        self.release(messenger, "debug_messenger", &[]);
    }

    fn destroy_instance(&mut self, instance: u64) {
        self.release(instance, "instance", &["device", "surface", "debug_messenger"]);
    }

    fn destroy_window(&mut self, window: u64) {
        self.release(window, "window", &["surface"]);
    }
}
