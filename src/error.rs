use std::fmt;

use thiserror::Error;

/// The native resources tracked by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Window,
    Instance,
    DebugMessenger,
    Surface,
    PhysicalDevices,
    LogicalDevice,
    SwapChain,
    Images,
    ImageViews,
    SwapChainConfig,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Window => "window",
            Resource::Instance => "instance",
            Resource::DebugMessenger => "debug messenger",
            Resource::Surface => "surface",
            Resource::PhysicalDevices => "physical device list",
            Resource::LogicalDevice => "logical device",
            Resource::SwapChain => "swap chain",
            Resource::Images => "swap chain image list",
            Resource::ImageViews => "image view list",
            Resource::SwapChainConfig => "swap chain config",
        };
        f.write_str(name)
    }
}

/// Misuse of the bring-up sequence. These abort the current bring-up or
/// teardown and are never retried; degraded native queries are reported
/// through logs and boolean results instead.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Can't initialize Vulkan {0} twice.")]
    AlreadyInitialized(Resource),
    #[error("Can't destroy Vulkan {0} twice.")]
    AlreadyDestroyed(Resource),
    #[error("The Vulkan {0} must exist before this step.")]
    Missing(Resource),
    #[error("No Vulkan device at devices[{offset}], only {count} enumerated.")]
    DeviceOffsetOutOfRange { offset: usize, count: usize },
    #[error("{step} failed.")]
    Native {
        step: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl LifecycleError {
    pub fn native(step: &'static str, source: anyhow::Error) -> Self {
        Self::Native { step, source }
    }
}
