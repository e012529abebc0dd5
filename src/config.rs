use ash::vk;

pub const VALIDATION_LAYER_NAME: &str = "VK_LAYER_KHRONOS_validation";
pub const DEBUG_UTILS_EXTENSION_NAME: &str = "VK_EXT_debug_utils";
pub const SWAPCHAIN_EXTENSION_NAME: &str = "VK_KHR_swapchain";

pub const API_VERSION: u32 = vk::API_VERSION_1_2;
pub const ENGINE_NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(feature = "enable_validations")]
pub const ENABLE_VALIDATIONS: bool = true;
#[cfg(not(feature = "enable_validations"))]
pub const ENABLE_VALIDATIONS: bool = cfg!(debug_assertions);

const DEFAULT_WIDTH: u16 = 1280;
const DEFAULT_HEIGHT: u16 = 720;

/// Everything the orchestrator needs to bring up the window and instance.
#[derive(Debug, Clone)]
pub struct InitRequest {
    pub application_name: String,
    /// Encoded with `vk::make_api_version`
    pub application_version: u32,
    pub extensions: Vec<String>,
    pub layers: Vec<String>,
    pub width: u16,
    pub height: u16,
    pub fullscreen: bool,
    /// Enables the validation layer and the debug messenger
    pub debug: bool,
}

impl InitRequest {
    pub fn for_application(application_name: &str, application_version: u32) -> Self {
        Self {
            application_name: application_name.to_owned(),
            application_version,
            ..Default::default()
        }
    }

    pub fn window_title(&self) -> String {
        format!(
            "{} {}",
            self.application_name,
            stringify_version(self.application_version)
        )
    }
}

impl Default for InitRequest {
    fn default() -> Self {
        Self {
            application_name: env!("CARGO_PKG_NAME").to_owned(),
            application_version: package_version(),
            extensions: vec![],
            layers: vec![],
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fullscreen: false,
            debug: ENABLE_VALIDATIONS,
        }
    }
}

/// The crate's own version, encoded the way Vulkan expects it.
pub fn package_version() -> u32 {
    // cargo guarantees these are numeric
    let major = env!("CARGO_PKG_VERSION_MAJOR").parse::<u32>().unwrap_or(0);
    let minor = env!("CARGO_PKG_VERSION_MINOR").parse::<u32>().unwrap_or(0);
    let patch = env!("CARGO_PKG_VERSION_PATCH").parse::<u32>().unwrap_or(0);
    vk::make_api_version(0, major, minor, patch)
}

/// Formats a Vulkan-encoded version as `vMAJOR.MINOR.PATCH`.
pub fn stringify_version(version: u32) -> String {
    format!(
        "v{}.{}.{}",
        vk::api_version_major(version),
        vk::api_version_minor(version),
        vk::api_version_patch(version)
    )
}
