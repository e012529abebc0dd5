use std::ffi::{c_void, CStr};

use anyhow::Result;
use ash::vk::{
    self, Bool32, DebugUtilsMessageSeverityFlagsEXT, DebugUtilsMessageTypeFlagsEXT,
    DebugUtilsMessengerCallbackDataEXT, DebugUtilsMessengerCreateInfoEXT,
};
use simple_logger::{set_up_color_terminal, SimpleLogger};
use tracing::{event, Level};

/// Installs the console logger. Level filtering follows `RUST_LOG`.
pub fn init() -> Result<()> {
    set_up_color_terminal();
    let logger = SimpleLogger::new().env();
    logger.init()?;
    Ok(())
}

/// Create info for both the instance-creation chain and the persistent
/// messenger.
pub fn debug_messenger_create_info<'a>() -> vk::DebugUtilsMessengerCreateInfoEXTBuilder<'a> {
    DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(
            DebugUtilsMessageSeverityFlagsEXT::ERROR
                | DebugUtilsMessageSeverityFlagsEXT::WARNING
                | DebugUtilsMessageSeverityFlagsEXT::VERBOSE,
        )
        .message_type(
            DebugUtilsMessageTypeFlagsEXT::GENERAL
                | DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(vulkan_debug_utils_callback))
}

/// Three characters, one per message type: `G`eneral, `V`alidation,
/// `P`erformance, blank when not set.
pub fn message_type_tag(message_type: DebugUtilsMessageTypeFlagsEXT) -> String {
    [
        (DebugUtilsMessageTypeFlagsEXT::GENERAL, 'G'),
        (DebugUtilsMessageTypeFlagsEXT::VALIDATION, 'V'),
        (DebugUtilsMessageTypeFlagsEXT::PERFORMANCE, 'P'),
    ]
    .iter()
    .map(|(flag, tag)| if message_type.contains(*flag) { *tag } else { ' ' })
    .collect()
}

pub unsafe extern "system" fn vulkan_debug_utils_callback(
    message_severity: DebugUtilsMessageSeverityFlagsEXT,
    message_type: DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut c_void,
) -> Bool32 {
    let message = if p_callback_data.is_null() || (*p_callback_data).p_message.is_null() {
        String::new()
    } else {
        CStr::from_ptr((*p_callback_data).p_message)
            .to_string_lossy()
            .into_owned()
    };
    let ty = message_type_tag(message_type);

    match message_severity {
        DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            event!(Level::ERROR, "[{}] {}", ty, message)
        }
        DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            event!(Level::WARN, "[{}] {}", ty, message)
        }
        DebugUtilsMessageSeverityFlagsEXT::INFO => {
            event!(Level::INFO, "[{}] {}", ty, message)
        }
        _ => event!(Level::DEBUG, "[{}] {}", ty, message),
    }
    // dont skip driver
    vk::FALSE
}
