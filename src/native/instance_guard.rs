use std::{ffi::CString, ops::Deref};

use anyhow::Result;
use ash::{
    extensions::{ext::DebugUtils, khr::Surface},
    vk::{ApplicationInfo, InstanceCreateInfo},
    Entry, Instance,
};
use tracing::debug;

use crate::{
    backend::InstanceRequest,
    config::{package_version, API_VERSION, ENGINE_NAME},
    logging::debug_messenger_create_info,
};

use super::to_c_strings;

/// RAII for Instance, plus the instance-level extension tables
pub struct InstanceGuard {
    pub instance: Instance,
    pub surface_fn: Surface,
    pub debug_utils: DebugUtils,
}

impl InstanceGuard {
    pub fn try_new(entry: &Entry, request: &InstanceRequest) -> Result<Self> {
        let appname = CString::new(request.application_name.as_str())?;
        let engine_name = CString::new(ENGINE_NAME)?;

        let application_info = ApplicationInfo::builder()
            .application_name(&appname)
            .application_version(request.application_version)
            .api_version(API_VERSION)
            .engine_name(&engine_name)
            .engine_version(package_version());

        let extension_names = to_c_strings(&request.extensions)?;
        let extension_name_pointers = extension_names
            .iter()
            .map(|extension_name| extension_name.as_ptr())
            .collect::<Vec<_>>();

        let layer_names = to_c_strings(&request.layers)?;
        let layer_name_pointers = layer_names
            .iter()
            .map(|layer_name| layer_name.as_ptr())
            .collect::<Vec<_>>();

        // lets the validation layer report on instance creation itself
        let mut debug_create_info = debug_messenger_create_info();
        let mut instance_create_info = InstanceCreateInfo::builder()
            .application_info(&application_info)
            .enabled_extension_names(&extension_name_pointers)
            .enabled_layer_names(&layer_name_pointers);
        if request.debug {
            instance_create_info = instance_create_info.push_next(&mut debug_create_info);
        }

        let instance = unsafe { entry.create_instance(&instance_create_info, None)? };
        let surface_fn = Surface::new(entry, &instance);
        let debug_utils = DebugUtils::new(entry, &instance);

        Ok(Self {
            instance,
            surface_fn,
            debug_utils,
        })
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        debug!("Dropping InstanceGuard");
        unsafe {
            self.instance.destroy_instance(None);
        }
    }
}

impl Deref for InstanceGuard {
    type Target = Instance;

    fn deref(&self) -> &Self::Target {
        &self.instance
    }
}
