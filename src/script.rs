use std::marker::PhantomData;

use ash::vk;
use tracing::{error, info, warn};

use crate::{
    backend::{Backend, PolledEvent},
    config::{package_version, InitRequest, ENABLE_VALIDATIONS, ENGINE_NAME, SWAPCHAIN_EXTENSION_NAME},
    error::LifecycleError,
    orchestrator::Orchestrator,
    runloop::Task,
    swap_chain::SwapChainConfig,
};

/// Application fields a script provides when it brings up the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptApp {
    pub app: String,
    /// Vulkan-encoded application version
    pub vsn: u32,
}

/// The calls a script can make into the graphics stack.
pub struct ScriptApi<'a, B: Backend> {
    orchestrator: &'a mut Orchestrator<B>,
}

impl<'a, B: Backend> ScriptApi<'a, B> {
    pub fn new(orchestrator: &'a mut Orchestrator<B>) -> Self {
        Self { orchestrator }
    }

    pub fn init_graphics(&mut self, app: &ScriptApp) -> Result<(), LifecycleError> {
        let request = InitRequest::for_application(&app.app, app.vsn);
        self.orchestrator.init(&request)
    }

    pub fn deinit_graphics(&mut self) -> Result<(), LifecycleError> {
        self.orchestrator.deinit()
    }

    pub fn poll_event(&mut self) -> Option<PolledEvent> {
        self.orchestrator.poll_event()
    }

    pub fn orchestrator(&mut self) -> &mut Orchestrator<B> {
        self.orchestrator
    }
}

/// Application logic driven by the run loop.
pub trait Script<B: Backend> {
    fn init(&mut self, api: &mut ScriptApi<'_, B>) -> Result<(), LifecycleError>;

    /// Returns true when the script wants to quit.
    fn tick(&mut self, api: &mut ScriptApi<'_, B>) -> Result<bool, LifecycleError>;

    fn deinit(&mut self, api: &mut ScriptApi<'_, B>) -> Result<(), LifecycleError>;
}

/// Runs a [`Script`] as a run loop task. The script's `init` runs on
/// creation and its `deinit` as soon as `tick` asks to quit.
pub struct ScriptedTask<B: Backend, S: Script<B>> {
    orchestrator: Orchestrator<B>,
    script: S,
    shall_quit: bool,
}

impl<B: Backend, S: Script<B>> ScriptedTask<B, S> {
    pub fn try_new(mut orchestrator: Orchestrator<B>, mut script: S) -> Result<Self, LifecycleError> {
        info!("Starting script runtime.");
        script.init(&mut ScriptApi::new(&mut orchestrator))?;
        Ok(Self {
            orchestrator,
            script,
            shall_quit: false,
        })
    }

    pub fn orchestrator(&self) -> &Orchestrator<B> {
        &self.orchestrator
    }
}

impl<B: Backend, S: Script<B>> Task for ScriptedTask<B, S> {
    fn perform(&mut self) -> Result<(), LifecycleError> {
        if self.shall_quit {
            return Ok(());
        }
        let mut api = ScriptApi::new(&mut self.orchestrator);
        let quit = match self.script.tick(&mut api) {
            Ok(quit) => quit,
            Err(error) => {
                error!("The script run loop encountered an error: {}", error);
                self.shall_quit = true;
                return Err(error);
            }
        };
        if quit {
            self.shall_quit = true;
            info!("Closing script runtime.");
            self.script.deinit(&mut api)?;
        }
        Ok(())
    }

    fn should_quit(&self) -> bool {
        self.shall_quit
    }
}

/// Brings the stack up on the first usable device, then waits for a quit
/// event and tears everything down.
pub struct BringUpScript<B> {
    device: Option<usize>,
    _backend: PhantomData<B>,
}

impl<B> BringUpScript<B> {
    /// Offset of the device in use, if any was usable.
    pub fn device(&self) -> Option<usize> {
        self.device
    }
}

impl<B> Default for BringUpScript<B> {
    fn default() -> Self {
        Self {
            device: None,
            _backend: PhantomData,
        }
    }
}

impl<B: Backend> Script<B> for BringUpScript<B> {
    fn init(&mut self, api: &mut ScriptApi<'_, B>) -> Result<(), LifecycleError> {
        api.init_graphics(&ScriptApp {
            app: ENGINE_NAME.to_owned(),
            vsn: package_version(),
        })?;

        let orchestrator = api.orchestrator();
        SwapChainConfig {
            format: vk::Format::B8G8R8A8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            present_mode: vk::PresentModeKHR::FIFO,
        }
        .use_globally(orchestrator.registry_mut());

        let extensions = [SWAPCHAIN_EXTENSION_NAME.to_owned()];
        for offset in 0..orchestrator.registry().device_count() {
            if orchestrator.try_use_device(offset, &extensions, &[], ENABLE_VALIDATIONS)? {
                self.device = Some(offset);
                break;
            }
            // a device that got this far can't be swapped for another one
            if orchestrator.registry().has_logical_device() {
                break;
            }
        }
        if self.device.is_none() {
            warn!("No usable Vulkan device found.");
        }
        Ok(())
    }

    fn tick(&mut self, api: &mut ScriptApi<'_, B>) -> Result<bool, LifecycleError> {
        Ok(api.poll_event() == Some(PolledEvent::Quit))
    }

    fn deinit(&mut self, api: &mut ScriptApi<'_, B>) -> Result<(), LifecycleError> {
        api.deinit_graphics()
    }
}
