pub mod backend;
pub mod config;
pub mod device_selector;
pub mod error;
pub mod logging;
#[cfg(feature = "native")]
pub mod native;
pub mod orchestrator;
pub mod physical_device;
pub mod registry;
pub mod runloop;
pub mod script;
pub mod swap_chain;

pub use backend::{Backend, PolledEvent};
pub use config::InitRequest;
pub use error::{LifecycleError, Resource};
#[cfg(feature = "native")]
pub use native::NativeBackend;
pub use orchestrator::{Orchestrator, Stage};
pub use runloop::{RunLoop, Task};
pub use script::{BringUpScript, Script, ScriptApi, ScriptApp, ScriptedTask};
pub use swap_chain::SwapChainConfig;
