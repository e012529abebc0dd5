use std::{process::ExitCode, thread, time::Duration};

use anyhow::Result;
use rusty_bringup::{
    config::{package_version, stringify_version, ENGINE_NAME},
    logging, BringUpScript, NativeBackend, Orchestrator, RunLoop, ScriptedTask,
};
use tracing::{error, info};

const TICK_INTERVAL: Duration = Duration::from_millis(10);

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("Fatal error: {:#}", error);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    logging::init()?;
    info!("{} {}", ENGINE_NAME, stringify_version(package_version()));

    let backend = NativeBackend::try_new()?;
    let task = ScriptedTask::try_new(Orchestrator::new(backend), BringUpScript::default())?;

    let mut run_loop = RunLoop::new();
    run_loop.push(Box::new(task));
    while run_loop.tick()? {
        thread::sleep(TICK_INTERVAL);
    }
    Ok(())
}
