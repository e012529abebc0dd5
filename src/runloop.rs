use tracing::info;

use crate::error::LifecycleError;

/// Something performed once per run loop tick.
pub trait Task {
    fn perform(&mut self) -> Result<(), LifecycleError>;

    /// Once true, the next tick drops the task.
    fn should_quit(&self) -> bool;
}

#[derive(Default)]
pub struct RunLoop {
    tasks: Vec<Box<dyn Task>>,
}

impl RunLoop {
    pub fn new() -> Self {
        info!("Starting run loop.");
        Self::default()
    }

    pub fn push(&mut self, task: Box<dyn Task>) {
        self.tasks.push(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Drops finished tasks, then performs the rest. Returns false once no
    /// tasks are left.
    pub fn tick(&mut self) -> Result<bool, LifecycleError> {
        if self.tasks.is_empty() {
            info!("No tasks left to perform.");
            return Ok(false);
        }

        self.tasks.retain(|task| !task.should_quit());
        for task in self.tasks.iter_mut() {
            task.perform()?;
        }
        Ok(true)
    }
}

impl Drop for RunLoop {
    fn drop(&mut self) {
        info!("Quitting run loop.");
    }
}
