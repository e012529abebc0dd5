use anyhow::{anyhow, Result};
use glfw::{ClientApiHint, Glfw, GlfwReceiver, PWindow, WindowEvent, WindowHint, WindowMode};
use tracing::debug;

use crate::backend::PolledEvent;

/// RAII for the GLFW window and its event queue
pub struct WindowGuard {
    pub window: PWindow,
    events: GlfwReceiver<(f64, WindowEvent)>,
}

impl WindowGuard {
    pub fn try_new(
        glfw: &mut Glfw,
        title: &str,
        width: u16,
        height: u16,
        fullscreen: bool,
    ) -> Result<Self> {
        // vulkan only, no GL context
        glfw.window_hint(WindowHint::ClientApi(ClientApiHint::NoApi));
        let (width, height) = (u32::from(width), u32::from(height));
        let created = if fullscreen {
            glfw.with_primary_monitor(|glfw, monitor| {
                let mode = monitor.map_or(WindowMode::Windowed, |monitor| {
                    WindowMode::FullScreen(&*monitor)
                });
                glfw.create_window(width, height, title, mode)
            })
        } else {
            glfw.create_window(width, height, title, WindowMode::Windowed)
        };
        let (mut window, events) = created.ok_or(anyhow!("Failed to create GLFW window"))?;

        window.set_close_polling(true);
        window.set_key_polling(true);

        Ok(Self { window, events })
    }

    /// Pumps the platform queue and folds whatever arrived into one event.
    /// A close request wins over everything else in the batch.
    pub fn poll_event(&self, glfw: &mut Glfw) -> Option<PolledEvent> {
        glfw.poll_events();
        let events = glfw::flush_messages(&self.events)
            .map(|(_, event)| event)
            .collect::<Vec<_>>();
        let close_requested = events
            .iter()
            .any(|event| matches!(event, WindowEvent::Close));
        if close_requested || self.window.should_close() {
            Some(PolledEvent::Quit)
        } else if events.is_empty() {
            None
        } else {
            Some(PolledEvent::Other)
        }
    }
}

impl Drop for WindowGuard {
    fn drop(&mut self) {
        debug!("Dropping WindowGuard");
    }
}
