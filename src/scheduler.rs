use std::sync::Arc;

use log::trace;
use winit::window::Window;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

/// Hands out "run me on the next refresh" requests
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;

    /// Forgets a request so it is never delivered
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Schedules frames on a winit window's redraw requests
#[derive(Default)]
pub struct WindowScheduler {
    window: Option<Arc<Window>>,
    next_id: u64,
    pending: Option<FrameHandle>,
    /// Pending frames are not turned into redraws while held
    held: bool,
}

impl WindowScheduler {
    pub fn attach(&mut self, window: Arc<Window>) {
        self.window = Some(window);
        self.wake();
    }

    pub fn detach(&mut self) {
        self.window = None;
    }

    /// Stops requesting redraws, e.g. while the window has no area to draw into
    pub fn hold(&mut self) {
        if !self.held {
            trace!("Holding frame requests");
        }
        self.held = true;
    }

    /// Resumes requesting redraws, waking a frame that was requested while held
    pub fn release(&mut self) {
        self.held = false;
        self.wake();
    }

    /// Takes the frame that should run on this redraw, if any
    pub fn take_due(&mut self) -> Option<FrameHandle> {
        if self.held {
            return None;
        }
        self.pending.take()
    }

    fn redraw_due(&self) -> bool {
        self.pending.is_some() && !self.held
    }

    fn wake(&mut self) {
        if !self.redraw_due() {
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl FrameScheduler for WindowScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        self.wake();

        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            trace!("Cancelled frame {:?}", handle);
            self.pending = None;
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Delivers requested frames only when the test calls `tick`
    #[derive(Default)]
    pub struct ManualScheduler {
        next_id: u64,
        pub pending: Vec<FrameHandle>,
        pub requested: usize,
    }

    impl ManualScheduler {
        /// Simulates one display refresh
        pub fn tick(&mut self) -> Vec<FrameHandle> {
            std::mem::take(&mut self.pending)
        }
    }

    impl FrameScheduler for ManualScheduler {
        fn request_frame(&mut self) -> FrameHandle {
            self.next_id += 1;
            self.requested += 1;
            let handle = FrameHandle(self.next_id);
            self.pending.push(handle);
            handle
        }

        fn cancel_frame(&mut self, handle: FrameHandle) {
            self.pending.retain(|h| *h != handle);
        }
    }
}
