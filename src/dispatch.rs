//! Work that must run on the thread owning the window and the webview.
//!
//! Background threads (relay poller, toast callbacks, the tray) never touch the
//! window directly; they hand a [`UiTask`] to a [`UiDispatcher`] and the UI
//! thread runs it on its next turn.
use crate::bridge::PageRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiTask {
    /// Bring the window back from the tray / background
    Present,
    /// Hide the window into the tray
    Hide,
    /// Show the window, then hand `id` to the page
    DeliverNotification(String),
    /// Message posted by the hosted page
    Page(PageRequest),
    /// Flip the "start with Windows" tray entry
    ToggleAutoStart,
    /// Terminate the browser surface and leave the event loop
    Exit,
}

pub trait UiDispatcher: Send + Sync {
    /// Queue a task for the UI thread; false once the UI thread is gone
    fn dispatch(&self, task: UiTask) -> bool;
}

impl UiDispatcher for crossbeam::channel::Sender<UiTask> {
    fn dispatch(&self, task: UiTask) -> bool {
        self.send(task).is_ok()
    }
}
