//! Recurring relay drain running off the UI thread.
use crate::dispatch::{UiDispatcher, UiTask};
use crate::relay::NotificationRelay;
use crossbeam::channel::tick;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Set once by the presentation controller on quit; observed by every tick
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct RelayPoller {
    relay: Arc<NotificationRelay>,
    dispatcher: Arc<dyn UiDispatcher>,
    shutdown: ShutdownFlag,
}

impl RelayPoller {
    pub fn new(
        relay: Arc<NotificationRelay>,
        dispatcher: Arc<dyn UiDispatcher>,
        shutdown: ShutdownFlag,
    ) -> Self {
        Self {
            relay,
            dispatcher,
            shutdown,
        }
    }

    /// One poll-and-consume step.
    ///
    /// The slot is deleted before anything is dispatched; the pending slot is
    /// never looked at here.
    pub fn tick(&self) -> Option<String> {
        self.step().0
    }

    /// Returns the consumed identifier and whether the UI thread is still there
    fn step(&self) -> (Option<String>, bool) {
        let Some(id) = self.relay.take_click() else {
            return (None, true);
        };
        tracing::info!("Notification click {} picked up from relay", id);

        let alive = self.dispatcher.dispatch(UiTask::DeliverNotification(id.clone()));
        if !alive {
            tracing::warn!("UI thread gone, dropping notification click {}", id);
        }
        (Some(id), alive)
    }

    /// Run `tick` every `interval` until shutdown or until the UI thread is gone
    pub fn spawn(self, interval: Duration) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("relay-poller".to_string())
            .spawn(move || {
                tracing::debug!("Relay poller started ({:?})", interval);
                let ticker = tick(interval);
                for _ in ticker.iter() {
                    if self.shutdown.is_set() {
                        break;
                    }
                    if !self.step().1 {
                        break;
                    }
                }
                tracing::debug!("Relay poller stopped");
            })
    }
}
