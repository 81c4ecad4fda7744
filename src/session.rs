//! Everything the primary instance owns for its lifetime.
use crate::bridge::PageRequest;
use crate::config::AppConfig;
use crate::dispatch::{UiDispatcher, UiTask};
use crate::identity::AppIdentity;
use crate::navigation::NavigationPolicy;
use crate::poller::{RelayPoller, ShutdownFlag, POLL_INTERVAL};
use crate::presentation::{
    InitialMode, Interception, Presentation, TrayBehavior, WindowHost, WindowMessage,
};
use crate::relay::NotificationRelay;
use crate::toast::{ToastBackend, ToastEmitter};
use std::sync::Arc;
use std::thread::JoinHandle;

/// What the event loop should do after a task ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Continue,
    Exit,
}

pub struct AppSession<H: WindowHost, T: ToastBackend> {
    config: AppConfig,
    identity: AppIdentity,
    relay: Arc<NotificationRelay>,
    presentation: Presentation<H>,
    toasts: Option<ToastEmitter<T>>,
    navigation: NavigationPolicy,
    shutdown: ShutdownFlag,
    dispatcher: Arc<dyn UiDispatcher>,
}

impl<H: WindowHost, T: ToastBackend> AppSession<H, T> {
    pub fn new(
        config: AppConfig,
        relay: Arc<NotificationRelay>,
        host: H,
        toast_backend: T,
        dispatcher: Arc<dyn UiDispatcher>,
    ) -> Self {
        let identity = AppIdentity::from_title(&config.title);
        let shutdown = ShutdownFlag::new();
        let presentation = Presentation::new(host, TrayBehavior::from_config(&config), shutdown.clone());
        let toasts = config.enable_notification.then(|| {
            ToastEmitter::new(
                toast_backend,
                Arc::clone(&relay),
                identity.app_user_model_id(),
                config.title.clone(),
            )
        });
        let navigation =
            NavigationPolicy::new(&config.url, &config.whitelist, config.block_external_nav);

        Self {
            config,
            identity,
            relay,
            presentation,
            toasts,
            navigation,
            shutdown,
            dispatcher,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn identity(&self) -> &AppIdentity {
        &self.identity
    }

    pub fn presentation(&self) -> &Presentation<H> {
        &self.presentation
    }

    pub fn navigation(&self) -> &NavigationPolicy {
        &self.navigation
    }

    pub fn start(&self, from_startup: bool) {
        self.presentation
            .start(InitialMode::resolve(&self.config, from_startup));
    }

    /// The present message arrived in the window procedure. Showing happens
    /// on a later turn of the event loop, never inside the message handler.
    pub fn handle_present_signal(&self) {
        tracing::debug!("Present signal received");
        if !self.dispatcher.dispatch(UiTask::Present) {
            tracing::warn!("Present signal dropped, event loop is gone");
        }
    }

    pub fn intercept(&self, message: WindowMessage) -> Interception {
        self.presentation.intercept(message)
    }

    pub fn poller(&self) -> RelayPoller {
        RelayPoller::new(
            Arc::clone(&self.relay),
            Arc::clone(&self.dispatcher),
            self.shutdown.clone(),
        )
    }

    pub fn spawn_poller(&self) -> std::io::Result<JoinHandle<()>> {
        self.poller().spawn(POLL_INTERVAL)
    }

    pub fn run_task(&self, task: UiTask) -> TaskOutcome {
        match task {
            UiTask::Present => self.presentation.show(),
            UiTask::Hide => self.presentation.hide(),
            UiTask::DeliverNotification(id) => self.presentation.deliver_notification(&id),
            UiTask::Page(request) => self.handle_page_request(request),
            // Owned by the tray, which the event loop holds
            UiTask::ToggleAutoStart => {
                tracing::debug!("Auto-start toggle reached the session, ignored without a tray");
            }
            UiTask::Exit => {
                self.presentation.quit();
                return TaskOutcome::Exit;
            }
        }
        TaskOutcome::Continue
    }

    fn handle_page_request(&self, request: PageRequest) {
        match request {
            PageRequest::Notify(notification) => match &self.toasts {
                Some(toasts) => toasts.emit(&notification),
                None => tracing::debug!("Notifications disabled, dropping {}", notification.id),
            },
            PageRequest::FocusWindow => self.presentation.show(),
            PageRequest::OpenExternal { url } => {
                open_external(&url);
            }
        }
    }
}

/// Hand a link to the system browser. Only web and mail links leave the app.
pub fn open_external(target: &str) -> bool {
    let allowed = url::Url::parse(target)
        .map(|u| matches!(u.scheme(), "http" | "https" | "mailto"))
        .unwrap_or(false);
    if !allowed {
        tracing::warn!("Refusing to open external target: {}", target);
        return false;
    }

    match open::that(target) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Failed to open {}: {}", target, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::NotificationRequest;
    use crate::presentation::tests::{FakeHost, HostCall};
    use crate::presentation::{ShowCommand, Visibility};
    use crate::relay::Slot;
    use crate::script;
    use crate::toast::ToastMessage;
    use crossbeam::channel::{unbounded, Receiver};
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingToasts {
        pushed: RefCell<Vec<ToastMessage>>,
    }

    impl ToastBackend for RecordingToasts {
        fn push(&self, toast: &ToastMessage) -> anyhow::Result<()> {
            self.pushed.borrow_mut().push(toast.clone());
            Ok(())
        }
    }

    fn session(
        dir: &std::path::Path,
        config: AppConfig,
    ) -> (AppSession<FakeHost, RecordingToasts>, Receiver<UiTask>) {
        let relay = Arc::new(NotificationRelay::in_dir(
            dir,
            &AppIdentity::from_title(&config.title),
        ));
        let (tx, rx) = unbounded();
        let session = AppSession::new(
            config,
            relay,
            FakeHost::default(),
            RecordingToasts::default(),
            Arc::new(tx),
        );
        (session, rx)
    }

    fn tray_config() -> AppConfig {
        AppConfig {
            url: "https://example.com".to_string(),
            title: "Session Test".to_string(),
            enable_tray: true,
            close_to_tray: true,
            enable_notification: true,
            start_minimized: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_relay_round_trip_delivers_click() {
        let dir = tempfile::tempdir().unwrap();
        let (session, rx) = session(dir.path(), tray_config());
        session.start(false);
        assert_eq!(session.presentation().visibility(), Visibility::Hidden);

        let relay = NotificationRelay::in_dir(dir.path(), session.identity());
        relay.post_click("42");

        assert_eq!(session.poller().tick().as_deref(), Some("42"));
        assert!(!relay.path(Slot::Notif).exists());

        let task = rx.try_recv().unwrap();
        assert_eq!(session.run_task(task), TaskOutcome::Continue);

        assert_eq!(session.presentation().visibility(), Visibility::Normal);
        assert_eq!(
            session.presentation().host().scripts(),
            vec![script::notification_click_call("42")]
        );
    }

    #[test]
    fn test_present_signal_is_deferred() {
        let dir = tempfile::tempdir().unwrap();
        let (session, rx) = session(dir.path(), tray_config());
        session.start(false);

        session.handle_present_signal();
        // Nothing shown until the task runs
        assert_eq!(session.presentation().visibility(), Visibility::Hidden);

        let task = rx.try_recv().unwrap();
        assert_eq!(task, UiTask::Present);
        session.run_task(task);
        assert_eq!(session.presentation().visibility(), Visibility::Normal);
        assert_eq!(session.presentation().host().count(&HostCall::Foreground), 1);
    }

    #[test]
    fn test_close_hides_then_exit_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _rx) = session(dir.path(), tray_config());
        session.start(false);
        session.run_task(UiTask::Present);

        assert_eq!(session.intercept(WindowMessage::CloseRequested), Interception::Suppress);
        assert_eq!(session.presentation().visibility(), Visibility::Hidden);

        assert_eq!(session.run_task(UiTask::Exit), TaskOutcome::Exit);
        assert_eq!(session.intercept(WindowMessage::CloseRequested), Interception::PassThrough);
    }

    #[test]
    fn test_tray_hide_task() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _rx) = session(dir.path(), tray_config());
        session.start(false);
        session.run_task(UiTask::Present);

        session.run_task(UiTask::Hide);
        assert_eq!(session.presentation().visibility(), Visibility::Hidden);
        assert_eq!(
            session
                .presentation()
                .host()
                .count(&HostCall::Show(ShowCommand::Hide)),
            1
        );
    }

    #[test]
    fn test_page_notify_raises_toast_and_records_pending() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _rx) = session(dir.path(), tray_config());

        session.run_task(UiTask::Page(PageRequest::Notify(NotificationRequest {
            title: "Ping".to_string(),
            id: "8".to_string(),
            ..Default::default()
        })));

        let relay = NotificationRelay::in_dir(dir.path(), session.identity());
        assert_eq!(relay.take_pending().as_deref(), Some("8"));
    }

    #[test]
    fn test_page_notify_ignored_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            enable_notification: false,
            ..tray_config()
        };
        let (session, _rx) = session(dir.path(), config);

        session.run_task(UiTask::Page(PageRequest::Notify(NotificationRequest {
            id: "8".to_string(),
            ..Default::default()
        })));

        let relay = NotificationRelay::in_dir(dir.path(), session.identity());
        assert_eq!(relay.take_pending(), None);
    }

    #[test]
    fn test_page_focus_shows_window() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _rx) = session(dir.path(), tray_config());
        session.start(false);

        session.run_task(UiTask::Page(PageRequest::FocusWindow));
        assert_eq!(session.presentation().visibility(), Visibility::Normal);
    }

    #[test]
    fn test_auto_start_toggle_leaves_window_alone() {
        let dir = tempfile::tempdir().unwrap();
        let (session, _rx) = session(dir.path(), tray_config());
        session.start(false);

        assert_eq!(session.run_task(UiTask::ToggleAutoStart), TaskOutcome::Continue);
        assert_eq!(session.presentation().visibility(), Visibility::Hidden);
        assert!(session.presentation().host().calls.borrow().is_empty());
    }

    #[test]
    fn test_open_external_rejects_local_schemes() {
        assert!(!open_external("file:///etc/passwd"));
        assert!(!open_external("javascript:alert(1)"));
        assert!(!open_external("not a url"));
    }
}
