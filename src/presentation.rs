//! Presentation controller: the window visibility state machine.
//!
//! States are `Hidden` (in the tray) and visible as `Normal`, `Maximized` or
//! `Fullscreen`. Tray clicks, the window procedure and the relay delivery path
//! all funnel through here, and every transition holds `state` for its whole
//! duration so OS queries and mutations never interleave.
//!
//! Everything in this module runs on the UI thread; background work reaches it
//! through [`crate::dispatch::UiTask`].
use crate::config::AppConfig;
use crate::poller::ShutdownFlag;
use crate::script;
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowCommand {
    Show,
    Hide,
    Maximize,
    Restore,
}

/// Native operations on the single top-level window
pub trait WindowHost {
    fn show_window(&self, command: ShowCommand);
    fn is_maximized(&self) -> bool;
    /// Borderless, monitor-sized
    fn enter_fullscreen(&self);
    /// Steal focus even under foreground-lock rules
    fn bring_to_foreground(&self);
    fn evaluate_script(&self, script: &str);
    /// Ask the browser surface to shut down on its own thread
    fn request_terminate(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Normal,
    Maximized,
    Fullscreen,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisibilityState {
    pub hidden: bool,
    /// Snapshot taken right before the last hide
    pub was_maximized: bool,
    /// Sticky mode flag
    pub is_fullscreen: bool,
    pub should_really_quit: bool,
}

/// Messages the window procedure asks us about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMessage {
    CloseRequested,
    MinimizeRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interception {
    /// Default action is skipped
    Suppress,
    PassThrough,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrayBehavior {
    pub close_to_tray: bool,
    pub minimize_to_tray: bool,
}

impl TrayBehavior {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            close_to_tray: config.closes_to_tray(),
            minimize_to_tray: config.minimizes_to_tray(),
        }
    }
}

/// How the window first appears
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitialMode {
    pub hidden: bool,
    pub maximized: bool,
    pub fullscreen: bool,
}

impl InitialMode {
    pub fn resolve(config: &AppConfig, from_startup: bool) -> Self {
        Self {
            hidden: config.enable_tray && (config.start_minimized || from_startup),
            maximized: config.start_maximized,
            fullscreen: config.fullscreen,
        }
    }
}

pub struct Presentation<H: WindowHost> {
    host: H,
    state: Mutex<VisibilityState>,
    tray: TrayBehavior,
    shutdown: ShutdownFlag,
}

impl<H: WindowHost> Presentation<H> {
    pub fn new(host: H, tray: TrayBehavior, shutdown: ShutdownFlag) -> Self {
        Self {
            host,
            state: Mutex::new(VisibilityState::default()),
            tray,
            shutdown,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn state(&self) -> VisibilityState {
        *self.state.lock()
    }

    /// Apply the first visible state of a window created hidden
    pub fn start(&self, mode: InitialMode) {
        let mut state = self.state.lock();
        state.is_fullscreen = mode.fullscreen;
        state.was_maximized = mode.maximized;

        if mode.hidden {
            state.hidden = true;
            tracing::info!("Starting hidden in tray");
            return;
        }

        state.hidden = false;
        self.host.show_window(ShowCommand::Show);
        if mode.fullscreen {
            self.host.enter_fullscreen();
        } else if mode.maximized {
            self.host.show_window(ShowCommand::Maximize);
        }
    }

    pub fn visibility(&self) -> Visibility {
        let state = self.state.lock();
        if state.hidden {
            Visibility::Hidden
        } else if state.is_fullscreen {
            Visibility::Fullscreen
        } else if self.host.is_maximized() {
            Visibility::Maximized
        } else {
            Visibility::Normal
        }
    }

    /// Make the window visible in its remembered mode and force it to the front
    pub fn show(&self) {
        let mut state = self.state.lock();

        if state.hidden {
            self.host.show_window(ShowCommand::Show);
            if state.is_fullscreen {
                self.host.enter_fullscreen();
            } else if state.was_maximized {
                self.host.show_window(ShowCommand::Maximize);
            } else {
                self.host.show_window(ShowCommand::Restore);
            }
            state.hidden = false;
            tracing::debug!("Window restored from tray");
        } else if state.is_fullscreen {
            // The popup already covers the monitor; restoring only un-minimizes it
            self.host.show_window(ShowCommand::Restore);
        } else if self.host.is_maximized() {
            // Un-minimize without losing a maximized layout
            self.host.show_window(ShowCommand::Maximize);
        } else {
            self.host.show_window(ShowCommand::Restore);
        }

        self.host.bring_to_foreground();
    }

    pub fn hide(&self) {
        let mut state = self.state.lock();
        self.hide_locked(&mut state);
    }

    fn hide_locked(&self, state: &mut VisibilityState) {
        if state.hidden {
            return;
        }
        if !state.is_fullscreen {
            state.was_maximized = self.host.is_maximized();
        }
        self.host.show_window(ShowCommand::Hide);
        state.hidden = true;
        tracing::debug!("Window hidden to tray (maximized: {})", state.was_maximized);
    }

    /// Stop intercepting close/minimize and shut the browser surface down
    pub fn quit(&self) {
        let mut state = self.state.lock();
        state.should_really_quit = true;
        self.shutdown.trigger();
        tracing::info!("Quit requested");
        self.host.request_terminate();
    }

    /// Decide whether a close/minimize reaches the default window procedure
    pub fn intercept(&self, message: WindowMessage) -> Interception {
        let mut state = self.state.lock();
        if state.should_really_quit {
            return Interception::PassThrough;
        }

        let to_tray = match message {
            WindowMessage::CloseRequested => self.tray.close_to_tray,
            WindowMessage::MinimizeRequested => self.tray.minimize_to_tray,
        };
        if !to_tray {
            return Interception::PassThrough;
        }

        self.hide_locked(&mut state);
        Interception::Suppress
    }

    /// Show the window, then hand the clicked notification to the page
    pub fn deliver_notification(&self, id: &str) {
        self.show();
        tracing::info!("Delivering notification click {} to page", id);
        self.host.evaluate_script(&script::notification_click_call(id));
    }
}
