//! SiteWrap stub library
//!
//! Hosts a single website in an embedded browser window, with optional tray
//! residency and native toasts. A second launch hands off to the running
//! window; clicked toasts reach the page through a small file relay.

pub mod autostart;
pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod handoff;
pub mod identity;
pub mod launch;
pub mod locator;
pub mod logging;
pub mod navigation;
pub mod poller;
pub mod presentation;
pub mod relay;
pub mod script;
pub mod session;
pub mod singleton;
pub mod titlebar;
pub mod toast;

#[cfg(windows)]
pub mod app;
#[cfg(windows)]
pub mod tray;
#[cfg(windows)]
pub mod win32_host;
