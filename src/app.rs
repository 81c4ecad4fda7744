//! Primary instance runner: window, webview, tray and the event loop.
//!
//! Everything here runs on the thread that called [`run`]. Background work
//! (relay poller, tray and toast callbacks, page messages) reaches the session
//! as `UiTask` user events.
use crate::bridge::PageRequest;
use crate::config::AppConfig;
use crate::dispatch::{UiDispatcher, UiTask};
use crate::handoff::LaunchPlan;
use crate::identity::AppIdentity;
use crate::navigation::{NavigationDecision, NavigationPolicy};
use crate::relay::NotificationRelay;
use crate::script::build_init_script;
use crate::session::{open_external, AppSession, TaskOutcome};
use crate::singleton::InstanceRole;
use crate::titlebar::TitleBarStyle;
use crate::toast::WinRtToasts;
use crate::tray::TrayManager;
use crate::win32_host::{apply_title_bar, install_window_proc, uninstall_window_proc, HwndHost};
use anyhow::{anyhow, Context, Result};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use windows::core::HSTRING;
use windows::Win32::Foundation::HWND;
use windows::Win32::UI::Shell::SetCurrentProcessExplicitAppUserModelID;
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use winit::platform::windows::IconExtWindows;
use winit::raw_window_handle::{HasWindowHandle, RawWindowHandle};
use winit::window::{Icon, Window, WindowBuilder, WindowLevel};
use wry::{WebContext, WebView, WebViewBuilder};

/// `UiDispatcher` backed by the winit event loop
struct LoopDispatcher(Mutex<EventLoopProxy<UiTask>>);

impl UiDispatcher for LoopDispatcher {
    fn dispatch(&self, task: UiTask) -> bool {
        self.0.lock().send_event(task).is_ok()
    }
}

/// Blocking error dialog
pub fn show_error(title: &str, message: &str) {
    let _ = rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title(title)
        .set_description(message)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

fn webview_data_dir(identity: &AppIdentity) -> PathBuf {
    std::env::temp_dir().join(format!("sitewrap-{}-webview", identity.hash()))
}

fn window_hwnd(window: &Window) -> Result<HWND> {
    let handle = window
        .window_handle()
        .map_err(|e| anyhow!("Failed to get window handle: {}", e))?;
    match handle.as_raw() {
        RawWindowHandle::Win32(h) => Ok(HWND(h.hwnd.get())),
        _ => Err(anyhow!("Not a Win32 window")),
    }
}

fn build_window(config: &AppConfig, event_loop: &winit::event_loop::EventLoop<UiTask>) -> Result<Window> {
    let level = if config.always_on_top {
        WindowLevel::AlwaysOnTop
    } else {
        WindowLevel::Normal
    };

    // Same resource the build script embeds and the tray uses
    let icon = Icon::from_resource(1, None)
        .map_err(|e| tracing::debug!("No embedded window icon: {}", e))
        .ok();

    // Created hidden; the presentation controller decides how it first appears
    WindowBuilder::new()
        .with_title(config.title.clone())
        .with_inner_size(LogicalSize::new(config.width, config.height))
        .with_resizable(config.resizable)
        .with_decorations(!config.frameless)
        .with_window_level(level)
        .with_window_icon(icon)
        .with_visible(false)
        .build(event_loop)
        .context("Failed to create window")
}

fn build_webview(
    config: &AppConfig,
    window: &Window,
    context: &mut WebContext,
    dispatcher: Arc<dyn UiDispatcher>,
) -> Result<WebView> {
    let navigation = NavigationPolicy::new(&config.url, &config.whitelist, config.block_external_nav);
    let new_window_policy = navigation.clone();

    let mut builder = WebViewBuilder::new(window)
        .with_web_context(context)
        .with_url(&config.url)
        .with_initialization_script(&build_init_script(config))
        .with_devtools(!config.disable_devtools)
        .with_ipc_handler(move |request: wry::http::Request<String>| {
            match PageRequest::parse(request.body()) {
                Ok(message) => {
                    dispatcher.dispatch(UiTask::Page(message));
                }
                Err(e) => tracing::warn!("{}", e),
            }
        })
        .with_navigation_handler(move |target: String| match navigation.decide(&target) {
            NavigationDecision::Allow => true,
            NavigationDecision::OpenExternal => {
                open_external(&target);
                false
            }
            NavigationDecision::Block => false,
        })
        .with_new_window_req_handler(move |target: String| {
            // Popups never open in-app
            if new_window_policy.decide(&target) != NavigationDecision::Block {
                open_external(&target);
            }
            false
        });

    if !config.user_agent.is_empty() {
        builder = builder.with_user_agent(&config.user_agent);
    }

    builder
        .build()
        .map_err(|e| anyhow!("Failed to create WebView (is the WebView2 runtime installed?): {}", e))
}

/// Run the primary instance until the window closes or Exit is chosen.
/// `role` keeps the instance lock alive for the duration.
pub fn run(config: AppConfig, plan: LaunchPlan, role: InstanceRole) -> Result<()> {
    let from_startup = match &plan {
        LaunchPlan::Run { from_startup, .. } => *from_startup,
        LaunchPlan::HandOff { .. } => return Err(anyhow!("run called with a handoff plan")),
    };

    let identity = AppIdentity::from_title(&config.title);
    tracing::info!("Starting \"{}\" ({:?})", identity.title(), role);

    unsafe {
        if let Err(e) = SetCurrentProcessExplicitAppUserModelID(&HSTRING::from(identity.app_user_model_id())) {
            tracing::warn!("Failed to set AppUserModelID: {}", e);
        }
    }

    let relay = Arc::new(NotificationRelay::new(&identity));

    let event_loop = EventLoopBuilder::<UiTask>::with_user_event()
        .build()
        .context("Failed to create event loop")?;
    let dispatcher: Arc<dyn UiDispatcher> =
        Arc::new(LoopDispatcher(Mutex::new(event_loop.create_proxy())));

    let window = build_window(&config, &event_loop)?;
    let hwnd = window_hwnd(&window)?;

    if !config.title_bar_color.is_empty() {
        match TitleBarStyle::parse(&config.title_bar_color) {
            Some(style) => apply_title_bar(hwnd, style),
            None => tracing::warn!("Ignoring titlebar_color {:?}", config.title_bar_color),
        }
    }

    let data_dir = webview_data_dir(&identity);
    let mut web_context = WebContext::new(Some(data_dir.clone()));
    let webview = build_webview(&config, &window, &mut web_context, Arc::clone(&dispatcher))?;

    let tray = if config.enable_tray {
        let tray = TrayManager::new(
            &config.title,
            config.enable_auto_start,
            Arc::clone(&dispatcher),
        )
        .context("Failed to create tray manager")?;
        Some(tray)
    } else {
        None
    };

    let clear_cache = config.clear_cache_on_exit;
    let session = Rc::new(AppSession::new(
        config,
        Arc::clone(&relay),
        HwndHost::new(hwnd, webview),
        WinRtToasts::new(Arc::clone(&relay)),
        Arc::clone(&dispatcher),
    ));
    install_window_proc(hwnd, Rc::clone(&session))?;

    session.start(from_startup);
    plan.seed_relay(&relay);
    if let Err(e) = session.spawn_poller() {
        tracing::error!("Failed to start relay poller: {}", e);
    }

    tracing::info!("Entering event loop");

    let loop_session = Rc::clone(&session);
    let result = event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Wait);
        // Keep the window and tray alive for as long as the loop runs
        let _ = (&window, &tray);

        match event {
            Event::UserEvent(UiTask::ToggleAutoStart) => {
                if let Some(tray) = &tray {
                    tray.toggle_auto_start();
                }
            }
            Event::UserEvent(task) => {
                if loop_session.run_task(task) == TaskOutcome::Exit {
                    elwt.exit();
                }
            }
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                // Only reached when the close was not sent to the tray
                if !loop_session.presentation().state().should_really_quit {
                    loop_session.presentation().quit();
                }
                elwt.exit();
            }
            Event::LoopExiting => tracing::info!("Event loop exiting"),
            _ => {}
        }
    });

    drop(uninstall_window_proc(hwnd));
    drop(session);
    drop(web_context);

    if clear_cache {
        if let Err(e) = std::fs::remove_dir_all(&data_dir) {
            tracing::debug!("Failed to clear webview data {:?}: {}", data_dir, e);
        } else {
            tracing::info!("Cleared webview data");
        }
    }

    result.map_err(|e| anyhow!("Event loop error: {}", e))
}
