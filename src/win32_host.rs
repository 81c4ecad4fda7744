/// Win32 side of the presentation controller
///
/// `HwndHost` performs the native window operations the state machine asks
/// for. The window procedure subclass routes close/minimize requests and the
/// cross-process present message into the session owned by the UI thread.
use crate::locator::present_message_id;
use crate::presentation::{Interception, ShowCommand, WindowHost, WindowMessage};
use crate::session::AppSession;
use crate::titlebar::TitleBarStyle;
use crate::toast::WinRtToasts;
use anyhow::{anyhow, Result};
use std::cell::RefCell;
use std::rc::Rc;
use windows::Win32::Foundation::{FALSE, HWND, LPARAM, LRESULT, TRUE, WPARAM};
use windows::Win32::Graphics::Dwm::{
    DwmSetWindowAttribute, DWMWA_CAPTION_COLOR, DWMWA_TEXT_COLOR, DWMWA_USE_IMMERSIVE_DARK_MODE,
    DWMWINDOWATTRIBUTE,
};
use windows::Win32::Graphics::Gdi::{GetMonitorInfoW, MonitorFromWindow, MONITORINFO, MONITOR_DEFAULTTONEAREST};
use windows::Win32::System::Threading::{AttachThreadInput, GetCurrentThreadId};
use windows::Win32::UI::Input::KeyboardAndMouse::SetFocus;
use windows::Win32::UI::Shell::{DefSubclassProc, RemoveWindowSubclass, SetWindowSubclass};
use windows::Win32::UI::WindowsAndMessaging::*;
use wry::WebView;

pub type WinSession = AppSession<HwndHost, WinRtToasts>;

const SUBCLASS_ID: usize = 0x5157;

thread_local! {
    // Only the UI thread ever runs the subclass procedure
    static SESSION: RefCell<Option<Rc<WinSession>>> = RefCell::new(None);
}

pub struct HwndHost {
    hwnd: HWND,
    webview: WebView,
}

impl HwndHost {
    pub fn new(hwnd: HWND, webview: WebView) -> Self {
        Self { hwnd, webview }
    }

    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }
}

impl WindowHost for HwndHost {
    fn show_window(&self, command: ShowCommand) {
        let cmd = match command {
            ShowCommand::Show => SW_SHOW,
            ShowCommand::Hide => SW_HIDE,
            ShowCommand::Maximize => SW_MAXIMIZE,
            ShowCommand::Restore => SW_RESTORE,
        };
        unsafe {
            let _ = ShowWindow(self.hwnd, cmd);
        }
    }

    fn is_maximized(&self) -> bool {
        unsafe { IsZoomed(self.hwnd).as_bool() }
    }

    fn enter_fullscreen(&self) {
        unsafe {
            let monitor = MonitorFromWindow(self.hwnd, MONITOR_DEFAULTTONEAREST);
            let mut info = MONITORINFO {
                cbSize: std::mem::size_of::<MONITORINFO>() as u32,
                ..Default::default()
            };
            if !GetMonitorInfoW(monitor, &mut info).as_bool() {
                tracing::warn!("Could not query monitor for fullscreen");
                return;
            }

            SetWindowLongPtrW(self.hwnd, GWL_STYLE, (WS_POPUP | WS_VISIBLE).0 as isize);
            let rect = info.rcMonitor;
            if let Err(e) = SetWindowPos(
                self.hwnd,
                HWND_TOP,
                rect.left,
                rect.top,
                rect.right - rect.left,
                rect.bottom - rect.top,
                SWP_FRAMECHANGED | SWP_SHOWWINDOW,
            ) {
                tracing::warn!("Failed to size fullscreen window: {}", e);
            }
        }
    }

    fn bring_to_foreground(&self) {
        unsafe {
            // SetForegroundWindow alone loses to focus-stealing prevention;
            // sharing the foreground thread's input state lets it through.
            let foreground = GetForegroundWindow();
            let current_thread = GetCurrentThreadId();
            let foreground_thread = GetWindowThreadProcessId(foreground, None);

            let attached = foreground_thread != 0
                && foreground_thread != current_thread
                && AttachThreadInput(current_thread, foreground_thread, TRUE).as_bool();

            let _ = BringWindowToTop(self.hwnd);
            let _ = SetForegroundWindow(self.hwnd);
            SetFocus(self.hwnd);

            if attached {
                let _ = AttachThreadInput(current_thread, foreground_thread, FALSE);
            }
        }
    }

    fn evaluate_script(&self, script: &str) {
        if let Err(e) = self.webview.evaluate_script(script) {
            tracing::error!("Script evaluation failed: {}", e);
        }
    }

    fn request_terminate(&self) {
        // Runs through the subclass again, which passes it on once quitting
        unsafe {
            if let Err(e) = PostMessageW(self.hwnd, WM_CLOSE, WPARAM(0), LPARAM(0)) {
                tracing::warn!("Failed to post close: {}", e);
            }
        }
    }
}

fn set_dwm_attribute<T>(hwnd: HWND, attribute: DWMWINDOWATTRIBUTE, value: &T) {
    unsafe {
        if let Err(e) = DwmSetWindowAttribute(
            hwnd,
            attribute,
            value as *const T as *const _,
            std::mem::size_of::<T>() as u32,
        ) {
            tracing::debug!("DwmSetWindowAttribute({}) failed: {}", attribute.0, e);
        }
    }
}

/// Color the caption; older systems without these attributes keep the default
pub fn apply_title_bar(hwnd: HWND, style: TitleBarStyle) {
    match style {
        TitleBarStyle::Dark => set_dwm_attribute(hwnd, DWMWA_USE_IMMERSIVE_DARK_MODE, &TRUE),
        TitleBarStyle::Light => set_dwm_attribute(hwnd, DWMWA_USE_IMMERSIVE_DARK_MODE, &FALSE),
        TitleBarStyle::Caption { color, text } => {
            set_dwm_attribute(hwnd, DWMWA_CAPTION_COLOR, &color);
            set_dwm_attribute(hwnd, DWMWA_TEXT_COLOR, &text);
        }
    }
}

/// Route this window's messages through the session
pub fn install_window_proc(hwnd: HWND, session: Rc<WinSession>) -> Result<()> {
    // Register before the first message can arrive
    let _ = present_message_id();
    SESSION.with(|cell| *cell.borrow_mut() = Some(session));

    let installed = unsafe { SetWindowSubclass(hwnd, Some(subclass_proc), SUBCLASS_ID, 0) };
    if !installed.as_bool() {
        SESSION.with(|cell| cell.borrow_mut().take());
        return Err(anyhow!("Failed to subclass main window"));
    }
    tracing::debug!("Window procedure installed");
    Ok(())
}

/// Undo `install_window_proc`, handing back the session
pub fn uninstall_window_proc(hwnd: HWND) -> Option<Rc<WinSession>> {
    unsafe {
        let _ = RemoveWindowSubclass(hwnd, Some(subclass_proc), SUBCLASS_ID);
    }
    SESSION.with(|cell| cell.borrow_mut().take())
}

fn classify(msg: u32, wparam: WPARAM) -> Option<WindowMessage> {
    match msg {
        WM_CLOSE => Some(WindowMessage::CloseRequested),
        WM_SYSCOMMAND if (wparam.0 as u32 & 0xFFF0) == SC_MINIMIZE => {
            Some(WindowMessage::MinimizeRequested)
        }
        _ => None,
    }
}

unsafe extern "system" fn subclass_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
    _id: usize,
    _data: usize,
) -> LRESULT {
    // Clone out so nested messages never find the cell borrowed
    let session = SESSION.with(|cell| cell.borrow().clone());
    let Some(session) = session else {
        return DefSubclassProc(hwnd, msg, wparam, lparam);
    };

    if msg != 0 && msg == present_message_id() {
        session.handle_present_signal();
        return LRESULT(0);
    }

    if let Some(message) = classify(msg, wparam) {
        if session.intercept(message) == Interception::Suppress {
            return LRESULT(0);
        }
    }

    DefSubclassProc(hwnd, msg, wparam, lparam)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_messages() {
        assert_eq!(classify(WM_CLOSE, WPARAM(0)), Some(WindowMessage::CloseRequested));
        assert_eq!(
            classify(WM_SYSCOMMAND, WPARAM(SC_MINIMIZE as usize | 0x2)),
            Some(WindowMessage::MinimizeRequested)
        );
        assert_eq!(classify(WM_SYSCOMMAND, WPARAM(SC_MAXIMIZE as usize)), None);
        assert_eq!(classify(WM_SIZE, WPARAM(0)), None);
    }
}
