//! Finding the primary's window from another process and telling it to come forward.
use crate::handoff::WindowSignal;

/// Registered window message the primary's window procedure listens for
pub const PRESENT_MESSAGE_NAME: &str = "SiteWrap.PresentWindow";

/// Production [`WindowSignal`]
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowLocator;

impl WindowSignal for WindowLocator {
    fn signal(&self, title: &str) -> bool {
        locate_and_signal(title)
    }
}

#[cfg(windows)]
mod win {
    use super::PRESENT_MESSAGE_NAME;
    use once_cell::sync::Lazy;
    use windows::core::{HSTRING, PCWSTR};
    use windows::Win32::Foundation::{HWND, LPARAM, WPARAM};
    use windows::Win32::UI::WindowsAndMessaging::{
        AllowSetForegroundWindow, FindWindowW, GetWindowThreadProcessId, PostMessageW,
        RegisterWindowMessageW, SetForegroundWindow,
    };

    static PRESENT_MESSAGE: Lazy<u32> =
        Lazy::new(|| unsafe { RegisterWindowMessageW(&HSTRING::from(PRESENT_MESSAGE_NAME)) });

    pub fn present_message_id() -> u32 {
        *PRESENT_MESSAGE
    }

    pub fn locate_and_signal(title: &str) -> bool {
        unsafe {
            let hwnd = FindWindowW(PCWSTR::null(), &HSTRING::from(title));
            if hwnd == HWND::default() {
                return false;
            }

            let message = present_message_id();
            if message == 0 {
                tracing::debug!("Present message could not be registered");
                return false;
            }

            if let Err(e) = PostMessageW(hwnd, message, WPARAM(0), LPARAM(0)) {
                tracing::debug!("Failed to post present message: {}", e);
                return false;
            }

            // We were just launched by the user, so we may hand our
            // foreground right to the primary before it asks for it.
            let mut pid = 0u32;
            GetWindowThreadProcessId(hwnd, Some(&mut pid as *mut u32));
            if pid != 0 {
                let _ = AllowSetForegroundWindow(pid);
            }
            let _ = SetForegroundWindow(hwnd);

            true
        }
    }
}

#[cfg(windows)]
pub use win::present_message_id;

/// Post the present message to the top-level window titled exactly `title`.
/// Not finding one is normal and returns false.
#[cfg(windows)]
pub fn locate_and_signal(title: &str) -> bool {
    let found = win::locate_and_signal(title);
    if !found {
        tracing::debug!("Window \"{}\" not found or not signalled", title);
    }
    found
}

/// There is no window to find off Windows
#[cfg(not(windows))]
pub fn locate_and_signal(title: &str) -> bool {
    tracing::debug!("Window \"{}\" not found (no window system)", title);
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_window_is_not_found() {
        assert!(!WindowLocator.signal("sitewrap test window that does not exist 3f1c"));
    }
}
