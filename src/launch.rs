//! Command line flags understood by the stub.
//!
//! - `--show` / `/show`: focus the running window and exit
//! - `--startup` / `/startup`: launched by the OS at logon (start in tray)
//! - `--notif-id=<id>`: a toast with this identifier was clicked (implies show)

pub const NOTIFICATION_ARG_PREFIX: &str = "--notif-id=";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LaunchArgs {
    pub show: bool,
    pub from_startup: bool,
    /// Clicked notification identifier, already trimmed and non-empty
    pub notification: Option<String>,
}

impl LaunchArgs {
    /// Parse arguments, excluding the program name
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = LaunchArgs::default();

        for arg in args {
            let arg = arg.as_ref();
            match arg {
                "--show" | "/show" => parsed.show = true,
                "--startup" | "/startup" => parsed.from_startup = true,
                _ => {
                    if let Some(id) = arg.strip_prefix(NOTIFICATION_ARG_PREFIX) {
                        parsed.show = true;
                        let id = id.trim();
                        if !id.is_empty() {
                            parsed.notification = Some(id.to_string());
                        }
                    } else {
                        tracing::debug!("Ignoring unknown argument: {}", arg);
                    }
                }
            }
        }

        parsed
    }

    pub fn from_env() -> Self {
        Self::parse(std::env::args().skip(1))
    }

    /// True when this launch exists to wake (and possibly notify) a running instance
    pub fn requests_handoff(&self) -> bool {
        self.show || self.notification.is_some()
    }
}

/// Relaunch argument carrying a notification identifier
pub fn notification_argument(id: &str) -> String {
    format!("{}{}", NOTIFICATION_ARG_PREFIX, id)
}
