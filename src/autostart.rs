//! "Start with Windows" entry under the per-user Run key.
//!
//! The entry relaunches the stub with `--startup`, which starts it in the tray.

/// Per-user Run key, relative to HKEY_CURRENT_USER
pub const RUN_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";

/// Registry value for launching `exe` at logon
pub fn run_entry(exe: &std::path::Path) -> String {
    format!("\"{}\" --startup", exe.display())
}

#[cfg(windows)]
mod win {
    use super::{run_entry, RUN_KEY};
    use anyhow::{Context, Result};
    use std::io::ErrorKind;
    use winreg::enums::HKEY_CURRENT_USER;
    use winreg::RegKey;

    pub fn is_enabled(title: &str) -> bool {
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        match hkcu.open_subkey(RUN_KEY) {
            Ok(key) => match key.get_value::<String, _>(title) {
                Ok(value) => !value.trim().is_empty(),
                Err(e) if e.kind() == ErrorKind::NotFound => false,
                Err(e) => {
                    tracing::debug!("Failed to read Run entry: {}", e);
                    false
                }
            },
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    tracing::debug!("Failed to open Run key: {}", e);
                }
                false
            }
        }
    }

    pub fn set_enabled(title: &str, enable: bool) -> Result<()> {
        let hkcu = RegKey::predef(HKEY_CURRENT_USER);
        let (key, _) = hkcu
            .create_subkey(RUN_KEY)
            .context("Failed to open Run key")?;

        if enable {
            let exe = std::env::current_exe().context("Failed to locate executable")?;
            key.set_value(title, &run_entry(&exe))
                .context("Failed to write Run entry")?;
        } else {
            match key.delete_value(title) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e).context("Failed to remove Run entry"),
            }
        }

        tracing::info!("Start with Windows {}", if enable { "enabled" } else { "disabled" });
        Ok(())
    }
}

#[cfg(windows)]
pub use win::{is_enabled, set_enabled};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_run_entry_quotes_path_and_starts_in_tray() {
        let entry = run_entry(Path::new("/apps/My App/stub.exe"));
        assert_eq!(entry, "\"/apps/My App/stub.exe\" --startup");
    }
}
