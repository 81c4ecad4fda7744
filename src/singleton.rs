//! Process singleton guard.
//!
//! Windows uses a named kernel mutex, which the OS releases when the owning
//! process dies (crash included). Unix hosts use an advisory `flock`, which has
//! the same lifetime semantics. Only an explicit "already held" answer makes a
//! launch secondary; every other failure fails open so a flaky OS call can
//! never lock the user out of the app.
use crate::identity::AppIdentity;

/// Outcome of the one-shot startup lock probe
pub enum InstanceRole {
    Primary(InstanceGuard),
    Secondary,
}

impl InstanceRole {
    pub fn is_primary(&self) -> bool {
        matches!(self, InstanceRole::Primary(_))
    }
}

impl std::fmt::Debug for InstanceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceRole::Primary(guard) => write!(f, "Primary(held: {})", guard.is_held()),
            InstanceRole::Secondary => write!(f, "Secondary"),
        }
    }
}

/// Keeps the OS lock alive; there is no release API, the lock lives until exit
pub struct InstanceGuard {
    #[cfg(windows)]
    _mutex: Option<windows::Win32::Foundation::HANDLE>,
    #[cfg(unix)]
    _file: Option<std::fs::File>,
}

impl InstanceGuard {
    /// Guard for a launch that failed open without holding anything
    fn unheld() -> Self {
        Self {
            #[cfg(windows)]
            _mutex: None,
            #[cfg(unix)]
            _file: None,
        }
    }

    pub fn is_held(&self) -> bool {
        #[cfg(windows)]
        {
            self._mutex.is_some()
        }
        #[cfg(unix)]
        {
            self._file.is_some()
        }
        #[cfg(not(any(windows, unix)))]
        {
            false
        }
    }
}

/// A primary role that never probed the lock (single-instance disabled)
pub fn untracked() -> InstanceRole {
    InstanceRole::Primary(InstanceGuard::unheld())
}

#[cfg(windows)]
pub fn acquire(identity: &AppIdentity) -> InstanceRole {
    use windows::core::{Error, HSTRING};
    use windows::Win32::Foundation::ERROR_ALREADY_EXISTS;
    use windows::Win32::System::Threading::CreateMutexW;

    let name = HSTRING::from(identity.lock_name());

    match unsafe { CreateMutexW(None, true, &name) } {
        Ok(handle) => {
            // CreateMutexW hands back the existing mutex and flags it via last-error
            let last = Error::from_win32();
            if last.code() == ERROR_ALREADY_EXISTS.to_hresult() {
                tracing::info!("Instance lock {} already held", identity.lock_name());
                unsafe {
                    let _ = windows::Win32::Foundation::CloseHandle(handle);
                }
                InstanceRole::Secondary
            } else {
                tracing::debug!("Acquired instance lock {}", identity.lock_name());
                InstanceRole::Primary(InstanceGuard {
                    _mutex: Some(handle),
                })
            }
        }
        Err(e) => {
            if e.code() == ERROR_ALREADY_EXISTS.to_hresult() {
                return InstanceRole::Secondary;
            }
            tracing::warn!("CreateMutexW failed ({}), assuming primary", e);
            untracked()
        }
    }
}

#[cfg(unix)]
pub fn acquire(identity: &AppIdentity) -> InstanceRole {
    acquire_in(&std::env::temp_dir(), identity)
}

#[cfg(unix)]
fn acquire_in(dir: &std::path::Path, identity: &AppIdentity) -> InstanceRole {
    use std::fs::OpenOptions;
    use std::os::unix::io::AsRawFd;

    let path = dir.join(format!("sitewrap_{}.lock", identity.hash()));
    let file = match OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)
    {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!("Failed to open lock file {:?} ({}), assuming primary", path, e);
            return untracked();
        }
    };

    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if rc == 0 {
        tracing::debug!("Acquired instance lock {:?}", path);
        return InstanceRole::Primary(InstanceGuard { _file: Some(file) });
    }

    let err = std::io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::EWOULDBLOCK) {
        tracing::info!("Instance lock {:?} already held", path);
        InstanceRole::Secondary
    } else {
        tracing::warn!("flock failed on {:?} ({}), assuming primary", path, err);
        untracked()
    }
}

#[cfg(not(any(windows, unix)))]
pub fn acquire(_identity: &AppIdentity) -> InstanceRole {
    untracked()
}
