//! Application identity derived from the configured title.
//!
//! Everything that has to line up across process restarts (the instance lock,
//! the relay files, the toast identity) is named from here so two launches of
//! the same stamped stub always agree.
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

const INVALID_FILE_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppIdentity {
    title: String,
    hash: String,
    sanitized: String,
}

impl AppIdentity {
    pub fn from_title(title: &str) -> Self {
        Self {
            title: title.to_string(),
            hash: stable_hash(title),
            sanitized: sanitize_file_name(title),
        }
    }

    /// Exact window title the primary instance is created with
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Hex digest of the title
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Filesystem-safe variant of the title
    pub fn sanitized(&self) -> &str {
        &self.sanitized
    }

    /// Name of the system-wide instance lock
    pub fn lock_name(&self) -> String {
        format!("Global\\sitewrap_{}", self.hash)
    }

    /// AppUserModelID-style identity used for toasts and the process
    pub fn app_user_model_id(&self) -> String {
        let compact: String = self.sanitized.chars().filter(|c| *c != ' ').collect();
        format!("SiteWrap.{}", compact)
    }

    pub fn pending_file_name(&self) -> String {
        format!("sitewrap-{}-pending.txt", self.sanitized)
    }

    pub fn notif_file_name(&self) -> String {
        format!("sitewrap-{}-notif.txt", self.sanitized)
    }
}

/// Replace characters Windows refuses in file names
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if INVALID_FILE_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

fn stable_hash(title: &str) -> String {
    let digest = Sha256::digest(title.as_bytes());
    // 128 bits keeps the kernel object name short
    digest[..16].iter().fold(String::with_capacity(32), |mut out, byte| {
        let _ = write!(out, "{:02x}", byte);
        out
    })
}
