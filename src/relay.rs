//! Pending-notification relay.
//!
//! Two small files in the temp directory carry a notification identifier
//! between processes that may never be alive at the same time:
//!
//! - *pending* slot: written when a toast is displayed, so a later launch can
//!   tell a notification was outstanding when the app was closed.
//! - *notif* slot: written by whoever observed a click (a secondary launch, the
//!   toast activation callback, or the primary itself on startup); drained only
//!   by the primary's poller.
//!
//! Publishing writes a private sibling file and renames it over the slot, so a
//! reader never sees a half-written identifier. Consuming renames the slot to a
//! private claim file first; only one claimer can win that rename, which keeps
//! delivery at-most-once even with racing consumers. The slot is gone before
//! the caller acts on the content.
//!
//! Missing files are the normal case and every I/O failure is treated the same
//! way: nothing to deliver.
use crate::identity::AppIdentity;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Pending,
    Notif,
}

#[derive(Debug, Clone)]
pub struct NotificationRelay {
    pending_path: PathBuf,
    notif_path: PathBuf,
}

impl NotificationRelay {
    /// Relay files in the OS temp directory
    pub fn new(identity: &AppIdentity) -> Self {
        Self::in_dir(&std::env::temp_dir(), identity)
    }

    pub fn in_dir(dir: &Path, identity: &AppIdentity) -> Self {
        Self {
            pending_path: dir.join(identity.pending_file_name()),
            notif_path: dir.join(identity.notif_file_name()),
        }
    }

    pub fn path(&self, slot: Slot) -> &Path {
        match slot {
            Slot::Pending => &self.pending_path,
            Slot::Notif => &self.notif_path,
        }
    }

    /// A toast carrying `id` was displayed
    pub fn record_displayed(&self, id: &str) {
        self.publish(Slot::Pending, id);
    }

    /// A toast carrying `id` was clicked; the primary's poller will deliver it.
    /// The click settles the pending record for the same toast.
    pub fn post_click(&self, id: &str) {
        self.publish(Slot::Notif, id);
        self.settle_pending(id);
    }

    /// Drop the pending record if it is for `id`. A newer toast's record stays.
    fn settle_pending(&self, id: &str) {
        let holds_id = fs::read_to_string(&self.pending_path)
            .map(|content| content.trim() == id)
            .unwrap_or(false);
        if !holds_id {
            return;
        }

        if let Some(taken) = self.take_pending() {
            if taken != id {
                // A newer toast landed between the read and the claim
                self.record_displayed(&taken);
            } else {
                tracing::debug!("Pending notification {} settled by its click", id);
            }
        }
    }

    /// Drain the notif slot
    pub fn take_click(&self) -> Option<String> {
        self.take(Slot::Notif)
    }

    /// Drain the pending slot
    pub fn take_pending(&self) -> Option<String> {
        self.take(Slot::Pending)
    }

    /// Treat an outstanding displayed notification as clicked
    pub fn forward_pending(&self) -> Option<String> {
        let id = self.take_pending()?;
        tracing::debug!("Forwarding pending notification {} to the notif slot", id);
        self.post_click(&id);
        Some(id)
    }

    /// Write `id` into a slot, replacing any previous value
    pub fn publish(&self, slot: Slot, id: &str) {
        let target = self.path(slot);
        if let Err(e) = write_atomically(target, id) {
            tracing::debug!("Relay write to {:?} failed: {}", target, e);
        } else {
            tracing::debug!("Relay {:?} <- {}", slot, id);
        }
    }

    /// Claim and delete a slot, returning its trimmed content if actionable
    pub fn take(&self, slot: Slot) -> Option<String> {
        let source = self.path(slot);
        let claim = private_sibling(source, "claim");

        // Losing the rename means the slot was empty or someone else got it
        if let Err(e) = fs::rename(source, &claim) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::debug!("Relay claim of {:?} failed: {}", source, e);
            }
            return None;
        }

        let content = fs::read_to_string(&claim);
        if let Err(e) = fs::remove_file(&claim) {
            tracing::debug!("Failed to remove relay claim {:?}: {}", claim, e);
        }

        let content = match content {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!("Relay read of {:?} failed: {}", claim, e);
                return None;
            }
        };

        let id = content.trim();
        if id.is_empty() {
            tracing::debug!("Relay {:?} held no identifier, discarded", slot);
            return None;
        }
        Some(id.to_string())
    }
}

fn write_atomically(target: &Path, content: &str) -> io::Result<()> {
    let staging = private_sibling(target, "tmp");
    fs::write(&staging, content)?;
    fs::rename(&staging, target).map_err(|e| {
        let _ = fs::remove_file(&staging);
        e
    })
}

/// Unique per process and per call, in the same directory as `path`
fn private_sibling(path: &Path, suffix: &str) -> PathBuf {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.{}.{}", std::process::id(), seq, suffix));
    path.with_file_name(name)
}
