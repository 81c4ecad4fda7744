//! Messages posted by the hosted page through `window.ipc.postMessage`.
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("malformed page message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A toast the page asked for
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub id: String,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum PageRequest {
    Notify(NotificationRequest),
    FocusWindow,
    OpenExternal { url: String },
}

impl PageRequest {
    pub fn parse(raw: &str) -> Result<Self, BridgeError> {
        Ok(serde_json::from_str(raw)?)
    }
}
