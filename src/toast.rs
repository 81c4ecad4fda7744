//! Desktop toasts raised on behalf of the hosted page.
use crate::bridge::NotificationRequest;
use crate::launch::notification_argument;
use crate::relay::NotificationRelay;
use anyhow::Result;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationKind {
    /// Clicking relaunches (or re-activates) the app in the foreground
    Foreground,
}

impl ActivationKind {
    fn as_attribute(&self) -> &'static str {
        match self {
            ActivationKind::Foreground => "foreground",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub kind: ActivationKind,
    pub argument: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastMessage {
    pub app_id: String,
    pub title: String,
    pub body: String,
    pub notification_id: String,
    /// None when the page gave no identifier; the toast is then display-only
    pub activation: Option<Activation>,
}

/// Toast payload. The launch attribute is what the OS passes on the command
/// line when a click has to start the app again.
pub fn toast_xml(toast: &ToastMessage) -> String {
    let mut xml = String::from("<toast");
    if let Some(activation) = &toast.activation {
        xml.push_str(&format!(
            " activationType=\"{}\" launch=\"{}\"",
            activation.kind.as_attribute(),
            escape_xml(&activation.argument)
        ));
    }
    xml.push_str("><visual><binding template=\"ToastGeneric\">");
    xml.push_str(&format!("<text>{}</text>", escape_xml(&toast.title)));
    if !toast.body.is_empty() {
        xml.push_str(&format!("<text>{}</text>", escape_xml(&toast.body)));
    }
    xml.push_str("</binding></visual></toast>");
    xml
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub trait ToastBackend {
    fn push(&self, toast: &ToastMessage) -> Result<()>;
}

pub struct ToastEmitter<B: ToastBackend> {
    backend: B,
    relay: Arc<NotificationRelay>,
    app_id: String,
    default_title: String,
}

impl<B: ToastBackend> ToastEmitter<B> {
    pub fn new(backend: B, relay: Arc<NotificationRelay>, app_id: String, default_title: String) -> Self {
        Self {
            backend,
            relay,
            app_id,
            default_title,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Record the identifier as pending, then show the toast
    pub fn emit(&self, request: &NotificationRequest) {
        let id = request.id.trim();
        let activation = if id.is_empty() {
            tracing::debug!("Notification without an identifier, clicks are not tracked");
            None
        } else {
            self.relay.record_displayed(id);
            Some(Activation {
                kind: ActivationKind::Foreground,
                argument: notification_argument(id),
            })
        };

        let toast = ToastMessage {
            app_id: self.app_id.clone(),
            title: if request.title.trim().is_empty() {
                self.default_title.clone()
            } else {
                request.title.clone()
            },
            body: request.body.clone(),
            notification_id: id.to_string(),
            activation,
        };

        match self.backend.push(&toast) {
            Ok(()) => tracing::debug!("Toast {} shown: {}", id, toast.title),
            Err(e) => tracing::warn!("Failed to show toast {}: {}", id, e),
        }
    }
}

/// WinRT toast notifications
#[cfg(windows)]
pub struct WinRtToasts {
    relay: Arc<NotificationRelay>,
}

#[cfg(windows)]
impl WinRtToasts {
    pub fn new(relay: Arc<NotificationRelay>) -> Self {
        Self { relay }
    }
}

#[cfg(windows)]
impl ToastBackend for WinRtToasts {
    fn push(&self, toast: &ToastMessage) -> Result<()> {
        use anyhow::Context;
        use windows::core::{IInspectable, HSTRING};
        use windows::Data::Xml::Dom::XmlDocument;
        use windows::Foundation::TypedEventHandler;
        use windows::UI::Notifications::{ToastNotification, ToastNotificationManager};

        let document = XmlDocument::new().context("Failed to create toast document")?;
        document
            .LoadXml(&HSTRING::from(toast_xml(toast)))
            .context("Failed to load toast XML")?;
        let notification = ToastNotification::CreateToastNotification(&document)
            .context("Failed to create toast")?;

        // Clicks while we are alive go through the same notif slot the
        // relaunch path writes, so the poller stays the only deliverer.
        if toast.activation.is_some() {
            let relay = Arc::clone(&self.relay);
            let id = toast.notification_id.clone();
            notification
                .Activated(&TypedEventHandler::<ToastNotification, IInspectable>::new(
                    move |_, _| {
                        tracing::info!("Toast {} activated", id);
                        relay.post_click(&id);
                        Ok(())
                    },
                ))
                .context("Failed to register toast activation")?;
        }

        ToastNotificationManager::CreateToastNotifierWithId(&HSTRING::from(toast.app_id.as_str()))
            .and_then(|notifier| notifier.Show(&notification))
            .context("Failed to show toast")
    }
}
