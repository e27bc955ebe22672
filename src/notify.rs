//! Outward notifications consumed by the notebook display layer.
//!
//! Events mirror DOM `CustomEvent`s: a fixed name plus a JSON `detail`.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::PlotResult;

pub const TOAST_EVENT: &str = "autoplot-toast";
pub const EMBED_IMAGE_EVENT: &str = "autoplot-embed-image";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Error,
    Warning,
    Success,
    Info,
}

impl ToastKind {
    /// How long the consumer keeps the toast on screen.
    #[must_use]
    pub fn display_duration(self) -> Duration {
        match self {
            Self::Error => Duration::from_secs(60),
            Self::Warning | Self::Success | Self::Info => Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToastEvent {
    #[serde(rename = "type")]
    pub kind: ToastKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedImageEvent {
    pub session_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Toast(ToastEvent),
    EmbedImage(EmbedImageEvent),
}

impl HostEvent {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Toast(_) => TOAST_EVENT,
            Self::EmbedImage(_) => EMBED_IMAGE_EVENT,
        }
    }

    /// JSON payload placed in the event's `detail`.
    pub fn detail_json(&self) -> PlotResult<String> {
        let detail = match self {
            Self::Toast(toast) => serde_json::to_string(toast)?,
            Self::EmbedImage(embed) => serde_json::to_string(embed)?,
        };
        Ok(detail)
    }
}

/// Asynchronous host channel. Delivery is fire-and-forget.
pub trait Notifier {
    fn dispatch(&self, event: HostEvent);
}

/// Writes events to the `tracing` stream; used when no host channel is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn dispatch(&self, event: HostEvent) {
        match event.detail_json() {
            Ok(detail) => info!(event = event.name(), %detail, "host event"),
            Err(err) => warn!(event = event.name(), error = %err, "host event not serializable"),
        }
    }
}

/// Keeps every dispatched event in memory. Clones share one buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    events: Rc<RefCell<Vec<HostEvent>>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<HostEvent> {
        self.events.borrow().clone()
    }

    #[must_use]
    pub fn toasts(&self) -> Vec<ToastEvent> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                HostEvent::Toast(toast) => Some(toast.clone()),
                HostEvent::EmbedImage(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn dispatch(&self, event: HostEvent) {
        self.events.borrow_mut().push(event);
    }
}

pub fn toast(notifier: &dyn Notifier, kind: ToastKind, message: impl Into<String>) {
    notifier.dispatch(HostEvent::Toast(ToastEvent {
        kind,
        message: message.into(),
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toast_detail_uses_type_key() {
        let event = HostEvent::Toast(ToastEvent {
            kind: ToastKind::Warning,
            message: "legend overflow".to_owned(),
        });
        assert_eq!(event.name(), "autoplot-toast");
        assert_eq!(
            event.detail_json().expect("json"),
            r#"{"type":"warning","message":"legend overflow"}"#
        );
    }

    #[test]
    fn embed_detail_is_camel_case() {
        let event = HostEvent::EmbedImage(EmbedImageEvent {
            session_key: "autoplot-image-fig-1".to_owned(),
        });
        assert_eq!(event.name(), "autoplot-embed-image");
        assert_eq!(
            event.detail_json().expect("json"),
            r#"{"sessionKey":"autoplot-image-fig-1"}"#
        );
    }

    #[test]
    fn errors_stay_on_screen_longer() {
        assert_eq!(ToastKind::Error.display_duration(), Duration::from_secs(60));
        assert_eq!(ToastKind::Info.display_duration(), Duration::from_secs(10));
    }
}
