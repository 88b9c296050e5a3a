// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User-facing notifications.
//!
//! Every state transition of a gated action (submission, confirmation,
//! success, failure) is pushed to a [`Notifier`]. The UI decides how to show
//! it; the gateway only decides what to say.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Visual weight of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    /// Progress milestone (e.g. transaction submitted)
    Info,
    /// Action completed
    Success,
    /// Confirmed on chain, but the outcome could not be fully determined
    Warning,
    /// Denial or failure
    Destructive,
}

/// Side channel for user-visible messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NoticeKind, message: &str);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        match kind {
            NoticeKind::Info | NoticeKind::Success => {
                tracing::info!(kind = ?kind, "{message}")
            }
            NoticeKind::Warning => tracing::warn!(kind = ?kind, "{message}"),
            NoticeKind::Destructive => tracing::error!(kind = ?kind, "{message}"),
        }
    }
}

/// A notification as delivered to a UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Forwards notifications over a channel so a UI task can render them.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end the UI drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        let notice = Notice {
            kind,
            message: message.to_string(),
            at: Utc::now(),
        };
        if self.tx.send(notice).is_err() {
            tracing::debug!("Notification receiver dropped: {message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_notifier_delivers_in_order() {
        let (notifier, mut rx) = ChannelNotifier::new();
        notifier.notify(NoticeKind::Info, "submitted");
        notifier.notify(NoticeKind::Success, "confirmed");

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!((first.kind, first.message.as_str()), (NoticeKind::Info, "submitted"));
        assert_eq!(
            (second.kind, second.message.as_str()),
            (NoticeKind::Success, "confirmed")
        );
    }

    #[test]
    fn channel_notifier_survives_dropped_receiver() {
        let (notifier, rx) = ChannelNotifier::new();
        drop(rx);
        notifier.notify(NoticeKind::Destructive, "nobody listening");
    }

    #[test]
    fn notice_kind_serializes_lowercase() {
        let json = serde_json::to_string(&NoticeKind::Destructive).unwrap();
        assert_eq!(json, r#""destructive""#);
    }
}
