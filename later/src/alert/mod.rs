//! User-visible error alerting.
//!
//! Every failure the store survives is translated into exactly one
//! [`Alert`] of its operation's category and pushed through a bounded
//! channel. The UI layer consumes the receiver and shows a non-blocking
//! message; the store never waits on it. Emission is best-effort — when
//! the channel is full the alert is dropped rather than blocking a
//! mutation path.

use std::fmt;

use tokio::sync::mpsc;

/// Category of a user-visible alert, one per operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    /// The standing remote subscription failed.
    Sync,
    /// An explicit reload from the remote store failed.
    Refresh,
    /// The remote leg of an add failed after the optimistic apply.
    Add,
    /// The remote leg of a completion toggle failed.
    Toggle,
    /// The remote leg of a field update failed.
    Update,
    /// The remote leg of a delete failed.
    Delete,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync => write!(f, "sync"),
            Self::Refresh => write!(f, "refresh"),
            Self::Add => write!(f, "add"),
            Self::Toggle => write!(f, "toggle"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A single user-visible alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// What kind of operation failed.
    pub kind: AlertKind,
    /// Human-readable message, ready to display.
    pub message: String,
}

/// Fire-and-forget sender side of the alert channel.
#[derive(Debug, Clone)]
pub struct AlertSink {
    tx: mpsc::Sender<Alert>,
}

impl AlertSink {
    /// Creates an alert channel with the given buffer size.
    ///
    /// Returns the sink (held by the store) and the receiver (consumed by
    /// the UI layer).
    #[must_use]
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Alert>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }

    /// Emits an alert without blocking.
    ///
    /// If the channel is full or the receiver is gone the alert is dropped;
    /// the failure is already in the log by the time this is called.
    pub fn emit(&self, kind: AlertKind, message: impl Into<String>) {
        let alert = Alert {
            kind,
            message: message.into(),
        };
        if let Err(err) = self.tx.try_send(alert) {
            tracing::debug!(kind = %kind, error = %err, "alert dropped");
        }
    }
}
