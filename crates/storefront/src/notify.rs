//! User-facing notifications.
//!
//! Components never let a backend failure escape as a fault. They fall back
//! to a safe state and push a [`Notice`] describing what happened; the front
//! end decides how to show it (snackbar, stderr, ...).

use std::fmt;

use tokio::sync::mpsc;
use tracing::Level;

/// How prominently a notice should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Level a notice is logged at: one below its severity, so notices
    /// never reach `ERROR` (and Sentry events).
    #[must_use]
    pub const fn log_level(self) -> Level {
        match self {
            Self::Info => Level::DEBUG,
            Self::Warning => Level::INFO,
            Self::Error => Level::WARN,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// Sending half of the notice channel.
///
/// Cheaply cloneable. Every notice is also logged. Sending never fails from
/// the caller's point of view: if nobody is listening the notice is only
/// logged.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: Option<mpsc::UnboundedSender<Notice>>,
}

impl Notifier {
    /// Create a notifier and the receiver the front end drains.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A notifier that only logs.
    #[must_use]
    pub const fn silent() -> Self {
        Self { tx: None }
    }

    /// Log one level below the notice severity, then deliver it.
    pub fn notify(&self, notice: Notice) {
        let level = notice.severity.log_level();
        if level == Level::WARN {
            tracing::warn!(message = %notice.message, "User notice");
        } else if level == Level::INFO {
            tracing::info!(message = %notice.message, "User notice");
        } else {
            tracing::debug!(message = %notice.message, "User notice");
        }

        if let Some(tx) = &self.tx
            && tx.send(notice).is_err()
        {
            tracing::debug!("Notice receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_display() {
        let notice = Notice::warning("Login to add an item to the Cart");
        assert_eq!(
            notice.to_string(),
            "[warning] Login to add an item to the Cart"
        );
    }

    #[test]
    fn test_notices_log_below_error() {
        assert_eq!(Severity::Error.log_level(), Level::WARN);
        assert_eq!(Severity::Warning.log_level(), Level::INFO);
        assert_eq!(Severity::Info.log_level(), Level::DEBUG);
    }

    #[test]
    fn test_channel_delivers_in_order() {
        let (notifier, mut rx) = Notifier::channel();
        notifier.notify(Notice::error("first"));
        notifier.notify(Notice::info("second"));

        assert_eq!(rx.try_recv().ok(), Some(Notice::error("first")));
        assert_eq!(rx.try_recv().ok(), Some(Notice::info("second")));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_receiver_does_not_panic() {
        let (notifier, rx) = Notifier::channel();
        drop(rx);
        notifier.notify(Notice::error("nobody listening"));
        Notifier::silent().notify(Notice::error("also fine"));
    }
}
