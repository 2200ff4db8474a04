// src/alerts.rs
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Info,
    Success,
    Error,
}

/// A user-visible notification surfaced by the bridge. Rendering is up to
/// whoever drains the channel; the bridge only decides when one is owed.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub header: String,
    pub message: String,
    pub level: AlertLevel,
    pub more_info_url: Option<String>,
}

/// Sending half of the alert channel, cheap to clone into the bridge
#[derive(Clone)]
pub struct AlertSink {
    tx: mpsc::UnboundedSender<Alert>,
}

impl AlertSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Alert>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn push(&self, alert: Alert) {
        // A dropped receiver only means nobody is rendering alerts
        let _ = self.tx.send(alert);
    }

    pub fn info(&self, header: &str, message: String) {
        self.push(Alert {
            header: header.to_string(),
            message,
            level: AlertLevel::Info,
            more_info_url: None,
        });
    }

    pub fn success(&self, header: &str, message: String, more_info_url: Option<String>) {
        self.push(Alert {
            header: header.to_string(),
            message,
            level: AlertLevel::Success,
            more_info_url,
        });
    }

    pub fn error(&self, header: &str, message: String) {
        self.push(Alert {
            header: header.to_string(),
            message,
            level: AlertLevel::Error,
            more_info_url: None,
        });
    }
}
