use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A contact form submission as recorded in the local backup store and
/// posted to the form endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSubmission {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub submitted: bool,
}

impl FormSubmission {
    /// Build a new submission from raw field values. Values are trimmed
    /// here so the stored record and the posted payload always agree.
    /// The record starts unconfirmed; `submitted` is only flipped once the
    /// gateway reports delivery.
    pub fn new(name: &str, email: &str, message: &str) -> Self {
        FormSubmission {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            message: message.trim().to_string(),
            timestamp: Utc::now(),
            submitted: false,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Severity {
    Success,
    Error,
    Info,
    Warning,
}

/// A transient on-screen notice. The UI auto-dismisses these after
/// `TOAST_DURATION_MS`; Escape dismisses them early.
#[derive(Debug, Clone)]
pub struct ToastMessage {
    pub text: String,
    pub severity: Severity,
}

impl ToastMessage {
    pub fn new(text: &str, severity: Severity) -> Self {
        ToastMessage {
            text: text.to_string(),
            severity,
        }
    }
}

/// How long a toast stays on screen before auto-dismissal.
pub const TOAST_DURATION_MS: i64 = 5000;

/// Outcome of the startup pass over unconfirmed backup records.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryReport {
    pub attempted: usize,
    pub delivered: usize,
}
