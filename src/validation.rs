//! Field validation for the contact form.
//!
//! Validation is pure: no network, no storage. The UI re-runs it on every
//! keystroke and on focus loss, and the controller runs it once more before
//! anything touches the network.

use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum trimmed length accepted for the message body.
pub const MESSAGE_MIN_LEN: usize = 10;
/// Maximum trimmed length accepted for the message body.
pub const MESSAGE_MAX_LEN: usize = 2000;

// One "@", at least one "." in the domain, no whitespace anywhere.
static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex must compile"));

/// Which form field a value belongs to. The message field carries extra
/// length rules; the email field carries the pattern rule.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum FieldKind {
    Name,
    Email,
    Message,
}

impl FieldKind {
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Name => "Name",
            FieldKind::Email => "Email",
            FieldKind::Message => "Message",
        }
    }
}

/// Result of validating a single field value.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ValidationResult {
    Valid,
    Invalid(String),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(msg) => Some(msg.as_str()),
        }
    }
}

/// A failed field paired with its message, as reported back from an
/// attempted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FieldKind,
    pub message: String,
}

/// Validate one field value. All three fields are required; the email and
/// message fields carry their extra rules only once non-empty, so an empty
/// value always reports "required" rather than a pattern or length error.
pub fn validate_field(kind: FieldKind, value: &str) -> ValidationResult {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return ValidationResult::Invalid("This field is required".to_string());
    }

    match kind {
        FieldKind::Email => {
            if !EMAIL_REGEX.is_match(trimmed) {
                return ValidationResult::Invalid(
                    "Please enter a valid email address".to_string(),
                );
            }
        }
        FieldKind::Message => {
            let len = trimmed.chars().count();
            if len < MESSAGE_MIN_LEN {
                return ValidationResult::Invalid(format!(
                    "Message should be at least {} characters",
                    MESSAGE_MIN_LEN
                ));
            }
            if len > MESSAGE_MAX_LEN {
                return ValidationResult::Invalid(format!(
                    "Message is too long (max {} characters)",
                    MESSAGE_MAX_LEN
                ));
            }
        }
        FieldKind::Name => {}
    }

    ValidationResult::Valid
}

/// Validate a whole form at once, returning every failure. An empty vec
/// means the form may be submitted.
pub fn validate_form(name: &str, email: &str, message: &str) -> Vec<FieldError> {
    let mut errors = Vec::new();

    for (kind, value) in [
        (FieldKind::Name, name),
        (FieldKind::Email, email),
        (FieldKind::Message, message),
    ] {
        if let ValidationResult::Invalid(msg) = validate_field(kind, value) {
            errors.push(FieldError {
                field: kind,
                message: msg,
            });
        }
    }

    errors
}
