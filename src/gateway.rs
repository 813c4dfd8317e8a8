//! The submission gateway: one outbound POST per submission attempt.
//!
//! The form collector accepts a multipart payload keyed by opaque
//! entry identifiers and returns a normal HTTP status, so delivery is
//! observable: 2xx means the collector accepted the payload, anything else
//! is a rejection. Transport failures and timeouts are reported separately
//! so the caller can tell "never sent" from "sent and refused".

use async_trait::async_trait;
use log::{debug, info};
use reqwest::multipart::Form;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

use crate::models::FormSubmission;

/// Default form-collection endpoint.
pub const DEFAULT_ENDPOINT_URL: &str =
    "https://docs.google.com/forms/d/e/1FAIpQLSf55xYmSfIEV8j7UlQW7nonnFFWiqums872umPQjzE1K5VsOQ/formResponse";

/// Default bound on a single submission attempt, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("form endpoint rejected the submission with status {0}")]
    Rejected(StatusCode),

    #[error("submission timed out after {0} seconds")]
    Timeout(u64),
}

/// Anything that can deliver a submission. The controller only ever talks
/// to this trait; tests inject their own implementation.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    async fn submit(&self, submission: &FormSubmission) -> Result<(), GatewayError>;
}

/// Where the POST goes and which opaque identifier carries each field.
#[derive(Debug, Clone)]
pub struct FormEndpoint {
    pub url: String,
    pub name_field: String,
    pub email_field: String,
    pub message_field: String,
    pub timestamp_field: String,
}

impl Default for FormEndpoint {
    fn default() -> Self {
        FormEndpoint {
            url: DEFAULT_ENDPOINT_URL.to_string(),
            name_field: "entry.1932833535".to_string(),
            email_field: "entry.434297466".to_string(),
            message_field: "entry.140618251".to_string(),
            timestamp_field: "entry.000000000".to_string(),
        }
    }
}

impl FormEndpoint {
    /// The default field mapping pointed at a different URL.
    pub fn with_url(url: &str) -> Self {
        FormEndpoint {
            url: url.to_string(),
            ..FormEndpoint::default()
        }
    }

    /// Map a submission onto (field identifier, value) pairs. Kept separate
    /// from the multipart builder so the mapping can be checked without a
    /// network.
    pub fn payload_fields(&self, submission: &FormSubmission) -> Vec<(String, String)> {
        vec![
            (self.name_field.clone(), submission.name.clone()),
            (self.email_field.clone(), submission.email.clone()),
            (self.message_field.clone(), submission.message.clone()),
            (
                self.timestamp_field.clone(),
                submission.timestamp.to_rfc3339(),
            ),
        ]
    }
}

/// Gateway that performs a real HTTP POST.
pub struct HttpGateway {
    client: reqwest::Client,
    endpoint: FormEndpoint,
    timeout_secs: u64,
}

impl HttpGateway {
    pub fn new(endpoint: FormEndpoint, timeout_secs: u64) -> Self {
        HttpGateway {
            client: reqwest::Client::new(),
            endpoint,
            timeout_secs,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(FormEndpoint::default(), DEFAULT_TIMEOUT_SECS)
    }

    fn build_form(&self, submission: &FormSubmission) -> Form {
        let mut form = Form::new();
        for (field, value) in self.endpoint.payload_fields(submission) {
            form = form.text(field, value);
        }
        form
    }
}

#[async_trait]
impl SubmissionGateway for HttpGateway {
    async fn submit(&self, submission: &FormSubmission) -> Result<(), GatewayError> {
        debug!(
            "Posting submission {} to {}",
            submission.id, self.endpoint.url
        );

        let request = self
            .client
            .post(&self.endpoint.url)
            .multipart(self.build_form(submission))
            .send();

        // A hung connection must not pin the attempt forever.
        let response = match tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            request,
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(GatewayError::Timeout(self.timeout_secs)),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Rejected(status));
        }

        // The collector's response body carries nothing useful; a 2xx is
        // the whole delivery signal.
        info!("Submission {} accepted with status {}", submission.id, status);
        Ok(())
    }
}
