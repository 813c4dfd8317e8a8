//! The form controller: orchestrates validation, the backup store, and the
//! submission gateway for each submit attempt.
//!
//! One attempt walks Idle -> Validating -> Submitting -> Idle. The state is
//! shared between the UI task and the spawned submission task, so a second
//! submit arriving while one is in flight is turned away here regardless of
//! what the UI shows.

use log::{error, info, warn};
use std::sync::{Arc, Mutex};

use crate::gateway::SubmissionGateway;
use crate::models::{FormSubmission, RetryReport};
use crate::storage::BackupStore;
use crate::validation::{validate_form, FieldError};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FormState {
    Idle,
    Validating,
    Submitting,
}

/// The defined completion result of one submission attempt.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was written or sent.
    Rejected(Vec<FieldError>),
    /// A prior attempt is still in flight; nothing was written or sent.
    AlreadyInFlight,
    /// The gateway confirmed delivery and the backup record was flagged.
    Delivered(FormSubmission),
    /// The gateway could not confirm delivery; the backup record stays
    /// unconfirmed for the next startup retry pass.
    Failed {
        submission: FormSubmission,
        reason: String,
    },
}

pub struct FormController {
    gateway: Arc<dyn SubmissionGateway>,
    store: BackupStore,
    state: Mutex<FormState>,
}

impl FormController {
    pub fn new(gateway: Arc<dyn SubmissionGateway>, store: BackupStore) -> Self {
        FormController {
            gateway,
            store,
            state: Mutex::new(FormState::Idle),
        }
    }

    pub fn store(&self) -> &BackupStore {
        &self.store
    }

    pub fn state(&self) -> FormState {
        *self.state.lock().unwrap()
    }

    /// Run one submission attempt. Side effects are strictly ordered:
    /// validation first, then the backup append, then the network call,
    /// then the flag update.
    pub async fn submit(&self, name: &str, email: &str, message: &str) -> SubmitOutcome {
        // Claim the state machine for this attempt. The lock is released
        // before any I/O; `Submitting` itself is what keeps later attempts
        // out.
        {
            let mut state = self.state.lock().unwrap();
            if *state == FormState::Submitting {
                warn!("Submit requested while a submission is already in flight");
                return SubmitOutcome::AlreadyInFlight;
            }
            *state = FormState::Validating;

            let errors = validate_form(name, email, message);
            if !errors.is_empty() {
                info!("Submission rejected by validation ({} field(s))", errors.len());
                *state = FormState::Idle;
                return SubmitOutcome::Rejected(errors);
            }

            *state = FormState::Submitting;
        }

        let submission = FormSubmission::new(name, email, message);

        // Record intent before the wire. The backup is best-effort: a store
        // failure is logged but does not abort the attempt.
        if let Err(e) = self.store.append(&submission) {
            warn!("Could not back up submission {}: {}", submission.id, e);
        }

        let outcome = match self.gateway.submit(&submission).await {
            Ok(()) => {
                if let Err(e) = self.store.mark_submitted(&submission.id) {
                    warn!(
                        "Delivered submission {} but could not update its backup record: {}",
                        submission.id, e
                    );
                }
                info!("Submission {} delivered", submission.id);
                let mut delivered = submission;
                delivered.submitted = true;
                SubmitOutcome::Delivered(delivered)
            }
            Err(e) => {
                error!("Submission {} failed: {}", submission.id, e);
                SubmitOutcome::Failed {
                    submission,
                    reason: e.to_string(),
                }
            }
        };

        *self.state.lock().unwrap() = FormState::Idle;
        outcome
    }

    /// Re-send every unconfirmed backup record, flagging the ones that get
    /// through. Run once at startup, before the UI takes over.
    pub async fn retry_unconfirmed(&self) -> RetryReport {
        let unconfirmed = match self.store.list_unconfirmed() {
            Ok(records) => records,
            Err(e) => {
                error!("Could not read backup store for retry: {}", e);
                return RetryReport::default();
            }
        };

        if unconfirmed.is_empty() {
            return RetryReport::default();
        }

        info!("Found {} unconfirmed submission(s) to retry", unconfirmed.len());

        let mut report = RetryReport {
            attempted: unconfirmed.len(),
            delivered: 0,
        };

        for submission in unconfirmed {
            match self.gateway.submit(&submission).await {
                Ok(()) => {
                    if let Err(e) = self.store.mark_submitted(&submission.id) {
                        warn!(
                            "Retried submission {} delivered but not flagged: {}",
                            submission.id, e
                        );
                    }
                    info!("Retried submission {} delivered", submission.id);
                    report.delivered += 1;
                }
                Err(e) => {
                    // Leave the record unconfirmed; the next start tries again.
                    warn!("Retry of submission {} failed: {}", submission.id, e);
                }
            }
        }

        report
    }
}
