// Tests for the form controller state machine: validation gating, the
// single-POST guarantee, the in-flight guard, and the startup retry pass.
// The gateway is a counting mock so no test touches a network.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

use outreach::controller::{FormController, FormState, SubmitOutcome};
use outreach::gateway::{GatewayError, SubmissionGateway};
use outreach::models::FormSubmission;
use outreach::storage::BackupStore;
use outreach::validation::FieldKind;

/// Gateway double that counts calls and can be told to fail or stall.
struct MockGateway {
    calls: AtomicUsize,
    failing: AtomicBool,
    delay: Duration,
}

impl MockGateway {
    fn new() -> Self {
        MockGateway {
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            delay: Duration::from_millis(0),
        }
    }

    fn with_delay(delay: Duration) -> Self {
        MockGateway {
            delay,
            ..Self::new()
        }
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubmissionGateway for MockGateway {
    async fn submit(&self, _submission: &FormSubmission) -> Result<(), GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            Err(GatewayError::Timeout(1))
        } else {
            Ok(())
        }
    }
}

fn controller_with(gateway: Arc<MockGateway>, dir: &tempfile::TempDir) -> FormController {
    let store = BackupStore::in_dir(&dir.path().to_path_buf()).unwrap();
    FormController::new(gateway, store)
}

#[tokio::test]
async fn test_valid_submission_is_delivered_once() {
    let dir = tempdir().unwrap();
    let gateway = Arc::new(MockGateway::new());
    let controller = controller_with(Arc::clone(&gateway), &dir);

    let outcome = controller
        .submit(
            "Jane Doe",
            "jane@example.com",
            "Hello, I would like to connect.",
        )
        .await;

    // Exactly one POST, one delivered outcome
    assert_eq!(gateway.call_count(), 1);
    let SubmitOutcome::Delivered(submission) = outcome else {
        panic!("expected Delivered, got {:?}", outcome);
    };
    assert_eq!(submission.name, "Jane Doe");
    assert!(submission.submitted);

    // The backup record exists and was flagged
    let stored = controller.store().load_all().unwrap();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].submitted);
    assert_eq!(stored[0].id, submission.id);

    // And the machine is back in Idle
    assert_eq!(controller.state(), FormState::Idle);
}

#[tokio::test]
async fn test_invalid_email_never_reaches_the_network() {
    let dir = tempdir().unwrap();
    let gateway = Arc::new(MockGateway::new());
    let controller = controller_with(Arc::clone(&gateway), &dir);

    let outcome = controller
        .submit("Jane Doe", "not-an-email", "Hello, I would like to connect.")
        .await;

    let SubmitOutcome::Rejected(errors) = outcome else {
        panic!("expected Rejected, got {:?}", outcome);
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, FieldKind::Email);

    // No POST, no backup write
    assert_eq!(gateway.call_count(), 0);
    assert!(controller.store().load_all().unwrap().is_empty());
}

#[tokio::test]
async fn test_validation_failure_reports_all_fields() {
    let dir = tempdir().unwrap();
    let gateway = Arc::new(MockGateway::new());
    let controller = controller_with(Arc::clone(&gateway), &dir);

    let outcome = controller.submit("", "a@b", "short").await;

    let SubmitOutcome::Rejected(errors) = outcome else {
        panic!("expected Rejected, got {:?}", outcome);
    };
    assert_eq!(errors.len(), 3);
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_second_submit_is_turned_away_while_in_flight() {
    let dir = tempdir().unwrap();
    let gateway = Arc::new(MockGateway::with_delay(Duration::from_millis(200)));
    let controller = Arc::new(controller_with(Arc::clone(&gateway), &dir));

    let first = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            controller
                .submit(
                    "Jane Doe",
                    "jane@example.com",
                    "Hello, I would like to connect.",
                )
                .await
        })
    };

    // Give the first attempt time to reach the gateway
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(controller.state(), FormState::Submitting);

    let second = controller
        .submit(
            "Jane Doe",
            "jane@example.com",
            "Hello, I would like to connect.",
        )
        .await;
    assert!(matches!(second, SubmitOutcome::AlreadyInFlight));

    let first = first.await.unwrap();
    assert!(matches!(first, SubmitOutcome::Delivered(_)));

    // Only the first attempt produced a POST and a backup record
    assert_eq!(gateway.call_count(), 1);
    assert_eq!(controller.store().load_all().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_submission_keeps_record_unconfirmed() {
    let dir = tempdir().unwrap();
    let gateway = Arc::new(MockGateway::new());
    gateway.set_failing(true);
    let controller = controller_with(Arc::clone(&gateway), &dir);

    let outcome = controller
        .submit(
            "Jane Doe",
            "jane@example.com",
            "Hello, I would like to connect.",
        )
        .await;

    let SubmitOutcome::Failed { submission, reason } = outcome else {
        panic!("expected Failed, got {:?}", outcome);
    };
    assert!(!submission.submitted);
    assert!(!reason.is_empty());

    // The record of intent was written before the wire and stays unconfirmed
    let unconfirmed = controller.store().list_unconfirmed().unwrap();
    assert_eq!(unconfirmed.len(), 1);
    assert_eq!(unconfirmed[0].id, submission.id);

    // The controller is usable again straight away
    assert_eq!(controller.state(), FormState::Idle);
}

#[tokio::test]
async fn test_retry_pass_delivers_unconfirmed_records() {
    let dir = tempdir().unwrap();
    let gateway = Arc::new(MockGateway::new());
    gateway.set_failing(true);
    let controller = controller_with(Arc::clone(&gateway), &dir);

    // Two attempts fail and stay on file
    for _ in 0..2 {
        let outcome = controller
            .submit(
                "Jane Doe",
                "jane@example.com",
                "Hello, I would like to connect.",
            )
            .await;
        assert!(matches!(outcome, SubmitOutcome::Failed { .. }));
    }
    assert_eq!(controller.store().list_unconfirmed().unwrap().len(), 2);

    // The endpoint comes back; the next startup pass clears the backlog
    gateway.set_failing(false);
    let report = controller.retry_unconfirmed().await;

    assert_eq!(report.attempted, 2);
    assert_eq!(report.delivered, 2);
    assert!(controller.store().list_unconfirmed().unwrap().is_empty());

    // Two failed posts plus two retries
    assert_eq!(gateway.call_count(), 4);
}

#[tokio::test]
async fn test_retry_pass_with_empty_store_does_nothing() {
    let dir = tempdir().unwrap();
    let gateway = Arc::new(MockGateway::new());
    let controller = controller_with(Arc::clone(&gateway), &dir);

    let report = controller.retry_unconfirmed().await;

    assert_eq!(report.attempted, 0);
    assert_eq!(report.delivered, 0);
    assert_eq!(gateway.call_count(), 0);
}

#[tokio::test]
async fn test_retry_pass_leaves_still_failing_records_for_next_time() {
    let dir = tempdir().unwrap();
    let gateway = Arc::new(MockGateway::new());
    gateway.set_failing(true);
    let controller = controller_with(Arc::clone(&gateway), &dir);

    let outcome = controller
        .submit(
            "Jane Doe",
            "jane@example.com",
            "Hello, I would like to connect.",
        )
        .await;
    assert!(matches!(outcome, SubmitOutcome::Failed { .. }));

    // Endpoint still down during the retry pass
    let report = controller.retry_unconfirmed().await;
    assert_eq!(report.attempted, 1);
    assert_eq!(report.delivered, 0);

    // The record survives for the session after this one
    assert_eq!(controller.store().list_unconfirmed().unwrap().len(), 1);
}

#[tokio::test]
async fn test_values_are_trimmed_before_posting() {
    let dir = tempdir().unwrap();
    let gateway = Arc::new(MockGateway::new());
    let controller = controller_with(Arc::clone(&gateway), &dir);

    let outcome = controller
        .submit(
            "  Jane Doe  ",
            "  jane@example.com ",
            "  Hello, I would like to connect.  ",
        )
        .await;

    let SubmitOutcome::Delivered(submission) = outcome else {
        panic!("expected Delivered, got {:?}", outcome);
    };
    assert_eq!(submission.name, "Jane Doe");
    assert_eq!(submission.email, "jane@example.com");
    assert_eq!(submission.message, "Hello, I would like to connect.");
}
