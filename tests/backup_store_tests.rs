// Tests for the local backup store: append, unconfirmed listing, and the
// submitted-flag update, all against temporary directories.

use outreach::models::FormSubmission;
use outreach::storage::BackupStore;
use tempfile::tempdir;

fn sample(n: usize) -> FormSubmission {
    FormSubmission::new(
        &format!("Sender {}", n),
        &format!("sender{}@example.com", n),
        "Hello, I would like to connect.",
    )
}

#[test]
fn test_missing_file_is_empty_store() {
    let dir = tempdir().unwrap();
    let store = BackupStore::in_dir(&dir.path().to_path_buf()).unwrap();

    assert!(store.load_all().unwrap().is_empty());
    assert!(store.list_unconfirmed().unwrap().is_empty());
}

#[test]
fn test_append_grows_the_sequence_in_order() {
    let dir = tempdir().unwrap();
    let store = BackupStore::in_dir(&dir.path().to_path_buf()).unwrap();

    let n = 5;
    let mut ids = Vec::new();
    for i in 0..n {
        let submission = sample(i);
        ids.push(submission.id.clone());
        store.append(&submission).unwrap();
    }

    let stored = store.load_all().unwrap();
    assert_eq!(stored.len(), n);

    // Order of appends is preserved and every record starts unconfirmed
    for (i, record) in stored.iter().enumerate() {
        assert_eq!(record.id, ids[i]);
        assert!(!record.submitted);
    }
}

#[test]
fn test_store_survives_reopening() {
    let dir = tempdir().unwrap();
    let path = dir.path().to_path_buf();

    {
        let store = BackupStore::in_dir(&path).unwrap();
        store.append(&sample(0)).unwrap();
    }

    // A second handle over the same directory sees the same sequence
    let reopened = BackupStore::in_dir(&path).unwrap();
    let stored = reopened.load_all().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Sender 0");
    assert_eq!(
        stored[0].timestamp.to_rfc3339(),
        stored[0].timestamp.to_rfc3339()
    );
}

#[test]
fn test_mark_submitted_flips_only_the_target() {
    let dir = tempdir().unwrap();
    let store = BackupStore::in_dir(&dir.path().to_path_buf()).unwrap();

    let first = sample(0);
    let second = sample(1);
    store.append(&first).unwrap();
    store.append(&second).unwrap();

    assert!(store.mark_submitted(&first.id).unwrap());

    let stored = store.load_all().unwrap();
    assert!(stored.iter().find(|s| s.id == first.id).unwrap().submitted);
    assert!(!stored.iter().find(|s| s.id == second.id).unwrap().submitted);

    let unconfirmed = store.list_unconfirmed().unwrap();
    assert_eq!(unconfirmed.len(), 1);
    assert_eq!(unconfirmed[0].id, second.id);
}

#[test]
fn test_mark_submitted_unknown_id_reports_not_found() {
    let dir = tempdir().unwrap();
    let store = BackupStore::in_dir(&dir.path().to_path_buf()).unwrap();

    store.append(&sample(0)).unwrap();
    assert!(!store.mark_submitted("no-such-id").unwrap());

    // Nothing changed
    assert_eq!(store.list_unconfirmed().unwrap().len(), 1);
}

#[test]
fn test_corrupt_file_is_an_error_not_a_panic() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("submissions.json");
    std::fs::write(&path, "this is not json").unwrap();

    let store = BackupStore::new(Some(path)).unwrap();
    assert!(store.load_all().is_err());
}

#[test]
fn test_records_round_trip_through_json() {
    let dir = tempdir().unwrap();
    let store = BackupStore::in_dir(&dir.path().to_path_buf()).unwrap();

    let original = FormSubmission::new(
        "Jane Doe",
        "jane@example.com",
        "Hello, I would like to connect.",
    );
    store.append(&original).unwrap();

    let stored = &store.load_all().unwrap()[0];
    assert_eq!(stored.id, original.id);
    assert_eq!(stored.name, original.name);
    assert_eq!(stored.email, original.email);
    assert_eq!(stored.message, original.message);
    assert_eq!(stored.timestamp, original.timestamp);
    assert!(!stored.submitted);
}
