//! Local backup store for form submissions.
//!
//! Every submission attempt is appended here before the network call, so a
//! record of intent survives a failed or unconfirmed delivery. The store is
//! a single JSON file holding the whole sequence; each operation is a
//! read-modify-write of that file. Two instances of the app can still race
//! each other on the file — that lost-update window is a known limit, the
//! in-process path is serialized by the controller.

use log::{info, warn};
use std::fs::{self, File};
use std::path::PathBuf;
use thiserror::Error;

use crate::models::FormSubmission;

const BACKUP_FILE_NAME: &str = "submissions.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("could not determine a data directory for the backup store")]
    NoDataDir,

    #[error("backup store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("backup store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Durable, append-only log of submissions.
pub struct BackupStore {
    path: PathBuf,
}

impl BackupStore {
    /// Open a store at an explicit path, or at the platform default
    /// (`<data dir>/outreach/submissions.json`) when none is given.
    pub fn new(path: Option<PathBuf>) -> Result<Self, StoreError> {
        let path = match path {
            Some(p) => p,
            None => {
                let mut dir = dirs::data_dir().ok_or(StoreError::NoDataDir)?;
                dir.push("outreach");
                fs::create_dir_all(&dir)?;
                dir.push(BACKUP_FILE_NAME);
                dir
            }
        };

        Ok(BackupStore { path })
    }

    /// Open a store rooted in the given directory.
    pub fn in_dir(dir: &PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(dir)?;
        Self::new(Some(dir.join(BACKUP_FILE_NAME)))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// The full stored sequence. A missing file is an empty sequence; a
    /// file that no longer parses is an error for the caller to surface.
    pub fn load_all(&self) -> Result<Vec<FormSubmission>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        let submissions: Vec<FormSubmission> = serde_json::from_str(&contents)?;
        Ok(submissions)
    }

    /// Append one record and rewrite the sequence.
    pub fn append(&self, submission: &FormSubmission) -> Result<(), StoreError> {
        let mut submissions = self.load_all()?;
        submissions.push(submission.clone());
        self.write_all(&submissions)?;

        info!(
            "Backed up submission {} ({} records on file)",
            submission.id,
            submissions.len()
        );
        Ok(())
    }

    /// Records whose delivery was never observed.
    pub fn list_unconfirmed(&self) -> Result<Vec<FormSubmission>, StoreError> {
        let submissions = self.load_all()?;
        Ok(submissions.into_iter().filter(|s| !s.submitted).collect())
    }

    /// Flip one record's `submitted` flag. Returns false when no record
    /// carries the given id, which callers treat as a warning, not a fault.
    pub fn mark_submitted(&self, id: &str) -> Result<bool, StoreError> {
        let mut submissions = self.load_all()?;

        let Some(record) = submissions.iter_mut().find(|s| s.id == id) else {
            warn!("No backup record with id {} to mark submitted", id);
            return Ok(false);
        };
        record.submitted = true;

        self.write_all(&submissions)?;
        Ok(true)
    }

    fn write_all(&self, submissions: &[FormSubmission]) -> Result<(), StoreError> {
        let file = File::create(&self.path)?;
        serde_json::to_writer_pretty(file, submissions)?;
        Ok(())
    }
}
