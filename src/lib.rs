// Shared modules, re-exported for the binary and the integration tests
pub mod controller;
pub mod gateway;
pub mod models;
pub mod storage;
pub mod theme;
pub mod validation;

// Re-export the main types for convenience
pub use controller::{FormController, FormState, SubmitOutcome};
pub use gateway::{FormEndpoint, HttpGateway, SubmissionGateway};
pub use models::*;
pub use storage::BackupStore;
pub use theme::{Theme, ThemeManager};
