//! Error types for giftswap-state

use thiserror::Error;

/// Errors raised by roster, history and draw storage backends.
#[derive(Error, Debug)]
pub enum StorageError {
    /// No roster is known for the cohort
    #[error("Cohort not found: {cohort_id}")]
    CohortNotFound { cohort_id: String },

    /// A draw already exists for the (cohort, period) key
    #[error("Draw already stored for cohort {cohort_id}, period {period}")]
    Conflict { cohort_id: String, period: i32 },

    /// No draw exists for the (cohort, period) key
    #[error("No draw stored for cohort {cohort_id}, period {period}")]
    DrawNotFound { cohort_id: String, period: i32 },

    /// Filesystem error from a file-backed store
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Document could not be encoded or decoded
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
