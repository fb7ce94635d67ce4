//! Giftswap-State: storage contracts for the gift-exchange engine
//!
//! The assignment engine itself never touches storage. Everything it needs
//! (who is in a cohort, which pairings happened before, where a finished draw
//! goes) is reached through the traits defined here.
//!
//! ## Key Components
//!
//! - `RosterProvider`: resolves a cohort's participants and partner links
//! - `HistoryProvider`: resolves past (giver, receiver) pairs since a cutoff
//! - `AssignmentStore`: persists one draw per (cohort, period), atomically
//! - `fakes`: in-memory implementations for tests
//! - `JsonFileStore`: single-document JSON backend used by the CLI

mod error;
pub mod fakes;
mod json_store;
pub mod storage_traits;

pub use error::StorageError;
pub use json_store::JsonFileStore;
pub use storage_traits::{
    AssignmentStore, CohortId, DrawRecord, HistoryEntry, HistoryProvider, PairRecord,
    ParticipantRecord, Period, RosterProvider, StorageResult,
};
