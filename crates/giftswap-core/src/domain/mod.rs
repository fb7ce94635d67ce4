//! Domain models for giftswap.
//!
//! Canonical definitions for the core entities:
//! - `Participant` / `Roster`: who takes part and whom they must not draw
//! - `HistoricalPair` / `History`: past pairings that must not repeat
//! - `AssignmentSet`: a complete draw

pub mod assignment;
pub mod error;
pub mod history;
pub mod participant;

// Re-export main types and errors
pub use assignment::{Assignment, AssignmentSet};
pub use error::{ExchangeError, InputError, Result};
pub use history::{HistoricalPair, History, LookbackWindow};
pub use participant::{Participant, ParticipantId, Roster};
