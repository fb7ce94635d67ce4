//! Giftswap Core Library
//!
//! Gift-exchange assignment engine: draws a random giver -> receiver
//! assignment for a cohort so nobody draws themselves, their partner, or
//! anyone they drew inside the lookback window.

pub mod constraint;
pub mod domain;
pub mod exchange;
pub mod metrics;
pub mod obs;
pub mod random;
pub mod retry;
pub mod search;
pub mod telemetry;
pub mod verify;

pub use constraint::{check_candidate, is_valid, Candidate, Exclusion};

pub use domain::{
    Assignment, AssignmentSet, ExchangeError, HistoricalPair, History, InputError,
    LookbackWindow, Participant, ParticipantId, Result, Roster,
};

pub use exchange::{
    CoordinatorConfig, CoordinatorError, CoordinatorResult, ExchangeCoordinator, RelaunchMode,
    RelaunchPolicy,
};
pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use retry::{retry_bounded, Exhausted};
pub use search::{generate, search, GiverOrder, SearchConfig, DEFAULT_MAX_ATTEMPTS};
pub use telemetry::{init_tracing, LogFormat};
pub use verify::{verify_assignment, AssignmentVerdict, AssignmentViolation};

pub use giftswap_state::{CohortId, DrawRecord, Period};

/// Giftswap version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
