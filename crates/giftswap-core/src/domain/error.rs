//! Domain-level error taxonomy for giftswap.

use crate::retry::Exhausted;

/// Problems with the input that no number of attempts could fix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("at least 2 participants are required, got {count}")]
    TooFewParticipants { count: usize },

    #[error("participant {id} lists itself as its own partner")]
    SelfPartner { id: String },

    #[error("participant {id} appears more than once")]
    DuplicateParticipant { id: String },

    #[error("attempt budget must be at least 1")]
    ZeroAttemptBudget,
}

/// Assignment engine errors.
///
/// Both variants are expected outcomes: `InvalidInput` means the cohort has
/// to change (more people, fixed partner links), `Exhausted` means no draw
/// was found this time and a retry or a shorter lookback window may help.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("no valid assignment found after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

impl ExchangeError {
    /// Whether running the same draw again could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExchangeError::Exhausted { .. })
    }
}

impl From<Exhausted> for ExchangeError {
    fn from(e: Exhausted) -> Self {
        ExchangeError::Exhausted {
            attempts: e.attempts,
        }
    }
}

/// Result type for assignment engine operations.
pub type Result<T> = std::result::Result<T, ExchangeError>;
