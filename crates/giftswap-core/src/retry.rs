//! Bounded retry combinator.

use tracing::trace;

/// Every attempt came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("gave up after {attempts} attempts")]
pub struct Exhausted {
    pub attempts: u32,
}

/// Call `attempt` with `1..=max_attempts` until it yields `Some`.
///
/// Returns the first value produced, or [`Exhausted`] once the budget is
/// spent. With `max_attempts == 0` the closure is never called.
pub fn retry_bounded<T, F>(max_attempts: u32, mut attempt: F) -> Result<T, Exhausted>
where
    F: FnMut(u32) -> Option<T>,
{
    for n in 1..=max_attempts {
        if let Some(value) = attempt(n) {
            return Ok(value);
        }
        trace!(attempt = n, max_attempts, "attempt came back empty");
    }
    Err(Exhausted {
        attempts: max_attempts,
    })
}
