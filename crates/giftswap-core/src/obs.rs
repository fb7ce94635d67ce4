//! Structured observability hooks for the draw lifecycle.
//!
//! This module provides:
//! - A draw-scoped tracing span for coordinator operations
//! - Emission functions for start, aborted attempt, success, exhaustion,
//!   rejection, and the coordinator's persistence steps
//!
//! Events carry an `event` field so log pipelines can filter on it.

use tracing::{debug, info, warn};

/// Span covering one coordinator operation on a (cohort, period) key.
///
/// Coordinator futures are wrapped with `Instrument::instrument`, so every
/// event emitted while they run, including the search's own, carries
/// `cohort` and `period`.
pub fn draw_span(op: &'static str, cohort: &str, period: i32) -> tracing::Span {
    tracing::info_span!("giftswap.draw", op = op, cohort = %cohort, period = period)
}

/// Emit event: search started over a validated roster.
pub fn emit_draw_started(participants: usize, history_pairs: usize, max_attempts: u32) {
    info!(
        event = "draw.started",
        participants = participants,
        history_pairs = history_pairs,
        max_attempts = max_attempts,
    );
}

/// Emit event: one attempt stopped at a giver with no legal receiver.
pub fn emit_attempt_aborted(attempt: u32, giver: &str, assigned: usize) {
    debug!(
        event = "draw.attempt_aborted",
        attempt = attempt,
        giver = %giver,
        assigned = assigned,
    );
}

/// Emit event: a complete assignment was found.
pub fn emit_draw_succeeded(attempts: u32, pairs: usize) {
    info!(event = "draw.succeeded", attempts = attempts, pairs = pairs);
}

/// Emit event: the attempt budget ran out (warning level).
pub fn emit_draw_exhausted(attempts: u32) {
    warn!(event = "draw.exhausted", attempts = attempts);
}

/// Emit event: input refused before searching (warning level).
pub fn emit_draw_rejected(error: &dyn std::fmt::Display) {
    warn!(event = "draw.rejected", error = %error);
}

/// Emit event: a draw was written to the store.
pub fn emit_draw_persisted(cohort: &str, period: i32, draw_id: &str, replaced: bool) {
    info!(
        event = "draw.persisted",
        cohort = %cohort,
        period = period,
        draw_id = %draw_id,
        replaced = replaced,
    );
}

/// Emit event: a stored draw was removed.
pub fn emit_draw_cancelled(cohort: &str, period: i32, draw_id: &str) {
    info!(
        event = "draw.cancelled",
        cohort = %cohort,
        period = period,
        draw_id = %draw_id,
    );
}

/// Emit event: a relaunch failed and left the existing draw in place.
pub fn emit_relaunch_kept_previous(cohort: &str, period: i32, error: &dyn std::fmt::Display) {
    warn!(
        event = "draw.relaunch_kept_previous",
        cohort = %cohort,
        period = period,
        error = %error,
    );
}
