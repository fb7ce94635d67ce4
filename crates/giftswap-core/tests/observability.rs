//! Observability tests for the draw lifecycle.
//!
//! These check that the emit helpers, the draw span, and the metrics flush
//! land in the captured logs with their `event` names and key fields.

use giftswap_core::metrics::METRICS;
use giftswap_core::obs::{
    draw_span, emit_attempt_aborted, emit_draw_cancelled, emit_draw_exhausted,
    emit_draw_persisted, emit_draw_rejected, emit_draw_started, emit_draw_succeeded,
    emit_relaunch_kept_previous,
};
use giftswap_core::{ExchangeError, InputError};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn test_search_events_emit() {
    emit_draw_started(4, 2, 100);
    emit_attempt_aborted(1, "dan", 3);
    emit_draw_succeeded(2, 4);
    emit_draw_exhausted(100);

    assert!(logs_contain("draw.started"));
    assert!(logs_contain("max_attempts=100"));
    assert!(logs_contain("draw.attempt_aborted"));
    assert!(logs_contain("giver=dan"));
    assert!(logs_contain("draw.succeeded"));
    assert!(logs_contain("draw.exhausted"));
}

#[traced_test]
#[test]
fn test_rejection_takes_any_error() {
    let err = ExchangeError::from(InputError::TooFewParticipants { count: 1 });
    emit_draw_rejected(&err);

    assert!(logs_contain("draw.rejected"));
    assert!(logs_contain(&err.to_string()));
}

#[traced_test]
#[test]
fn test_persistence_events_emit() {
    emit_draw_persisted("family", 2025, "d-1", false);
    emit_draw_persisted("family", 2025, "d-2", true);
    emit_draw_cancelled("family", 2025, "d-2");
    emit_relaunch_kept_previous("family", 2025, &"no valid assignment found after 5 attempts");

    assert!(logs_contain("draw.persisted"));
    assert!(logs_contain("draw_id=d-1"));
    assert!(logs_contain("replaced=false"));
    assert!(logs_contain("replaced=true"));
    assert!(logs_contain("draw.cancelled"));
    assert!(logs_contain("draw.relaunch_kept_previous"));
    assert!(logs_contain("after 5 attempts"));
}

#[traced_test]
#[test]
fn test_events_inside_draw_span() {
    let span = draw_span("launch", "family", 2025);
    let _guard = span.enter();
    emit_draw_started(3, 0, 10);
    emit_draw_succeeded(1, 3);

    assert!(logs_contain("giftswap.draw"));
    assert!(logs_contain("cohort=family"));
    assert!(logs_contain("period=2025"));
    assert!(logs_contain("draw.succeeded"));
}

#[traced_test]
#[test]
fn test_metrics_flush() {
    METRICS.inc_draws_started();
    METRICS.inc_draws_succeeded();
    METRICS.flush();

    assert!(METRICS.draws_started() >= 1);
    assert!(logs_contain("metric=\"flush\""));
    assert!(logs_contain("draws_started="));
}
