//! Pairing rules.
//!
//! A candidate pair is legal unless the giver would draw themselves, their
//! partner, or someone they already drew inside the lookback window. The
//! checks are pure; roster and history arrive already loaded and filtered.

use serde::{Deserialize, Serialize};

use crate::domain::{History, ParticipantId, Roster};

/// A (giver, receiver) pair under evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub giver: &'a ParticipantId,
    pub receiver: &'a ParticipantId,
}

impl<'a> Candidate<'a> {
    pub fn new(giver: &'a ParticipantId, receiver: &'a ParticipantId) -> Self {
        Self { giver, receiver }
    }
}

/// Why a candidate pair is not allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exclusion {
    SelfPairing,
    Partner,
    History,
}

/// First rule `candidate` breaks, or `None` when it is legal.
///
/// Rules are checked in order: self-pairing, partner, history.
pub fn check_candidate(
    candidate: Candidate<'_>,
    roster: &Roster,
    history: &History,
) -> Option<Exclusion> {
    if candidate.giver == candidate.receiver {
        return Some(Exclusion::SelfPairing);
    }
    if roster.partner_of(candidate.giver) == Some(candidate.receiver) {
        return Some(Exclusion::Partner);
    }
    if history.contains(candidate.giver, candidate.receiver) {
        return Some(Exclusion::History);
    }
    None
}

/// Whether `candidate` may be part of a draw.
pub fn is_valid(candidate: Candidate<'_>, roster: &Roster, history: &History) -> bool {
    check_candidate(candidate, roster, history).is_none()
}
