//! Assignment verification.
//!
//! Checks an [`AssignmentSet`] against a roster and history and reports
//! every broken rule, not just the first. Sets produced by the search always
//! pass; the check exists for sets that come back from storage or from
//! another system.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constraint::{check_candidate, Candidate, Exclusion};
use crate::domain::{AssignmentSet, History, ParticipantId, Roster};

/// A single broken rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssignmentViolation {
    /// A giver who is not on the roster.
    UnknownGiver { giver: ParticipantId },
    /// A receiver who is not on the roster.
    UnknownReceiver { receiver: ParticipantId },
    /// Someone gives more than once.
    DuplicateGiver { giver: ParticipantId },
    /// Someone receives more than once.
    DuplicateReceiver { receiver: ParticipantId },
    /// A roster member gives to nobody.
    MissingGiver { giver: ParticipantId },
    /// A roster member receives from nobody.
    MissingReceiver { receiver: ParticipantId },
    SelfPairing { giver: ParticipantId },
    PartnerPairing {
        giver: ParticipantId,
        receiver: ParticipantId,
    },
    HistoricalRepeat {
        giver: ParticipantId,
        receiver: ParticipantId,
    },
}

/// The outcome of verifying a set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentVerdict {
    /// Violations found (empty when the set is valid).
    pub violations: Vec<AssignmentViolation>,
}

impl AssignmentVerdict {
    /// Whether the set satisfies every rule.
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Verify `set` against `roster` and `history`.
///
/// Unknown and duplicate people are listed first in pair order, then missing
/// people in roster order, then pairing rule breaks in pair order.
pub fn verify_assignment(
    roster: &Roster,
    history: &History,
    set: &AssignmentSet,
) -> AssignmentVerdict {
    let mut violations = Vec::new();
    let mut gives: HashMap<&ParticipantId, usize> = HashMap::new();
    let mut receives: HashMap<&ParticipantId, usize> = HashMap::new();

    for a in set {
        if !roster.contains(&a.giver_id) {
            violations.push(AssignmentViolation::UnknownGiver {
                giver: a.giver_id.clone(),
            });
        }
        if !roster.contains(&a.receiver_id) {
            violations.push(AssignmentViolation::UnknownReceiver {
                receiver: a.receiver_id.clone(),
            });
        }

        let g = gives.entry(&a.giver_id).or_insert(0);
        *g += 1;
        if *g == 2 {
            violations.push(AssignmentViolation::DuplicateGiver {
                giver: a.giver_id.clone(),
            });
        }
        let r = receives.entry(&a.receiver_id).or_insert(0);
        *r += 1;
        if *r == 2 {
            violations.push(AssignmentViolation::DuplicateReceiver {
                receiver: a.receiver_id.clone(),
            });
        }
    }

    for id in roster.ids() {
        if !gives.contains_key(id) {
            violations.push(AssignmentViolation::MissingGiver { giver: id.clone() });
        }
        if !receives.contains_key(id) {
            violations.push(AssignmentViolation::MissingReceiver {
                receiver: id.clone(),
            });
        }
    }

    for a in set {
        let candidate = Candidate::new(&a.giver_id, &a.receiver_id);
        let violation = match check_candidate(candidate, roster, history) {
            None => continue,
            Some(Exclusion::SelfPairing) => AssignmentViolation::SelfPairing {
                giver: a.giver_id.clone(),
            },
            Some(Exclusion::Partner) => AssignmentViolation::PartnerPairing {
                giver: a.giver_id.clone(),
                receiver: a.receiver_id.clone(),
            },
            Some(Exclusion::History) => AssignmentViolation::HistoricalRepeat {
                giver: a.giver_id.clone(),
                receiver: a.receiver_id.clone(),
            },
        };
        violations.push(violation);
    }

    AssignmentVerdict { violations }
}
