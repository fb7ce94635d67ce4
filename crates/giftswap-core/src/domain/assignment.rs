//! The output of a draw: who gives to whom.

use chrono::{DateTime, Utc};
use giftswap_state::PairRecord;
use serde::{Deserialize, Serialize};

use super::history::HistoricalPair;
use super::participant::ParticipantId;

/// One giver -> receiver pairing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    pub giver_id: ParticipantId,
    pub receiver_id: ParticipantId,
}

impl Assignment {
    pub fn new(giver_id: impl Into<ParticipantId>, receiver_id: impl Into<ParticipantId>) -> Self {
        Self {
            giver_id: giver_id.into(),
            receiver_id: receiver_id.into(),
        }
    }
}

impl From<PairRecord> for Assignment {
    fn from(record: PairRecord) -> Self {
        Self::new(record.giver_id, record.receiver_id)
    }
}

impl From<&Assignment> for PairRecord {
    fn from(a: &Assignment) -> Self {
        PairRecord {
            giver_id: a.giver_id.0.clone(),
            receiver_id: a.receiver_id.0.clone(),
        }
    }
}

/// A complete draw.
///
/// When produced by the search, the pairs form a permutation of the roster
/// with no fixed point and no excluded pairing, listed in the order givers
/// were processed. Sets rebuilt from storage carry no such guarantee until
/// checked with [`crate::verify_assignment`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentSet {
    pairs: Vec<Assignment>,
}

impl AssignmentSet {
    /// Wrap pairs without checking them.
    pub fn from_pairs(pairs: Vec<Assignment>) -> Self {
        Self { pairs }
    }

    pub fn pairs(&self) -> &[Assignment] {
        &self.pairs
    }

    pub fn into_pairs(self) -> Vec<Assignment> {
        self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Assignment> {
        self.pairs.iter()
    }

    /// Who `giver` gives to.
    pub fn receiver_for(&self, giver: &ParticipantId) -> Option<&ParticipantId> {
        self.pairs
            .iter()
            .find(|a| &a.giver_id == giver)
            .map(|a| &a.receiver_id)
    }

    /// Who gives to `receiver`.
    pub fn giver_for(&self, receiver: &ParticipantId) -> Option<&ParticipantId> {
        self.pairs
            .iter()
            .find(|a| &a.receiver_id == receiver)
            .map(|a| &a.giver_id)
    }

    /// Stamp every pair as history created at `when`.
    pub fn to_history(&self, when: DateTime<Utc>) -> Vec<HistoricalPair> {
        self.pairs
            .iter()
            .map(|a| HistoricalPair {
                giver_id: a.giver_id.clone(),
                receiver_id: a.receiver_id.clone(),
                when_created: when,
            })
            .collect()
    }

    pub fn to_records(&self) -> Vec<PairRecord> {
        self.pairs.iter().map(PairRecord::from).collect()
    }
}

impl<'a> IntoIterator for &'a AssignmentSet {
    type Item = &'a Assignment;
    type IntoIter = std::slice::Iter<'a, Assignment>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

impl FromIterator<Assignment> for AssignmentSet {
    fn from_iter<T: IntoIterator<Item = Assignment>>(iter: T) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}
