//! Participants and the validated roster the search runs over.

use std::collections::HashMap;

use giftswap_state::ParticipantRecord;
use serde::{Deserialize, Serialize};

use super::error::InputError;

/// Opaque participant identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        ParticipantId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        ParticipantId(s.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        ParticipantId(s)
    }
}

/// One person eligible for the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    /// Someone this participant must never be assigned to give to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<ParticipantId>,
}

impl Participant {
    pub fn new(id: impl Into<ParticipantId>) -> Self {
        Self {
            id: id.into(),
            partner_id: None,
        }
    }

    pub fn with_partner(mut self, partner_id: impl Into<ParticipantId>) -> Self {
        self.partner_id = Some(partner_id.into());
        self
    }
}

impl From<ParticipantRecord> for Participant {
    fn from(record: ParticipantRecord) -> Self {
        Self {
            id: ParticipantId(record.id),
            partner_id: record.partner_id.map(ParticipantId),
        }
    }
}

/// A validated, ordered list of participants.
///
/// # Invariants
///
/// - At least two participants.
/// - Ids are unique.
/// - Nobody is their own partner.
///
/// A partner id that names someone outside the roster is kept as is; it can
/// never match a receiver, so it excludes nothing.
#[derive(Debug, Clone)]
pub struct Roster {
    participants: Vec<Participant>,
    index: HashMap<ParticipantId, usize>,
}

impl Roster {
    /// Validate `participants` and build a roster, keeping their order.
    pub fn new(participants: Vec<Participant>) -> Result<Self, InputError> {
        if participants.len() < 2 {
            return Err(InputError::TooFewParticipants {
                count: participants.len(),
            });
        }

        let mut index = HashMap::with_capacity(participants.len());
        for (i, p) in participants.iter().enumerate() {
            if p.partner_id.as_ref() == Some(&p.id) {
                return Err(InputError::SelfPartner { id: p.id.0.clone() });
            }
            if index.insert(p.id.clone(), i).is_some() {
                return Err(InputError::DuplicateParticipant { id: p.id.0.clone() });
            }
        }

        Ok(Self {
            participants,
            index,
        })
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Always false for a constructed roster; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.index.get(id).map(|&i| &self.participants[i])
    }

    /// Partner of `id`, if `id` is on the roster and has one.
    pub fn partner_of(&self, id: &ParticipantId) -> Option<&ParticipantId> {
        self.get(id).and_then(|p| p.partner_id.as_ref())
    }

    pub fn ids(&self) -> impl Iterator<Item = &ParticipantId> {
        self.participants.iter().map(|p| &p.id)
    }
}
