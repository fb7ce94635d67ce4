//! Storage trait definitions for giftswap
//!
//! These traits define the collaborators the assignment engine consumes:
//! - `RosterProvider`: cohort membership and partner links
//! - `HistoryProvider`: past pairings, filtered by a caller-chosen cutoff
//! - `AssignmentStore`: draw persistence keyed by (cohort, period)
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Identifier of a cohort (the group running an exchange)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CohortId(pub String);

impl CohortId {
    pub fn new(id: impl Into<String>) -> Self {
        CohortId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CohortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One exchange cycle, usually a calendar year.
pub type Period = i32;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A roster member as stored by the membership layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub id: String,
    /// Participant this member must never draw
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<String>,
}

impl ParticipantRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            partner_id: None,
        }
    }

    pub fn with_partner(mut self, partner_id: impl Into<String>) -> Self {
        self.partner_id = Some(partner_id.into());
        self
    }
}

/// A single stored giver -> receiver pairing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairRecord {
    pub giver_id: String,
    pub receiver_id: String,
}

/// A complete draw for one cohort and period.
///
/// Draws are written and removed as a unit; there is no API for editing
/// individual pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawRecord {
    pub draw_id: uuid::Uuid,
    pub cohort_id: CohortId,
    pub period: Period,
    pub pairs: Vec<PairRecord>,
    pub created_at: DateTime<Utc>,
}

impl DrawRecord {
    /// Create a record with a fresh draw id.
    pub fn new(
        cohort_id: CohortId,
        period: Period,
        pairs: Vec<PairRecord>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            draw_id: uuid::Uuid::new_v4(),
            cohort_id,
            period,
            pairs,
            created_at,
        }
    }

    /// Receiver drawn by `giver_id`, if the giver is part of this draw.
    pub fn receiver_for(&self, giver_id: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|p| p.giver_id == giver_id)
            .map(|p| p.receiver_id.as_str())
    }

    /// Flatten into history entries stamped with this draw's period and time.
    pub fn history_entries(&self) -> Vec<HistoryEntry> {
        self.pairs
            .iter()
            .map(|p| HistoryEntry {
                giver_id: p.giver_id.clone(),
                receiver_id: p.receiver_id.clone(),
                period: self.period,
                created_at: self.created_at,
            })
            .collect()
    }
}

/// A past pairing as returned by a history provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub giver_id: String,
    pub receiver_id: String,
    /// Period the pairing was drawn for
    pub period: Period,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Cohort membership provider.
#[async_trait]
pub trait RosterProvider: Send + Sync {
    /// Participants of a cohort, in a stable order.
    /// Returns `StorageError::CohortNotFound` for unknown cohorts.
    async fn roster(&self, cohort_id: &CohortId) -> StorageResult<Vec<ParticipantRecord>>;
}

/// Past pairing provider.
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    /// All pairings for the cohort created at or after `since`
    /// (every pairing when `since` is `None`).
    async fn history_since(
        &self,
        cohort_id: &CohortId,
        since: Option<DateTime<Utc>>,
    ) -> StorageResult<Vec<HistoryEntry>>;
}

/// Draw persistence.
///
/// Guarantees:
/// - At most one draw exists per (cohort, period).
/// - `insert` fails with `StorageError::Conflict` when a draw already exists,
///   which is what serializes concurrent launches for the same key.
/// - `replace` swaps the stored draw in one step; readers never observe a
///   key with no draw in between.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Current draw for the key, if any.
    async fn get(&self, cohort_id: &CohortId, period: Period) -> StorageResult<Option<DrawRecord>>;

    /// Store a new draw. Fails with `Conflict` if one exists.
    async fn insert(&self, record: DrawRecord) -> StorageResult<()>;

    /// Atomically replace the draw for the record's key, returning the old one.
    /// Fails with `DrawNotFound` if there is nothing to replace.
    async fn replace(&self, record: DrawRecord) -> StorageResult<DrawRecord>;

    /// Remove and return the draw for the key. Fails with `DrawNotFound`.
    async fn remove(&self, cohort_id: &CohortId, period: Period) -> StorageResult<DrawRecord>;
}

// Shared handles: one backend can serve several roles at once.

#[async_trait]
impl<T: RosterProvider + ?Sized> RosterProvider for Arc<T> {
    async fn roster(&self, cohort_id: &CohortId) -> StorageResult<Vec<ParticipantRecord>> {
        (**self).roster(cohort_id).await
    }
}

#[async_trait]
impl<T: HistoryProvider + ?Sized> HistoryProvider for Arc<T> {
    async fn history_since(
        &self,
        cohort_id: &CohortId,
        since: Option<DateTime<Utc>>,
    ) -> StorageResult<Vec<HistoryEntry>> {
        (**self).history_since(cohort_id, since).await
    }
}

#[async_trait]
impl<T: AssignmentStore + ?Sized> AssignmentStore for Arc<T> {
    async fn get(&self, cohort_id: &CohortId, period: Period) -> StorageResult<Option<DrawRecord>> {
        (**self).get(cohort_id, period).await
    }

    async fn insert(&self, record: DrawRecord) -> StorageResult<()> {
        (**self).insert(record).await
    }

    async fn replace(&self, record: DrawRecord) -> StorageResult<DrawRecord> {
        (**self).replace(record).await
    }

    async fn remove(&self, cohort_id: &CohortId, period: Period) -> StorageResult<DrawRecord> {
        (**self).remove(cohort_id, period).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_draw() -> DrawRecord {
        DrawRecord::new(
            CohortId::new("family"),
            2024,
            vec![
                PairRecord {
                    giver_id: "ana".to_string(),
                    receiver_id: "ben".to_string(),
                },
                PairRecord {
                    giver_id: "ben".to_string(),
                    receiver_id: "ana".to_string(),
                },
            ],
            Utc::now(),
        )
    }

    #[test]
    fn receiver_for_finds_giver() {
        let draw = sample_draw();
        assert_eq!(draw.receiver_for("ana"), Some("ben"));
        assert_eq!(draw.receiver_for("zoe"), None);
    }

    #[test]
    fn history_entries_carry_period_and_time() {
        let draw = sample_draw();
        let entries = draw.history_entries();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.period == 2024));
        assert!(entries.iter().all(|e| e.created_at == draw.created_at));
    }

    #[test]
    fn participant_record_omits_missing_partner() {
        let json = serde_json::to_string(&ParticipantRecord::new("ana")).unwrap();
        assert_eq!(json, r#"{"id":"ana"}"#);

        let linked: ParticipantRecord =
            serde_json::from_str(r#"{"id":"ana","partner_id":"ben"}"#).unwrap();
        assert_eq!(linked, ParticipantRecord::new("ana").with_partner("ben"));
    }

    #[test]
    fn cohort_id_is_transparent() {
        let json = serde_json::to_string(&CohortId::new("family")).unwrap();
        assert_eq!(json, r#""family""#);
    }
}
