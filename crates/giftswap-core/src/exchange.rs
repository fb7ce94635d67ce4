//! Exchange coordinator: the persistence-facing side of a draw.
//!
//! Loads the roster and the relevant history from storage, runs the search,
//! and stores the result as one [`DrawRecord`] per (cohort, period). Also
//! implements cancel, relaunch, per-giver lookup, and auditing of a stored
//! draw.

use chrono::{DateTime, Utc};
use giftswap_state::{
    AssignmentStore, CohortId, DrawRecord, HistoryProvider, Period, RosterProvider, StorageError,
};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::domain::{
    Assignment, AssignmentSet, ExchangeError, HistoricalPair, History, LookbackWindow,
    Participant, ParticipantId, Roster,
};
use crate::obs;
use crate::random::RandomSource;
use crate::search::{generate, SearchConfig};
use crate::verify::{verify_assignment, AssignmentVerdict};

/// Coordinator errors.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("cohort {cohort_id} already has a draw for period {period}")]
    AlreadyDrawn { cohort_id: CohortId, period: Period },

    #[error("cohort {cohort_id} has no draw for period {period}")]
    NoDraw { cohort_id: CohortId, period: Period },
}

impl CoordinatorError {
    /// Whether running the same operation again could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoordinatorError::Exchange(e) if e.is_retryable())
    }
}

pub type CoordinatorResult<T> = std::result::Result<T, CoordinatorError>;

/// What happens to the stored draw while a relaunch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelaunchMode {
    /// Generate first, then swap. A failed relaunch keeps the old draw.
    #[default]
    Transactional,
    /// Delete first, then generate. A failed relaunch leaves no draw.
    Lossy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaunchPolicy {
    pub mode: RelaunchMode,
    /// Treat the cancelled draw's pairs as history for the new one.
    pub exclude_previous_draw: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub search: SearchConfig,
    pub lookback: LookbackWindow,
    pub relaunch: RelaunchPolicy,
}

/// Runs draws for cohorts against pluggable storage backends.
pub struct ExchangeCoordinator<R, H, S> {
    rosters: R,
    history: H,
    store: S,
    config: CoordinatorConfig,
}

impl<R, H, S> ExchangeCoordinator<R, H, S>
where
    R: RosterProvider,
    H: HistoryProvider,
    S: AssignmentStore,
{
    pub fn new(rosters: R, history: H, store: S, config: CoordinatorConfig) -> Self {
        Self {
            rosters,
            history,
            store,
            config,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Draw for a cohort and period that has no draw yet.
    pub async fn launch<G>(
        &self,
        cohort_id: &CohortId,
        period: Period,
        now: DateTime<Utc>,
        rng: &mut G,
    ) -> CoordinatorResult<DrawRecord>
    where
        G: RandomSource + ?Sized,
    {
        let span = obs::draw_span("launch", cohort_id.as_str(), period);
        self.launch_draw(cohort_id, period, now, rng)
            .instrument(span)
            .await
    }

    /// Remove the stored draw, returning it.
    pub async fn cancel(&self, cohort_id: &CohortId, period: Period) -> CoordinatorResult<DrawRecord> {
        let span = obs::draw_span("cancel", cohort_id.as_str(), period);
        self.cancel_draw(cohort_id, period).instrument(span).await
    }

    /// Cancel the stored draw and draw again, following the relaunch policy.
    ///
    /// # Errors
    ///
    /// `NoDraw` when there is nothing to relaunch. When the new search
    /// fails, the stored state afterwards depends on [`RelaunchMode`].
    pub async fn relaunch<G>(
        &self,
        cohort_id: &CohortId,
        period: Period,
        now: DateTime<Utc>,
        rng: &mut G,
    ) -> CoordinatorResult<DrawRecord>
    where
        G: RandomSource + ?Sized,
    {
        let span = obs::draw_span("relaunch", cohort_id.as_str(), period);
        self.relaunch_draw(cohort_id, period, now, rng)
            .instrument(span)
            .await
    }

    /// Stored draw for the key.
    pub async fn current(
        &self,
        cohort_id: &CohortId,
        period: Period,
    ) -> CoordinatorResult<DrawRecord> {
        self.store
            .get(cohort_id, period)
            .await?
            .ok_or_else(|| CoordinatorError::NoDraw {
                cohort_id: cohort_id.clone(),
                period,
            })
    }

    /// Receiver `giver` drew, `None` if the giver is not part of the draw.
    pub async fn receiver_for(
        &self,
        cohort_id: &CohortId,
        period: Period,
        giver: &ParticipantId,
    ) -> CoordinatorResult<Option<ParticipantId>> {
        let record = self.current(cohort_id, period).await?;
        Ok(record.receiver_for(giver.as_str()).map(ParticipantId::new))
    }

    /// Check the stored draw against the current roster and history.
    pub async fn audit(
        &self,
        cohort_id: &CohortId,
        period: Period,
        now: DateTime<Utc>,
    ) -> CoordinatorResult<AssignmentVerdict> {
        let record = self.current(cohort_id, period).await?;
        let roster = Roster::new(self.participants(cohort_id).await?).map_err(ExchangeError::from)?;
        let history = self.history_for(cohort_id, period, now).await?;
        let set: AssignmentSet = record.pairs.into_iter().map(Assignment::from).collect();
        Ok(verify_assignment(&roster, &history, &set))
    }

    async fn launch_draw<G>(
        &self,
        cohort_id: &CohortId,
        period: Period,
        now: DateTime<Utc>,
        rng: &mut G,
    ) -> CoordinatorResult<DrawRecord>
    where
        G: RandomSource + ?Sized,
    {
        if self.store.get(cohort_id, period).await?.is_some() {
            return Err(already_drawn(cohort_id, period));
        }

        let participants = self.participants(cohort_id).await?;
        let history = self.history_for(cohort_id, period, now).await?;
        let set = generate(&participants, &history, &self.config.search, rng)?;
        self.insert_new(cohort_id, period, &set, now).await
    }

    async fn cancel_draw(&self, cohort_id: &CohortId, period: Period) -> CoordinatorResult<DrawRecord> {
        let removed = self
            .store
            .remove(cohort_id, period)
            .await
            .map_err(|e| not_drawn(e, cohort_id, period))?;
        obs::emit_draw_cancelled(cohort_id.as_str(), period, &removed.draw_id.to_string());
        Ok(removed)
    }

    async fn relaunch_draw<G>(
        &self,
        cohort_id: &CohortId,
        period: Period,
        now: DateTime<Utc>,
        rng: &mut G,
    ) -> CoordinatorResult<DrawRecord>
    where
        G: RandomSource + ?Sized,
    {
        let previous = self.current(cohort_id, period).await?;
        let participants = self.participants(cohort_id).await?;
        let mut history = self.history_for(cohort_id, period, now).await?;
        if self.config.relaunch.exclude_previous_draw {
            history.extend(previous.pairs.iter().map(|p| {
                (
                    ParticipantId::new(p.giver_id.as_str()),
                    ParticipantId::new(p.receiver_id.as_str()),
                )
            }));
        }

        match self.config.relaunch.mode {
            RelaunchMode::Transactional => {
                let set = match generate(&participants, &history, &self.config.search, rng) {
                    Ok(set) => set,
                    Err(e) => {
                        obs::emit_relaunch_kept_previous(cohort_id.as_str(), period, &e);
                        return Err(e.into());
                    }
                };
                let record = DrawRecord::new(cohort_id.clone(), period, set.to_records(), now);
                self.store
                    .replace(record.clone())
                    .await
                    .map_err(|e| not_drawn(e, cohort_id, period))?;
                obs::emit_draw_persisted(
                    cohort_id.as_str(),
                    period,
                    &record.draw_id.to_string(),
                    true,
                );
                Ok(record)
            }
            RelaunchMode::Lossy => {
                self.cancel_draw(cohort_id, period).await?;
                let set = generate(&participants, &history, &self.config.search, rng)?;
                self.insert_new(cohort_id, period, &set, now).await
            }
        }
    }

    async fn insert_new(
        &self,
        cohort_id: &CohortId,
        period: Period,
        set: &AssignmentSet,
        now: DateTime<Utc>,
    ) -> CoordinatorResult<DrawRecord> {
        let record = DrawRecord::new(cohort_id.clone(), period, set.to_records(), now);
        self.store
            .insert(record.clone())
            .await
            .map_err(|e| match e {
                StorageError::Conflict { .. } => already_drawn(cohort_id, period),
                other => other.into(),
            })?;
        obs::emit_draw_persisted(
            cohort_id.as_str(),
            period,
            &record.draw_id.to_string(),
            false,
        );
        Ok(record)
    }

    async fn participants(&self, cohort_id: &CohortId) -> CoordinatorResult<Vec<Participant>> {
        let records = self.rosters.roster(cohort_id).await?;
        Ok(records.into_iter().map(Participant::from).collect())
    }

    /// History inside the lookback window, minus pairs of `period` itself.
    async fn history_for(
        &self,
        cohort_id: &CohortId,
        period: Period,
        now: DateTime<Utc>,
    ) -> CoordinatorResult<History> {
        let lookback = self.config.lookback;
        let entries = self
            .history
            .history_since(cohort_id, lookback.cutoff(now))
            .await?;
        let past: Vec<HistoricalPair> = entries
            .into_iter()
            .filter(|e| e.period != period)
            .map(HistoricalPair::from)
            .collect();
        Ok(History::within(&past, lookback, now))
    }
}

fn already_drawn(cohort_id: &CohortId, period: Period) -> CoordinatorError {
    CoordinatorError::AlreadyDrawn {
        cohort_id: cohort_id.clone(),
        period,
    }
}

fn not_drawn(error: StorageError, cohort_id: &CohortId, period: Period) -> CoordinatorError {
    match error {
        StorageError::DrawNotFound { .. } => CoordinatorError::NoDraw {
            cohort_id: cohort_id.clone(),
            period,
        },
        other => other.into(),
    }
}
