//! Past pairings and the lookback window that decides which of them count.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use giftswap_state::HistoryEntry;
use serde::{Deserialize, Serialize};

use super::participant::ParticipantId;

/// A pairing from an earlier cycle. Never modified once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalPair {
    pub giver_id: ParticipantId,
    pub receiver_id: ParticipantId,
    pub when_created: DateTime<Utc>,
}

impl From<HistoryEntry> for HistoricalPair {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            giver_id: ParticipantId(entry.giver_id),
            receiver_id: ParticipantId(entry.receiver_id),
            when_created: entry.created_at,
        }
    }
}

/// How far back past pairings stay forbidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LookbackWindow {
    /// From January 1 of `now.year() - years`.
    CalendarYears { years: u32 },
    /// The last `days` days before `now`.
    RollingDays { days: u32 },
    /// Every pairing ever recorded.
    Unbounded,
}

impl Default for LookbackWindow {
    fn default() -> Self {
        LookbackWindow::CalendarYears { years: 2 }
    }
}

impl LookbackWindow {
    /// Earliest creation time still inside the window, `None` if unbounded.
    ///
    /// A window that reaches past chrono's representable range has no cutoff.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match *self {
            LookbackWindow::CalendarYears { years } => {
                let year = now
                    .year()
                    .saturating_sub(i32::try_from(years).unwrap_or(i32::MAX));
                Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()
            }
            LookbackWindow::RollingDays { days } => Duration::try_days(i64::from(days))
                .and_then(|span| now.checked_sub_signed(span)),
            LookbackWindow::Unbounded => None,
        }
    }

    /// Whether a pairing created at `when` is still inside the window.
    pub fn contains(&self, when: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.cutoff(now).map_or(true, |cutoff| when >= cutoff)
    }
}

/// The set of (giver, receiver) pairs a draw must not repeat.
///
/// The search trusts this set as given; narrowing it to a cohort and a
/// lookback window is the caller's job (see [`History::within`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    by_giver: HashMap<ParticipantId, HashSet<ParticipantId>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from bare (giver, receiver) pairs.
    pub fn from_pairs<I, G, R>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (G, R)>,
        G: Into<ParticipantId>,
        R: Into<ParticipantId>,
    {
        let mut history = Self::new();
        history.extend(pairs.into_iter().map(|(g, r)| (g.into(), r.into())));
        history
    }

    /// Keep only the pairs created inside `window` as seen from `now`.
    pub fn within<'a, I>(pairs: I, window: LookbackWindow, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a HistoricalPair>,
    {
        let mut history = Self::new();
        history.extend(
            pairs
                .into_iter()
                .filter(|p| window.contains(p.when_created, now))
                .map(|p| (p.giver_id.clone(), p.receiver_id.clone())),
        );
        history
    }

    pub fn insert(&mut self, giver: ParticipantId, receiver: ParticipantId) {
        self.by_giver.entry(giver).or_default().insert(receiver);
    }

    pub fn contains(&self, giver: &ParticipantId, receiver: &ParticipantId) -> bool {
        self.by_giver
            .get(giver)
            .map_or(false, |receivers| receivers.contains(receiver))
    }

    /// Number of distinct (giver, receiver) pairs.
    pub fn len(&self) -> usize {
        self.by_giver.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Extend<(ParticipantId, ParticipantId)> for History {
    fn extend<T: IntoIterator<Item = (ParticipantId, ParticipantId)>>(&mut self, iter: T) {
        for (giver, receiver) in iter {
            self.insert(giver, receiver);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn past(giver: &str, receiver: &str, when: DateTime<Utc>) -> HistoricalPair {
        HistoricalPair {
            giver_id: giver.into(),
            receiver_id: receiver.into(),
            when_created: when,
        }
    }

    #[test]
    fn calendar_years_starts_on_january_first() {
        let window = LookbackWindow::CalendarYears { years: 2 };
        let cutoff = window.cutoff(at(2025, 11, 20)).unwrap();
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn calendar_years_zero_is_current_year_only() {
        let window = LookbackWindow::CalendarYears { years: 0 };
        assert!(window.contains(at(2025, 1, 2), at(2025, 12, 1)));
        assert!(!window.contains(at(2024, 12, 31), at(2025, 12, 1)));
    }

    #[test]
    fn rolling_days_is_relative_to_now() {
        let window = LookbackWindow::RollingDays { days: 30 };
        let now = at(2025, 3, 31);
        assert!(window.contains(at(2025, 3, 15), now));
        assert!(!window.contains(at(2025, 2, 1), now));
    }

    #[test]
    fn oversized_windows_have_no_cutoff() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let days = LookbackWindow::RollingDays { days: u32::MAX };
        assert_eq!(days.cutoff(now), None);
        assert!(days.contains(at(1990, 1, 1), now));

        let years = LookbackWindow::CalendarYears { years: u32::MAX };
        assert_eq!(years.cutoff(now), None);
    }

    #[test]
    fn unbounded_keeps_everything() {
        assert_eq!(LookbackWindow::Unbounded.cutoff(at(2025, 1, 1)), None);
        assert!(LookbackWindow::Unbounded.contains(at(1990, 1, 1), at(2025, 1, 1)));
    }

    #[test]
    fn default_window_is_two_calendar_years() {
        assert_eq!(
            LookbackWindow::default(),
            LookbackWindow::CalendarYears { years: 2 }
        );
    }

    #[test]
    fn within_drops_pairs_outside_window() {
        let records = vec![
            past("ana", "ben", at(2020, 12, 1)),
            past("ana", "cal", at(2023, 12, 1)),
            past("ben", "ana", at(2024, 12, 1)),
        ];
        let history = History::within(
            &records,
            LookbackWindow::CalendarYears { years: 2 },
            at(2025, 10, 1),
        );

        assert_eq!(history.len(), 2);
        assert!(!history.contains(&"ana".into(), &"ben".into()));
        assert!(history.contains(&"ana".into(), &"cal".into()));
        assert!(history.contains(&"ben".into(), &"ana".into()));
    }

    #[test]
    fn history_is_directed() {
        let history = History::from_pairs([("ana", "ben")]);
        assert!(history.contains(&"ana".into(), &"ben".into()));
        assert!(!history.contains(&"ben".into(), &"ana".into()));
    }

    #[test]
    fn window_serializes_with_kind_tag() {
        let json = serde_json::to_value(LookbackWindow::RollingDays { days: 400 }).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "rolling_days", "days": 400 }));
    }
}
