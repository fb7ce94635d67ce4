//! Randomized assignment search.
//!
//! Each attempt walks the givers in a chosen order, keeps a pool of receivers
//! not yet taken, and for every giver picks uniformly among the pool members
//! the pairing rules allow. A giver with no legal receiver ends the attempt
//! on the spot; the next attempt starts from a full pool. The search stops at
//! the first complete assignment or when the attempt budget is spent.
//!
//! Because receivers are drawn from a pool rather than by chaining a shuffled
//! list into one loop, a result may consist of several disjoint cycles.

use serde::{Deserialize, Serialize};

use crate::constraint::{is_valid, Candidate};
use crate::domain::{
    Assignment, AssignmentSet, ExchangeError, History, InputError, Participant, ParticipantId,
    Result, Roster,
};
use crate::metrics::METRICS;
use crate::obs;
use crate::random::{shuffle, RandomSource};
use crate::retry::retry_bounded;

/// Attempt budget used when none is configured.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Order in which givers pick their receiver within an attempt.
///
/// Givers processed late see the smallest pool, so the order decides who
/// tends to get squeezed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GiverOrder {
    /// Roster order, identical for every attempt.
    #[default]
    Roster,
    /// A fresh random order for every attempt.
    Shuffled,
    /// Fewest legal receivers first (counted over the whole roster); ties
    /// keep roster order.
    MostConstrainedFirst,
}

/// Search knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_attempts: u32,
    pub giver_order: GiverOrder,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            giver_order: GiverOrder::default(),
        }
    }
}

impl SearchConfig {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_giver_order(mut self, giver_order: GiverOrder) -> Self {
        self.giver_order = giver_order;
        self
    }
}

/// Validate `participants` and search for an assignment.
///
/// # Errors
///
/// - `ExchangeError::InvalidInput` when the roster has fewer than two
///   people, a duplicate id, a self-partner, or the attempt budget is zero.
///   No attempt is spent in that case.
/// - `ExchangeError::Exhausted` when every attempt aborted.
pub fn generate<R>(
    participants: &[Participant],
    history: &History,
    config: &SearchConfig,
    rng: &mut R,
) -> Result<AssignmentSet>
where
    R: RandomSource + ?Sized,
{
    let roster = Roster::new(participants.to_vec()).map_err(reject)?;
    search(&roster, history, config, rng)
}

/// Search for an assignment over an already validated roster.
///
/// Same contract as [`generate`].
pub fn search<R>(
    roster: &Roster,
    history: &History,
    config: &SearchConfig,
    rng: &mut R,
) -> Result<AssignmentSet>
where
    R: RandomSource + ?Sized,
{
    if config.max_attempts == 0 {
        return Err(reject(InputError::ZeroAttemptBudget));
    }

    METRICS.inc_draws_started();
    obs::emit_draw_started(roster.len(), history.len(), config.max_attempts);

    let base_order = match config.giver_order {
        GiverOrder::Roster | GiverOrder::Shuffled => (0..roster.len()).collect(),
        GiverOrder::MostConstrainedFirst => most_constrained_order(roster, history),
    };

    let outcome = retry_bounded(config.max_attempts, |n| {
        let mut order = base_order.clone();
        if config.giver_order == GiverOrder::Shuffled {
            shuffle(&mut *rng, &mut order);
        }
        match attempt(roster, history, &order, &mut *rng) {
            Ok(pairs) => Some((n, pairs)),
            Err(aborted) => {
                METRICS.inc_attempts_aborted();
                obs::emit_attempt_aborted(n, aborted.giver.as_str(), aborted.assigned);
                None
            }
        }
    });

    match outcome {
        Ok((attempts, pairs)) => {
            METRICS.inc_draws_succeeded();
            obs::emit_draw_succeeded(attempts, pairs.len());
            Ok(AssignmentSet::from_pairs(pairs))
        }
        Err(exhausted) => {
            METRICS.inc_draws_exhausted();
            obs::emit_draw_exhausted(exhausted.attempts);
            Err(exhausted.into())
        }
    }
}

fn reject(error: InputError) -> ExchangeError {
    METRICS.inc_draws_rejected();
    obs::emit_draw_rejected(&error);
    error.into()
}

/// Where an attempt stopped.
struct Aborted<'a> {
    giver: &'a ParticipantId,
    assigned: usize,
}

/// One pass over `order`. Returns every pair, or the giver that found the
/// pool empty of legal receivers. Nothing partial escapes.
fn attempt<'r, R>(
    roster: &'r Roster,
    history: &History,
    order: &[usize],
    rng: &mut R,
) -> std::result::Result<Vec<Assignment>, Aborted<'r>>
where
    R: RandomSource + ?Sized,
{
    let participants = roster.participants();
    let mut pool: Vec<&ParticipantId> = roster.ids().collect();
    let mut pairs = Vec::with_capacity(participants.len());

    for &g in order {
        let giver = &participants[g].id;
        let legal: Vec<usize> = pool
            .iter()
            .enumerate()
            .filter(|(_, receiver)| is_valid(Candidate::new(giver, receiver), roster, history))
            .map(|(i, _)| i)
            .collect();

        if legal.is_empty() {
            return Err(Aborted {
                giver,
                assigned: pairs.len(),
            });
        }

        let pick = rng.pick(legal.len());
        debug_assert!(pick < legal.len(), "random source returned out-of-range index");
        let receiver = pool.remove(legal[pick % legal.len()]);
        pairs.push(Assignment {
            giver_id: giver.clone(),
            receiver_id: receiver.clone(),
        });
    }

    Ok(pairs)
}

/// Roster indices sorted by how many legal receivers each giver has.
fn most_constrained_order(roster: &Roster, history: &History) -> Vec<usize> {
    let ids: Vec<&ParticipantId> = roster.ids().collect();
    let mut order: Vec<(usize, usize)> = ids
        .iter()
        .enumerate()
        .map(|(i, giver)| {
            let options = ids
                .iter()
                .filter(|receiver| is_valid(Candidate::new(giver, receiver), roster, history))
                .count();
            (i, options)
        })
        .collect();
    order.sort_by_key(|&(_, options)| options);
    order.into_iter().map(|(i, _)| i).collect()
}
