//! Fixed scenarios for the assignment search, including the dense-history
//! and forced-pick cases that must fail cleanly.

use std::collections::HashSet;

use giftswap_core::{
    generate, Assignment, ExchangeError, History, Participant, RandomSource, SearchConfig,
    SeededRandom,
};

fn people(ids: &[&str]) -> Vec<Participant> {
    ids.iter().map(|id| Participant::new(*id)).collect()
}

/// Always picks the first legal receiver.
struct AlwaysFirst;

impl RandomSource for AlwaysFirst {
    fn pick(&mut self, _len: usize) -> usize {
        0
    }
}

/// Always picks the last legal receiver.
struct AlwaysLast;

impl RandomSource for AlwaysLast {
    fn pick(&mut self, len: usize) -> usize {
        len - 1
    }
}

#[test]
fn four_strangers_always_get_a_derangement() {
    let participants = people(&["A", "B", "C", "D"]);
    let mut successes = 0;

    for seed in 0..1000 {
        let result = generate(
            &participants,
            &History::new(),
            &SearchConfig::default(),
            &mut SeededRandom::new(seed),
        );
        let Ok(set) = result else { continue };
        successes += 1;

        assert_eq!(set.len(), 4);
        let receivers: HashSet<&str> = set.iter().map(|a| a.receiver_id.as_str()).collect();
        assert_eq!(receivers.len(), 4);
        assert!(set.iter().all(|a| a.giver_id != a.receiver_id));
    }

    assert!(successes > 990, "only {successes}/1000 draws succeeded");
}

#[test]
fn mutual_partners_cannot_be_drawn() {
    let participants = vec![
        Participant::new("A").with_partner("B"),
        Participant::new("B").with_partner("A"),
    ];
    let err = generate(
        &participants,
        &History::new(),
        &SearchConfig::default(),
        &mut SeededRandom::new(0),
    )
    .unwrap_err();
    assert_eq!(err, ExchangeError::Exhausted { attempts: 100 });
    assert!(err.is_retryable());
}

#[test]
fn fully_used_history_exhausts_the_search() {
    let history = History::from_pairs([
        ("A", "B"),
        ("A", "C"),
        ("B", "A"),
        ("B", "C"),
        ("C", "A"),
        ("C", "B"),
    ]);
    let err = generate(
        &people(&["A", "B", "C"]),
        &history,
        &SearchConfig::default(),
        &mut SeededRandom::new(0),
    )
    .unwrap_err();
    assert!(matches!(err, ExchangeError::Exhausted { .. }));
}

#[test]
fn forced_first_pick_aborts_instead_of_returning_a_partial_draw() {
    // A takes B, B takes A, and C is left with only itself.
    let err = generate(
        &people(&["A", "B", "C"]),
        &History::new(),
        &SearchConfig::default().with_max_attempts(1),
        &mut AlwaysFirst,
    )
    .unwrap_err();
    assert_eq!(err, ExchangeError::Exhausted { attempts: 1 });
}

#[test]
fn forced_last_pick_completes_the_ring() {
    let set = generate(
        &people(&["A", "B", "C"]),
        &History::new(),
        &SearchConfig::default().with_max_attempts(1),
        &mut AlwaysLast,
    )
    .unwrap();
    assert_eq!(
        set.pairs(),
        &[
            Assignment::new("A", "C"),
            Assignment::new("B", "A"),
            Assignment::new("C", "B"),
        ]
    );
}

#[test]
fn same_seed_same_draw() {
    let participants = people(&["A", "B", "C", "D", "E", "F"]);
    let config = SearchConfig::default();
    let first = generate(&participants, &History::new(), &config, &mut SeededRandom::new(77));
    let second = generate(&participants, &History::new(), &config, &mut SeededRandom::new(77));
    assert_eq!(first, second);
}

#[test]
fn self_partner_is_rejected_up_front() {
    let err = generate(
        &[Participant::new("A").with_partner("A"), Participant::new("B")],
        &History::new(),
        &SearchConfig::default(),
        &mut AlwaysFirst,
    )
    .unwrap_err();
    assert!(matches!(err, ExchangeError::InvalidInput(_)));
    assert!(!err.is_retryable());
}
