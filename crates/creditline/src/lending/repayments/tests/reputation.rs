use super::common::{dt, policy, reputation};
use crate::lending::repayments::domain::ReputationEventKind;
use crate::lending::repayments::{Classification, ReputationEngine};

fn engine() -> ReputationEngine {
    ReputationEngine::new(policy())
}

#[test]
fn early_repayment_rewards_twelve_and_starts_clean_cycle() {
    let transition = engine().apply(&reputation(50, 0, 0, None), Classification::Early, dt(1));
    assert_eq!(transition.next.score, 62);
    assert_eq!(transition.next.clean_cycle_count, 1);
    assert_eq!(transition.next.consecutive_late_count, 0);
    assert_eq!(transition.points_change, 12);
    assert_eq!(transition.event_kind, Some(ReputationEventKind::EarlyRepayment));
    assert!(!transition.blocked);
}

#[test]
fn on_time_repayment_rewards_ten() {
    let transition = engine().apply(&reputation(50, 0, 0, None), Classification::OnTime, dt(1));
    assert_eq!(transition.next.score, 60);
    assert_eq!(transition.next.clean_cycle_count, 1);
    assert_eq!(transition.event_kind, Some(ReputationEventKind::LoanRepaid));
}

#[test]
fn partial_leaves_score_and_counters_untouched() {
    let transition = engine().apply(&reputation(50, 0, 0, None), Classification::Partial, dt(1));
    assert_eq!(transition.next.score, 50);
    assert_eq!(transition.next.clean_cycle_count, 0);
    assert_eq!(transition.next.consecutive_late_count, 0);
    assert_eq!(transition.points_change, 0);
    assert_eq!(transition.event_kind, None);
    assert_eq!(transition.next.updated_at, dt(1));
}

#[test]
fn first_late_applies_base_penalty() {
    let transition = engine().apply(
        &reputation(50, 0, 0, None),
        Classification::Late { days: 1 },
        dt(1),
    );
    assert_eq!(transition.next.score, 45);
    assert_eq!(transition.next.consecutive_late_count, 1);
    assert_eq!(transition.next.clean_cycle_count, 0);
    assert_eq!(transition.event_kind, Some(ReputationEventKind::LatePayment));
    assert!(!transition.blocked);
}

#[test]
fn second_consecutive_late_escalates_and_blocks() {
    let transition = engine().apply(
        &reputation(50, 1, 0, None),
        Classification::Late { days: 1 },
        dt(1),
    );
    assert_eq!(transition.next.score, 30);
    assert_eq!(transition.next.consecutive_late_count, 2);
    assert_eq!(transition.next.max_score_before_last_penalty, Some(50));
    assert_eq!(transition.points_change, -20);
    assert_eq!(transition.event_kind, Some(ReputationEventKind::AccountBlocked));
    assert!(transition.blocked);
}

#[test]
fn escalation_deltas_are_minus_five_then_minus_twenty() {
    let engine = engine();
    let first = engine.apply(
        &reputation(50, 0, 0, None),
        Classification::Late { days: 1 },
        dt(1),
    );
    assert_eq!(first.points_change, -5);
    assert!(!first.blocked);

    let second = engine.apply(&first.next, Classification::Late { days: 2 }, dt(2));
    assert_eq!(second.points_change, -20);
    assert!(second.blocked);
}

#[test]
fn clean_repayment_resets_consecutive_late_count() {
    let transition = engine().apply(&reputation(50, 1, 0, None), Classification::OnTime, dt(1));
    assert_eq!(transition.next.consecutive_late_count, 0);
    assert_eq!(transition.next.clean_cycle_count, 1);
    assert_eq!(transition.next.score, 60);
}

#[test]
fn recovery_bonus_is_capped_at_pre_penalty_score() {
    let transition = engine().apply(
        &reputation(40, 0, 1, Some(55)),
        Classification::Early,
        dt(1),
    );
    // 40 + 12 base + floor(0.5 * |55 - 40|) = 59, capped back to the snapshot.
    assert_eq!(transition.next.score, 55);
    assert_eq!(transition.next.clean_cycle_count, 2);
}

#[test]
fn clean_reward_clamps_at_one_hundred() {
    let transition = engine().apply(&reputation(95, 0, 0, None), Classification::Early, dt(1));
    assert_eq!(transition.next.score, 100);
}

#[test]
fn escalated_penalty_clamps_at_zero() {
    let transition = engine().apply(
        &reputation(3, 1, 0, None),
        Classification::Late { days: 1 },
        dt(1),
    );
    assert_eq!(transition.next.score, 0);
    assert_eq!(transition.next.max_score_before_last_penalty, Some(3));
    assert!(transition.blocked);
}

#[test]
fn streak_bonus_fires_exactly_on_third_clean_cycle() {
    let engine = engine();
    let mut state = reputation(10, 0, 0, None);
    let mut scores = Vec::new();
    for day in 1..=4 {
        state = engine.apply(&state, Classification::OnTime, dt(day)).next;
        scores.push(state.score);
    }
    // +10 each cycle, with the one-off +10 streak bonus on the third only.
    assert_eq!(scores, vec![20, 30, 50, 60]);
}

#[test]
fn streak_bonus_rearms_after_a_late_reset() {
    let engine = engine();
    let mut state = reputation(10, 0, 0, None);
    for day in 1..=4 {
        state = engine.apply(&state, Classification::OnTime, dt(day)).next;
    }
    state = engine
        .apply(&state, Classification::Late { days: 1 }, dt(5))
        .next;
    assert_eq!(state.score, 55);
    assert_eq!(state.clean_cycle_count, 0);

    let mut scores = Vec::new();
    for day in 6..=8 {
        state = engine.apply(&state, Classification::OnTime, dt(day)).next;
        scores.push(state.score);
    }
    assert_eq!(scores, vec![65, 75, 95]);
}

#[test]
fn no_clean_sequence_exceeds_the_recovery_cap() {
    let engine = engine();
    let mut state = reputation(25, 2, 0, Some(45));
    for day in 1..=10 {
        state = engine.apply(&state, Classification::Early, dt(day)).next;
        assert!(
            state.score <= 45,
            "score {} exceeded recovery cap on day {day}",
            state.score
        );
    }
    assert_eq!(state.score, 45);
}

#[test]
fn penalty_snapshot_is_never_cleared() {
    // Documented behavior: the snapshot persists even after the score has
    // fully recovered to it, permanently capping clean-cycle gains.
    let engine = engine();
    let mut state = reputation(25, 2, 0, Some(45));
    for day in 1..=10 {
        state = engine.apply(&state, Classification::Early, dt(day)).next;
    }
    assert_eq!(state.max_score_before_last_penalty, Some(45));
}

#[test]
fn repeat_escalation_lowers_the_snapshot() {
    let engine = engine();
    let blocked = engine.apply(
        &reputation(50, 1, 0, None),
        Classification::Late { days: 1 },
        dt(1),
    );
    assert_eq!(blocked.next.max_score_before_last_penalty, Some(50));

    let again = engine.apply(&blocked.next, Classification::Late { days: 1 }, dt(2));
    assert_eq!(again.points_change, -20);
    assert_eq!(again.next.max_score_before_last_penalty, Some(30));
    assert!(again.blocked);
}

#[test]
fn score_stays_in_bounds_over_arbitrary_sequences() {
    let engine = engine();
    let events = [
        Classification::Early,
        Classification::Late { days: 3 },
        Classification::Late { days: 1 },
        Classification::OnTime,
        Classification::Partial,
        Classification::Early,
        Classification::Early,
        Classification::Late { days: 7 },
        Classification::OnTime,
        Classification::OnTime,
        Classification::OnTime,
        Classification::Late { days: 2 },
    ];
    let mut state = reputation(50, 0, 0, None);
    for (day, classification) in events.iter().enumerate() {
        state = engine
            .apply(&state, *classification, dt(day as i64))
            .next;
        assert!((0..=100).contains(&state.score), "score {}", state.score);
    }
}
