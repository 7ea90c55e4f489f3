use super::super::classifier::Classification;
use super::super::domain::{Reputation, ReputationEventKind};
use super::config::ScorePolicy;
use super::ReputationTransition;

/// Compute the next reputation state for one classified repayment.
///
/// Evaluation order is fixed: base delta and counter updates, then the capped
/// recovery overlay, then the streak bonus, then the recovery cap, then the
/// final clamp. `next.updated_at` is left untouched; the engine stamps it.
pub(crate) fn transition(
    current: &Reputation,
    classification: Classification,
    policy: &ScorePolicy,
) -> ReputationTransition {
    let mut next = current.clone();
    let score_before = current.score;
    let mut blocked = false;
    let event_kind;

    match classification {
        Classification::Early | Classification::OnTime => {
            let (reward, kind) = match classification {
                Classification::Early => {
                    (policy.early_reward, ReputationEventKind::EarlyRepayment)
                }
                _ => (policy.on_time_reward, ReputationEventKind::LoanRepaid),
            };
            event_kind = Some(kind);
            next.consecutive_late_count = 0;
            next.clean_cycle_count = current.clean_cycle_count + 1;

            let mut score = score_before + reward;

            if let Some(snapshot) = current.max_score_before_last_penalty {
                if next.clean_cycle_count >= policy.recovery_cycle_threshold {
                    score += (snapshot - score_before).abs() / 2;
                }
            }

            if next.clean_cycle_count == policy.streak_length {
                score += policy.streak_bonus;
            }

            // Recovery never lifts a borrower above where they stood before
            // the last blocking penalty.
            if let Some(snapshot) = current.max_score_before_last_penalty {
                score = score.min(snapshot);
            }

            next.score = score.clamp(policy.min_score, policy.max_score);
        }
        Classification::Partial => {
            // No score movement and no counter changes; the row is still
            // rewritten so updated_at reflects the event.
            event_kind = None;
        }
        Classification::Late { .. } => {
            let escalated =
                current.consecutive_late_count + 1 >= policy.block_after_consecutive_late;
            next.clean_cycle_count = 0;
            next.consecutive_late_count = current.consecutive_late_count + 1;

            let penalty = if escalated {
                next.max_score_before_last_penalty = Some(score_before);
                blocked = true;
                policy.escalated_late_penalty
            } else {
                policy.late_penalty
            };
            event_kind = Some(if escalated {
                ReputationEventKind::AccountBlocked
            } else {
                ReputationEventKind::LatePayment
            });

            next.score = (score_before - penalty).clamp(policy.min_score, policy.max_score);
        }
    }

    ReputationTransition {
        points_change: next.score - score_before,
        blocked,
        event_kind,
        next,
    }
}
