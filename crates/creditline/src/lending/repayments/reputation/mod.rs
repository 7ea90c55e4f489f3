mod config;
mod policy;
mod rules;

pub use config::ScorePolicy;

pub(crate) use policy::unblock_eligible;

use chrono::{DateTime, Utc};

use super::classifier::Classification;
use super::domain::{Reputation, ReputationEventKind};

/// Deterministic reputation state machine configured by a [`ScorePolicy`].
///
/// The engine is pure: it reads one reputation row and a classification and
/// produces the fully computed next row plus a report of what happened.
/// Persistence stays with the orchestration layer.
pub struct ReputationEngine {
    policy: ScorePolicy,
}

impl ReputationEngine {
    pub fn new(policy: ScorePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ScorePolicy {
        &self.policy
    }

    pub fn apply(
        &self,
        current: &Reputation,
        classification: Classification,
        at: DateTime<Utc>,
    ) -> ReputationTransition {
        let mut transition = rules::transition(current, classification, &self.policy);
        transition.next.updated_at = at;
        transition
    }
}

/// Outcome of applying one classified repayment to a reputation row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReputationTransition {
    /// The next reputation row, ready to persist.
    pub next: Reputation,
    /// Net score movement including recovery and streak bonuses.
    pub points_change: i32,
    /// True when this event triggered the blocking escalation.
    pub blocked: bool,
    /// Audit-trail entry kind, `None` for partial payments.
    pub event_kind: Option<ReputationEventKind>,
}
