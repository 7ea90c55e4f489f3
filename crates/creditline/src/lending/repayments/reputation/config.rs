use serde::{Deserialize, Serialize};

/// Scoring weights and thresholds for the reputation state machine.
///
/// Penalty fields hold magnitudes; the rules subtract them. `late_penalty`
/// escalates to `escalated_late_penalty` once a borrower reaches
/// `block_after_consecutive_late` consecutive late events, which also blocks
/// the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorePolicy {
    pub early_reward: i32,
    pub on_time_reward: i32,
    pub late_penalty: i32,
    pub escalated_late_penalty: i32,
    pub block_after_consecutive_late: u32,
    /// Clean cycles required before the capped recovery bonus applies.
    pub recovery_cycle_threshold: u32,
    pub streak_bonus: i32,
    /// Exact clean-cycle count at which the streak bonus fires.
    pub streak_length: u32,
    pub min_score: i32,
    pub max_score: i32,
    pub starting_score: i32,
    /// Minimum score required to open a new loan.
    pub min_score_to_borrow: i32,
    /// Grace window granted by the one-shot partial-payment extension.
    pub partial_extension_days: i64,
}

impl Default for ScorePolicy {
    fn default() -> Self {
        Self {
            early_reward: 12,
            on_time_reward: 10,
            late_penalty: 5,
            escalated_late_penalty: 20,
            block_after_consecutive_late: 2,
            recovery_cycle_threshold: 2,
            streak_bonus: 10,
            streak_length: 3,
            min_score: 0,
            max_score: 100,
            starting_score: 50,
            min_score_to_borrow: 30,
            partial_extension_days: 3,
        }
    }
}
