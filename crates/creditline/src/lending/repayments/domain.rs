use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for loans.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoanId(pub String);

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for borrower accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for recorded repayments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepaymentId(pub String);

impl fmt::Display for RepaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a loan. `Repaid` is terminal; `Overdue` is set administratively
/// when an active loan ages past its due date without settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    Active,
    Repaid,
    Overdue,
}

impl LoanStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Repaid => "repaid",
            LoanStatus::Overdue => "overdue",
        }
    }
}

/// Account standing of a borrower. Blocked accounts cannot open new loans and
/// only leave this state through the unblock path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    Active,
    Blocked,
}

impl UserStatus {
    pub const fn label(self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Blocked => "blocked",
        }
    }
}

/// A loan against which repayments accrue. `partial_extension_used` is a
/// one-shot flag: at most one grace extension per loan, ever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub user_id: UserId,
    pub principal: u64,
    pub due_at: DateTime<Utc>,
    pub status: LoanStatus,
    pub partial_extension_used: bool,
    pub late_days: u32,
    pub opened_at: DateTime<Utc>,
}

impl Loan {
    pub fn open(
        id: LoanId,
        user_id: UserId,
        principal: u64,
        due_at: DateTime<Utc>,
        opened_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            principal,
            due_at,
            status: LoanStatus::Active,
            partial_extension_used: false,
            late_days: 0,
            opened_at,
        }
    }
}

/// A single payment against a loan. Append-only: never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repayment {
    pub id: RepaymentId,
    pub loan_id: LoanId,
    pub user_id: UserId,
    pub amount: u64,
    pub paid_at: DateTime<Utc>,
}

/// Scored-trust record for a borrower, one row per account.
///
/// `max_score_before_last_penalty` snapshots the score immediately before the
/// most recent blocking penalty and bounds all later recovery. It is never
/// cleared once set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reputation {
    pub user_id: UserId,
    pub score: i32,
    pub consecutive_late_count: u32,
    pub clean_cycle_count: u32,
    pub max_score_before_last_penalty: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

impl Reputation {
    /// Fresh reputation row for a newly registered borrower.
    pub fn starting(user_id: UserId, score: i32, at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            score,
            consecutive_late_count: 0,
            clean_cycle_count: 0,
            max_score_before_last_penalty: None,
            updated_at: at,
        }
    }
}

/// Kinds of entries in the reputation audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReputationEventKind {
    EarlyRepayment,
    LoanRepaid,
    LatePayment,
    AccountBlocked,
    AccountUnblocked,
}

impl ReputationEventKind {
    pub const fn label(self) -> &'static str {
        match self {
            ReputationEventKind::EarlyRepayment => "early_repayment",
            ReputationEventKind::LoanRepaid => "loan_repaid",
            ReputationEventKind::LatePayment => "late_payment",
            ReputationEventKind::AccountBlocked => "account_blocked",
            ReputationEventKind::AccountUnblocked => "account_unblocked",
        }
    }
}

/// Audit entry appended whenever a repayment outcome or unblock moves a
/// reputation row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationEvent {
    pub user_id: UserId,
    pub kind: ReputationEventKind,
    pub points_change: i32,
    pub previous_score: i32,
    pub new_score: i32,
    pub loan_id: Option<LoanId>,
    pub recorded_at: DateTime<Utc>,
}
