use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// How a single repayment relates to the loan schedule.
///
/// `Late` carries the number of whole or partial days past due, always at
/// least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Early,
    OnTime,
    Partial,
    Late { days: u32 },
}

impl Classification {
    pub const fn label(self) -> &'static str {
        match self {
            Classification::Early => "early",
            Classification::OnTime => "on_time",
            Classification::Partial => "partial",
            Classification::Late { .. } => "late",
        }
    }

    pub fn late_days(self) -> u32 {
        match self {
            Classification::Late { days } => days,
            _ => 0,
        }
    }

    /// Early and on-time settlements count toward clean-cycle streaks.
    pub fn is_clean(self) -> bool {
        matches!(self, Classification::Early | Classification::OnTime)
    }
}

/// Result of classifying one payment against a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepaymentOutcome {
    pub classification: Classification,
    /// Days elapsed past the due date at payment time, 0 when not yet due.
    pub days_past_due: u32,
    /// True when this payment settles the outstanding balance in full.
    pub settles_loan: bool,
}

/// Classify a payment of `payment_amount` made at `paid_at` against a loan
/// with `outstanding` still owed and due at `due_at`.
///
/// The due-date boundary is half-open: a full settlement at exactly `due_at`
/// is on time, one made at least a full day before is early, and anything
/// after `due_at` is late. Pure and deterministic; callers supply the clock.
pub fn classify_repayment(
    due_at: DateTime<Utc>,
    outstanding: u64,
    payment_amount: u64,
    paid_at: DateTime<Utc>,
) -> RepaymentOutcome {
    let days_past_due = days_past_due(due_at, paid_at);

    if payment_amount < outstanding {
        return RepaymentOutcome {
            classification: Classification::Partial,
            days_past_due,
            settles_loan: false,
        };
    }

    let early_threshold = due_at - Duration::days(1);
    let classification = if paid_at <= early_threshold {
        Classification::Early
    } else if paid_at <= due_at {
        Classification::OnTime
    } else {
        Classification::Late {
            days: days_past_due.max(1),
        }
    };

    RepaymentOutcome {
        classification,
        days_past_due,
        settles_loan: true,
    }
}

pub(crate) fn days_past_due(due_at: DateTime<Utc>, paid_at: DateTime<Utc>) -> u32 {
    let overdue = paid_at.signed_duration_since(due_at);
    if overdue <= Duration::zero() {
        return 0;
    }
    let millis = overdue.num_milliseconds();
    ((millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY) as u32
}
