use super::super::domain::UserStatus;

/// Whether a blocked borrower qualifies for reinstatement.
///
/// All three gates must hold: currently blocked, no active loans, and at
/// least one clean repayment cycle on record.
pub(crate) fn unblock_eligible(
    status: UserStatus,
    active_loans: usize,
    clean_cycle_count: u32,
) -> bool {
    status == UserStatus::Blocked && active_loans == 0 && clean_cycle_count >= 1
}
