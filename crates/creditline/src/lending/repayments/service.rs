use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use super::classifier::{classify_repayment, days_past_due, Classification};
use super::domain::{
    Loan, LoanId, LoanStatus, Repayment, RepaymentId, Reputation, ReputationEvent,
    ReputationEventKind, UserId, UserStatus,
};
use super::repository::{LendingRepository, LoanSnapshot, RepositoryError, UnitOfWork};
use super::reputation::{unblock_eligible, ReputationEngine, ScorePolicy};

/// Number of audit entries returned by the reputation history projection.
const HISTORY_LIMIT: usize = 50;

static LOAN_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static REPAYMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_loan_id() -> LoanId {
    let id = LOAN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    LoanId(format!("loan-{id:06}"))
}

fn next_repayment_id() -> RepaymentId {
    let id = REPAYMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RepaymentId(format!("rp-{id:06}"))
}

/// Service sequencing repayment events against loans and the reputation
/// engine. Every mutating operation stages its writes into one [`UnitOfWork`]
/// so the repository can commit them atomically.
pub struct RepaymentService<R> {
    repository: Arc<R>,
    engine: ReputationEngine,
}

impl<R> RepaymentService<R>
where
    R: LendingRepository + 'static,
{
    pub fn new(repository: Arc<R>, policy: ScorePolicy) -> Self {
        Self {
            repository,
            engine: ReputationEngine::new(policy),
        }
    }

    pub fn policy(&self) -> &ScorePolicy {
        self.engine.policy()
    }

    /// Create a borrower account with a fresh reputation row.
    pub fn register_borrower(
        &self,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<Reputation, RepaymentServiceError> {
        if self.repository.user_status(user_id)?.is_some() {
            return Err(RepaymentServiceError::BorrowerExists(user_id.clone()));
        }

        let reputation =
            Reputation::starting(user_id.clone(), self.policy().starting_score, at);
        let unit = UnitOfWork {
            insert_user: Some((user_id.clone(), UserStatus::Active)),
            save_reputation: Some(reputation.clone()),
            ..UnitOfWork::default()
        };
        self.repository.commit(unit)?;

        info!(user = %user_id, score = reputation.score, "borrower registered");
        Ok(reputation)
    }

    /// Open a loan for a borrower who passes the standing checks: not
    /// blocked, no other active loan, and score at or above the borrowing
    /// minimum.
    pub fn open_loan(
        &self,
        user_id: &UserId,
        principal: u64,
        due_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<Loan, RepaymentServiceError> {
        let status = self
            .repository
            .user_status(user_id)?
            .ok_or_else(|| RepaymentServiceError::UserNotFound(user_id.clone()))?;
        if status == UserStatus::Blocked {
            return Err(RepaymentServiceError::UserBlocked(user_id.clone()));
        }
        if self.repository.active_loan_count(user_id)? > 0 {
            return Err(RepaymentServiceError::ActiveLoanExists(user_id.clone()));
        }

        let reputation = self
            .repository
            .reputation(user_id)?
            .ok_or_else(|| RepaymentServiceError::ReputationNotFound(user_id.clone()))?;
        let required = self.policy().min_score_to_borrow;
        if reputation.score < required {
            return Err(RepaymentServiceError::ScoreBelowMinimum {
                score: reputation.score,
                required,
            });
        }

        let loan = Loan::open(next_loan_id(), user_id.clone(), principal, due_at, at);
        let unit = UnitOfWork {
            insert_loan: Some(loan.clone()),
            ..UnitOfWork::default()
        };
        self.repository.commit(unit)?;

        info!(loan = %loan.id, user = %user_id, principal, due_at = %due_at, "loan opened");
        Ok(loan)
    }

    /// Process one repayment event: classify it, resolve or extend the loan,
    /// and apply the reputation outcome when the event resolves.
    pub fn submit_repayment(
        &self,
        loan_id: &LoanId,
        amount: u64,
        paid_at: DateTime<Utc>,
    ) -> Result<Repayment, RepaymentServiceError> {
        let snapshot = self
            .repository
            .loan_snapshot(loan_id)?
            .ok_or_else(|| RepaymentServiceError::LoanNotFound(loan_id.clone()))?;
        if snapshot.loan.status == LoanStatus::Repaid {
            return Err(RepaymentServiceError::LoanAlreadySettled(loan_id.clone()));
        }

        let outcome = classify_repayment(
            snapshot.loan.due_at,
            snapshot.outstanding(),
            amount,
            paid_at,
        );
        let repayment = Repayment {
            id: next_repayment_id(),
            loan_id: loan_id.clone(),
            user_id: snapshot.loan.user_id.clone(),
            amount,
            paid_at,
        };

        let mut unit = UnitOfWork {
            insert_repayment: Some(repayment.clone()),
            ..UnitOfWork::default()
        };
        let mut loan = snapshot.loan.clone();

        match outcome.classification {
            Classification::Partial if !loan.partial_extension_used => {
                loan.partial_extension_used = true;
                loan.due_at = loan.due_at + Duration::days(self.policy().partial_extension_days);
                unit.update_loan = Some(loan.clone());
                self.repository.commit(unit)?;
                info!(
                    loan = %loan.id,
                    due_at = %loan.due_at,
                    "partial payment recorded, one-time grace extension granted"
                );
            }
            Classification::Partial => {
                // Grace already spent: the loan stays open but the borrower
                // absorbs a late penalty.
                let days = outcome.days_past_due.max(1);
                loan.late_days = days;
                unit.update_loan = Some(loan.clone());
                let blocked = self.stage_outcome(
                    &mut unit,
                    &snapshot,
                    Classification::Late { days },
                    paid_at,
                )?;
                self.repository.commit(unit)?;
                info!(
                    loan = %loan.id,
                    days,
                    blocked,
                    "partial payment after exhausted grace treated as late"
                );
            }
            classification => {
                loan.status = LoanStatus::Repaid;
                loan.late_days = classification.late_days();
                unit.update_loan = Some(loan.clone());
                let blocked = self.stage_outcome(&mut unit, &snapshot, classification, paid_at)?;
                self.repository.commit(unit)?;
                info!(
                    loan = %loan.id,
                    classification = classification.label(),
                    blocked,
                    "loan settled"
                );
            }
        }

        Ok(repayment)
    }

    /// Apply a classified repayment outcome to a borrower's reputation.
    ///
    /// Invoked by the repayment path above; exposed for administrative
    /// replays. Returns whether the event blocked the account.
    pub fn apply_repayment_outcome(
        &self,
        user_id: &UserId,
        classification: Classification,
        loan_id: Option<&LoanId>,
        at: DateTime<Utc>,
    ) -> Result<OutcomeApplied, RepaymentServiceError> {
        let reputation = self
            .repository
            .reputation(user_id)?
            .ok_or_else(|| RepaymentServiceError::ReputationNotFound(user_id.clone()))?;

        let mut unit = UnitOfWork::default();
        let blocked =
            self.stage_transition(&mut unit, &reputation, classification, loan_id.cloned(), at);
        self.repository.commit(unit)?;

        Ok(OutcomeApplied { blocked })
    }

    /// Read-only projection of a borrower's current reputation state.
    pub fn reputation_score(
        &self,
        user_id: &UserId,
    ) -> Result<Reputation, RepaymentServiceError> {
        self.repository
            .reputation(user_id)?
            .ok_or_else(|| RepaymentServiceError::ReputationNotFound(user_id.clone()))
    }

    /// Most recent reputation audit entries, newest first.
    pub fn reputation_history(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ReputationEvent>, RepaymentServiceError> {
        Ok(self.repository.reputation_events(user_id, HISTORY_LIMIT)?)
    }

    /// Reinstate a blocked borrower when the eligibility gates hold.
    /// Returns `false` without writing anything otherwise.
    pub fn attempt_unblock(
        &self,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<bool, RepaymentServiceError> {
        let Some(status) = self.repository.user_status(user_id)? else {
            return Ok(false);
        };
        let Some(reputation) = self.repository.reputation(user_id)? else {
            return Ok(false);
        };
        let active_loans = self.repository.active_loan_count(user_id)?;

        if !unblock_eligible(status, active_loans, reputation.clean_cycle_count) {
            return Ok(false);
        }

        let unit = UnitOfWork {
            set_user_status: Some((user_id.clone(), UserStatus::Active)),
            append_event: Some(ReputationEvent {
                user_id: user_id.clone(),
                kind: ReputationEventKind::AccountUnblocked,
                points_change: 0,
                previous_score: reputation.score,
                new_score: reputation.score,
                loan_id: None,
                recorded_at: at,
            }),
            ..UnitOfWork::default()
        };
        self.repository.commit(unit)?;

        info!(user = %user_id, "borrower reinstated");
        Ok(true)
    }

    /// Administrative sweep entry point: flag an active loan past its due
    /// date as overdue. Reputation only moves on repayment events, so this
    /// touches the loan row alone.
    pub fn mark_overdue(
        &self,
        loan_id: &LoanId,
        as_of: DateTime<Utc>,
    ) -> Result<Loan, RepaymentServiceError> {
        let snapshot = self
            .repository
            .loan_snapshot(loan_id)?
            .ok_or_else(|| RepaymentServiceError::LoanNotFound(loan_id.clone()))?;

        let mut loan = snapshot.loan.clone();
        if loan.status != LoanStatus::Active {
            return Err(RepaymentServiceError::LoanNotActive(loan_id.clone()));
        }
        if as_of <= loan.due_at {
            return Err(RepaymentServiceError::LoanNotPastDue(loan_id.clone()));
        }

        loan.status = LoanStatus::Overdue;
        loan.late_days = days_past_due(loan.due_at, as_of).max(1);
        let unit = UnitOfWork {
            update_loan: Some(loan.clone()),
            ..UnitOfWork::default()
        };
        self.repository.commit(unit)?;

        warn!(loan = %loan.id, late_days = loan.late_days, "loan marked overdue");
        Ok(loan)
    }

    fn stage_outcome(
        &self,
        unit: &mut UnitOfWork,
        snapshot: &LoanSnapshot,
        classification: Classification,
        at: DateTime<Utc>,
    ) -> Result<bool, RepaymentServiceError> {
        let reputation = snapshot.reputation.as_ref().ok_or_else(|| {
            RepaymentServiceError::ReputationNotFound(snapshot.loan.user_id.clone())
        })?;
        Ok(self.stage_transition(
            unit,
            reputation,
            classification,
            Some(snapshot.loan.id.clone()),
            at,
        ))
    }

    fn stage_transition(
        &self,
        unit: &mut UnitOfWork,
        reputation: &Reputation,
        classification: Classification,
        loan_id: Option<LoanId>,
        at: DateTime<Utc>,
    ) -> bool {
        let transition = self.engine.apply(reputation, classification, at);

        if let Some(kind) = transition.event_kind {
            unit.append_event = Some(ReputationEvent {
                user_id: reputation.user_id.clone(),
                kind,
                points_change: transition.points_change,
                previous_score: reputation.score,
                new_score: transition.next.score,
                loan_id,
                recorded_at: at,
            });
        }
        if transition.blocked {
            unit.set_user_status = Some((reputation.user_id.clone(), UserStatus::Blocked));
            warn!(
                user = %reputation.user_id,
                score = transition.next.score,
                "borrower blocked after repeated lateness"
            );
        }
        unit.save_reputation = Some(transition.next);

        transition.blocked
    }
}

/// Result of applying one repayment outcome to a reputation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeApplied {
    pub blocked: bool,
}

/// Error raised by the repayment service.
#[derive(Debug, thiserror::Error)]
pub enum RepaymentServiceError {
    #[error("loan {0} not found")]
    LoanNotFound(LoanId),
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("reputation for user {0} not found")]
    ReputationNotFound(UserId),
    #[error("borrower {0} already registered")]
    BorrowerExists(UserId),
    #[error("loan {0} is already repaid")]
    LoanAlreadySettled(LoanId),
    #[error("loan {0} is not active")]
    LoanNotActive(LoanId),
    #[error("loan {0} is not past due")]
    LoanNotPastDue(LoanId),
    #[error("user {0} is blocked from borrowing")]
    UserBlocked(UserId),
    #[error("user {0} already has an active loan")]
    ActiveLoanExists(UserId),
    #[error("reputation score {score} is below the borrowing minimum {required}")]
    ScoreBelowMinimum { score: i32, required: i32 },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
