use super::domain::{
    Loan, LoanId, Repayment, Reputation, ReputationEvent, UserId, UserStatus,
};

/// Aggregate read used by the orchestration layer: the loan, its append-only
/// repayment ledger, and the borrower's account state in one fetch.
#[derive(Debug, Clone)]
pub struct LoanSnapshot {
    pub loan: Loan,
    pub repayments: Vec<Repayment>,
    pub user_status: UserStatus,
    pub reputation: Option<Reputation>,
}

impl LoanSnapshot {
    /// Principal still owed after all recorded repayments.
    pub fn outstanding(&self) -> u64 {
        let repaid: u64 = self.repayments.iter().map(|r| r.amount).sum();
        self.loan.principal.saturating_sub(repaid)
    }
}

/// Write set for one orchestration step. The repository applies every
/// populated field atomically or none at all.
#[derive(Debug, Clone, Default)]
pub struct UnitOfWork {
    pub insert_user: Option<(UserId, UserStatus)>,
    pub insert_loan: Option<Loan>,
    pub insert_repayment: Option<Repayment>,
    pub update_loan: Option<Loan>,
    pub save_reputation: Option<Reputation>,
    pub append_event: Option<ReputationEvent>,
    pub set_user_status: Option<(UserId, UserStatus)>,
}

/// Storage abstraction so the service module can be exercised in isolation.
///
/// Reads are point-in-time; all writes flow through [`UnitOfWork`] commits so
/// a repayment insert, loan update, and reputation/user mutation land in one
/// transaction.
pub trait LendingRepository: Send + Sync {
    fn loan_snapshot(&self, id: &LoanId) -> Result<Option<LoanSnapshot>, RepositoryError>;
    fn reputation(&self, user_id: &UserId) -> Result<Option<Reputation>, RepositoryError>;
    fn reputation_events(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<ReputationEvent>, RepositoryError>;
    fn user_status(&self, user_id: &UserId) -> Result<Option<UserStatus>, RepositoryError>;
    fn active_loan_count(&self, user_id: &UserId) -> Result<usize, RepositoryError>;
    fn commit(&self, unit: UnitOfWork) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
