//! Repayment processing and borrower reputation.
//!
//! The engine splits into three layers: a pure classifier mapping one payment
//! against a loan schedule to an outcome, a pure reputation state machine
//! applying that outcome to a scored-trust row, and an orchestration service
//! that sequences both against a transactional repository. Repayments are
//! append-only; loans and reputation rows are the only mutable state, and
//! every mutation for one event commits as a single unit of work.

pub(crate) mod classifier;
pub mod domain;
pub mod repository;
pub(crate) mod reputation;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use classifier::{classify_repayment, Classification, RepaymentOutcome};
pub use domain::{
    Loan, LoanId, LoanStatus, Repayment, RepaymentId, Reputation, ReputationEvent,
    ReputationEventKind, UserId, UserStatus,
};
pub use repository::{LendingRepository, LoanSnapshot, RepositoryError, UnitOfWork};
pub use reputation::{ReputationEngine, ReputationTransition, ScorePolicy};
pub use router::lending_router;
pub use service::{OutcomeApplied, RepaymentService, RepaymentServiceError};
