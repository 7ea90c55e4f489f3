use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use creditline::lending::repayments::{
    LendingRepository, Loan, LoanId, LoanSnapshot, LoanStatus, Repayment, Reputation,
    ReputationEvent, RepositoryError, ScorePolicy, UnitOfWork, UserId, UserStatus,
};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct LendingState {
    users: HashMap<UserId, UserStatus>,
    reputations: HashMap<UserId, Reputation>,
    loans: HashMap<LoanId, Loan>,
    repayments: Vec<Repayment>,
    events: Vec<ReputationEvent>,
}

/// Single-process store backing the service. One mutex over the whole state
/// gives every committed unit of work the required atomicity.
#[derive(Default, Clone)]
pub(crate) struct InMemoryLendingRepository {
    inner: Arc<Mutex<LendingState>>,
}

impl LendingRepository for InMemoryLendingRepository {
    fn loan_snapshot(&self, id: &LoanId) -> Result<Option<LoanSnapshot>, RepositoryError> {
        let state = self.inner.lock().expect("repository mutex poisoned");
        let Some(loan) = state.loans.get(id).cloned() else {
            return Ok(None);
        };
        let repayments = state
            .repayments
            .iter()
            .filter(|repayment| repayment.loan_id == *id)
            .cloned()
            .collect();
        let user_status = state
            .users
            .get(&loan.user_id)
            .copied()
            .ok_or(RepositoryError::NotFound)?;
        let reputation = state.reputations.get(&loan.user_id).cloned();
        Ok(Some(LoanSnapshot {
            loan,
            repayments,
            user_status,
            reputation,
        }))
    }

    fn reputation(&self, user_id: &UserId) -> Result<Option<Reputation>, RepositoryError> {
        let state = self.inner.lock().expect("repository mutex poisoned");
        Ok(state.reputations.get(user_id).cloned())
    }

    fn reputation_events(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<ReputationEvent>, RepositoryError> {
        let state = self.inner.lock().expect("repository mutex poisoned");
        Ok(state
            .events
            .iter()
            .rev()
            .filter(|event| event.user_id == *user_id)
            .take(limit)
            .cloned()
            .collect())
    }

    fn user_status(&self, user_id: &UserId) -> Result<Option<UserStatus>, RepositoryError> {
        let state = self.inner.lock().expect("repository mutex poisoned");
        Ok(state.users.get(user_id).copied())
    }

    fn active_loan_count(&self, user_id: &UserId) -> Result<usize, RepositoryError> {
        let state = self.inner.lock().expect("repository mutex poisoned");
        Ok(state
            .loans
            .values()
            .filter(|loan| loan.user_id == *user_id && loan.status == LoanStatus::Active)
            .count())
    }

    fn commit(&self, unit: UnitOfWork) -> Result<(), RepositoryError> {
        let mut state = self.inner.lock().expect("repository mutex poisoned");

        // Validate the whole write set before touching anything so a failed
        // commit leaves no partial state behind.
        if let Some((user_id, _)) = &unit.insert_user {
            if state.users.contains_key(user_id) {
                return Err(RepositoryError::Conflict);
            }
        }
        if let Some(loan) = &unit.insert_loan {
            if state.loans.contains_key(&loan.id) {
                return Err(RepositoryError::Conflict);
            }
        }
        if let Some(loan) = &unit.update_loan {
            if !state.loans.contains_key(&loan.id) {
                return Err(RepositoryError::NotFound);
            }
        }
        if let Some((user_id, _)) = &unit.set_user_status {
            if !state.users.contains_key(user_id) {
                return Err(RepositoryError::NotFound);
            }
        }

        if let Some((user_id, status)) = unit.insert_user {
            state.users.insert(user_id, status);
        }
        if let Some(loan) = unit.insert_loan {
            state.loans.insert(loan.id.clone(), loan);
        }
        if let Some(repayment) = unit.insert_repayment {
            state.repayments.push(repayment);
        }
        if let Some(loan) = unit.update_loan {
            state.loans.insert(loan.id.clone(), loan);
        }
        if let Some(reputation) = unit.save_reputation {
            state
                .reputations
                .insert(reputation.user_id.clone(), reputation);
        }
        if let Some(event) = unit.append_event {
            state.events.push(event);
        }
        if let Some((user_id, status)) = unit.set_user_status {
            state.users.insert(user_id, status);
        }

        Ok(())
    }
}

pub(crate) fn default_score_policy() -> ScorePolicy {
    ScorePolicy::default()
}
