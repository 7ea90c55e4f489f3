use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::lending::repayments::domain::{
    Loan, LoanId, LoanStatus, Repayment, Reputation, ReputationEvent, UserId, UserStatus,
};
use crate::lending::repayments::repository::{
    LendingRepository, LoanSnapshot, RepositoryError, UnitOfWork,
};
use crate::lending::repayments::{RepaymentService, ScorePolicy};

/// Fixed reference clock for deterministic schedules: day 0 at noon UTC.
pub(super) fn dt(day: i64) -> DateTime<Utc> {
    dt_h(day, 0)
}

pub(super) fn dt_h(day: i64, hours: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
        + Duration::days(day)
        + Duration::hours(hours)
}

pub(super) fn policy() -> ScorePolicy {
    ScorePolicy::default()
}

pub(super) fn reputation(
    score: i32,
    consecutive_late_count: u32,
    clean_cycle_count: u32,
    max_score_before_last_penalty: Option<i32>,
) -> Reputation {
    Reputation {
        user_id: UserId("user-1".to_string()),
        score,
        consecutive_late_count,
        clean_cycle_count,
        max_score_before_last_penalty,
        updated_at: dt(0),
    }
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<UserId, UserStatus>,
    reputations: HashMap<UserId, Reputation>,
    loans: HashMap<LoanId, Loan>,
    repayments: Vec<Repayment>,
    events: Vec<ReputationEvent>,
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryRepository {
    pub(super) fn loan(&self, id: &LoanId) -> Option<Loan> {
        self.inner.lock().expect("store mutex poisoned").loans.get(id).cloned()
    }

    pub(super) fn repayment_count(&self) -> usize {
        self.inner.lock().expect("store mutex poisoned").repayments.len()
    }

    pub(super) fn events(&self) -> Vec<ReputationEvent> {
        self.inner.lock().expect("store mutex poisoned").events.clone()
    }

    /// Seed raw rows directly, bypassing the service. Used to stage invariant
    /// violations the public API cannot produce.
    pub(super) fn seed_user_and_loan(&self, user_id: &UserId, loan: Loan) {
        let mut state = self.inner.lock().expect("store mutex poisoned");
        state.users.insert(user_id.clone(), UserStatus::Active);
        state.loans.insert(loan.id.clone(), loan);
    }
}

impl LendingRepository for MemoryRepository {
    fn loan_snapshot(&self, id: &LoanId) -> Result<Option<LoanSnapshot>, RepositoryError> {
        let state = self.inner.lock().expect("store mutex poisoned");
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
        let state = self.inner.lock().expect("store mutex poisoned");
        Ok(state.reputations.get(user_id).cloned())
    }

    fn reputation_events(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<ReputationEvent>, RepositoryError> {
        let state = self.inner.lock().expect("store mutex poisoned");
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
        let state = self.inner.lock().expect("store mutex poisoned");
        Ok(state.users.get(user_id).copied())
    }

    fn active_loan_count(&self, user_id: &UserId) -> Result<usize, RepositoryError> {
        let state = self.inner.lock().expect("store mutex poisoned");
        Ok(state
            .loans
            .values()
            .filter(|loan| loan.user_id == *user_id && loan.status == LoanStatus::Active)
            .count())
    }

    fn commit(&self, unit: UnitOfWork) -> Result<(), RepositoryError> {
        let mut state = self.inner.lock().expect("store mutex poisoned");

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
            state.reputations.insert(reputation.user_id.clone(), reputation);
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

pub(super) struct UnavailableRepository;

impl LendingRepository for UnavailableRepository {
    fn loan_snapshot(&self, _id: &LoanId) -> Result<Option<LoanSnapshot>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn reputation(&self, _user_id: &UserId) -> Result<Option<Reputation>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn reputation_events(
        &self,
        _user_id: &UserId,
        _limit: usize,
    ) -> Result<Vec<ReputationEvent>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn user_status(&self, _user_id: &UserId) -> Result<Option<UserStatus>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn active_loan_count(&self, _user_id: &UserId) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn commit(&self, _unit: UnitOfWork) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn build_service() -> (RepaymentService<MemoryRepository>, Arc<MemoryRepository>) {
    build_service_with_policy(policy())
}

pub(super) fn build_service_with_policy(
    policy: ScorePolicy,
) -> (RepaymentService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = RepaymentService::new(repository.clone(), policy);
    (service, repository)
}

pub(super) fn borrower(service: &RepaymentService<MemoryRepository>, name: &str) -> UserId {
    let user_id = UserId(name.to_string());
    service
        .register_borrower(&user_id, dt(0))
        .expect("borrower registers");
    user_id
}

pub(super) fn open_loan(
    service: &RepaymentService<MemoryRepository>,
    user_id: &UserId,
    principal: u64,
    due_day: i64,
) -> Loan {
    service
        .open_loan(user_id, principal, dt(due_day), dt(0))
        .expect("loan opens")
}

pub(super) async fn read_json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
