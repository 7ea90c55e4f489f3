use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{LoanId, UserId};
use super::repository::{LendingRepository, RepositoryError};
use super::service::{RepaymentService, RepaymentServiceError};

/// Router builder exposing the lending engine over HTTP.
pub fn lending_router<R>(service: Arc<RepaymentService<R>>) -> Router
where
    R: LendingRepository + 'static,
{
    Router::new()
        .route("/api/v1/borrowers", post(register_borrower_handler::<R>))
        .route("/api/v1/loans", post(open_loan_handler::<R>))
        .route("/api/v1/loans/:loan_id/overdue", post(mark_overdue_handler::<R>))
        .route("/api/v1/repayments", post(submit_repayment_handler::<R>))
        .route(
            "/api/v1/users/:user_id/reputation",
            get(reputation_handler::<R>),
        )
        .route(
            "/api/v1/users/:user_id/reputation/history",
            get(reputation_history_handler::<R>),
        )
        .route(
            "/api/v1/users/:user_id/unblock",
            post(attempt_unblock_handler::<R>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterBorrowerRequest {
    user_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenLoanRequest {
    user_id: String,
    principal: u64,
    due_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitRepaymentRequest {
    loan_id: String,
    amount: u64,
}

pub(crate) async fn register_borrower_handler<R>(
    State(service): State<Arc<RepaymentService<R>>>,
    axum::Json(request): axum::Json<RegisterBorrowerRequest>,
) -> Response
where
    R: LendingRepository + 'static,
{
    let user_id = UserId(request.user_id);
    match service.register_borrower(&user_id, Utc::now()) {
        Ok(reputation) => (StatusCode::CREATED, axum::Json(reputation)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn open_loan_handler<R>(
    State(service): State<Arc<RepaymentService<R>>>,
    axum::Json(request): axum::Json<OpenLoanRequest>,
) -> Response
where
    R: LendingRepository + 'static,
{
    if request.principal == 0 {
        return validation_response("principal must be a positive amount");
    }

    let user_id = UserId(request.user_id);
    match service.open_loan(&user_id, request.principal, request.due_at, Utc::now()) {
        Ok(loan) => (StatusCode::CREATED, axum::Json(loan)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_repayment_handler<R>(
    State(service): State<Arc<RepaymentService<R>>>,
    axum::Json(request): axum::Json<SubmitRepaymentRequest>,
) -> Response
where
    R: LendingRepository + 'static,
{
    if request.amount == 0 {
        return validation_response("amount must be a positive amount");
    }

    let loan_id = LoanId(request.loan_id);
    match service.submit_repayment(&loan_id, request.amount, Utc::now()) {
        Ok(repayment) => (StatusCode::CREATED, axum::Json(repayment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reputation_handler<R>(
    State(service): State<Arc<RepaymentService<R>>>,
    Path(user_id): Path<String>,
) -> Response
where
    R: LendingRepository + 'static,
{
    let user_id = UserId(user_id);
    match service.reputation_score(&user_id) {
        Ok(reputation) => (StatusCode::OK, axum::Json(reputation)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reputation_history_handler<R>(
    State(service): State<Arc<RepaymentService<R>>>,
    Path(user_id): Path<String>,
) -> Response
where
    R: LendingRepository + 'static,
{
    let user_id = UserId(user_id);
    match service.reputation_history(&user_id) {
        Ok(events) => (StatusCode::OK, axum::Json(events)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn attempt_unblock_handler<R>(
    State(service): State<Arc<RepaymentService<R>>>,
    Path(user_id): Path<String>,
) -> Response
where
    R: LendingRepository + 'static,
{
    let user_id = UserId(user_id);
    match service.attempt_unblock(&user_id, Utc::now()) {
        Ok(unblocked) => {
            (StatusCode::OK, axum::Json(json!({ "unblocked": unblocked }))).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn mark_overdue_handler<R>(
    State(service): State<Arc<RepaymentService<R>>>,
    Path(loan_id): Path<String>,
) -> Response
where
    R: LendingRepository + 'static,
{
    let loan_id = LoanId(loan_id);
    match service.mark_overdue(&loan_id, Utc::now()) {
        Ok(loan) => (StatusCode::OK, axum::Json(loan)).into_response(),
        Err(error) => error_response(error),
    }
}

fn validation_response(message: &str) -> Response {
    let payload = json!({ "error": message });
    (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
}

fn error_response(error: RepaymentServiceError) -> Response {
    let status = match &error {
        RepaymentServiceError::LoanNotFound(_)
        | RepaymentServiceError::UserNotFound(_)
        | RepaymentServiceError::ReputationNotFound(_)
        | RepaymentServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        RepaymentServiceError::BorrowerExists(_)
        | RepaymentServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        RepaymentServiceError::LoanAlreadySettled(_)
        | RepaymentServiceError::LoanNotActive(_)
        | RepaymentServiceError::LoanNotPastDue(_)
        | RepaymentServiceError::UserBlocked(_)
        | RepaymentServiceError::ActiveLoanExists(_)
        | RepaymentServiceError::ScoreBelowMinimum { .. } => StatusCode::BAD_REQUEST,
        RepaymentServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
