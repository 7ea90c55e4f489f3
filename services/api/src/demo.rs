use crate::infra::{default_score_policy, InMemoryLendingRepository};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use creditline::error::AppError;
use creditline::lending::repayments::{RepaymentService, UserId};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Loan principal used by the scripted borrowers
    #[arg(long, default_value_t = 1_000)]
    pub(crate) principal: u64,
    /// Days until the scripted loans fall due
    #[arg(long, default_value_t = 5)]
    pub(crate) term_days: i64,
}

/// Walk the full engine on two synthetic borrowers: one building a clean
/// streak, one exhausting the grace window, getting blocked, and recovering.
pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        principal,
        term_days,
    } = args;

    let repository = Arc::new(InMemoryLendingRepository::default());
    let service = RepaymentService::new(repository, default_score_policy());
    let t0 = Utc::now();
    let day = |offset: i64| t0 + Duration::days(offset);
    let half_day = Duration::hours(12);

    println!("Creditline repayment demo");
    println!(
        "Principal {} due {} day(s) after opening",
        principal, term_days
    );

    run_reliable_borrower(&service, principal, term_days, day)?;
    run_recovering_borrower(&service, principal, term_days, day, half_day)?;

    Ok(())
}

fn run_reliable_borrower(
    service: &RepaymentService<InMemoryLendingRepository>,
    principal: u64,
    term_days: i64,
    day: impl Fn(i64) -> DateTime<Utc>,
) -> Result<(), AppError> {
    let user = UserId("demo-reliable".to_string());
    let reputation = service.register_borrower(&user, day(0))?;
    println!("\nReliable borrower {} (score {})", user, reputation.score);

    for cycle in 0..3 {
        let opened_at = day(cycle * (term_days + 2));
        let due_at = opened_at + Duration::days(term_days);
        let loan = service.open_loan(&user, principal, due_at, opened_at)?;
        service.submit_repayment(&loan.id, principal, due_at)?;
        let reputation = service.reputation_score(&user)?;
        println!(
            "- cycle {}: {} settled on time -> score {} (clean cycles {})",
            cycle + 1,
            loan.id,
            reputation.score,
            reputation.clean_cycle_count
        );
    }

    Ok(())
}

fn run_recovering_borrower(
    service: &RepaymentService<InMemoryLendingRepository>,
    principal: u64,
    term_days: i64,
    day: impl Fn(i64) -> DateTime<Utc>,
    half_day: Duration,
) -> Result<(), AppError> {
    let user = UserId("demo-fragile".to_string());
    let reputation = service.register_borrower(&user, day(0))?;
    println!("\nFragile borrower {} (score {})", user, reputation.score);

    let loan = service.open_loan(&user, principal, day(term_days), day(0))?;
    let first = principal * 3 / 10;
    let second = principal * 2 / 10;
    let third = principal / 10;
    let remainder = principal - first - second - third;

    service.submit_repayment(&loan.id, first, day(term_days + 1))?;
    println!(
        "- partial {} past due -> one-time grace extension, score {}",
        first,
        service.reputation_score(&user)?.score
    );

    service.submit_repayment(&loan.id, second, day(term_days + 1) + Duration::hours(6))?;
    println!(
        "- partial {} with grace spent -> late penalty, score {}",
        second,
        service.reputation_score(&user)?.score
    );

    service.submit_repayment(&loan.id, third, day(term_days + 2))?;
    let reputation = service.reputation_score(&user)?;
    println!(
        "- partial {} -> escalated penalty, score {}, recovery capped at {:?}",
        third, reputation.score, reputation.max_score_before_last_penalty
    );

    let unblocked = service.attempt_unblock(&user, day(term_days + 2))?;
    println!("- unblock attempt with the loan still open: {}", unblocked);

    service.submit_repayment(&loan.id, remainder, day(term_days + 2) + half_day)?;
    let reputation = service.reputation_score(&user)?;
    println!(
        "- settled {} inside the extension -> clean cycle, score {}",
        remainder, reputation.score
    );

    let unblocked = service.attempt_unblock(&user, day(term_days + 3))?;
    println!("- unblock attempt after settlement: {}", unblocked);

    let loan = service.open_loan(
        &user,
        principal / 2,
        day(term_days + 15),
        day(term_days + 3),
    )?;
    service.submit_repayment(&loan.id, principal / 2, day(term_days + 10))?;
    let reputation = service.reputation_score(&user)?;
    println!(
        "- early settlement of {} -> score {} (cap {:?})",
        loan.id, reputation.score, reputation.max_score_before_last_penalty
    );

    println!("- reputation history (newest first):");
    for event in service.reputation_history(&user)? {
        println!(
            "  - {}: {:+} ({} -> {})",
            event.kind.label(),
            event.points_change,
            event.previous_score,
            event.new_score
        );
    }

    Ok(())
}
