//! Lending workflows: loan repayment processing and borrower reputation.

pub mod repayments;
