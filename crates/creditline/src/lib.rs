//! Reputation-scored lending engine.
//!
//! The crate is organized around the `lending::repayments` module: a pure
//! repayment classifier, a deterministic reputation state machine, and an
//! orchestration service that applies both against a transactional
//! repository. Configuration, telemetry, and the shared error surface live
//! alongside it so the HTTP service binary stays thin.

pub mod config;
pub mod error;
pub mod lending;
pub mod telemetry;
