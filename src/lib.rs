//! Academic risk early warning.
//!
//! The scoring engine (`snapshot`, `risk`, `trend`, `subject`) is pure and
//! synchronous. `db`, `config` and `report` are the collaborators the CLI
//! wires around it.

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod report;
pub mod risk;
pub mod snapshot;
pub mod subject;
pub mod trend;

pub use models::{RiskAssessment, RiskFactors, RiskLevel, RiskTrendResult, Trend};
pub use risk::RiskEngine;
pub use snapshot::PerformanceSnapshot;
