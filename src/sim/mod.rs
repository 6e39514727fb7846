/// Hourly dispatch policy.
pub mod dispatch;
pub mod engine;
pub mod kpi;
/// Objective vector and feasibility gating.
pub mod objective;
pub mod solver;
pub mod types;
