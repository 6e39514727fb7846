/// CSV export of hourly telemetry and Pareto fronts.
pub mod export;
pub mod series;
