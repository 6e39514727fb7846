//! Crate-wide error type.

use thiserror::Error;

use crate::config::ConfigError;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Error, Debug)]
pub enum SimError {
    /// PV and load series disagree on length; a data-pipeline bug upstream.
    #[error("series length mismatch: pv has {pv} hours, load has {load} hours")]
    LengthMismatch { pv: usize, load: usize },

    #[error("hourly series is empty")]
    EmptySeries,

    #[error("invalid design: {what} must be > 0 (got {value})")]
    InvalidDesign { what: &'static str, value: f64 },

    #[error("invalid input: {what}")]
    InvalidInput { what: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
