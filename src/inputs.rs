//! Aligned hourly input series for one site.

use tracing::warn;

use crate::error::{SimError, SimResult};

/// Hourly irradiance, temperature, and load, all the same length.
///
/// Read-only once built; evaluators share one instance across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyInputs {
    irradiance_w_m2: Vec<f64>,
    ambient_temp_c: Vec<f64>,
    load_kw: Vec<f64>,
}

impl HourlyInputs {
    /// Validates and takes ownership of the series.
    ///
    /// Negative load samples are clamped to zero.
    ///
    /// # Errors
    ///
    /// * [`SimError::LengthMismatch`] if irradiance and load differ in length
    /// * [`SimError::InvalidInput`] if temperature differs in length or any
    ///   sample is not finite
    /// * [`SimError::EmptySeries`] if the series are empty
    pub fn new(
        irradiance_w_m2: Vec<f64>,
        ambient_temp_c: Vec<f64>,
        mut load_kw: Vec<f64>,
    ) -> SimResult<Self> {
        if irradiance_w_m2.len() != load_kw.len() {
            return Err(SimError::LengthMismatch {
                pv: irradiance_w_m2.len(),
                load: load_kw.len(),
            });
        }
        if ambient_temp_c.len() != irradiance_w_m2.len() {
            return Err(SimError::InvalidInput {
                what: format!(
                    "temperature has {} hours, irradiance has {}",
                    ambient_temp_c.len(),
                    irradiance_w_m2.len()
                ),
            });
        }
        if load_kw.is_empty() {
            return Err(SimError::EmptySeries);
        }
        for (name, series) in [
            ("irradiance", &irradiance_w_m2),
            ("temperature", &ambient_temp_c),
            ("load", &load_kw),
        ] {
            if let Some(hour) = series.iter().position(|v| !v.is_finite()) {
                return Err(SimError::InvalidInput {
                    what: format!("{name} is not finite at hour {hour}"),
                });
            }
        }

        let negative = load_kw.iter().filter(|&&v| v < 0.0).count();
        if negative > 0 {
            warn!(hours = negative, "negative load clamped to zero");
            for v in &mut load_kw {
                *v = v.max(0.0);
            }
        }

        Ok(Self {
            irradiance_w_m2,
            ambient_temp_c,
            load_kw,
        })
    }

    pub fn len(&self) -> usize {
        self.load_kw.len()
    }

    /// Always false for a constructed value.
    pub fn is_empty(&self) -> bool {
        self.load_kw.is_empty()
    }

    pub fn irradiance_w_m2(&self) -> &[f64] {
        &self.irradiance_w_m2
    }

    pub fn ambient_temp_c(&self) -> &[f64] {
        &self.ambient_temp_c
    }

    pub fn load_kw(&self) -> &[f64] {
        &self.load_kw
    }

    pub fn peak_load_kw(&self) -> f64 {
        self.load_kw.iter().copied().fold(0.0, f64::max)
    }
}
