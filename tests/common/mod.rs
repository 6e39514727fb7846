//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use psh_fpv_sim::inputs::HourlyInputs;
use psh_fpv_sim::sim::dispatch::GridRefill;
use psh_fpv_sim::sim::engine::Engine;
use psh_fpv_sim::sim::solver::HeadVolumeSolver;
use psh_fpv_sim::sim::types::ReservoirDesign;

/// Small test reservoir: 100 m² by 10 m deep at 90 m static head, 50 kW machine.
///
/// Full volume is 1000 m³ and the default solver grid spaces candidates 20 m³ apart.
pub fn small_design() -> ReservoirDesign {
    ReservoirDesign::new(100.0, 10.0, 90.0, 50.0).expect("valid design")
}

/// Engine over [`small_design`] with default solver constants.
pub fn small_engine(refill: GridRefill, initial_fill: f64) -> Engine {
    Engine::new(small_design(), HeadVolumeSolver::default(), refill, initial_fill)
}

/// A constant series of `hours` values.
pub fn constant(hours: usize, value: f64) -> Vec<f64> {
    vec![value; hours]
}

/// Daily PV bell (0 at night, `peak_kw` at noon) repeated for `days`.
pub fn daily_pv(days: usize, peak_kw: f64) -> Vec<f64> {
    (0..days * 24)
        .map(|h| {
            let hour = (h % 24) as f64;
            if (6.0..18.0).contains(&hour) {
                peak_kw * (std::f64::consts::PI * (hour - 6.0) / 12.0).sin()
            } else {
                0.0
            }
        })
        .collect()
}

/// Hourly inputs with a daily irradiance bell, 20 °C, and a constant load.
pub fn daily_inputs(days: usize, peak_irradiance: f64, load_kw: f64) -> HourlyInputs {
    let irradiance = daily_pv(days, peak_irradiance);
    let hours = irradiance.len();
    HourlyInputs::new(irradiance, constant(hours, 20.0), constant(hours, load_kw))
        .expect("valid inputs")
}
