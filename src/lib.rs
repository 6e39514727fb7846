//! Techno-economic simulator for pumped-storage hydro paired with floating PV.
//!
//! A design is a reservoir (area, depth, static head) with a motor/generator
//! rating. The PV array floats on the reservoir surface. Each design is
//! simulated over an hourly year and scored on grid dependency, combined
//! LCOE, capital cost and storage utilization.

pub mod config;
/// Parametric PSH and PV cost models.
pub mod cost;
pub mod error;
pub mod evaluate;
pub mod inputs;
pub mod io;
/// Synthetic hourly weather and load profiles.
pub mod profiles;
pub mod pv;
pub mod search;
/// Head/volume solver, dispatch, annual runner and objective modules.
pub mod sim;
