//! Parametric LCOE of a floating PV plant.

use serde::{Deserialize, Serialize};

use super::{PvCostEstimate, PvCostModel};

/// Discounted-cash-flow PV cost model.
///
/// LCOE is the present value of capital plus O&M over the present value of
/// degraded annual production.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParametricPvCost {
    /// Installed cost ($/kW).
    pub capex_per_kw: f64,
    /// Fixed O&M ($/kW/yr).
    pub om_per_kw_year: f64,
    /// First-year specific yield (kWh/kW/yr).
    pub specific_yield_kwh_per_kw: f64,
    /// Annual production degradation.
    pub degradation_rate: f64,
    /// Real discount rate.
    pub discount_rate: f64,
    pub lifetime_years: u32,
}

impl Default for ParametricPvCost {
    fn default() -> Self {
        Self {
            capex_per_kw: 1285.24,
            om_per_kw_year: 15.5,
            specific_yield_kwh_per_kw: 1527.5,
            degradation_rate: 0.007,
            discount_rate: 0.05,
            lifetime_years: 30,
        }
    }
}

impl PvCostModel for ParametricPvCost {
    fn estimate(&self, capacity_kw: f64) -> PvCostEstimate {
        if !(capacity_kw.is_finite() && capacity_kw > 0.0) || self.lifetime_years == 0 {
            return PvCostEstimate::sentinel();
        }

        let capital_cost = capacity_kw * self.capex_per_kw;
        let om = capacity_kw * self.om_per_kw_year;
        let first_year_kwh = capacity_kw * self.specific_yield_kwh_per_kw;

        let (cost_pv, energy_pv) = (1..=self.lifetime_years).fold((0.0, 0.0), |(c, e), year| {
            let df = (1.0 + self.discount_rate).powi(year as i32);
            let produced = first_year_kwh * (1.0 - self.degradation_rate).powi(year as i32 - 1);
            (c + om / df, e + produced / df)
        });

        if energy_pv <= 0.0 {
            return PvCostEstimate::sentinel();
        }

        PvCostEstimate {
            lcoe_per_kwh: (capital_cost + cost_pv) / energy_pv,
            capital_cost,
        }
    }
}
