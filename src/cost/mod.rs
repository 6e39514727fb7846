//! Capital-cost and LCOE collaborators for the PSH facility and the floating PV plant.
//!
//! The evaluator only depends on the [`PshCostModel`] and [`PvCostModel`]
//! traits. The bundled parametric models are simple closed-form stand-ins;
//! a detailed regression model can be plugged in behind the same traits.
//!
//! Infeasible inputs are signaled in-band with [`COST_SENTINEL`] rather than
//! with an error so the objective function stays total.

mod psh;
mod pv;

pub use psh::ParametricPshCost;
pub use pv::ParametricPvCost;

use serde::Serialize;

/// Cost value that marks an infeasible sizing.
pub const COST_SENTINEL: f64 = 1e9;

/// Whether a cost figure is the sentinel (or not a usable number).
pub fn is_sentinel(value: f64) -> bool {
    value.is_nan() || value >= COST_SENTINEL
}

/// Sizing parameters handed to a PSH cost model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PshSizing {
    pub area_m2: f64,
    pub max_depth_m: f64,
    pub static_head_m: f64,
    /// Installed capacity; `None` lets the model size the machines itself.
    pub capacity_kw: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PshCostEstimate {
    /// Total capital cost ($).
    pub capital_cost: f64,
    pub cost_per_kw: f64,
    pub cost_per_kwh: f64,
    /// Machine rating the model would install for this geometry (kW).
    pub recommended_capacity_kw: f64,
}

impl PshCostEstimate {
    pub fn sentinel() -> Self {
        Self {
            capital_cost: COST_SENTINEL,
            cost_per_kw: COST_SENTINEL,
            cost_per_kwh: COST_SENTINEL,
            recommended_capacity_kw: 0.0,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        is_sentinel(self.capital_cost) || is_sentinel(self.cost_per_kwh)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PvCostEstimate {
    /// Levelized cost of PV energy ($/kWh).
    pub lcoe_per_kwh: f64,
    /// Total capital cost ($).
    pub capital_cost: f64,
}

impl PvCostEstimate {
    pub fn sentinel() -> Self {
        Self {
            lcoe_per_kwh: COST_SENTINEL,
            capital_cost: COST_SENTINEL,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        is_sentinel(self.lcoe_per_kwh) || is_sentinel(self.capital_cost)
    }
}

/// Cost figures for one design, both plants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub psh: PshCostEstimate,
    pub pv: PvCostEstimate,
}

impl CostBreakdown {
    /// PV LCOE plus PSH cost per kWh of storage.
    pub fn combined_lcoe(&self) -> f64 {
        self.pv.lcoe_per_kwh + self.psh.cost_per_kwh
    }

    pub fn combined_capital_cost(&self) -> f64 {
        self.pv.capital_cost + self.psh.capital_cost
    }

    /// True if either collaborator flagged the sizing as infeasible.
    pub fn is_sentinel(&self) -> bool {
        self.psh.is_sentinel()
            || self.pv.is_sentinel()
            || is_sentinel(self.combined_lcoe())
            || is_sentinel(self.combined_capital_cost())
    }
}

/// Capital cost of a pumped-storage facility.
pub trait PshCostModel: Send + Sync {
    fn estimate(&self, sizing: &PshSizing) -> PshCostEstimate;
}

/// Capital cost and LCOE of a floating PV plant.
pub trait PvCostModel: Send + Sync {
    fn estimate(&self, capacity_kw: f64) -> PvCostEstimate;
}
