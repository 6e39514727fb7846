//! Objective vector and feasibility gating for the outer optimizer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cost::{COST_SENTINEL, CostBreakdown};

use super::kpi::RunSummary;

/// Fixed-order objectives, all minimized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObjectiveVector {
    /// Fraction of hours drawing on the grid.
    pub grid_dependency: f64,
    /// Combined PV + PSH LCOE ($/kWh).
    pub lcoe_per_kwh: f64,
    /// Combined capital cost ($).
    pub capital_cost: f64,
    /// Negated storage utilization factor.
    pub neg_utilization: f64,
}

impl ObjectiveVector {
    /// Number of objectives.
    pub const LEN: usize = 4;

    /// Worst-case vector given to rejected designs.
    ///
    /// Every component is at or beyond the worst value a feasible design can
    /// reach, so the vector is dominated by any accepted design.
    pub fn rejected() -> Self {
        Self {
            grid_dependency: 1.0,
            lcoe_per_kwh: COST_SENTINEL,
            capital_cost: COST_SENTINEL,
            neg_utilization: 1.0,
        }
    }

    pub fn as_array(&self) -> [f64; Self::LEN] {
        [
            self.grid_dependency,
            self.lcoe_per_kwh,
            self.capital_cost,
            self.neg_utilization,
        ]
    }

    /// Pareto dominance: no worse in every objective and better in one.
    pub fn dominates(&self, other: &Self) -> bool {
        let a = self.as_array();
        let b = other.as_array();
        a.iter().zip(&b).all(|(x, y)| x <= y) && a.iter().zip(&b).any(|(x, y)| x < y)
    }
}

impl fmt::Display for ObjectiveVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Objectives ---")?;
        writeln!(
            f,
            "Grid dependency:       {:.4}",
            self.grid_dependency
        )?;
        writeln!(f, "PSH + PV LCOE:         {:.4} $/kWh", self.lcoe_per_kwh)?;
        writeln!(f, "Capital cost:          {:.0} $", self.capital_cost)?;
        write!(f, "Neg. utilization:      {:.4}", self.neg_utilization)
    }
}

/// Why a design received [`ObjectiveVector::rejected`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// The reservoir never reached full over the run.
    UnfilledReservoir,
    /// Peak export exceeded the allowed multiple of peak load.
    ExcessExport,
    /// A cost collaborator returned its infeasibility sentinel.
    CostSentinel,
    /// The design vector could not be simulated at all.
    InvalidGeometry,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnfilledReservoir => "unfilled_reservoir",
            Self::ExcessExport => "excess_export",
            Self::CostSentinel => "cost_sentinel",
            Self::InvalidGeometry => "invalid_geometry",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds of the feasibility gate.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RejectionPolicy {
    /// Largest allowed peak-export / peak-load ratio.
    pub max_excess_ratio: f64,
    /// Fill ratio the reservoir must reach at least once.
    pub required_fill_ratio: f64,
}

impl Default for RejectionPolicy {
    fn default() -> Self {
        Self {
            max_excess_ratio: 10.0,
            required_fill_ratio: 1.0,
        }
    }
}

/// Merges a run summary with cost figures into the objective vector.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectiveAggregator {
    policy: RejectionPolicy,
}

impl ObjectiveAggregator {
    pub fn new(policy: RejectionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RejectionPolicy {
        &self.policy
    }

    /// Returns the objectives and, for rejected designs, the first gate that failed.
    ///
    /// Gates are checked in order: fill, excess export, cost sentinel. A
    /// rejected design always gets exactly [`ObjectiveVector::rejected`].
    pub fn aggregate(
        &self,
        summary: &RunSummary,
        costs: &CostBreakdown,
    ) -> (ObjectiveVector, Option<RejectionReason>) {
        if let Some(reason) = self.rejection(summary, costs) {
            return (ObjectiveVector::rejected(), Some(reason));
        }
        let objectives = ObjectiveVector {
            grid_dependency: summary.grid_dependency_fraction,
            lcoe_per_kwh: costs.combined_lcoe(),
            capital_cost: costs.combined_capital_cost(),
            neg_utilization: -summary.utilization_factor,
        };
        (objectives, None)
    }

    fn rejection(&self, summary: &RunSummary, costs: &CostBreakdown) -> Option<RejectionReason> {
        let fill = summary.max_fill_ratio;
        if fill.is_nan() || fill < self.policy.required_fill_ratio {
            return Some(RejectionReason::UnfilledReservoir);
        }
        if summary.max_excess_ratio > self.policy.max_excess_ratio {
            return Some(RejectionReason::ExcessExport);
        }
        if costs.is_sentinel() {
            return Some(RejectionReason::CostSentinel);
        }
        None
    }
}
