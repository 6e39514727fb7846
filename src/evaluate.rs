//! Objective function: design vector in, objective vector out.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cost::{
    CostBreakdown, ParametricPshCost, ParametricPvCost, PshCostEstimate, PshCostModel, PshSizing,
    PvCostModel,
};
use crate::error::{SimError, SimResult};
use crate::inputs::HourlyInputs;
use crate::pv::FloatingPvArray;
use crate::sim::dispatch::GridRefill;
use crate::sim::engine::{DEFAULT_INITIAL_FILL, Engine, SimulationOutput};
use crate::sim::kpi::RunSummary;
use crate::sim::objective::{ObjectiveAggregator, ObjectiveVector, RejectionReason};
use crate::sim::solver::HeadVolumeSolver;
use crate::sim::types::ReservoirDesign;

/// Decision variables searched by the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DesignVector {
    /// Reservoir surface area (m²).
    pub area_m2: f64,
    /// Maximum water depth (m).
    pub max_depth_m: f64,
    /// Static head (m).
    pub static_head_m: f64,
    /// Motor/generator rating (kW); only read when capacity comes from the design.
    pub capacity_kw: Option<f64>,
}

impl Default for DesignVector {
    fn default() -> Self {
        Self {
            area_m2: 1600.0,
            max_depth_m: 2.0,
            static_head_m: 90.0,
            capacity_kw: Some(55.0),
        }
    }
}

impl FromStr for DesignVector {
    type Err = SimError;

    /// Parses `area,depth,head[,capacity]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if !(3..=4).contains(&parts.len()) {
            return Err(SimError::InvalidInput {
                what: format!("design \"{s}\" must be area,depth,head[,capacity]"),
            });
        }
        let mut values = Vec::with_capacity(parts.len());
        for p in &parts {
            let v = p.parse::<f64>().map_err(|e| SimError::InvalidInput {
                what: format!("design component \"{p}\": {e}"),
            })?;
            values.push(v);
        }
        Ok(Self {
            area_m2: values[0],
            max_depth_m: values[1],
            static_head_m: values[2],
            capacity_kw: values.get(3).copied(),
        })
    }
}

impl fmt::Display for DesignVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "area={:.1} m2 depth={:.2} m head={:.2} m",
            self.area_m2, self.max_depth_m, self.static_head_m
        )?;
        if let Some(kw) = self.capacity_kw {
            write!(f, " capacity={kw:.1} kW")?;
        }
        Ok(())
    }
}

/// Where the motor/generator rating comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacitySource {
    /// The design vector's own `capacity_kw`.
    #[default]
    Design,
    /// The PSH cost model's recommended rating for the geometry.
    CostModel,
    /// A fixed share of the PV array's rated capacity.
    PvFraction,
}

/// Capacity resolution settings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapacityConfig {
    pub source: CapacitySource,
    /// Share of PV capacity used with [`CapacitySource::PvFraction`].
    pub pv_fraction: f64,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            source: CapacitySource::Design,
            pv_fraction: 0.25,
        }
    }
}

/// Everything known about one evaluated design.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub design: DesignVector,
    pub objectives: ObjectiveVector,
    pub rejection: Option<RejectionReason>,
    /// Present whenever the year was simulated.
    pub summary: Option<RunSummary>,
    pub costs: Option<CostBreakdown>,
    /// Resolved motor/generator rating (kW); 0 if it could not be resolved.
    pub capacity_kw: f64,
    /// PV rated capacity (kW).
    pub pv_capacity_kw: f64,
}

impl Evaluation {
    pub fn is_feasible(&self) -> bool {
        self.rejection.is_none()
    }

    fn invalid(design: DesignVector, pv_capacity_kw: f64) -> Self {
        Self {
            design,
            objectives: ObjectiveVector::rejected(),
            rejection: Some(RejectionReason::InvalidGeometry),
            summary: None,
            costs: None,
            capacity_kw: 0.0,
            pv_capacity_kw,
        }
    }
}

/// Simulation setup shared by every evaluated design.
///
/// Borrowed immutably by [`Evaluator::evaluate`], so one evaluator can serve
/// a whole population in parallel.
pub struct Evaluator {
    inputs: HourlyInputs,
    pv_array: FloatingPvArray,
    psh_cost: Box<dyn PshCostModel>,
    pv_cost: Box<dyn PvCostModel>,
    solver: HeadVolumeSolver,
    refill: GridRefill,
    initial_fill: f64,
    capacity: CapacityConfig,
    aggregator: ObjectiveAggregator,
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("hours", &self.inputs.len())
            .field("pv_array", &self.pv_array)
            .field("solver", &self.solver)
            .field("refill", &self.refill)
            .field("initial_fill", &self.initial_fill)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl Evaluator {
    /// Evaluator with default physics, parametric cost models, and design-supplied capacity.
    pub fn new(inputs: HourlyInputs) -> Self {
        Self {
            inputs,
            pv_array: FloatingPvArray::default(),
            psh_cost: Box::new(ParametricPshCost::default()),
            pv_cost: Box::new(ParametricPvCost::default()),
            solver: HeadVolumeSolver::default(),
            refill: GridRefill::default(),
            initial_fill: DEFAULT_INITIAL_FILL,
            capacity: CapacityConfig::default(),
            aggregator: ObjectiveAggregator::default(),
        }
    }

    pub fn with_pv_array(mut self, pv_array: FloatingPvArray) -> Self {
        self.pv_array = pv_array;
        self
    }

    pub fn with_cost_models(
        mut self,
        psh_cost: impl PshCostModel + 'static,
        pv_cost: impl PvCostModel + 'static,
    ) -> Self {
        self.psh_cost = Box::new(psh_cost);
        self.pv_cost = Box::new(pv_cost);
        self
    }

    pub fn with_solver(mut self, solver: HeadVolumeSolver) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_refill(mut self, refill: GridRefill) -> Self {
        self.refill = refill;
        self
    }

    pub fn with_initial_fill(mut self, initial_fill: f64) -> Self {
        self.initial_fill = initial_fill;
        self
    }

    pub fn with_capacity(mut self, capacity: CapacityConfig) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_aggregator(mut self, aggregator: ObjectiveAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn inputs(&self) -> &HourlyInputs {
        &self.inputs
    }

    /// PV output for a reservoir of the given area.
    pub fn pv_series_kw(&self, area_m2: f64) -> Vec<f64> {
        self.pv_array.series_kw(
            area_m2,
            self.inputs.irradiance_w_m2(),
            self.inputs.ambient_temp_c(),
        )
    }

    /// Evaluates one design. Defined for every input: designs that cannot be
    /// simulated get the rejected vector instead of an error.
    pub fn evaluate(&self, design: &DesignVector) -> Evaluation {
        let geometry_ok = [design.area_m2, design.max_depth_m, design.static_head_m]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0);
        if !geometry_ok {
            debug!(%design, "rejected: invalid geometry");
            return Evaluation::invalid(*design, 0.0);
        }

        let pv_capacity_kw = self
            .pv_array
            .rated_capacity_kw(design.area_m2, self.inputs.irradiance_w_m2());
        let (psh, capacity_kw) = match self.resolve_psh_cost(design, pv_capacity_kw) {
            Some(resolved) => resolved,
            None => {
                debug!(%design, "rejected: no usable capacity");
                return Evaluation::invalid(*design, pv_capacity_kw);
            }
        };

        let reservoir = match ReservoirDesign::new(
            design.area_m2,
            design.max_depth_m,
            design.static_head_m,
            capacity_kw,
        ) {
            Ok(r) => r,
            Err(e) => {
                debug!(%design, error = %e, "rejected");
                return Evaluation::invalid(*design, pv_capacity_kw);
            }
        };

        let pv_kw = self.pv_series_kw(design.area_m2);
        let summary = match self.engine(reservoir).run_summary(&pv_kw, self.inputs.load_kw()) {
            Ok(s) => s,
            Err(e) => {
                warn!(%design, error = %e, "simulation failed");
                return Evaluation::invalid(*design, pv_capacity_kw);
            }
        };

        let costs = CostBreakdown {
            psh,
            pv: self.pv_cost.estimate(pv_capacity_kw),
        };
        let (objectives, rejection) = self.aggregator.aggregate(&summary, &costs);
        debug!(
            %design,
            capacity_kw,
            grid_dependency = objectives.grid_dependency,
            rejection = rejection.map(|r| r.as_str()),
            "design evaluated"
        );

        Evaluation {
            design: *design,
            objectives,
            rejection,
            summary: Some(summary),
            costs: Some(costs),
            capacity_kw,
            pv_capacity_kw,
        }
    }

    /// Runs one design and keeps the hourly records, for reporting.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidDesign`] if the design or its resolved
    /// capacity is not positive.
    pub fn simulate(&self, design: &DesignVector) -> SimResult<SimulationOutput> {
        let pv_capacity_kw = self
            .pv_array
            .rated_capacity_kw(design.area_m2, self.inputs.irradiance_w_m2());
        let capacity_kw = self
            .resolve_psh_cost(design, pv_capacity_kw)
            .map_or(0.0, |(_, kw)| kw);
        let reservoir = ReservoirDesign::new(
            design.area_m2,
            design.max_depth_m,
            design.static_head_m,
            capacity_kw,
        )?;
        let pv_kw = self.pv_series_kw(design.area_m2);
        self.engine(reservoir).run(&pv_kw, self.inputs.load_kw())
    }

    fn engine(&self, reservoir: ReservoirDesign) -> Engine {
        Engine::new(reservoir, self.solver, self.refill, self.initial_fill)
    }

    /// PSH cost estimate and the capacity it was priced at.
    fn resolve_psh_cost(
        &self,
        design: &DesignVector,
        pv_capacity_kw: f64,
    ) -> Option<(PshCostEstimate, f64)> {
        let mut sizing = PshSizing {
            area_m2: design.area_m2,
            max_depth_m: design.max_depth_m,
            static_head_m: design.static_head_m,
            capacity_kw: None,
        };
        let capacity_kw = match self.capacity.source {
            CapacitySource::Design => design.capacity_kw?,
            CapacitySource::PvFraction => self.capacity.pv_fraction * pv_capacity_kw,
            CapacitySource::CostModel => {
                let estimate = self.psh_cost.estimate(&sizing);
                let kw = estimate.recommended_capacity_kw;
                return (kw.is_finite() && kw > 0.0).then_some((estimate, kw));
            }
        };
        if !(capacity_kw.is_finite() && capacity_kw > 0.0) {
            return None;
        }
        sizing.capacity_kw = Some(capacity_kw);
        Some((self.psh_cost.estimate(&sizing), capacity_kw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_inputs(hours: usize, irradiance: f64, load: f64) -> HourlyInputs {
        HourlyInputs::new(vec![irradiance; hours], vec![25.0; hours], vec![load; hours])
            .expect("valid inputs")
    }

    #[test]
    fn design_vector_parses() {
        let d: DesignVector = "1600, 2, 90".parse().expect("parse");
        assert_eq!(d.capacity_kw, None);
        let d: DesignVector = "1600,2,90,55".parse().expect("parse");
        assert_eq!(d.capacity_kw, Some(55.0));
        assert!("1600,2".parse::<DesignVector>().is_err());
        assert!("a,b,c".parse::<DesignVector>().is_err());
    }

    #[test]
    fn invalid_geometry_yields_rejected_vector() {
        let ev = Evaluator::new(flat_inputs(24, 500.0, 10.0));
        for design in [
            DesignVector {
                area_m2: 0.0,
                ..DesignVector::default()
            },
            DesignVector {
                max_depth_m: -2.0,
                ..DesignVector::default()
            },
            DesignVector {
                static_head_m: f64::NAN,
                ..DesignVector::default()
            },
            DesignVector {
                capacity_kw: None,
                ..DesignVector::default()
            },
        ] {
            let e = ev.evaluate(&design);
            assert_eq!(e.rejection, Some(RejectionReason::InvalidGeometry));
            assert_eq!(e.objectives, ObjectiveVector::rejected());
            assert!(e.summary.is_none());
        }
    }

    #[test]
    fn pv_fraction_capacity() {
        let ev = Evaluator::new(flat_inputs(24, 800.0, 10.0)).with_capacity(CapacityConfig {
            source: CapacitySource::PvFraction,
            pv_fraction: 0.25,
        });
        let e = ev.evaluate(&DesignVector {
            capacity_kw: None,
            ..DesignVector::default()
        });
        assert!((e.capacity_kw - 0.25 * e.pv_capacity_kw).abs() < 1e-9);
        assert!(e.summary.is_some());
    }

    #[test]
    fn cost_model_capacity() {
        let ev = Evaluator::new(flat_inputs(24, 800.0, 10.0)).with_capacity(CapacityConfig {
            source: CapacitySource::CostModel,
            ..CapacityConfig::default()
        });
        let design = DesignVector {
            capacity_kw: None,
            ..DesignVector::default()
        };
        let e = ev.evaluate(&design);
        let expected = ParametricPshCost::default().recommended_capacity_kw(&PshSizing {
            area_m2: design.area_m2,
            max_depth_m: design.max_depth_m,
            static_head_m: design.static_head_m,
            capacity_kw: None,
        });
        assert!((e.capacity_kw - expected).abs() < 1e-9);
    }

    #[test]
    fn tiny_reservoir_without_panels_is_rejected_not_panicking() {
        let ev = Evaluator::new(flat_inputs(24, 800.0, 10.0));
        let e = ev.evaluate(&DesignVector {
            area_m2: 2.0,
            max_depth_m: 1.0,
            static_head_m: 50.0,
            capacity_kw: Some(5.0),
        });
        assert!(!e.is_feasible());
        assert_eq!(e.objectives, ObjectiveVector::rejected());
    }

    #[test]
    fn simulate_returns_hourly_records() {
        let ev = Evaluator::new(flat_inputs(48, 600.0, 20.0));
        let out = ev.simulate(&DesignVector::default()).expect("simulate");
        assert_eq!(out.records.len(), 48);
        assert!(ev.simulate(&DesignVector {
            area_m2: -1.0,
            ..DesignVector::default()
        })
        .is_err());
    }

    #[test]
    fn evaluate_is_deterministic() {
        let ev = Evaluator::new(flat_inputs(72, 500.0, 15.0));
        let d = DesignVector::default();
        assert_eq!(ev.evaluate(&d), ev.evaluate(&d));
    }

    #[test]
    fn evaluator_is_sync() {
        fn assert_sync<T: Sync + Send>() {}
        assert_sync::<Evaluator>();
    }
}
