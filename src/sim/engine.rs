//! Annual simulation runner that threads storage state through the dispatch policy.

use tracing::{debug, warn};

use crate::error::{SimError, SimResult};

use super::dispatch::{DispatchPolicy, GridRefill};
use super::kpi::{RunSummary, SummaryAccumulator};
use super::solver::HeadVolumeSolver;
use super::types::{HourlyRecord, ReservoirDesign, SimulationState};

/// Fill fraction of the reservoir at hour 0 unless configured otherwise.
pub const DEFAULT_INITIAL_FILL: f64 = 0.2;

/// Hourly records plus their summary.
#[derive(Debug, Clone)]
pub struct SimulationOutput {
    pub records: Vec<HourlyRecord>,
    pub summary: RunSummary,
}

/// Simulation engine for one reservoir design.
///
/// Holds no per-run state: every call to [`Engine::run`] or
/// [`Engine::run_summary`] starts from a fresh initial state, so an engine can
/// be shared across threads evaluating the same design.
#[derive(Debug, Clone, Copy)]
pub struct Engine {
    policy: DispatchPolicy,
    initial_fill: f64,
    residual_threshold: f64,
}

impl Engine {
    /// Creates a new simulation engine.
    ///
    /// # Arguments
    ///
    /// * `design` - Validated reservoir design
    /// * `solver` - Head/volume solver; its residual threshold drives diagnostics
    /// * `refill` - Grid refill behavior when storage is exhausted
    /// * `initial_fill` - Fill fraction at hour 0 (clamped to `[0, 1]`)
    pub fn new(
        design: ReservoirDesign,
        solver: HeadVolumeSolver,
        refill: GridRefill,
        initial_fill: f64,
    ) -> Self {
        let residual_threshold = solver.constants().residual_warn_threshold;
        Self {
            policy: DispatchPolicy::new(design, solver, refill),
            initial_fill: initial_fill.clamp(0.0, 1.0),
            residual_threshold,
        }
    }

    /// Engine with default solver constants, same-hour refill, and 20 % initial fill.
    pub fn with_defaults(design: ReservoirDesign) -> Self {
        Self::new(
            design,
            HeadVolumeSolver::default(),
            GridRefill::default(),
            DEFAULT_INITIAL_FILL,
        )
    }

    pub fn design(&self) -> &ReservoirDesign {
        self.policy.design()
    }

    pub fn policy(&self) -> &DispatchPolicy {
        &self.policy
    }

    /// State the reservoir starts each run in.
    pub fn initial_state(&self) -> SimulationState {
        SimulationState::initial(self.design(), self.initial_fill)
    }

    /// Runs the whole series and keeps every hourly record.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::LengthMismatch`] if the series differ in length and
    /// [`SimError::EmptySeries`] if they are empty.
    pub fn run(&self, pv_kw: &[f64], load_kw: &[f64]) -> SimResult<SimulationOutput> {
        check_series(pv_kw, load_kw)?;
        let mut records = Vec::with_capacity(pv_kw.len());
        let summary = self.fold(pv_kw, load_kw, |r| records.push(*r));
        Ok(SimulationOutput { records, summary })
    }

    /// Runs the whole series and keeps only the summary.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::run`].
    pub fn run_summary(&self, pv_kw: &[f64], load_kw: &[f64]) -> SimResult<RunSummary> {
        check_series(pv_kw, load_kw)?;
        Ok(self.fold(pv_kw, load_kw, |_| {}))
    }

    fn fold(
        &self,
        pv_kw: &[f64],
        load_kw: &[f64],
        mut sink: impl FnMut(&HourlyRecord),
    ) -> RunSummary {
        let initial = self.initial_state();
        let mut acc = SummaryAccumulator::new(self.design(), &initial, self.residual_threshold);
        let mut state = initial;

        for (hour, (&pv, &load)) in pv_kw.iter().zip(load_kw).enumerate() {
            let (record, next) = self.policy.step(hour, pv, load, &state);
            acc.push(&record);
            sink(&record);
            state = next;
        }

        let summary = acc.finish();
        debug!(
            area_m2 = self.design().area_m2,
            depth_m = self.design().max_depth_m,
            head_m = self.design().static_head_m,
            capacity_kw = self.design().capacity_kw,
            hours = summary.hours,
            grid_dependency = summary.grid_dependency_fraction,
            max_fill = summary.max_fill_ratio,
            "simulation run complete"
        );
        if summary.high_residual_hours > 0 {
            warn!(
                hours = summary.high_residual_hours,
                max_residual = summary.max_residual,
                threshold = self.residual_threshold,
                "head/volume solve poorly resolved"
            );
        }
        summary
    }
}

fn check_series(pv_kw: &[f64], load_kw: &[f64]) -> SimResult<()> {
    if pv_kw.len() != load_kw.len() {
        return Err(SimError::LengthMismatch {
            pv: pv_kw.len(),
            load: load_kw.len(),
        });
    }
    if pv_kw.is_empty() {
        return Err(SimError::EmptySeries);
    }
    Ok(())
}
