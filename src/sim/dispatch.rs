//! Hourly dispatch among PV, load, pumped storage, and the grid.

use serde::{Deserialize, Serialize};

use super::solver::HeadVolumeSolver;
use super::types::{DispatchBranch, HourlyRecord, PowerFlows, ReservoirDesign, SimulationState};

/// Whether the grid tops up an exhausted reservoir.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GridRefill {
    /// The grid pumps at full capacity in the same hour it serves the deficit.
    #[default]
    SameHour,
    /// The grid only serves load; storage refills from PV surplus alone.
    Disabled,
}

/// Rule-based dispatch for one hour.
///
/// Priority order:
/// 1. `pv >= load`: PV serves load, surplus pumps up to capacity, the rest is
///    exported. A full reservoir exports the whole surplus.
/// 2. `pv < load` with water stored: a tentative solve tests whether the
///    reservoir can carry the deficit. If it stays above empty, storage serves
///    up to capacity and the grid covers any overflow; otherwise the grid
///    serves the deficit and refills.
/// 3. `pv < load` with an empty reservoir: the grid serves the deficit and
///    refills.
///
/// A final solve with the decided flows commits the next state.
#[derive(Debug, Clone, Copy)]
pub struct DispatchPolicy {
    design: ReservoirDesign,
    solver: HeadVolumeSolver,
    refill: GridRefill,
}

impl DispatchPolicy {
    pub fn new(design: ReservoirDesign, solver: HeadVolumeSolver, refill: GridRefill) -> Self {
        Self {
            design,
            solver,
            refill,
        }
    }

    pub fn design(&self) -> &ReservoirDesign {
        &self.design
    }

    /// Dispatches one hour and returns its record and the next state.
    ///
    /// # Arguments
    ///
    /// * `hour` - Hour index
    /// * `pv_kw` - PV generation (negative values are treated as zero)
    /// * `load_kw` - Load demand (negative values are treated as zero)
    /// * `state` - Storage state at the start of the hour
    pub fn step(
        &self,
        hour: usize,
        pv_kw: f64,
        load_kw: f64,
        state: &SimulationState,
    ) -> (HourlyRecord, SimulationState) {
        let pv_kw = pv_kw.max(0.0);
        let load_kw = load_kw.max(0.0);
        let (flows, branch) = self.decide(pv_kw, load_kw, state);

        let solved = self.solver.solve(
            &self.design,
            state.volume_m3,
            flows.charge_kw(),
            flows.discharge_kw(),
        );
        let next = SimulationState {
            volume_m3: solved.volume_m3,
            head_m: solved.head_m,
            residual: solved.residual,
        };

        let record = HourlyRecord {
            hour,
            pv_kw,
            load_kw,
            flows,
            // 1 h timestep: kW and kWh coincide.
            storage_energy_kwh: flows.pv_to_storage_kw + flows.storage_to_load_kw,
            head_m: next.head_m,
            volume_m3: next.volume_m3,
            residual: next.residual,
            branch,
        };
        (record, next)
    }

    fn decide(
        &self,
        pv_kw: f64,
        load_kw: f64,
        state: &SimulationState,
    ) -> (PowerFlows, DispatchBranch) {
        let capacity_kw = self.design.capacity_kw;
        let mut flows = PowerFlows {
            pv_to_load_kw: pv_kw.min(load_kw),
            ..PowerFlows::default()
        };

        if pv_kw >= load_kw {
            let surplus_kw = pv_kw - load_kw;
            if state.volume_m3 < self.design.max_volume_m3() {
                flows.pv_to_storage_kw = surplus_kw.min(capacity_kw);
                flows.pv_to_grid_kw = (surplus_kw - capacity_kw).max(0.0);
                return (flows, DispatchBranch::Charging);
            }
            flows.pv_to_grid_kw = surplus_kw.max(0.0);
            return (flows, DispatchBranch::StorageFull);
        }

        let deficit_kw = load_kw - pv_kw;
        if state.volume_m3 > 0.0 {
            let tentative = self
                .solver
                .solve(&self.design, state.volume_m3, 0.0, deficit_kw);
            if tentative.volume_m3 > 0.0 {
                flows.storage_to_load_kw = deficit_kw.min(capacity_kw);
                flows.grid_to_load_kw = deficit_kw - flows.storage_to_load_kw;
                return (flows, DispatchBranch::Discharging);
            }
            self.grid_serves(&mut flows, deficit_kw);
            return (flows, DispatchBranch::Exhausted);
        }

        self.grid_serves(&mut flows, deficit_kw);
        (flows, DispatchBranch::Empty)
    }

    fn grid_serves(&self, flows: &mut PowerFlows, deficit_kw: f64) {
        flows.grid_to_load_kw = deficit_kw;
        if self.refill == GridRefill::SameHour {
            flows.grid_to_storage_kw = self.design.capacity_kw;
        }
    }
}
