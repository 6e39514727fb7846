//! Core simulation types: reservoir design, storage state, and per-hour records.

use std::fmt;

use serde::Serialize;

use crate::error::{SimError, SimResult};

/// Reservoir geometry and machine rating for one simulation run.
///
/// Immutable once constructed. The reservoir is modeled as a prism: stored
/// volume grows linearly with water depth above the static head.
///
/// # Examples
///
/// ```
/// use psh_fpv_sim::sim::types::ReservoirDesign;
///
/// let design = ReservoirDesign::new(100.0, 10.0, 90.0, 50.0).unwrap();
/// assert_eq!(design.max_volume_m3(), 1000.0);
/// assert_eq!(design.full_head_m(), 100.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReservoirDesign {
    /// Reservoir surface area (m²).
    pub area_m2: f64,
    /// Maximum water depth (m).
    pub max_depth_m: f64,
    /// Static head between the reservoirs at empty (m).
    pub static_head_m: f64,
    /// Motor/generator rating, shared by pumping and generating (kW).
    pub capacity_kw: f64,
}

impl ReservoirDesign {
    /// Creates a validated design.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidDesign`] if any parameter is non-positive or
    /// not finite.
    pub fn new(
        area_m2: f64,
        max_depth_m: f64,
        static_head_m: f64,
        capacity_kw: f64,
    ) -> SimResult<Self> {
        for (what, value) in [
            ("area_m2", area_m2),
            ("max_depth_m", max_depth_m),
            ("static_head_m", static_head_m),
            ("capacity_kw", capacity_kw),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::InvalidDesign { what, value });
            }
        }
        Ok(Self {
            area_m2,
            max_depth_m,
            static_head_m,
            capacity_kw,
        })
    }

    /// Storage volume when the reservoir is full (m³).
    pub fn max_volume_m3(&self) -> f64 {
        self.area_m2 * self.max_depth_m
    }

    /// Head with a full reservoir (m).
    pub fn full_head_m(&self) -> f64 {
        self.static_head_m + self.max_depth_m
    }

    /// Head for a stored volume via the geometric relation `h = h0 + V / A`.
    pub fn head_at(&self, volume_m3: f64) -> f64 {
        self.static_head_m + volume_m3 / self.area_m2
    }
}

/// Storage state threaded from one hour to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationState {
    /// Stored volume (m³).
    pub volume_m3: f64,
    /// Head at the stored volume (m).
    pub head_m: f64,
    /// Relative residual of the solve that produced this state.
    pub residual: f64,
}

impl SimulationState {
    /// State at hour 0: a fraction of the full volume, zero residual.
    pub fn initial(design: &ReservoirDesign, fill_fraction: f64) -> Self {
        let volume_m3 = design.max_volume_m3() * fill_fraction;
        Self {
            volume_m3,
            head_m: design.head_at(volume_m3),
            residual: 0.0,
        }
    }

    /// Stored volume as a fraction of the full volume.
    pub fn fill_ratio(&self, design: &ReservoirDesign) -> f64 {
        self.volume_m3 / design.max_volume_m3()
    }
}

/// The six power flows decided for one hour (kW, all non-negative).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PowerFlows {
    pub pv_to_load_kw: f64,
    pub pv_to_storage_kw: f64,
    pub storage_to_load_kw: f64,
    pub grid_to_load_kw: f64,
    pub grid_to_storage_kw: f64,
    pub pv_to_grid_kw: f64,
}

impl PowerFlows {
    /// Power sent to the pump.
    pub fn charge_kw(&self) -> f64 {
        self.pv_to_storage_kw + self.grid_to_storage_kw
    }

    /// Power drawn through the turbine.
    pub fn discharge_kw(&self) -> f64 {
        self.storage_to_load_kw
    }

    /// Total grid import.
    pub fn grid_import_kw(&self) -> f64 {
        self.grid_to_load_kw + self.grid_to_storage_kw
    }

    /// Whether the grid supplies anything this hour.
    pub fn uses_grid(&self) -> bool {
        self.grid_to_load_kw > 0.0 || self.grid_to_storage_kw > 0.0
    }

    /// Power reaching the load from every source.
    pub fn served_load_kw(&self) -> f64 {
        self.pv_to_load_kw + self.storage_to_load_kw + self.grid_to_load_kw
    }
}

/// Which dispatch case was active in an hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchBranch {
    /// PV covers load, residual pumped (overflow exported).
    Charging,
    /// PV covers load, reservoir already full, residual exported.
    StorageFull,
    /// PV short, storage covers the deficit (overflow beyond capacity from grid).
    Discharging,
    /// PV short, storage would run dry this hour; grid serves and refills.
    Exhausted,
    /// PV short, reservoir empty at the start of the hour.
    Empty,
}

impl DispatchBranch {
    /// True for the `PV >= load` branches.
    pub fn is_surplus(&self) -> bool {
        matches!(self, Self::Charging | Self::StorageFull)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Charging => "charging",
            Self::StorageFull => "storage_full",
            Self::Discharging => "discharging",
            Self::Exhausted => "exhausted",
            Self::Empty => "empty",
        }
    }
}

impl fmt::Display for DispatchBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete record of one simulated hour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourlyRecord {
    /// Hour index from the start of the series.
    pub hour: usize,
    /// PV generation (kW).
    pub pv_kw: f64,
    /// Load demand (kW).
    pub load_kw: f64,
    /// Decided power flows.
    pub flows: PowerFlows,
    /// Energy moved through storage this hour (kWh): PV pumped plus turbine output.
    pub storage_energy_kwh: f64,
    /// Head after the hour (m).
    pub head_m: f64,
    /// Stored volume after the hour (m³).
    pub volume_m3: f64,
    /// Relative residual of the committing solve.
    pub residual: f64,
    /// Dispatch case taken.
    pub branch: DispatchBranch,
}

impl fmt::Display for HourlyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fl = &self.flows;
        write!(
            f,
            "h={:>5} | pv={:>8.2} kW  load={:>8.2} kW | pv>load={:.2} pv>psh={:.2} \
             psh>load={:.2} grid>load={:.2} grid>psh={:.2} pv>grid={:.2} | \
             head={:.2} m  vol={:.1} m3 ({})",
            self.hour,
            self.pv_kw,
            self.load_kw,
            fl.pv_to_load_kw,
            fl.pv_to_storage_kw,
            fl.storage_to_load_kw,
            fl.grid_to_load_kw,
            fl.grid_to_storage_kw,
            fl.pv_to_grid_kw,
            self.head_m,
            self.volume_m3,
            self.branch,
        )
    }
}
