//! Run statistics accumulated hour by hour.

use std::fmt;

use serde::Serialize;

use super::types::{HourlyRecord, ReservoirDesign, SimulationState};

/// Aggregate statistics of a complete simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    /// Number of simulated hours.
    pub hours: usize,
    /// Fraction of hours with any grid import (to load or to storage).
    pub grid_dependency_fraction: f64,
    /// Fraction of hours where PV alone falls short of load.
    pub pv_shortfall_fraction: f64,
    /// Energy moved through storage divided by `capacity * hours`.
    pub utilization_factor: f64,
    /// Largest stored volume over the run, initial state included, over the full volume.
    pub max_fill_ratio: f64,
    /// Peak PV export over peak load.
    pub max_excess_ratio: f64,
    /// Energy moved through storage (kWh): PV pumped plus turbine output.
    pub storage_energy_kwh: f64,
    /// Energy imported from the grid (kWh).
    pub grid_energy_kwh: f64,
    /// Energy exported to the grid (kWh).
    pub exported_energy_kwh: f64,
    /// Peak PV export (kW).
    pub peak_export_kw: f64,
    /// Peak load (kW).
    pub peak_load_kw: f64,
    /// Volume at the end of the run (m³).
    pub final_volume_m3: f64,
    /// Largest solver residual seen.
    pub max_residual: f64,
    /// Hours whose solver residual exceeded the warning threshold.
    pub high_residual_hours: usize,
}

impl RunSummary {
    /// Computes the summary from a complete record vector.
    pub fn from_records(
        records: &[HourlyRecord],
        design: &ReservoirDesign,
        initial: &SimulationState,
        residual_threshold: f64,
    ) -> Self {
        let mut acc = SummaryAccumulator::new(design, initial, residual_threshold);
        for r in records {
            acc.push(r);
        }
        acc.finish()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Run Summary ---")?;
        writeln!(f, "Hours simulated:       {}", self.hours)?;
        writeln!(
            f,
            "Grid dependency:       {:.2}%",
            self.grid_dependency_fraction * 100.0
        )?;
        writeln!(
            f,
            "PV shortfall hours:    {:.2}%",
            self.pv_shortfall_fraction * 100.0
        )?;
        writeln!(
            f,
            "Utilization factor:    {:.2}%",
            self.utilization_factor * 100.0
        )?;
        writeln!(f, "Max fill ratio:        {:.3}", self.max_fill_ratio)?;
        writeln!(f, "Max excess ratio:      {:.3}", self.max_excess_ratio)?;
        writeln!(
            f,
            "Storage throughput:    {:.1} kWh",
            self.storage_energy_kwh
        )?;
        writeln!(f, "Grid import:           {:.1} kWh", self.grid_energy_kwh)?;
        writeln!(
            f,
            "Grid export:           {:.1} kWh",
            self.exported_energy_kwh
        )?;
        writeln!(f, "Final volume:          {:.1} m3", self.final_volume_m3)?;
        write!(
            f,
            "Solver residual:       max {:.4} ({} h above threshold)",
            self.max_residual, self.high_residual_hours
        )
    }
}

/// Streaming accumulator behind [`RunSummary`].
///
/// Lets the run loop fold records in without buffering the whole year.
#[derive(Debug, Clone)]
pub struct SummaryAccumulator {
    max_volume_m3: f64,
    capacity_kw: f64,
    residual_threshold: f64,
    hours: usize,
    grid_hours: usize,
    shortfall_hours: usize,
    storage_energy_kwh: f64,
    grid_energy_kwh: f64,
    exported_energy_kwh: f64,
    peak_volume_m3: f64,
    peak_export_kw: f64,
    peak_load_kw: f64,
    final_volume_m3: f64,
    max_residual: f64,
    high_residual_hours: usize,
}

impl SummaryAccumulator {
    pub fn new(design: &ReservoirDesign, initial: &SimulationState, residual_threshold: f64) -> Self {
        Self {
            max_volume_m3: design.max_volume_m3(),
            capacity_kw: design.capacity_kw,
            residual_threshold,
            hours: 0,
            grid_hours: 0,
            shortfall_hours: 0,
            storage_energy_kwh: 0.0,
            grid_energy_kwh: 0.0,
            exported_energy_kwh: 0.0,
            peak_volume_m3: initial.volume_m3,
            peak_export_kw: 0.0,
            peak_load_kw: 0.0,
            final_volume_m3: initial.volume_m3,
            max_residual: initial.residual,
            high_residual_hours: 0,
        }
    }

    pub fn push(&mut self, r: &HourlyRecord) {
        self.hours += 1;
        if r.flows.uses_grid() {
            self.grid_hours += 1;
        }
        if r.pv_kw < r.load_kw {
            self.shortfall_hours += 1;
        }
        self.storage_energy_kwh += r.storage_energy_kwh;
        self.grid_energy_kwh += r.flows.grid_import_kw();
        self.exported_energy_kwh += r.flows.pv_to_grid_kw;
        self.peak_volume_m3 = self.peak_volume_m3.max(r.volume_m3);
        self.peak_export_kw = self.peak_export_kw.max(r.flows.pv_to_grid_kw);
        self.peak_load_kw = self.peak_load_kw.max(r.load_kw);
        self.final_volume_m3 = r.volume_m3;
        self.max_residual = self.max_residual.max(r.residual);
        if r.residual > self.residual_threshold {
            self.high_residual_hours += 1;
        }
    }

    pub fn finish(self) -> RunSummary {
        let hours = self.hours as f64;
        let frac = |count: usize| if self.hours > 0 { count as f64 / hours } else { 0.0 };

        let utilization_factor = if self.hours > 0 && self.capacity_kw > 0.0 {
            self.storage_energy_kwh / (self.capacity_kw * hours)
        } else {
            0.0
        };

        let max_excess_ratio = if self.peak_load_kw > 0.0 {
            self.peak_export_kw / self.peak_load_kw
        } else if self.peak_export_kw > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        RunSummary {
            hours: self.hours,
            grid_dependency_fraction: frac(self.grid_hours),
            pv_shortfall_fraction: frac(self.shortfall_hours),
            utilization_factor,
            max_fill_ratio: self.peak_volume_m3 / self.max_volume_m3,
            max_excess_ratio,
            storage_energy_kwh: self.storage_energy_kwh,
            grid_energy_kwh: self.grid_energy_kwh,
            exported_energy_kwh: self.exported_energy_kwh,
            peak_export_kw: self.peak_export_kw,
            peak_load_kw: self.peak_load_kw,
            final_volume_m3: self.final_volume_m3,
            max_residual: self.max_residual,
            high_residual_hours: self.high_residual_hours,
        }
    }
}
