//! CSV export for hourly records and evaluated design fronts.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::evaluate::Evaluation;
use crate::sim::types::HourlyRecord;

/// Column header for hourly telemetry export.
const HEADER: &str = "hour,pv_kw,load_kw,pv_to_load_kw,pv_to_storage_kw,\
                       storage_to_load_kw,grid_to_load_kw,grid_to_storage_kw,\
                       pv_to_grid_kw,storage_energy_kwh,head_m,volume_m3,residual,branch";

/// Column header for design front export.
const FRONT_HEADER: &str = "area_m2,max_depth_m,static_head_m,capacity_kw,pv_capacity_kw,\
                             grid_dependency,lcoe_per_kwh,capital_cost,neg_utilization,\
                             max_fill_ratio,rejection";

/// Exports hourly records to a CSV file at the given path.
///
/// Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(records: &[HourlyRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_csv(records, io::BufWriter::new(file))
}

/// Writes hourly records as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(records: &[HourlyRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in records {
        let f = &r.flows;
        wtr.write_record(&[
            r.hour.to_string(),
            format!("{:.4}", r.pv_kw),
            format!("{:.4}", r.load_kw),
            format!("{:.4}", f.pv_to_load_kw),
            format!("{:.4}", f.pv_to_storage_kw),
            format!("{:.4}", f.storage_to_load_kw),
            format!("{:.4}", f.grid_to_load_kw),
            format!("{:.4}", f.grid_to_storage_kw),
            format!("{:.4}", f.pv_to_grid_kw),
            format!("{:.4}", r.storage_energy_kwh),
            format!("{:.4}", r.head_m),
            format!("{:.4}", r.volume_m3),
            format!("{:.6}", r.residual),
            r.branch.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports evaluated designs to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_front_csv(front: &[Evaluation], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_front_csv(front, io::BufWriter::new(file))
}

/// Writes evaluated designs as CSV, one row per design.
///
/// Designs that were never simulated leave `max_fill_ratio` empty; feasible
/// designs leave `rejection` empty.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_front_csv(front: &[Evaluation], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(FRONT_HEADER.split(',').map(str::trim))?;

    for e in front {
        let d = &e.design;
        let o = &e.objectives;
        wtr.write_record(&[
            format!("{:.4}", d.area_m2),
            format!("{:.4}", d.max_depth_m),
            format!("{:.4}", d.static_head_m),
            format!("{:.4}", e.capacity_kw),
            format!("{:.4}", e.pv_capacity_kw),
            format!("{:.6}", o.grid_dependency),
            format!("{:.6}", o.lcoe_per_kwh),
            format!("{:.2}", o.capital_cost),
            format!("{:.6}", o.neg_utilization),
            e.summary
                .map(|s| format!("{:.4}", s.max_fill_ratio))
                .unwrap_or_default(),
            e.rejection.map(|r| r.to_string()).unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
