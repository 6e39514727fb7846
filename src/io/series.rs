//! CSV reader for aligned hourly input series.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::SimResult;
use crate::inputs::HourlyInputs;

/// One CSV row. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct SeriesRow {
    irradiance_w_m2: f64,
    ambient_temp_c: f64,
    load_kw: f64,
}

/// Reads `irradiance_w_m2,ambient_temp_c,load_kw` rows from a CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, a row fails to parse, or the
/// resulting series fail [`HourlyInputs::new`] validation.
pub fn load_series(path: &Path) -> SimResult<HourlyInputs> {
    let file = File::open(path)?;
    read_series(file)
}

/// Reads hourly series from any CSV source with a header row.
///
/// # Errors
///
/// Same as [`load_series`], minus the file handling.
pub fn read_series(reader: impl Read) -> SimResult<HourlyInputs> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut irradiance = Vec::new();
    let mut temperature = Vec::new();
    let mut load = Vec::new();
    for row in rdr.deserialize() {
        let row: SeriesRow = row?;
        irradiance.push(row.irradiance_w_m2);
        temperature.push(row.ambient_temp_c);
        load.push(row.load_kw);
    }

    HourlyInputs::new(irradiance, temperature, load)
}
