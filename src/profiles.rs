//! Seeded synthetic hourly year for sites without measured data.

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::error::SimResult;
use crate::inputs::HourlyInputs;

const HOURS_PER_DAY: usize = 24;
const DAYS_PER_YEAR: f64 = 365.0;

/// Shape parameters of the synthetic weather and load profiles.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherConfig {
    /// Number of hours to generate (must be > 0).
    pub hours: usize,
    /// Clear-sky noon irradiance at the summer peak (W/m²).
    pub peak_irradiance_w_m2: f64,
    /// Fractional winter reduction of the noon peak (0.0–1.0).
    pub seasonal_swing: f64,
    /// Sunrise hour (inclusive).
    pub sunrise_hour: usize,
    /// Sunset hour (exclusive).
    pub sunset_hour: usize,
    /// Multiplicative cloud noise standard deviation.
    pub cloud_noise_std: f64,
    /// Annual mean temperature (°C).
    pub mean_temp_c: f64,
    /// Summer/winter temperature amplitude (°C).
    pub seasonal_temp_amp_c: f64,
    /// Afternoon/night temperature amplitude (°C).
    pub daily_temp_amp_c: f64,
    /// Mean load (kW).
    pub base_load_kw: f64,
    /// Daily load swing (kW).
    pub load_amp_kw: f64,
    /// Phase of the daily load sinusoid (radians).
    pub load_phase_rad: f64,
    /// Load noise standard deviation (kW).
    pub load_noise_std: f64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            hours: 8760,
            peak_irradiance_w_m2: 1000.0,
            seasonal_swing: 0.35,
            sunrise_hour: 6,
            sunset_hour: 19,
            cloud_noise_std: 0.15,
            mean_temp_c: 17.0,
            seasonal_temp_amp_c: 9.0,
            daily_temp_amp_c: 5.0,
            base_load_kw: 40.0,
            load_amp_kw: 12.0,
            load_phase_rad: 4.2,
            load_noise_std: 2.0,
        }
    }
}

/// Gaussian noise via the Box-Muller transform.
///
/// Returns 0 for a non-positive standard deviation without consuming the rng.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

/// Fraction of the day's peak at `hour_of_day` (half-sine between sunrise and sunset).
fn daylight_frac(hour_of_day: usize, sunrise: usize, sunset: usize) -> f64 {
    if hour_of_day < sunrise || hour_of_day >= sunset || sunrise >= sunset {
        return 0.0;
    }
    let x = (hour_of_day - sunrise) as f64 + 0.5;
    (std::f64::consts::PI * x / (sunset - sunrise) as f64).sin()
}

/// Position in the seasonal cycle: 1 at midsummer, -1 at midwinter.
fn season(hour: usize) -> f64 {
    let day = (hour / HOURS_PER_DAY) as f64;
    // Day 172 is the June solstice.
    (2.0 * std::f64::consts::PI * (day - 172.0) / DAYS_PER_YEAR).cos()
}

/// Builds a deterministic synthetic year from `config` and `seed`.
///
/// Irradiance and load draw from independent streams, so changing one
/// profile's noise leaves the other unchanged.
///
/// # Errors
///
/// Returns [`crate::error::SimError::EmptySeries`] if `config.hours` is 0.
pub fn synthetic_year(config: &WeatherConfig, seed: u64) -> SimResult<HourlyInputs> {
    let mut sky_rng = StdRng::seed_from_u64(seed);
    let mut load_rng = StdRng::seed_from_u64(seed.wrapping_add(1));

    let n = config.hours;
    let mut irradiance = Vec::with_capacity(n);
    let mut temperature = Vec::with_capacity(n);
    let mut load = Vec::with_capacity(n);

    for hour in 0..n {
        let hod = hour % HOURS_PER_DAY;
        let s = season(hour);

        let clear_sky = config.peak_irradiance_w_m2
            * (1.0 - config.seasonal_swing * (1.0 - s) / 2.0)
            * daylight_frac(hod, config.sunrise_hour, config.sunset_hour);
        let cloud = (1.0 + gaussian_noise(&mut sky_rng, config.cloud_noise_std)).clamp(0.0, 1.2);
        irradiance.push((clear_sky * cloud).max(0.0));

        // Warmest mid-afternoon.
        let daily = (2.0 * std::f64::consts::PI * (hod as f64 - 9.0) / HOURS_PER_DAY as f64).sin();
        temperature.push(
            config.mean_temp_c + config.seasonal_temp_amp_c * s + config.daily_temp_amp_c * daily,
        );

        let angle = 2.0 * std::f64::consts::PI * hod as f64 / HOURS_PER_DAY as f64
            + config.load_phase_rad;
        let kw = config.base_load_kw
            + config.load_amp_kw * angle.sin()
            + gaussian_noise(&mut load_rng, config.load_noise_std);
        load.push(kw.max(0.0));
    }

    HourlyInputs::new(irradiance, temperature, load)
}
