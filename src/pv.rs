//! Floating PV array covering the reservoir surface.

use serde::{Deserialize, Serialize};

/// Panel and inverter parameters of a floating PV array.
///
/// The usable area excludes a perimeter band proportional to the reservoir
/// circumference; the rest is tiled with whole panels.
///
/// # Examples
///
/// ```
/// use psh_fpv_sim::pv::FloatingPvArray;
///
/// let array = FloatingPvArray::default();
/// assert_eq!(array.panel_count(1.0), 0);
/// assert!(array.power_kw(10_000.0, 1000.0, 25.0) > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FloatingPvArray {
    /// Area of one panel (m²).
    pub panel_area_m2: f64,
    /// Module efficiency.
    pub module_efficiency: f64,
    /// Inverter efficiency.
    pub inverter_efficiency: f64,
    /// Power temperature coefficient (1/°C).
    pub temp_coefficient_per_c: f64,
    /// Reference cell temperature (°C).
    pub reference_temp_c: f64,
}

impl Default for FloatingPvArray {
    fn default() -> Self {
        Self {
            panel_area_m2: 1.53,
            module_efficiency: 0.16,
            inverter_efficiency: 0.93,
            temp_coefficient_per_c: 0.0047,
            reference_temp_c: 25.0,
        }
    }
}

impl FloatingPvArray {
    /// Surface area left for panels after the perimeter band (m², >= 0).
    pub fn usable_area_m2(&self, surface_area_m2: f64) -> f64 {
        if surface_area_m2.is_nan() || surface_area_m2 <= 0.0 {
            return 0.0;
        }
        let band = (2.0 * std::f64::consts::PI * surface_area_m2 * self.panel_area_m2).sqrt();
        (surface_area_m2 - band).max(0.0)
    }

    /// Whole panels that fit on the reservoir.
    pub fn panel_count(&self, surface_area_m2: f64) -> u64 {
        if self.panel_area_m2 <= 0.0 {
            return 0;
        }
        (self.usable_area_m2(surface_area_m2) / self.panel_area_m2).floor() as u64
    }

    fn array_efficiency(&self) -> f64 {
        self.module_efficiency * self.inverter_efficiency
    }

    /// AC output for one hour (kW, >= 0).
    ///
    /// # Arguments
    ///
    /// * `surface_area_m2` - Reservoir surface area
    /// * `irradiance_w_m2` - Plane irradiance
    /// * `ambient_temp_c` - Temperature driving the derate
    pub fn power_kw(&self, surface_area_m2: f64, irradiance_w_m2: f64, ambient_temp_c: f64) -> f64 {
        let panels = self.panel_count(surface_area_m2) as f64;
        let derate = 1.0 - self.temp_coefficient_per_c * (ambient_temp_c - self.reference_temp_c);
        let kw = panels * self.array_efficiency() * derate * irradiance_w_m2 * self.panel_area_m2
            / 1000.0;
        kw.max(0.0)
    }

    /// Hourly AC output for aligned irradiance and temperature series.
    pub fn series_kw(
        &self,
        surface_area_m2: f64,
        irradiance_w_m2: &[f64],
        ambient_temp_c: &[f64],
    ) -> Vec<f64> {
        irradiance_w_m2
            .iter()
            .zip(ambient_temp_c)
            .map(|(&g, &t)| self.power_kw(surface_area_m2, g, t))
            .collect()
    }

    /// Nameplate capacity at the series' peak irradiance, no temperature derate (kW).
    pub fn rated_capacity_kw(&self, surface_area_m2: f64, irradiance_w_m2: &[f64]) -> f64 {
        let peak = irradiance_w_m2.iter().copied().fold(0.0, f64::max);
        self.panel_count(surface_area_m2) as f64
            * self.array_efficiency()
            * peak
            * self.panel_area_m2
            / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perimeter_band_removed() {
        let a = FloatingPvArray::default();
        let usable = a.usable_area_m2(10_000.0);
        let band = (2.0 * std::f64::consts::PI * 10_000.0 * 1.53).sqrt();
        assert!((usable - (10_000.0 - band)).abs() < 1e-9);
        assert_eq!(a.panel_count(10_000.0), (usable / 1.53).floor() as u64);
    }

    #[test]
    fn tiny_reservoir_has_no_panels() {
        let a = FloatingPvArray::default();
        assert_eq!(a.usable_area_m2(5.0), 0.0);
        assert_eq!(a.panel_count(5.0), 0);
        assert_eq!(a.power_kw(5.0, 1000.0, 25.0), 0.0);
        assert_eq!(a.panel_count(-3.0), 0);
    }

    #[test]
    fn power_at_reference_temperature() {
        let a = FloatingPvArray::default();
        let n = a.panel_count(1600.0) as f64;
        let expected = n * 0.16 * 0.93 * 800.0 * 1.53 / 1000.0;
        assert!((a.power_kw(1600.0, 800.0, 25.0) - expected).abs() < 1e-9);
    }

    #[test]
    fn heat_derates_output() {
        let a = FloatingPvArray::default();
        assert!(a.power_kw(1600.0, 800.0, 40.0) < a.power_kw(1600.0, 800.0, 25.0));
        assert!(a.power_kw(1600.0, 800.0, 0.0) > a.power_kw(1600.0, 800.0, 25.0));
    }

    #[test]
    fn night_and_negative_irradiance_give_zero() {
        let a = FloatingPvArray::default();
        assert_eq!(a.power_kw(1600.0, 0.0, 20.0), 0.0);
        assert_eq!(a.power_kw(1600.0, -10.0, 20.0), 0.0);
    }

    #[test]
    fn rated_capacity_uses_peak_irradiance() {
        let a = FloatingPvArray::default();
        let irr = [0.0, 400.0, 950.0, 300.0];
        let temps = [25.0; 4];
        let rated = a.rated_capacity_kw(1600.0, &irr);
        let series = a.series_kw(1600.0, &irr, &temps);
        assert_eq!(series.len(), 4);
        assert!((rated - series[2]).abs() < 1e-9);
    }
}
