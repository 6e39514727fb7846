//! Parametric capital cost of a small pumped-storage facility.

use serde::{Deserialize, Serialize};

use super::{PshCostEstimate, PshCostModel, PshSizing};

/// Closed-form PSH cost model.
///
/// The machine rating follows from hydraulics: the active share of the upper
/// reservoir is released over a fixed generating period at the mean gross
/// head. Capital cost is a fixed civil term plus a power term and a storage
/// term, each with its own scale exponent.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParametricPshCost {
    /// Share of the reservoir volume usable for generation.
    pub active_storage_fraction: f64,
    /// Hours to drain the active storage at mean discharge.
    pub generating_hours: f64,
    /// Pump-turbine efficiency.
    pub turbine_efficiency: f64,
    pub water_density_kg_m3: f64,
    pub gravity_m_s2: f64,
    /// Fixed development and civil cost ($).
    pub fixed_cost: f64,
    /// Power-house and electro-mechanical cost per kW ($/kW).
    pub power_cost_per_kw: f64,
    /// Scale exponent on installed kW.
    pub power_exponent: f64,
    /// Reservoir works cost per m³ of storage ($/m³).
    pub storage_cost_per_m3: f64,
    /// Scale exponent on storage volume.
    pub storage_exponent: f64,
}

impl Default for ParametricPshCost {
    fn default() -> Self {
        Self {
            active_storage_fraction: 0.85,
            generating_hours: 10.0,
            turbine_efficiency: 0.88,
            water_density_kg_m3: 1000.0,
            gravity_m_s2: 9.81,
            fixed_cost: 1.5e6,
            power_cost_per_kw: 2200.0,
            power_exponent: 0.9,
            storage_cost_per_m3: 18.0,
            storage_exponent: 0.85,
        }
    }
}

impl ParametricPshCost {
    /// Generating capacity the hydraulics support for this geometry (kW).
    pub fn recommended_capacity_kw(&self, sizing: &PshSizing) -> f64 {
        let active_m3 = self.active_storage_fraction * sizing.area_m2 * sizing.max_depth_m;
        let discharge_m3_s = active_m3 / (self.generating_hours * 3600.0);
        let mean_head_m = sizing.static_head_m + sizing.max_depth_m / 2.0;
        self.water_density_kg_m3
            * self.gravity_m_s2
            * discharge_m3_s
            * mean_head_m
            * self.turbine_efficiency
            / 1000.0
    }
}

impl PshCostModel for ParametricPshCost {
    fn estimate(&self, sizing: &PshSizing) -> PshCostEstimate {
        let geometry_ok = [sizing.area_m2, sizing.max_depth_m, sizing.static_head_m]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0);
        if !geometry_ok {
            return PshCostEstimate::sentinel();
        }

        let recommended_capacity_kw = self.recommended_capacity_kw(sizing);
        let capacity_kw = sizing.capacity_kw.unwrap_or(recommended_capacity_kw);
        if !(capacity_kw.is_finite() && capacity_kw > 0.0) {
            return PshCostEstimate::sentinel();
        }

        let volume_m3 = sizing.area_m2 * sizing.max_depth_m;
        let capital_cost = self.fixed_cost
            + self.power_cost_per_kw * capacity_kw.powf(self.power_exponent)
            + self.storage_cost_per_m3 * volume_m3.powf(self.storage_exponent);

        PshCostEstimate {
            capital_cost,
            cost_per_kw: capital_cost / capacity_kw,
            cost_per_kwh: capital_cost / (capacity_kw * self.generating_hours),
            recommended_capacity_kw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizing(area: f64, depth: f64, head: f64, capacity: Option<f64>) -> PshSizing {
        PshSizing {
            area_m2: area,
            max_depth_m: depth,
            static_head_m: head,
            capacity_kw: capacity,
        }
    }

    #[test]
    fn non_positive_geometry_is_sentinel() {
        let m = ParametricPshCost::default();
        assert!(m.estimate(&sizing(0.0, 10.0, 50.0, None)).is_sentinel());
        assert!(m.estimate(&sizing(100.0, -1.0, 50.0, None)).is_sentinel());
        assert!(m.estimate(&sizing(100.0, 10.0, 0.0, None)).is_sentinel());
        assert!(m.estimate(&sizing(100.0, 10.0, 50.0, Some(0.0))).is_sentinel());
    }

    #[test]
    fn recommended_capacity_from_hydraulics() {
        let m = ParametricPshCost::default();
        // 0.85 * 36000 m3 over 10 h = 0.85 m3/s at 95 m mean head.
        let kw = m.recommended_capacity_kw(&sizing(3600.0, 10.0, 90.0, None));
        let expected = 1000.0 * 9.81 * 0.85 * 95.0 * 0.88 / 1000.0;
        assert!((kw - expected).abs() < 1e-9);
    }

    #[test]
    fn per_unit_costs_are_consistent() {
        let m = ParametricPshCost::default();
        let e = m.estimate(&sizing(1000.0, 10.0, 80.0, Some(200.0)));
        assert!(!e.is_sentinel());
        assert!((e.cost_per_kw - e.capital_cost / 200.0).abs() < 1e-6);
        assert!((e.cost_per_kwh - e.cost_per_kw / 10.0).abs() < 1e-9);
    }

    #[test]
    fn bigger_plant_costs_more() {
        let m = ParametricPshCost::default();
        let small = m.estimate(&sizing(1000.0, 10.0, 80.0, Some(100.0)));
        let large = m.estimate(&sizing(10_000.0, 10.0, 80.0, Some(1000.0)));
        assert!(large.capital_cost > small.capital_cost);
    }
}
