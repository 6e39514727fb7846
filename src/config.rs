//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::cost::{ParametricPshCost, ParametricPvCost};
use crate::evaluate::{CapacityConfig, CapacitySource, DesignVector, Evaluator};
use crate::inputs::HourlyInputs;
use crate::profiles::WeatherConfig;
use crate::pv::FloatingPvArray;
use crate::search::SearchConfig;
use crate::sim::dispatch::GridRefill;
use crate::sim::objective::{ObjectiveAggregator, RejectionPolicy};
use crate::sim::solver::{HeadVolumeSolver, SolverConstants};

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Run-level parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Design evaluated in single-run mode.
    #[serde(default)]
    pub design: DesignVector,
    /// Where the motor/generator rating comes from.
    #[serde(default)]
    pub capacity: CapacityConfig,
    /// Head/volume solver constants.
    #[serde(default)]
    pub solver: SolverConstants,
    /// Dispatch policy options.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Feasibility gate thresholds.
    #[serde(default)]
    pub objective: RejectionPolicy,
    /// Floating PV array parameters.
    #[serde(default)]
    pub pv: FloatingPvArray,
    /// PSH capital-cost model parameters.
    #[serde(default)]
    pub psh_cost: ParametricPshCost,
    /// PV cost model parameters.
    #[serde(default)]
    pub pv_cost: ParametricPvCost,
    /// Synthetic weather and load profile used when no series file is given.
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Evolutionary search settings.
    #[serde(default)]
    pub search: SearchConfig,
}

/// Run-level parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Reservoir fill fraction at hour 0 (0.0–1.0).
    pub initial_fill_fraction: f64,
    /// Master random seed.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_fill_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Dispatch policy options.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DispatchConfig {
    pub grid_refill: GridRefill,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.initial_fill_fraction"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: a 1600 m² pond 2 m deep at 90 m head
    /// with a 55 kW machine.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the small-pond preset: shallow farm pond at low head, machine
    /// sized at a quarter of PV capacity.
    pub fn small_pond() -> Self {
        Self {
            design: DesignVector {
                area_m2: 900.0,
                max_depth_m: 1.5,
                static_head_m: 40.0,
                capacity_kw: None,
            },
            capacity: CapacityConfig {
                source: CapacitySource::PvFraction,
                pv_fraction: 0.25,
            },
            weather: WeatherConfig {
                base_load_kw: 20.0,
                load_amp_kw: 6.0,
                load_noise_std: 1.0,
                ..WeatherConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the large-reservoir preset: deep reservoir with the machine
    /// sized by the PSH cost model.
    pub fn large_reservoir() -> Self {
        Self {
            design: DesignVector {
                area_m2: 20_000.0,
                max_depth_m: 6.0,
                static_head_m: 100.0,
                capacity_kw: None,
            },
            capacity: CapacityConfig {
                source: CapacitySource::CostModel,
                ..CapacityConfig::default()
            },
            weather: WeatherConfig {
                base_load_kw: 400.0,
                load_amp_kw: 120.0,
                load_noise_std: 15.0,
                ..WeatherConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "small_pond", "large_reservoir"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "small_pond" => Ok(Self::small_pond()),
            "large_reservoir" => Ok(Self::large_reservoir()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut positive = |field: &str, value: f64| {
            if !(value.is_finite() && value > 0.0) {
                errors.push(ConfigError::new(field, format!("must be > 0, got {value}")));
            }
        };

        let d = &self.design;
        positive("design.area_m2", d.area_m2);
        positive("design.max_depth_m", d.max_depth_m);
        positive("design.static_head_m", d.static_head_m);
        if let Some(kw) = d.capacity_kw {
            positive("design.capacity_kw", kw);
        }

        let c = &self.solver;
        positive("solver.interval_s", c.interval_s);
        positive("solver.water_density_kg_m3", c.water_density_kg_m3);
        positive("solver.gravity_m_s2", c.gravity_m_s2);
        positive("solver.generator_coefficient", c.generator_coefficient);
        positive("solver.turbine_coefficient", c.turbine_coefficient);
        positive("solver.residual_warn_threshold", c.residual_warn_threshold);

        positive("objective.max_excess_ratio", self.objective.max_excess_ratio);
        positive("objective.required_fill_ratio", self.objective.required_fill_ratio);

        positive("pv.panel_area_m2", self.pv.panel_area_m2);
        positive("psh_cost.generating_hours", self.psh_cost.generating_hours);

        let s = &self.search;
        positive("search.mutation_scale", s.mutation_scale);
        if !(0.0..=1.0).contains(&s.crossover_rate) {
            errors.push(ConfigError::new("search.crossover_rate", "must be in [0.0, 1.0]"));
        }

        if !(0.0..=1.0).contains(&self.simulation.initial_fill_fraction) {
            errors.push(ConfigError::new(
                "simulation.initial_fill_fraction",
                "must be in [0.0, 1.0]",
            ));
        }

        if self.capacity.source == CapacitySource::Design && d.capacity_kw.is_none() {
            errors.push(ConfigError::new(
                "design.capacity_kw",
                "required when capacity.source = \"design\"",
            ));
        }
        if !(self.capacity.pv_fraction > 0.0 && self.capacity.pv_fraction <= 1.0) {
            errors.push(ConfigError::new("capacity.pv_fraction", "must be in (0.0, 1.0]"));
        }

        if self.solver.grid_points < 2 {
            errors.push(ConfigError::new("solver.grid_points", "must be >= 2"));
        }

        let w = &self.weather;
        if w.hours == 0 {
            errors.push(ConfigError::new("weather.hours", "must be > 0"));
        }
        if w.sunrise_hour >= w.sunset_hour || w.sunset_hour > 24 {
            errors.push(ConfigError::new(
                "weather.sunrise_hour",
                "must be < weather.sunset_hour <= 24",
            ));
        }
        if !(0.0..=1.0).contains(&w.seasonal_swing) {
            errors.push(ConfigError::new("weather.seasonal_swing", "must be in [0.0, 1.0]"));
        }

        if s.population == 0 {
            errors.push(ConfigError::new("search.population", "must be > 0"));
        }
        for name in s.bounds.invalid_fields() {
            errors.push(ConfigError::new(
                format!("search.bounds.{name}"),
                "must satisfy 0 < min <= max",
            ));
        }
        if s.asf_weights.iter().any(|w| !(w.is_finite() && *w >= 0.0))
            || s.asf_weights.iter().all(|w| *w == 0.0)
        {
            errors.push(ConfigError::new(
                "search.asf_weights",
                "must be non-negative and not all zero",
            ));
        }

        errors
    }

    /// Whether the search treats capacity as a decision variable.
    pub fn searches_capacity(&self) -> bool {
        self.capacity.source == CapacitySource::Design
    }

    /// Builds an evaluator over `inputs` wired with this scenario's models.
    pub fn evaluator(&self, inputs: HourlyInputs) -> Evaluator {
        Evaluator::new(inputs)
            .with_pv_array(self.pv)
            .with_cost_models(self.psh_cost, self.pv_cost)
            .with_solver(HeadVolumeSolver::new(self.solver))
            .with_refill(self.dispatch.grid_refill)
            .with_initial_fill(self.simulation.initial_fill_fraction)
            .with_capacity(self.capacity)
            .with_aggregator(ObjectiveAggregator::new(self.objective))
    }
}
