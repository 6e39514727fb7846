//! Seeded evolutionary search over reservoir designs.
//!
//! A small elitist multi-objective loop: a random initial population, Gaussian
//! mutation with uniform crossover drawn from the current archive, and a
//! Pareto archive truncated by achievement-scalarizing score. Offspring are
//! generated sequentially from one seeded rng and evaluated in parallel, so a
//! run is reproducible for a given seed regardless of thread count.

use rand::{Rng, SeedableRng, rngs::StdRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::evaluate::{DesignVector, Evaluation, Evaluator};
use crate::profiles::gaussian_noise;
use crate::sim::objective::ObjectiveVector;

/// Closed interval for one decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn clamp(&self, v: f64) -> f64 {
        v.clamp(self.min, self.max)
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        self.min + rng.random::<f64>() * self.span()
    }

    fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min > 0.0 && self.min <= self.max
    }
}

/// Search domain of the four decision variables.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DesignBounds {
    pub area_m2: Bounds,
    pub max_depth_m: Bounds,
    pub static_head_m: Bounds,
    pub capacity_kw: Bounds,
}

impl Default for DesignBounds {
    fn default() -> Self {
        Self {
            area_m2: Bounds::new(1.0, 100_000.0),
            max_depth_m: Bounds::new(1.0, 100.0),
            static_head_m: Bounds::new(1.0, 100.0),
            capacity_kw: Bounds::new(1.0, 10_000.0),
        }
    }
}

impl DesignBounds {
    /// Names of bounds that are empty, inverted, or include non-positive values.
    pub fn invalid_fields(&self) -> Vec<&'static str> {
        [
            ("area_m2", self.area_m2),
            ("max_depth_m", self.max_depth_m),
            ("static_head_m", self.static_head_m),
            ("capacity_kw", self.capacity_kw),
        ]
        .into_iter()
        .filter(|(_, b)| !b.is_valid())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Evolutionary search settings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Initial population and archive size.
    pub population: usize,
    /// New designs evaluated per generation.
    pub offspring: usize,
    pub generations: usize,
    /// Mutation standard deviation as a fraction of each variable's range.
    pub mutation_scale: f64,
    /// Probability of taking each variable from a second parent.
    pub crossover_rate: f64,
    /// Weights for picking one design off the front.
    pub asf_weights: [f64; ObjectiveVector::LEN],
    pub bounds: DesignBounds,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            population: 100,
            offspring: 25,
            generations: 40,
            mutation_scale: 0.1,
            crossover_rate: 0.5,
            asf_weights: [0.95, 0.02, 0.02, 0.01],
            bounds: DesignBounds::default(),
        }
    }
}

/// Result of a search run.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Final non-dominated archive.
    pub front: Vec<Evaluation>,
    /// Total designs evaluated.
    pub evaluations: usize,
}

impl SearchOutcome {
    /// Front member with the lowest ASF score.
    pub fn recommended(&self, weights: &[f64; ObjectiveVector::LEN]) -> Option<&Evaluation> {
        select_by_asf(&self.front, weights).map(|i| &self.front[i])
    }
}

/// Seeded multi-objective search driver.
#[derive(Debug, Clone)]
pub struct EvolutionarySearch {
    config: SearchConfig,
    include_capacity: bool,
    rng: StdRng,
}

impl EvolutionarySearch {
    /// Creates a search.
    ///
    /// # Arguments
    ///
    /// * `config` - Population sizes, mutation, and bounds
    /// * `include_capacity` - Whether capacity is a decision variable
    /// * `seed` - Master seed for every random draw
    pub fn new(config: SearchConfig, include_capacity: bool, seed: u64) -> Self {
        Self {
            config,
            include_capacity,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Runs every generation and returns the final archive.
    pub fn run(&mut self, evaluator: &Evaluator) -> SearchOutcome {
        let population = self.config.population.max(1);
        let initial: Vec<DesignVector> = (0..population).map(|_| self.random_design()).collect();
        let mut evaluations = initial.len();
        let mut archive = self.truncate(pareto_front(evaluate_all(evaluator, &initial)));
        log_generation(0, &archive, evaluations);

        for generation in 1..=self.config.generations {
            let children: Vec<DesignVector> = (0..self.config.offspring)
                .map(|_| self.child(&archive))
                .collect();
            evaluations += children.len();

            let mut pool = archive;
            pool.extend(evaluate_all(evaluator, &children));
            archive = self.truncate(pareto_front(pool));
            log_generation(generation, &archive, evaluations);
        }

        SearchOutcome {
            front: archive,
            evaluations,
        }
    }

    fn random_design(&mut self) -> DesignVector {
        let b = self.config.bounds;
        DesignVector {
            area_m2: b.area_m2.sample(&mut self.rng),
            max_depth_m: b.max_depth_m.sample(&mut self.rng),
            static_head_m: b.static_head_m.sample(&mut self.rng),
            capacity_kw: self
                .include_capacity
                .then(|| b.capacity_kw.sample(&mut self.rng)),
        }
    }

    fn child(&mut self, archive: &[Evaluation]) -> DesignVector {
        if archive.is_empty() {
            return self.random_design();
        }
        let a = archive[self.rng.random_range(0..archive.len())].design;
        let b = archive[self.rng.random_range(0..archive.len())].design;
        let rate = self.config.crossover_rate;
        let scale = self.config.mutation_scale;
        let bounds = self.config.bounds;

        let gene = |x: f64, y: f64, bounds: Bounds, rng: &mut StdRng| {
            let base = if rng.random::<f64>() < rate { y } else { x };
            bounds.clamp(base + gaussian_noise(rng, scale * bounds.span()))
        };

        let rng = &mut self.rng;
        let area_m2 = gene(a.area_m2, b.area_m2, bounds.area_m2, rng);
        let max_depth_m = gene(a.max_depth_m, b.max_depth_m, bounds.max_depth_m, rng);
        let static_head_m = gene(a.static_head_m, b.static_head_m, bounds.static_head_m, rng);
        let capacity_kw = if self.include_capacity {
            let x = a.capacity_kw.unwrap_or(bounds.capacity_kw.min);
            let y = b.capacity_kw.unwrap_or(bounds.capacity_kw.min);
            Some(gene(x, y, bounds.capacity_kw, rng))
        } else {
            None
        };

        DesignVector {
            area_m2,
            max_depth_m,
            static_head_m,
            capacity_kw,
        }
    }

    /// Keeps at most `population` members, lowest ASF score first.
    fn truncate(&self, mut front: Vec<Evaluation>) -> Vec<Evaluation> {
        let limit = self.config.population.max(1);
        if front.len() <= limit {
            return front;
        }
        let scores = asf_scores(&front, &self.config.asf_weights);
        let mut order: Vec<usize> = (0..front.len()).collect();
        order.sort_by(|&i, &j| scores[i].total_cmp(&scores[j]).then(i.cmp(&j)));
        let mut keep = vec![false; front.len()];
        for &i in order.iter().take(limit) {
            keep[i] = true;
        }
        let mut flags = keep.into_iter();
        front.retain(|_| flags.next().unwrap_or(false));
        front
    }
}

fn evaluate_all(evaluator: &Evaluator, designs: &[DesignVector]) -> Vec<Evaluation> {
    designs.par_iter().map(|d| evaluator.evaluate(d)).collect()
}

fn log_generation(generation: usize, archive: &[Evaluation], evaluations: usize) {
    let feasible = archive.iter().filter(|e| e.is_feasible()).count();
    let best_grid = archive
        .iter()
        .filter(|e| e.is_feasible())
        .map(|e| e.objectives.grid_dependency)
        .fold(f64::INFINITY, f64::min);
    info!(
        generation,
        front = archive.len(),
        feasible,
        evaluations,
        best_grid_dependency = best_grid,
        "search generation complete"
    );
}

/// Members not dominated by any other member, in input order.
///
/// Equal objective vectors do not dominate each other, so duplicates survive.
pub fn pareto_front(evals: Vec<Evaluation>) -> Vec<Evaluation> {
    let dominated: Vec<bool> = evals
        .iter()
        .map(|e| evals.iter().any(|o| o.objectives.dominates(&e.objectives)))
        .collect();
    evals
        .into_iter()
        .zip(dominated)
        .filter_map(|(e, d)| (!d).then_some(e))
        .collect()
}

/// Achievement-scalarizing scores: objectives normalized by ideal and nadir
/// over `evals`, then `max_i(w_i * f_i)`. A larger weight makes an objective
/// count more. Lower is better.
pub fn asf_scores(evals: &[Evaluation], weights: &[f64; ObjectiveVector::LEN]) -> Vec<f64> {
    let mut ideal = [f64::INFINITY; ObjectiveVector::LEN];
    let mut nadir = [f64::NEG_INFINITY; ObjectiveVector::LEN];
    for e in evals {
        for (k, v) in e.objectives.as_array().into_iter().enumerate() {
            ideal[k] = ideal[k].min(v);
            nadir[k] = nadir[k].max(v);
        }
    }

    evals
        .iter()
        .map(|e| {
            e.objectives
                .as_array()
                .into_iter()
                .enumerate()
                .map(|(k, v)| {
                    let range = nadir[k] - ideal[k];
                    let norm = if range > 0.0 { (v - ideal[k]) / range } else { 0.0 };
                    norm * weights[k]
                })
                .fold(f64::NEG_INFINITY, f64::max)
        })
        .collect()
}

/// Index of the member with the lowest ASF score; ties go to the earliest.
pub fn select_by_asf(
    front: &[Evaluation],
    weights: &[f64; ObjectiveVector::LEN],
) -> Option<usize> {
    asf_scores(front, weights)
        .into_iter()
        .enumerate()
        .min_by(|(i, a), (j, b)| a.total_cmp(b).then(i.cmp(j)))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::HourlyInputs;

    fn eval_with(objs: [f64; 4]) -> Evaluation {
        Evaluation {
            design: DesignVector::default(),
            objectives: ObjectiveVector {
                grid_dependency: objs[0],
                lcoe_per_kwh: objs[1],
                capital_cost: objs[2],
                neg_utilization: objs[3],
            },
            rejection: None,
            summary: None,
            costs: None,
            capacity_kw: 0.0,
            pv_capacity_kw: 0.0,
        }
    }

    #[test]
    fn pareto_front_drops_dominated() {
        let evals = vec![
            eval_with([0.2, 1.0, 100.0, -0.1]),
            eval_with([0.3, 1.0, 100.0, -0.1]),
            eval_with([0.5, 0.5, 50.0, -0.2]),
            eval_with([0.2, 1.0, 100.0, -0.1]),
        ];
        let front = pareto_front(evals);
        assert_eq!(front.len(), 3);
        assert!(front.iter().all(|e| e.objectives.grid_dependency != 0.3));
    }

    #[test]
    fn rejected_never_on_front_with_feasible() {
        let mut rejected = eval_with([0.0; 4]);
        rejected.objectives = ObjectiveVector::rejected();
        let front = pareto_front(vec![rejected, eval_with([0.99, 5e8, 5e8, 0.0])]);
        assert_eq!(front.len(), 1);
        assert_ne!(front[0].objectives, ObjectiveVector::rejected());
    }

    #[test]
    fn asf_prefers_heavily_weighted_objective() {
        let front = vec![
            eval_with([0.1, 2.0, 200.0, -0.1]),
            eval_with([0.5, 1.0, 100.0, -0.3]),
        ];
        assert_eq!(select_by_asf(&front, &[0.95, 0.02, 0.02, 0.01]), Some(0));
        assert_eq!(select_by_asf(&front, &[0.01, 0.5, 0.5, 0.5]), Some(1));
        assert_eq!(select_by_asf(&[], &[0.25; 4]), None);
    }

    #[test]
    fn asf_constant_objectives_tie_to_first() {
        let front = vec![eval_with([0.2; 4]), eval_with([0.2; 4])];
        assert_eq!(select_by_asf(&front, &[0.25; 4]), Some(0));
    }

    #[test]
    fn bounds_validation() {
        let mut b = DesignBounds::default();
        assert!(b.invalid_fields().is_empty());
        b.max_depth_m = Bounds::new(10.0, 5.0);
        b.area_m2 = Bounds::new(0.0, 5.0);
        assert_eq!(b.invalid_fields(), vec!["area_m2", "max_depth_m"]);
    }

    fn small_search() -> (Evaluator, SearchConfig) {
        let hours = 24 * 4;
        let irr: Vec<f64> = (0..hours)
            .map(|h| if (7..17).contains(&(h % 24)) { 700.0 } else { 0.0 })
            .collect();
        let inputs =
            HourlyInputs::new(irr, vec![25.0; hours], vec![20.0; hours]).expect("valid inputs");
        let config = SearchConfig {
            population: 8,
            offspring: 4,
            generations: 3,
            bounds: DesignBounds {
                area_m2: Bounds::new(200.0, 5000.0),
                max_depth_m: Bounds::new(1.0, 5.0),
                static_head_m: Bounds::new(20.0, 100.0),
                capacity_kw: Bounds::new(5.0, 200.0),
            },
            ..SearchConfig::default()
        };
        (Evaluator::new(inputs), config)
    }

    #[test]
    fn search_is_reproducible_for_a_seed() {
        let (ev, config) = small_search();
        let a = EvolutionarySearch::new(config, true, 11).run(&ev);
        let b = EvolutionarySearch::new(config, true, 11).run(&ev);
        assert_eq!(a.evaluations, 8 + 3 * 4);
        assert_eq!(a.front, b.front);
    }

    #[test]
    fn search_respects_bounds_and_archive_size() {
        let (ev, config) = small_search();
        let out = EvolutionarySearch::new(config, true, 5).run(&ev);
        assert!(!out.front.is_empty() && out.front.len() <= config.population);
        for e in &out.front {
            let d = e.design;
            assert!((200.0..=5000.0).contains(&d.area_m2));
            assert!((1.0..=5.0).contains(&d.max_depth_m));
            assert!((20.0..=100.0).contains(&d.static_head_m));
            let kw = d.capacity_kw.expect("capacity searched");
            assert!((5.0..=200.0).contains(&kw));
        }
        assert!(out.recommended(&config.asf_weights).is_some());
    }

    #[test]
    fn capacity_omitted_when_not_searched() {
        let (_, config) = small_search();
        let mut search = EvolutionarySearch::new(config, false, 3);
        assert!(search.random_design().capacity_kw.is_none());
    }
}
