//! Integration tests for design evaluation, feasibility gates, and search.

mod common;

use psh_fpv_sim::evaluate::{CapacityConfig, CapacitySource, DesignVector, Evaluation, Evaluator};
use psh_fpv_sim::search::{Bounds, DesignBounds, EvolutionarySearch, SearchConfig};
use psh_fpv_sim::sim::objective::{ObjectiveVector, RejectionReason};

/// Shallow pond that fills within the first morning of sun.
fn shallow_design() -> DesignVector {
    DesignVector {
        area_m2: 1600.0,
        max_depth_m: 0.5,
        static_head_m: 90.0,
        capacity_kw: Some(55.0),
    }
}

#[test]
fn shallow_pond_with_moderate_load_is_feasible() {
    let ev = Evaluator::new(common::daily_inputs(7, 1000.0, 25.0));
    let e = ev.evaluate(&shallow_design());

    assert!(e.is_feasible(), "unexpected rejection: {:?}", e.rejection);
    let summary = e.summary.expect("simulated");
    assert_eq!(summary.max_fill_ratio, 1.0);
    assert!(summary.max_excess_ratio <= 10.0);

    let o = e.objectives;
    assert!(o.grid_dependency >= 0.0 && o.grid_dependency <= 1.0);
    assert!(o.lcoe_per_kwh.is_finite() && o.lcoe_per_kwh > 0.0);
    assert!(o.capital_cost.is_finite() && o.capital_cost > 0.0);
    assert!(o.neg_utilization <= 0.0);
    assert_eq!(o.neg_utilization, -summary.utilization_factor);

    let costs = e.costs.expect("costed");
    assert_eq!(o.lcoe_per_kwh, costs.combined_lcoe());
    assert_eq!(o.capital_cost, costs.combined_capital_cost());
}

#[test]
fn deep_reservoir_that_never_fills_is_rejected() {
    let ev = Evaluator::new(common::daily_inputs(7, 1000.0, 25.0));
    let design = DesignVector {
        max_depth_m: 80.0,
        ..shallow_design()
    };
    let e = ev.evaluate(&design);

    assert_eq!(e.rejection, Some(RejectionReason::UnfilledReservoir));
    assert_eq!(e.objectives, ObjectiveVector::rejected());
    let summary = e.summary.expect("simulated before rejection");
    assert!(summary.max_fill_ratio < 1.0);
}

#[test]
fn tiny_load_with_large_array_rejected_for_export() {
    let ev = Evaluator::new(common::daily_inputs(7, 1000.0, 1.0));
    let e = ev.evaluate(&shallow_design());
    assert_eq!(e.rejection, Some(RejectionReason::ExcessExport));
    assert_eq!(e.objectives, ObjectiveVector::rejected());
}

#[test]
fn rejected_vector_is_dominated_by_any_feasible_design() {
    let ev = Evaluator::new(common::daily_inputs(7, 1000.0, 25.0));
    let feasible = ev.evaluate(&shallow_design());
    assert!(feasible.is_feasible());
    assert!(feasible.objectives.dominates(&ObjectiveVector::rejected()));
}

#[test]
fn invalid_designs_never_panic() {
    let ev = Evaluator::new(common::daily_inputs(2, 800.0, 20.0));
    for design in [
        DesignVector {
            area_m2: 0.0,
            ..shallow_design()
        },
        DesignVector {
            max_depth_m: f64::INFINITY,
            ..shallow_design()
        },
        DesignVector {
            capacity_kw: None,
            ..shallow_design()
        },
        DesignVector {
            capacity_kw: Some(-5.0),
            ..shallow_design()
        },
    ] {
        let e = ev.evaluate(&design);
        assert_eq!(e.rejection, Some(RejectionReason::InvalidGeometry), "{design}");
        assert_eq!(e.objectives, ObjectiveVector::rejected());
    }
}

#[test]
fn cost_model_capacity_is_used_when_configured() {
    let ev = Evaluator::new(common::daily_inputs(3, 1000.0, 20.0)).with_capacity(CapacityConfig {
        source: CapacitySource::CostModel,
        ..CapacityConfig::default()
    });
    let design = DesignVector {
        capacity_kw: None,
        ..DesignVector::default()
    };
    let e = ev.evaluate(&design);
    assert!(e.capacity_kw > 0.0);
    assert!(e.summary.is_some());
    let psh = e.costs.expect("costed").psh;
    assert_eq!(psh.recommended_capacity_kw, e.capacity_kw);
}

#[test]
fn pv_fraction_capacity_tracks_array_size() {
    let ev = Evaluator::new(common::daily_inputs(3, 1000.0, 20.0)).with_capacity(CapacityConfig {
        source: CapacitySource::PvFraction,
        pv_fraction: 0.25,
    });
    let e = ev.evaluate(&shallow_design());
    assert!(e.pv_capacity_kw > 0.0);
    assert!((e.capacity_kw - 0.25 * e.pv_capacity_kw).abs() < 1e-9);
}

#[test]
fn simulate_returns_hourly_records_matching_evaluation() {
    let inputs = common::daily_inputs(3, 1000.0, 20.0);
    let hours = inputs.len();
    let ev = Evaluator::new(inputs);
    let out = ev.simulate(&shallow_design()).expect("simulates");
    assert_eq!(out.records.len(), hours);
    assert_eq!(Some(out.summary), ev.evaluate(&shallow_design()).summary);
}

#[test]
fn small_search_returns_non_dominated_front() {
    let ev = Evaluator::new(common::daily_inputs(3, 1000.0, 20.0));
    let config = SearchConfig {
        population: 8,
        offspring: 4,
        generations: 3,
        bounds: DesignBounds {
            area_m2: Bounds::new(500.0, 5000.0),
            max_depth_m: Bounds::new(0.2, 3.0),
            ..DesignBounds::default()
        },
        ..SearchConfig::default()
    };
    let outcome = EvolutionarySearch::new(config, true, 7).run(&ev);

    assert!(!outcome.front.is_empty());
    assert!(outcome.evaluations >= config.population);
    for a in &outcome.front {
        for b in &outcome.front {
            assert!(!a.objectives.dominates(&b.objectives));
        }
    }
    let best = outcome
        .recommended(&config.asf_weights)
        .expect("front is non-empty");
    assert!(outcome.front.iter().any(|e| e == best));
    if outcome.front.iter().any(Evaluation::is_feasible) {
        assert!(best.is_feasible());
    }

    let again = EvolutionarySearch::new(config, true, 7).run(&ev);
    assert_eq!(outcome.front, again.front);
}
