//! PSH + floating PV simulator entry point: CLI wiring and config-driven evaluation.

use std::io;
use std::path::Path;
use std::process;

use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use psh_fpv_sim::config::ScenarioConfig;
use psh_fpv_sim::evaluate::{DesignVector, Evaluation, Evaluator};
use psh_fpv_sim::inputs::HourlyInputs;
use psh_fpv_sim::io::export::{export_csv, export_front_csv};
use psh_fpv_sim::io::series::load_series;
use psh_fpv_sim::profiles::synthetic_year;
use psh_fpv_sim::search::EvolutionarySearch;

/// Parsed CLI arguments.
struct CliArgs {
    scenario_path: Option<String>,
    preset: Option<String>,
    series_path: Option<String>,
    seed_override: Option<u64>,
    design: Option<DesignVector>,
    search: bool,
    telemetry_out: Option<String>,
    front_out: Option<String>,
    json: bool,
}

/// JSON report of a search run.
#[derive(Serialize)]
struct SearchReport<'a> {
    evaluations: usize,
    recommended: Option<&'a Evaluation>,
    front: &'a [Evaluation],
}

fn print_help() {
    eprintln!("psh-fpv-sim: pumped-storage hydro + floating PV simulator");
    eprintln!();
    eprintln!("Usage: psh-fpv-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>        Load scenario from TOML config file");
    eprintln!(
        "  --preset <name>          Use a built-in preset ({})",
        ScenarioConfig::PRESETS.join(", ")
    );
    eprintln!("  --series <path>          Hourly CSV (irradiance_w_m2,ambient_temp_c,load_kw)");
    eprintln!("  --seed <u64>             Override random seed");
    eprintln!("  --design <a,d,h[,c]>     Override design: area m², depth m, head m, capacity kW");
    eprintln!("  --search                 Run the evolutionary design search");
    eprintln!("  --telemetry-out <path>   Export hourly records of the evaluated design to CSV");
    eprintln!("  --front-out <path>       Export the search front to CSV");
    eprintln!("  --json                   Print the report as JSON");
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the baseline preset is used.");
    eprintln!("If no --series is given, a synthetic year is generated from [weather].");
}

/// Returns the value following a flag or exits with an error.
fn take_value(args: &[String], i: &mut usize, flag: &str, what: &str) -> String {
    *i += 1;
    if *i >= args.len() {
        eprintln!("error: {flag} requires a {what} argument");
        process::exit(1);
    }
    args[*i].clone()
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        scenario_path: None,
        preset: None,
        series_path: None,
        seed_override: None,
        design: None,
        search: false,
        telemetry_out: None,
        front_out: None,
        json: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--scenario" => {
                cli.scenario_path = Some(take_value(&args, &mut i, "--scenario", "path"));
            }
            "--preset" => {
                cli.preset = Some(take_value(&args, &mut i, "--preset", "name"));
            }
            "--series" => {
                cli.series_path = Some(take_value(&args, &mut i, "--series", "path"));
            }
            "--seed" => {
                let raw = take_value(&args, &mut i, "--seed", "u64");
                if let Ok(s) = raw.parse::<u64>() {
                    cli.seed_override = Some(s);
                } else {
                    eprintln!("error: --seed value \"{raw}\" is not a valid u64");
                    process::exit(1);
                }
            }
            "--design" => {
                let raw = take_value(&args, &mut i, "--design", "design");
                match raw.parse::<DesignVector>() {
                    Ok(d) => cli.design = Some(d),
                    Err(e) => {
                        eprintln!("error: --design value \"{raw}\": {e}");
                        process::exit(1);
                    }
                }
            }
            "--search" => {
                cli.search = true;
            }
            "--json" => {
                cli.json = true;
            }
            "--telemetry-out" => {
                cli.telemetry_out = Some(take_value(&args, &mut i, "--telemetry-out", "path"));
            }
            "--front-out" => {
                cli.front_out = Some(take_value(&args, &mut i, "--front-out", "path"));
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn load_config(cli: &CliArgs) -> ScenarioConfig {
    // --scenario takes priority, then --preset, then baseline default
    let loaded = if let Some(ref path) = cli.scenario_path {
        ScenarioConfig::from_toml_file(Path::new(path))
    } else if let Some(ref name) = cli.preset {
        ScenarioConfig::from_preset(name)
    } else {
        Ok(ScenarioConfig::baseline())
    };
    let mut scenario = loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    if let Some(seed) = cli.seed_override {
        scenario.simulation.seed = seed;
    }
    if let Some(design) = cli.design {
        scenario.design = design;
    }

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    scenario
}

fn load_inputs(cli: &CliArgs, cfg: &ScenarioConfig) -> HourlyInputs {
    let loaded = match cli.series_path {
        Some(ref path) => load_series(Path::new(path)),
        None => synthetic_year(&cfg.weather, cfg.simulation.seed),
    };
    loaded.unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    })
}

fn print_json(report: &impl Serialize) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("error: failed to serialize report: {e}");
            process::exit(1);
        }
    }
}

fn print_evaluation(evaluation: &Evaluation) {
    println!("Design: {}", evaluation.design);
    println!(
        "Capacity: {:.1} kW machine, {:.1} kW PV",
        evaluation.capacity_kw, evaluation.pv_capacity_kw
    );
    if let Some(ref summary) = evaluation.summary {
        println!("\n{summary}");
    }
    println!("\n{}", evaluation.objectives);
    match evaluation.rejection {
        Some(reason) => println!("Rejected: {reason}"),
        None => println!("Feasible"),
    }
}

fn run_single(cli: &CliArgs, cfg: &ScenarioConfig, evaluator: &Evaluator) {
    let evaluation = evaluator.evaluate(&cfg.design);
    if cli.json {
        print_json(&evaluation);
    } else {
        print_evaluation(&evaluation);
    }

    if let Some(ref path) = cli.telemetry_out {
        let output = evaluator.simulate(&cfg.design).unwrap_or_else(|e| {
            eprintln!("error: {e}");
            process::exit(1);
        });
        if let Err(e) = export_csv(&output.records, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Telemetry written to {path}");
    }
}

fn run_search(cli: &CliArgs, cfg: &ScenarioConfig, evaluator: &Evaluator) {
    let mut search = EvolutionarySearch::new(
        cfg.search,
        cfg.searches_capacity(),
        cfg.simulation.seed,
    );
    let outcome = search.run(evaluator);
    let recommended = outcome.recommended(&cfg.search.asf_weights);

    if cli.json {
        print_json(&SearchReport {
            evaluations: outcome.evaluations,
            recommended,
            front: &outcome.front,
        });
    } else {
        println!(
            "Front: {} designs from {} evaluations",
            outcome.front.len(),
            outcome.evaluations
        );
        match recommended {
            Some(best) => {
                println!("Recommended design: {}", best.design);
                println!(
                    "Capacity: {:.1} kW machine, {:.1} kW PV",
                    best.capacity_kw, best.pv_capacity_kw
                );
                println!("\n{}", best.objectives);
            }
            None => println!("Front is empty"),
        }
    }

    if let Some(ref path) = cli.front_out {
        if let Err(e) = export_front_csv(&outcome.front, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Front written to {path}");
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = parse_args();
    let scenario = load_config(&cli);
    let inputs = load_inputs(&cli, &scenario);
    info!(hours = inputs.len(), seed = scenario.simulation.seed, "inputs ready");

    let evaluator = scenario.evaluator(inputs);
    if cli.search {
        run_search(&cli, &scenario, &evaluator);
    } else {
        run_single(&cli, &scenario, &evaluator);
    }
}
