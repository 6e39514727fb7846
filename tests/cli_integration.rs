//! End-to-end CLI runs against small hourly series.

mod common;

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

/// Unique temp path per test and process.
fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("psh-fpv-sim-{}-{name}", std::process::id()))
}

/// Writes a three-day series with a daily irradiance bell and a 25 kW load.
fn write_series(name: &str) -> PathBuf {
    let path = temp_path(name);
    let mut csv = String::from("irradiance_w_m2,ambient_temp_c,load_kw\n");
    for g in common::daily_pv(3, 1000.0) {
        csv.push_str(&format!("{g:.3},20.0,25.0\n"));
    }
    fs::write(&path, csv).expect("series written");
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_psh-fpv-sim"))
        .args(args)
        .output()
        .expect("psh-fpv-sim process should run")
}

fn parse_metric(stdout: &str, label: &str, unit: &str) -> f64 {
    let line = stdout
        .lines()
        .find(|line| line.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing line `{label}` in output: {stdout}"));

    let raw = line
        .split_once(':')
        .map(|(_, right)| right.trim())
        .unwrap_or_else(|| panic!("invalid format for line `{line}`"));

    let numeric = raw.strip_suffix(unit).unwrap_or(raw).trim();
    numeric
        .parse::<f64>()
        .unwrap_or_else(|_| panic!("failed parsing `{numeric}` from line `{line}`"))
}

#[test]
fn single_design_run_prints_summary_and_exports_telemetry() {
    let series = write_series("single.csv");
    let telemetry = temp_path("single-telemetry.csv");
    let output = run(&[
        "--preset",
        "baseline",
        "--series",
        series.to_str().expect("utf-8 path"),
        "--design",
        "1600,0.5,90,55",
        "--telemetry-out",
        telemetry.to_str().expect("utf-8 path"),
    ]);
    assert!(
        output.status.success(),
        "run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    assert_eq!(parse_metric(&stdout, "Hours simulated:", ""), 72.0);
    let grid = parse_metric(&stdout, "Grid dependency:", "%");
    assert!((0.0..=100.0).contains(&grid), "grid dependency {grid}");
    assert!(stdout.contains("--- Objectives ---"));
    assert!(stdout.contains("Feasible") || stdout.contains("Rejected:"));

    let csv = fs::read_to_string(&telemetry).expect("telemetry written");
    assert_eq!(csv.lines().count(), 73);
    assert!(csv.starts_with("hour,pv_kw,load_kw"));

    fs::remove_file(series).ok();
    fs::remove_file(telemetry).ok();
}

#[test]
fn search_run_prints_front_and_exports_it() {
    let series = write_series("search.csv");
    let scenario = temp_path("search.toml");
    let front = temp_path("search-front.csv");
    fs::write(
        &scenario,
        r#"
[search]
population = 6
offspring = 3
generations = 2

[search.bounds]
area_m2 = { min = 500.0, max = 4000.0 }
max_depth_m = { min = 0.2, max = 3.0 }
"#,
    )
    .expect("scenario written");

    let output = run(&[
        "--scenario",
        scenario.to_str().expect("utf-8 path"),
        "--series",
        series.to_str().expect("utf-8 path"),
        "--search",
        "--front-out",
        front.to_str().expect("utf-8 path"),
    ]);
    assert!(
        output.status.success(),
        "search failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be valid UTF-8");
    assert!(stdout.starts_with("Front: "), "{stdout}");
    let csv = fs::read_to_string(&front).expect("front written");
    assert!(csv.lines().count() >= 2);

    fs::remove_file(series).ok();
    fs::remove_file(scenario).ok();
    fs::remove_file(front).ok();
}

#[test]
fn unknown_preset_fails() {
    let output = run(&["--preset", "nonexistent"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown preset"), "{stderr}");
}

#[test]
fn invalid_scenario_reports_field() {
    let scenario = temp_path("invalid.toml");
    fs::write(&scenario, "[simulation]\ninitial_fill_fraction = 2.0\n").expect("written");
    let output = run(&["--scenario", scenario.to_str().expect("utf-8 path")]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("simulation.initial_fill_fraction"), "{stderr}");
    fs::remove_file(scenario).ok();
}

#[test]
fn malformed_design_fails() {
    let output = run(&["--design", "1600,abc,90"]);
    assert!(!output.status.success());
}

#[test]
fn json_report_carries_design_and_objectives() {
    let series = write_series("json.csv");
    let output = run(&[
        "--series",
        series.to_str().expect("utf-8 path"),
        "--design",
        "1600,0.5,90,55",
        "--json",
    ]);
    assert!(
        output.status.success(),
        "run failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(report["design"]["area_m2"], 1600.0);
    assert_eq!(report["capacity_kw"], 55.0);
    assert!(report["objectives"]["grid_dependency"].is_number());
    assert_eq!(report["summary"]["hours"], 72);

    fs::remove_file(series).ok();
}
