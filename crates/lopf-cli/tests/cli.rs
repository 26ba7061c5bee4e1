use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn merit_order(demand: f64) -> Value {
    json!({
        "name": "merit-order",
        "snapshots": {"start": "2024-01-01 00:00", "end": "2024-01-01 05:00", "freq": "h"},
        "buses": [{"name": "Bus"}],
        "generators": [
            {"name": "Base", "bus": "Bus", "p_nom": 200, "marginal_cost": 40,
             "carrier": "coal", "emission_factor": 0.9},
            {"name": "Peak", "bus": "Bus", "p_nom": 150, "marginal_cost": 70,
             "carrier": "gas", "emission_factor": 0.4}
        ],
        "loads": [{"name": "Load", "bus": "Bus", "p_set": demand}]
    })
}

fn with_solar(mut doc: Value) -> Value {
    doc["name"] = json!("with-solar");
    doc["generators"].as_array_mut().unwrap().push(json!({
        "name": "Solar", "bus": "Bus", "p_nom_extendable": true, "capital_cost": 5,
        "p_max_pu": [0.0, 0.2, 0.6, 1.0, 0.6, 0.2], "carrier": "solar"
    }));
    doc
}

fn write(dir: &TempDir, name: &str, doc: &Value) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, serde_json::to_string_pretty(doc).unwrap()).unwrap();
    path
}

fn lopf(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("lopf").unwrap();
    cmd.current_dir(dir);
    cmd
}

#[test]
fn lopf_solvers_lists_clarabel() {
    let dir = tempdir().unwrap();
    lopf(dir.path())
        .arg("solvers")
        .assert()
        .success()
        .stdout(predicate::str::contains("clarabel"));
}

#[test]
fn lopf_solve_prints_table() {
    let dir = tempdir().unwrap();
    let network = write(&dir, "network.json", &merit_order(220.0));
    lopf(dir.path())
        .args(["solve", network.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("optimal"))
        .stdout(predicate::str::contains("PRICE Bus"))
        .stdout(predicate::str::contains("2024-01-01 05:00"));
}

#[test]
fn lopf_solve_json_output() {
    let dir = tempdir().unwrap();
    let network = write(&dir, "network.json", &merit_order(180.0));
    let output = lopf(dir.path())
        .args(["solve", network.to_str().unwrap(), "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let solution: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(solution["status"], "optimal");
    let objective = solution["objective"].as_f64().unwrap();
    assert!((objective - 180.0 * 40.0 * 6.0).abs() < 1.0);
}

#[test]
fn lopf_solve_writes_csv_tables() {
    let dir = tempdir().unwrap();
    let network = write(&dir, "network.json", &with_solar(merit_order(180.0)));
    let out = dir.path().join("results");
    lopf(dir.path())
        .args([
            "solve",
            network.to_str().unwrap(),
            "--format",
            "csv",
            "--out",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("generators-p.csv"));
    assert!(out.join("generators-p.csv").exists());
    assert!(out.join("buses-marginal_price.csv").exists());
    let capacities = fs::read_to_string(out.join("capacities.csv")).unwrap();
    assert!(capacities.contains("generator,Solar,"));
}

#[test]
fn lopf_solve_csv_without_directory_fails() {
    let dir = tempdir().unwrap();
    let network = write(&dir, "network.json", &merit_order(180.0));
    lopf(dir.path())
        .args(["solve", network.to_str().unwrap(), "--format", "csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--out"));
}

#[test]
fn lopf_solve_infeasible_exits_with_two() {
    let dir = tempdir().unwrap();
    let network = write(&dir, "network.json", &merit_order(400.0));
    lopf(dir.path())
        .args(["solve", network.to_str().unwrap()])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("infeasible"));
}

#[test]
fn lopf_solve_rejects_unknown_solver() {
    let dir = tempdir().unwrap();
    let network = write(&dir, "network.json", &merit_order(180.0));
    lopf(dir.path())
        .args(["solve", network.to_str().unwrap(), "--solver", "cplex"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown lp solver 'cplex'"));
}

#[test]
fn lopf_solve_reads_config_file() {
    let dir = tempdir().unwrap();
    let network = write(&dir, "network.json", &merit_order(180.0));
    fs::write(
        dir.path().join("lopf.toml"),
        "[output]\nformat = \"json\"\n[solver]\nflow_model = \"dc_angle\"\n",
    )
    .unwrap();
    let output = lopf(dir.path())
        .args(["solve", network.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let solution: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(solution["status"], "optimal");

    let bad = dir.path().join("bad.toml");
    fs::write(&bad, "[solver]\nbackend = \"cplex\"\n").unwrap();
    lopf(dir.path())
        .args(["--config", bad.to_str().unwrap(), "solve", network.to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn lopf_compare_reports_reduction() {
    let dir = tempdir().unwrap();
    let old = write(&dir, "old.json", &merit_order(180.0));
    let new = write(&dir, "new.json", &with_solar(merit_order(180.0)));
    lopf(dir.path())
        .args(["compare", old.to_str().unwrap(), new.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Emissions reduction:"))
        .stdout(predicate::str::contains("Payback ratio:"));

    let output = lopf(dir.path())
        .args(["compare", old.to_str().unwrap(), new.to_str().unwrap(), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let comparison: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(comparison["objective_delta"].as_f64().unwrap() < 0.0);
    assert!(comparison["emissions_reduction_pct"].as_f64().unwrap() > 0.0);
}

#[test]
fn lopf_validate_reports_stats_and_warnings() {
    let dir = tempdir().unwrap();
    let mut doc = merit_order(180.0);
    doc["buses"].as_array_mut().unwrap().push(json!({"name": "Orphan"}));
    let network = write(&dir, "network.json", &doc);
    lopf(dir.path())
        .args(["validate", network.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 buses"))
        .stdout(predicate::str::contains("warning"));
}

#[test]
fn lopf_validate_fails_on_dangling_bus() {
    let dir = tempdir().unwrap();
    let mut doc = merit_order(180.0);
    doc["loads"][0]["bus"] = json!("Nowhere");
    let network = write(&dir, "network.json", &doc);
    lopf(dir.path())
        .args(["validate", network.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown bus 'Nowhere'"));
}
