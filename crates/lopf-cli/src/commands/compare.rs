use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::SolverArgs;
use crate::config::LopfConfig;

pub fn handle(
    config: &LopfConfig,
    old_path: &Path,
    new_path: &Path,
    args: &SolverArgs,
    json: bool,
) -> Result<ExitCode> {
    let solver = config.build_solver(args)?;
    let old = lopf_io::load_network(old_path)
        .with_context(|| format!("loading network {}", old_path.display()))?;
    let new = lopf_io::load_network(new_path)
        .with_context(|| format!("loading network {}", new_path.display()))?;

    info!("Solving '{}' and '{}'", old.name(), new.name());
    let mut results = solver.solve_many(&[&old, &new]).into_iter();
    let (Some(old_solution), Some(new_solution)) = (results.next(), results.next()) else {
        anyhow::bail!("expected two solutions");
    };
    let old_solution = old_solution.with_context(|| format!("solving {}", old_path.display()))?;
    let new_solution = new_solution.with_context(|| format!("solving {}", new_path.display()))?;

    let mut optimal = true;
    for solution in [&old_solution, &new_solution] {
        if !solution.is_optimal() {
            println!("{}: {}", solution.network(), solution.status());
            optimal = false;
        }
    }
    if !optimal {
        return Ok(super::not_optimal());
    }

    let comparison = lopf_algo::compare(&old_solution, &new_solution)?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&comparison).context("serializing comparison to JSON")?
        );
    } else {
        print!("{}", comparison.summary());
    }
    Ok(ExitCode::SUCCESS)
}
