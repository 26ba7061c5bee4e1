use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use lopf_algo::Solution;
use tabwriter::TabWriter;
use tracing::info;

use crate::cli::{OutputFormat, SolverArgs};
use crate::config::LopfConfig;

pub fn handle(
    config: &LopfConfig,
    network_path: &Path,
    args: &SolverArgs,
    format: Option<OutputFormat>,
    out: Option<&Path>,
) -> Result<ExitCode> {
    let format = config.output_format(format)?;
    let out_dir = config.output_directory(out);
    let solver = config.build_solver(args)?;

    let network = lopf_io::load_network(network_path)
        .with_context(|| format!("loading network {}", network_path.display()))?;
    info!(
        "Solving {} with {} ({} flow model)",
        network.stats(),
        solver.backend_id(),
        solver.flow_model()
    );
    let solution = solver.solve(&network)?;

    if !solution.is_optimal() {
        println!("Status: {}", solution.status());
        if let Some(message) = solution.message() {
            println!("{message}");
        }
        return Ok(super::not_optimal());
    }

    match format {
        OutputFormat::Table => print_tables(&solution)?,
        OutputFormat::Json => println!("{}", solution.to_json()?),
        OutputFormat::Csv => {
            let dir = out_dir
                .as_deref()
                .ok_or_else(|| anyhow!("csv output needs --out DIR or [output] directory"))?;
            let written = solution.write_csv_tables(dir)?;
            println!("Wrote {} to {}", written.join(", "), dir.display());
        }
    }
    if format != OutputFormat::Csv {
        if let Some(dir) = out_dir {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating output directory {}", dir.display()))?;
            let path = dir.join("solution.json");
            solution.write_json(&path)?;
            info!("Wrote {}", path.display());
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_tables(solution: &Solution) -> Result<()> {
    print!("{}", solution.summary());
    println!();

    let mut writer = TabWriter::new(io::stdout()).padding(2);
    write!(writer, "SNAPSHOT")?;
    for generator in solution.generators() {
        write!(writer, "\t{}", generator.name)?;
    }
    for prices in solution.prices() {
        write!(writer, "\tPRICE {}", prices.bus)?;
    }
    writeln!(writer)?;

    for (t, timestamp) in solution.snapshots().iter().enumerate() {
        write!(writer, "{}", timestamp.format("%Y-%m-%d %H:%M"))?;
        for generator in solution.generators() {
            write!(writer, "\t{:.2}", generator.p[t])?;
        }
        for prices in solution.prices() {
            write!(writer, "\t{:.2}", prices.marginal_price[t])?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;

    if !solution.line_flows().is_empty() {
        println!();
        let mut writer = TabWriter::new(io::stdout()).padding(2);
        writeln!(writer, "LINE\tFROM\tTO\tMAX |FLOW|")?;
        for line in solution.line_flows() {
            let peak = line.p0.iter().fold(0.0_f64, |acc, p| acc.max(p.abs()));
            writeln!(writer, "{}\t{}\t{}\t{:.2}", line.name, line.bus0, line.bus1, peak)?;
        }
        writer.flush()?;
    }
    Ok(())
}
