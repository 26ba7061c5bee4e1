use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use lopf_core::Diagnostics;

pub fn handle(network_path: &Path) -> Result<ExitCode> {
    let network = lopf_io::load_network(network_path)
        .with_context(|| format!("loading network {}", network_path.display()))?;

    let mut diagnostics = Diagnostics::new();
    network.validate_into(&mut diagnostics);

    println!("{}: {}", network.name(), network.stats());
    for issue in diagnostics.issues() {
        println!("  {issue}");
    }
    println!("{}", diagnostics.summary());

    if diagnostics.has_errors() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
