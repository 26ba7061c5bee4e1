//! # lopf-io: network description documents
//!
//! Reads and writes [`Network`]s as JSON or YAML documents. The format is
//! picked from the file extension (`.json`, `.yaml`, `.yml`).
//!
//! ```yaml
//! name: island
//! snapshots: {start: "2024-01-01 00:00", end: "2024-01-01 23:00", freq: h}
//! buses:
//!   - name: Island
//! generators:
//!   - {name: Gas, bus: Island, p_nom: 150, marginal_cost: 70, emission_factor: 0.4}
//!   - {name: Solar, bus: Island, p_nom_extendable: true, capital_cost: 600,
//!      p_max_pu: [0, 0, 0.1, 0.4, 0.8, 1.0, 0.8, 0.4, 0.1, 0, 0, 0]}
//! loads:
//!   - {name: Demand, bus: Island, p_set: 180}
//! ```
//!
//! Series accept a scalar (repeated for every snapshot) or a list. Writing a
//! network and reading it back yields the same optimization problem.

pub mod document;
pub mod format;

use std::fs;
use std::path::Path;

use lopf_core::{LopfError, LopfResult, Network};
use tracing::debug;

pub use document::{
    BusSpec, CapitalCost, GeneratorSpec, LineSpec, LoadSpec, NetworkDocument, Series,
    SnapshotsSpec,
};
pub use format::DocumentFormat;

fn json_error(err: serde_json::Error) -> LopfError {
    LopfError::Parse(format!("invalid JSON network document: {err}"))
}

fn yaml_error(err: serde_yaml::Error) -> LopfError {
    LopfError::Parse(format!("invalid YAML network document: {err}"))
}

pub fn from_json_str(text: &str) -> LopfResult<Network> {
    let doc: NetworkDocument = serde_json::from_str(text).map_err(json_error)?;
    doc.to_network()
}

pub fn from_yaml_str(text: &str) -> LopfResult<Network> {
    let doc: NetworkDocument = serde_yaml::from_str(text).map_err(yaml_error)?;
    doc.to_network()
}

pub fn to_document(network: &Network) -> NetworkDocument {
    NetworkDocument::from_network(network)
}

pub fn to_json_string(network: &Network) -> LopfResult<String> {
    serde_json::to_string_pretty(&to_document(network)).map_err(json_error)
}

pub fn to_yaml_string(network: &Network) -> LopfResult<String> {
    serde_yaml::to_string(&to_document(network)).map_err(yaml_error)
}

/// Read a network document, choosing the format from the extension.
pub fn load_network(path: &Path) -> LopfResult<Network> {
    let format = DocumentFormat::from_path(path)?;
    let text = fs::read_to_string(path)?;
    let network = match format {
        DocumentFormat::Json => from_json_str(&text),
        DocumentFormat::Yaml => from_yaml_str(&text),
    }?;
    debug!(
        path = %path.display(),
        %format,
        buses = network.buses().len(),
        generators = network.generators().len(),
        snapshots = network.snapshot_count(),
        "loaded network"
    );
    Ok(network)
}

pub fn save_network(network: &Network, path: &Path) -> LopfResult<()> {
    let text = match DocumentFormat::from_path(path)? {
        DocumentFormat::Json => to_json_string(network)?,
        DocumentFormat::Yaml => to_yaml_string(network)?,
    };
    fs::write(path, text)?;
    Ok(())
}
