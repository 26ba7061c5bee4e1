use std::fmt;
use std::path::Path;

use lopf_core::{LopfError, LopfResult};

/// Serialization of a network document, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    pub const ALL: &'static [DocumentFormat] = &[DocumentFormat::Json, DocumentFormat::Yaml];

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            DocumentFormat::Json => &["json"],
            DocumentFormat::Yaml => &["yaml", "yml"],
        }
    }

    pub fn from_path(path: &Path) -> LopfResult<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::ALL
            .iter()
            .copied()
            .find(|format| {
                format
                    .extensions()
                    .iter()
                    .any(|candidate| ext.eq_ignore_ascii_case(candidate))
            })
            .ok_or_else(|| {
                LopfError::Parse(format!(
                    "cannot tell the format of '{}': expected a .json, .yaml or .yml file",
                    path.display()
                ))
            })
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Json => f.write_str("JSON"),
            DocumentFormat::Yaml => f.write_str("YAML"),
        }
    }
}
