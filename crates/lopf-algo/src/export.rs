//! Writing solutions to disk.

use std::path::Path;

use anyhow::{Context, Result};

use crate::solution::Solution;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

impl Solution {
    /// Serialize the whole solution as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serializing solution to JSON")
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).with_context(|| format!("writing JSON to {}", path.display()))?;
        Ok(())
    }

    /// Write one CSV table per result kind into `dir`, creating it if needed.
    ///
    /// Time-indexed tables have a `snapshot` column followed by one column
    /// per component. Returns the written file names.
    #[cfg(feature = "csv")]
    pub fn write_csv_tables(&self, dir: &Path) -> Result<Vec<String>> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;

        let generators: Vec<(&str, &[f64])> = self
            .generators
            .iter()
            .map(|g| (g.name.as_str(), g.p.as_slice()))
            .collect();
        let prices: Vec<(&str, &[f64])> = self
            .prices
            .iter()
            .map(|p| (p.bus.as_str(), p.marginal_price.as_slice()))
            .collect();
        let flows: Vec<(&str, &[f64])> = self
            .line_flows
            .iter()
            .map(|l| (l.name.as_str(), l.p0.as_slice()))
            .collect();

        let mut written = Vec::new();
        for (file, columns) in [
            ("generators-p.csv", &generators),
            ("buses-marginal_price.csv", &prices),
            ("lines-p0.csv", &flows),
        ] {
            if columns.is_empty() {
                continue;
            }
            self.write_series_table(&dir.join(file), columns)?;
            written.push(file.to_string());
        }

        let path = dir.join("capacities.csv");
        let mut wtr = csv::Writer::from_path(&path)
            .with_context(|| format!("creating CSV writer for {}", path.display()))?;
        wtr.write_record(["component", "name", "p_nom_opt"])
            .context("writing CSV header")?;
        for c in &self.capacities {
            wtr.write_record([c.component, c.name.as_str(), &c.p_nom_opt.to_string()])
                .context("writing CSV record")?;
        }
        wtr.flush().context("flushing CSV writer")?;
        written.push("capacities.csv".to_string());

        Ok(written)
    }

    #[cfg(feature = "csv")]
    fn write_series_table(&self, path: &Path, columns: &[(&str, &[f64])]) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)
            .with_context(|| format!("creating CSV writer for {}", path.display()))?;

        let header: Vec<&str> = std::iter::once("snapshot")
            .chain(columns.iter().map(|(name, _)| *name))
            .collect();
        wtr.write_record(&header).context("writing CSV header")?;

        for (t, timestamp) in self.snapshots.iter().enumerate() {
            let mut record = Vec::with_capacity(columns.len() + 1);
            record.push(timestamp.format(TIMESTAMP_FORMAT).to_string());
            record.extend(columns.iter().map(|(_, values)| values[t].to_string()));
            wtr.write_record(&record).context("writing CSV record")?;
        }

        wtr.flush().context("flushing CSV writer")?;
        Ok(())
    }
}

#[cfg(all(test, feature = "csv"))]
mod tests {
    use crate::test_support::single_bus;
    use crate::LopfSolver;

    #[test]
    fn test_csv_tables() {
        let solution = LopfSolver::new().solve(&single_bus(180.0)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let written = solution.write_csv_tables(dir.path()).unwrap();
        assert_eq!(
            written,
            vec!["generators-p.csv", "buses-marginal_price.csv", "capacities.csv"]
        );

        let text = std::fs::read_to_string(dir.path().join("generators-p.csv")).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("snapshot,Coal Plant,Gas Plant"));
        assert!(lines.next().unwrap().starts_with("2024-01-01 00:00:00,"));
        assert_eq!(text.lines().count(), 4);

        let caps = std::fs::read_to_string(dir.path().join("capacities.csv")).unwrap();
        assert_eq!(caps.trim(), "component,name,p_nom_opt");
    }

    #[test]
    fn test_json_contains_status() {
        let solution = LopfSolver::new().solve(&single_bus(180.0)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&solution.to_json().unwrap()).unwrap();
        assert_eq!(value["status"], "optimal");
        assert_eq!(value["generators"][0]["name"], "Coal Plant");
        assert_eq!(value["snapshots"].as_array().unwrap().len(), 3);
    }
}
