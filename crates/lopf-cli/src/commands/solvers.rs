use std::io::{self, Write};

use anyhow::Result;
use lopf_algo::LpSolverKind;
use tabwriter::TabWriter;

pub fn handle() -> Result<()> {
    let default = LpSolverKind::default();
    let mut writer = TabWriter::new(io::stdout()).padding(2);
    writeln!(writer, "SOLVER\tAVAILABLE\tDEFAULT")?;
    for name in LpSolverKind::available() {
        let kind: LpSolverKind = name.parse()?;
        let backend = kind.build();
        writeln!(
            writer,
            "{}\t{}\t{}",
            name,
            if backend.is_available() { "yes" } else { "no" },
            if kind == default { "*" } else { "" }
        )?;
    }
    writer.flush()?;
    Ok(())
}
