//! Record feed output.

use anyhow::{Context, Result};
use hakken_core::ValidatedRecord;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Write records as a pretty JSON array to `path`, or stdout when None.
pub fn write_records(records: &[ValidatedRecord], path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
            write_to(records, BufWriter::new(file)).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), records = records.len(), "records written");
        }
        None => write_to(records, io::stdout().lock()).context("writing records to stdout")?,
    }
    Ok(())
}

fn write_to(records: &[ValidatedRecord], mut writer: impl Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
