use anyhow::{Context, Result};
use std::path::Path;

use crate::commands::{file_label, CommandEnv};
use crate::error::{Result as EtlResult, RowLocation};
use crate::log;
use crate::table::{dump_csv, field, load_csv, make_row, required, sheet_row, Row};

pub const HEADERS: [&str; 2] = ["isolate_name", "genbank_accn"];

/// Isolate rows of an isolate worksheet. Synonym rows (those with a
/// `CanonName`) are skipped.
pub fn isolate_rows(rows: &[Row], file: Option<&str>) -> EtlResult<Vec<Row>> {
    let mut out = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        if field(row, "CanonName").is_some() {
            continue;
        }
        let at = RowLocation {
            file: file.map(String::from),
            row: sheet_row(idx),
        };
        let name = required(row, "IsolateName", &at)?;
        out.push(make_row([
            ("isolate_name", Some(name.to_string())),
            ("genbank_accn", field(row, "Genbank").map(String::from)),
        ]));
    }
    Ok(out)
}

pub fn run(input_worksheet: &Path, output_csv: &Path, env: &mut CommandEnv<'_>) -> Result<()> {
    log!(env.logger, Info, "Writing {}", output_csv.display());

    let rows = load_csv(input_worksheet)
        .with_context(|| format!("Failed to read {}", input_worksheet.display()))?;
    env.metrics.inc_files();
    env.metrics.add_rows_read(rows.len() as u64);

    let out = isolate_rows(&rows, Some(&file_label(input_worksheet)))?;
    let skipped = rows.len() - out.len();
    if skipped > 0 {
        log!(env.logger, Debug, "Skipped {} synonym rows", skipped);
    }
    env.metrics.add_isolates(out.len() as u64);

    let written = dump_csv(output_csv, &out, &HEADERS)
        .with_context(|| format!("Failed to write {}", output_csv.display()))?;
    env.metrics.add_rows_written(written as u64);
    log!(env.logger, Info, "{} isolates", written);
    Ok(())
}
