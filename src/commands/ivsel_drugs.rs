use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

use crate::commands::{file_label, split_regimen, CommandEnv};
use crate::error::Result as EtlResult;
use crate::isolates::gen_isolate_names;
use crate::log;
use crate::table::{dump_csv, field, load_csv, make_row, Row};

pub const HEADERS: [&str; 3] = ["ref_name", "isolate_name", "drug_name"];

/// Unique `(ref_name, isolate_name, drug_name)` rows in first-seen order.
/// Rows without a regimen contribute nothing.
pub fn ivsel_drug_rows(rows: &[Row], file: Option<&str>) -> EtlResult<Vec<Row>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for named in gen_isolate_names(rows, None, file)? {
        let Some(regimen) = field(&named.row, "Regimen") else {
            continue;
        };
        let ref_name = field(&named.row, "RefName").unwrap_or_default();
        for drug in split_regimen(regimen) {
            let key = (
                ref_name.to_string(),
                named.isolate_name.clone(),
                drug.to_string(),
            );
            if seen.insert(key.clone()) {
                out.push(make_row([
                    ("ref_name", Some(key.0)),
                    ("isolate_name", Some(key.1)),
                    ("drug_name", Some(key.2)),
                ]));
            }
        }
    }

    Ok(out)
}

pub fn run(input_worksheet: &Path, output_csv: &Path, env: &mut CommandEnv<'_>) -> Result<()> {
    log!(env.logger, Info, "Writing {}", output_csv.display());

    let rows = load_csv(input_worksheet)
        .with_context(|| format!("Failed to read {}", input_worksheet.display()))?;
    env.metrics.inc_files();
    env.metrics.add_rows_read(rows.len() as u64);

    let label = file_label(input_worksheet);
    let out = ivsel_drug_rows(&rows, Some(&label))?;

    let written = dump_csv(output_csv, &out, &HEADERS)
        .with_context(|| format!("Failed to write {}", output_csv.display()))?;
    env.metrics.add_rows_written(written as u64);
    log!(env.logger, Info, "{} isolate/drug pairs", written);
    Ok(())
}
