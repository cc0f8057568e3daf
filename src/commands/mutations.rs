use anyhow::{Context, Result};
use std::path::Path;

use crate::commands::{file_label, CommandEnv};
use crate::error::{AtRow, Result as EtlResult, RowLocation};
use crate::gene::Gene;
use crate::log;
use crate::mutations::{load_mutations, split_mutation_list};
use crate::table::{dump_csv, field, load_csv, make_row, required, sheet_row, Row};

pub const HEADERS: [&str; 4] = ["isolate_name", "gene", "position", "amino_acid"];

/// Order in which gene columns are read from each isolate row.
const GENE_COLUMNS: [Gene; 4] = [Gene::PR, Gene::RT, Gene::IN, Gene::CA];

/// One output row per call of every isolate's gene columns.
pub fn mutation_rows(rows: &[Row], file: Option<&str>) -> EtlResult<Vec<Row>> {
    let mut out = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        let at = RowLocation {
            file: file.map(String::from),
            row: sheet_row(idx),
        };
        for gene in GENE_COLUMNS {
            let Some(text) = field(row, &gene.mutations_column()) else {
                continue;
            };
            let isolate_name = required(row, "IsolateName", &at)?;
            let mutmap =
                load_mutations(&split_mutation_list(text), gene, None, None).at_row(&at)?;
            for (genepos, calls) in &mutmap {
                for call in calls {
                    out.push(make_row([
                        ("isolate_name", Some(isolate_name.to_string())),
                        ("gene", Some(genepos.gene.to_string())),
                        ("position", Some(genepos.pos.to_string())),
                        ("amino_acid", Some(call.to_string())),
                    ]));
                }
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

    let out = mutation_rows(&rows, Some(&file_label(input_worksheet)))?;
    env.metrics.add_mutations(out.len() as u64);

    let written = dump_csv(output_csv, &out, &HEADERS)
        .with_context(|| format!("Failed to write {}", output_csv.display()))?;
    env.metrics.add_rows_written(written as u64);
    log!(env.logger, Info, "{} mutation calls", written);
    Ok(())
}
