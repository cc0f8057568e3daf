use anyhow::{Context, Result};
use std::path::Path;

use crate::commands::{bool_text, file_label, CommandEnv};
use crate::error::{Result as EtlResult, RowLocation};
use crate::isolates::gen_isolate_names;
use crate::log;
use crate::measure::{is_unknown, parse_concentration, positive_num, time_unit, value_cmp};
use crate::table::{dump_csv, field, load_csv, make_row, required, Row};

pub const HEADERS: [&str; 16] = [
    "ref_name",
    "isolate_name",
    "baseline_isolate_name",
    "cell_line",
    "experiment",
    "passage_cmp",
    "passage",
    "passage_unknown",
    "cumulative_culture_time_cmp",
    "cumulative_culture_time",
    "cumulative_culture_time_unit",
    "cumulative_culture_time_unknown",
    "concentration_cmp",
    "concentration",
    "concentration_unit",
    "section",
];

/// One output row per worksheet row, keyed by its synthetic isolate name.
pub fn worksheet_to_table(rows: &[Row], file: Option<&str>) -> EtlResult<Vec<Row>> {
    let named_rows = gen_isolate_names(rows, None, file)?;
    let mut table = Vec::with_capacity(named_rows.len());

    for named in named_rows {
        let at = RowLocation {
            file: file.map(String::from),
            row: named.row_number,
        };
        let row = &named.row;
        let strain = required(row, "Strain", &at)?;
        required(row, "Baseline mutations", &at)?;
        required(row, "Gene", &at)?;
        let passage = required(row, "Passage", &at)?;
        let culture_time = required(row, "Cumulative culture time", &at)?;

        let concentration = match field(row, "Concentration") {
            Some(value) => parse_concentration(value, &at)?,
            None => None,
        };
        let text = |value: Option<&str>| value.map(String::from);

        table.push(make_row([
            ("ref_name", text(field(row, "RefName"))),
            ("isolate_name", Some(named.isolate_name.clone())),
            ("baseline_isolate_name", Some(strain.to_string())),
            ("cell_line", text(field(row, "Cell line"))),
            ("experiment", text(field(row, "Experiment"))),
            ("passage_cmp", text(value_cmp(passage))),
            ("passage", positive_num(passage)),
            ("passage_unknown", Some(bool_text(is_unknown(passage)))),
            ("cumulative_culture_time_cmp", text(value_cmp(culture_time))),
            ("cumulative_culture_time", positive_num(culture_time)),
            ("cumulative_culture_time_unit", text(time_unit(culture_time))),
            (
                "cumulative_culture_time_unknown",
                Some(bool_text(is_unknown(culture_time))),
            ),
            ("concentration_cmp", concentration.as_ref().map(|c| c.cmp.to_string())),
            ("concentration", concentration.as_ref().map(|c| c.value.clone())),
            ("concentration_unit", concentration.map(|c| c.unit)),
            ("section", text(field(row, "Source"))),
        ]));
    }

    Ok(table)
}

pub fn run(input_worksheet: &Path, output_csv: &Path, env: &mut CommandEnv<'_>) -> Result<()> {
    log!(env.logger, Info, "Writing {}", output_csv.display());

    let rows = load_csv(input_worksheet)
        .with_context(|| format!("Failed to read {}", input_worksheet.display()))?;
    env.metrics.inc_files();
    env.metrics.add_rows_read(rows.len() as u64);

    let label = file_label(input_worksheet);
    let table = worksheet_to_table(&rows, Some(&label))?;
    env.metrics.add_isolates(table.len() as u64);

    let written = dump_csv(output_csv, &table, &HEADERS)
        .with_context(|| format!("Failed to write {}", output_csv.display()))?;
    env.metrics.add_rows_written(written as u64);
    log!(env.logger, Info, "{} selection experiments", written);
    Ok(())
}
