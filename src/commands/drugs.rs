use anyhow::{Context, Result};
use glob::MatchOptions;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::commands::{find_files, split_regimen, CommandEnv};
use crate::error::Result as EtlResult;
use crate::log;
use crate::table::{dump_csv, field, load_csv, make_row, Row};

pub const HEADERS: [&str; 5] = [
    "drug_name",
    "drug_class",
    "approved",
    "drug_full_name",
    "fda_approval_date",
];

/// Drug rows keyed by name, so output is sorted by `drug_name`.
#[derive(Debug, Default)]
pub struct DrugCatalog {
    drugs: BTreeMap<String, Row>,
}

impl DrugCatalog {
    /// Seeds the catalog with rows of a previously generated drug table.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let drugs = rows
            .into_iter()
            .filter_map(|row| {
                let name = field(&row, "drug_name")?.to_string();
                Some((name, row))
            })
            .collect();
        Self { drugs }
    }

    /// Adds every drug named in a `Regimen` column. Known drugs keep their
    /// curated columns. Returns how many drugs were new.
    pub fn add_regimens(&mut self, rows: &[Row]) -> usize {
        let mut added = 0;
        for regimen in rows.iter().filter_map(|row| field(row, "Regimen")) {
            for drug in split_regimen(regimen) {
                if !self.drugs.contains_key(drug) {
                    self.drugs.insert(
                        drug.to_string(),
                        make_row([("drug_name", Some(drug.to_string()))]),
                    );
                    added += 1;
                }
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.drugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.drugs.values()
    }
}

/// Every `*.csv` in `dir`, extension matched case-insensitively.
pub fn find_csv_files(dir: &Path, suffix: &str) -> EtlResult<Vec<PathBuf>> {
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    find_files(dir, suffix, options)
}

pub fn run(input_dir: &Path, output_csv: &Path, env: &mut CommandEnv<'_>) -> Result<()> {
    log!(env.logger, Info, "Writing {}", output_csv.display());

    let mut catalog = if output_csv.exists() {
        let existing = load_csv(output_csv)
            .with_context(|| format!("Failed to read existing {}", output_csv.display()))?;
        log!(env.logger, Info, "Merging into {} known drugs", existing.len());
        DrugCatalog::from_rows(existing)
    } else {
        DrugCatalog::default()
    };

    let files = find_csv_files(input_dir, &env.settings.worksheets.csv_suffix)?;
    let pb = env.progress_bar(files.len())?;
    let mut added = 0;
    for path in &files {
        let rows = load_csv(path).with_context(|| format!("Failed to read {}", path.display()))?;
        env.metrics.inc_files();
        env.metrics.add_rows_read(rows.len() as u64);
        added += catalog.add_regimens(&rows);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let written = dump_csv(output_csv, catalog.rows(), &HEADERS)
        .with_context(|| format!("Failed to write {}", output_csv.display()))?;
    env.metrics.add_rows_written(written as u64);
    log!(env.logger, Info, "{} drugs ({} new)", written, added);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::read_rows;
    use std::fs;

    #[test]
    fn keeps_curated_columns_and_sorts() {
        let existing = read_rows(
            "drug_name,drug_class,approved\nEFV,NNRTI,true\n".as_bytes(),
        )
        .unwrap();
        let mut catalog = DrugCatalog::from_rows(existing);
        let sheet = read_rows("Regimen\nTDF + EFV\n\nAZT+3TC\n".as_bytes()).unwrap();

        assert_eq!(catalog.add_regimens(&sheet), 3);
        let names: Vec<&str> = catalog
            .rows()
            .map(|r| field(r, "drug_name").unwrap())
            .collect();
        assert_eq!(names, vec!["3TC", "AZT", "EFV", "TDF"]);

        let efv = catalog.rows().find(|r| field(r, "drug_name") == Some("EFV")).unwrap();
        assert_eq!(field(efv, "drug_class"), Some("NNRTI"));
    }

    #[test]
    fn csv_extension_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.csv", "B.CSV", "notes.txt"] {
            fs::write(dir.path().join(name), "Regimen\n").unwrap();
        }
        let files = find_csv_files(dir.path(), ".csv").unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn worksheet_directory_may_contain_brackets() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("regimens [2024]");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("a.CSV"), "Regimen\n").unwrap();

        let files = find_csv_files(&dir, ".csv").unwrap();
        assert_eq!(files, vec![dir.join("a.CSV")]);
    }
}
