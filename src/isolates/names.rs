use std::collections::{HashMap, HashSet};

use crate::error::{EtlError, Result, RowLocation};
use crate::isolates::RenameTable;
use crate::table::{field, required, sheet_row, Row};

/// Candidate key columns with the prefix used when rendering them, in key order.
pub const KEY_COLUMNS: [(&str, &str); 7] = [
    ("Cell line", ""),
    ("Strain", ""),
    ("Regimen", ""),
    ("Experiment", "exp:"),
    ("Passage", "p"),
    ("Cumulative culture time", ""),
    ("Concentration", "dose:"),
];

/// Never dropped from the key, even when it carries no information.
const ALWAYS_KEPT: &str = "Experiment";

/// A worksheet row together with its synthetic isolate identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedRow {
    /// Spreadsheet row number (header is row 1).
    pub row_number: usize,
    pub isolate_name: String,
    pub row: Row,
}

/// Result of key minimisation: the retained column indices and the reduced keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinimalKeys {
    pub columns: Vec<usize>,
    pub keys: Vec<Vec<String>>,
}

impl MinimalKeys {
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|&idx| KEY_COLUMNS[idx].0).collect()
    }
}

/// Drops key columns right to left while all keys stay unique.
///
/// Each column is tested once against the keys as reduced so far; a column
/// whose removal would collapse two keys is kept. `Experiment` is always kept.
/// Callers must pass keys that are already unique.
pub fn minimal_keys(full_keys: Vec<Vec<String>>) -> MinimalKeys {
    let mut keys = full_keys;
    let mut kept = vec![true; KEY_COLUMNS.len()];

    for idx in (0..KEY_COLUMNS.len()).rev() {
        if KEY_COLUMNS[idx].0 == ALWAYS_KEPT {
            continue;
        }
        let reduced: Vec<Vec<String>> = keys
            .iter()
            .map(|key| {
                let mut key = key.clone();
                key.remove(idx);
                key
            })
            .collect();
        if all_unique(&reduced) {
            keys = reduced;
            kept[idx] = false;
        }
    }

    MinimalKeys {
        columns: (0..KEY_COLUMNS.len()).filter(|&idx| kept[idx]).collect(),
        keys,
    }
}

/// Gives every worksheet row a short, stable isolate identifier.
///
/// The identifier is `ivsel:<RefName>|` followed by the minimal set of
/// prefixed key columns that keeps all rows distinct, joined by `|`. With a
/// rename table, `Strain` is canonicalised before keys are built.
pub fn gen_isolate_names(
    rows: &[Row],
    renames: Option<&RenameTable>,
    file: Option<&str>,
) -> Result<Vec<NamedRow>> {
    isolate_names(rows, renames, file)?.collect()
}

/// Lazy form of [`gen_isolate_names`].
///
/// Duplicate signatures are rejected up front since key reduction needs every
/// row. `RefName` is checked as each row is yielded, so a caller validating
/// its own columns row by row reports the first bad row in sheet order.
pub fn isolate_names<'a>(
    rows: &'a [Row],
    renames: Option<&RenameTable>,
    file: Option<&'a str>,
) -> Result<impl Iterator<Item = Result<NamedRow>> + 'a> {
    let location = move |idx: usize| RowLocation {
        file: file.map(String::from),
        row: sheet_row(idx),
    };

    let full_keys: Vec<Vec<String>> = rows.iter().map(|row| full_key(row, renames)).collect();

    let mut seen: HashMap<&[String], usize> = HashMap::with_capacity(full_keys.len());
    for (idx, key) in full_keys.iter().enumerate() {
        if let Some(&other) = seen.get(key.as_slice()) {
            return Err(EtlError::DuplicateSignature {
                at: location(idx),
                other_row: sheet_row(other),
                key: key.clone(),
            });
        }
        seen.insert(key, idx);
    }

    let minimal = minimal_keys(full_keys);

    Ok(rows
        .iter()
        .zip(minimal.keys)
        .enumerate()
        .map(move |(idx, (row, key))| -> Result<NamedRow> {
            let ref_name = required(row, "RefName", &location(idx))?;
            Ok(NamedRow {
                row_number: sheet_row(idx),
                isolate_name: format!("ivsel:{}|{}", ref_name, key.join("|")),
                row: row.clone(),
            })
        }))
}

fn full_key(row: &Row, renames: Option<&RenameTable>) -> Vec<String> {
    KEY_COLUMNS
        .iter()
        .map(|(column, prefix)| {
            let mut value = field(row, column).unwrap_or("");
            if *column == "Strain" {
                if let Some(canon) = renames.and_then(|r| r.get(value)) {
                    value = canon;
                }
            }
            format!("{}{}", prefix, value)
        })
        .collect()
}

fn all_unique(keys: &[Vec<String>]) -> bool {
    let mut seen = HashSet::with_capacity(keys.len());
    keys.iter().all(|key| seen.insert(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::make_row;

    fn sheet(rows: &[&[(&str, &str)]]) -> Vec<Row> {
        rows.iter()
            .map(|cells| {
                make_row(
                    cells
                        .iter()
                        .map(|(k, v)| (*k, (!v.is_empty()).then(|| v.to_string()))),
                )
            })
            .collect()
    }

    fn names(rows: &[Row]) -> Vec<String> {
        gen_isolate_names(rows, None, None)
            .unwrap()
            .into_iter()
            .map(|r| r.isolate_name)
            .collect()
    }

    #[test]
    fn keeps_only_the_varying_column() {
        let rows = sheet(&[
            &[("RefName", "Smith20"), ("Cell line", "MT-2"), ("Strain", "NL4-3"), ("Passage", "5")],
            &[("RefName", "Smith20"), ("Cell line", "MT-2"), ("Strain", "NL4-3"), ("Passage", "10")],
        ]);
        assert_eq!(
            names(&rows),
            vec!["ivsel:Smith20|exp:|p5", "ivsel:Smith20|exp:|p10"]
        );
    }

    #[test]
    fn experiment_column_is_always_kept() {
        let rows = sheet(&[
            &[("RefName", "R"), ("Cell line", "MT-4"), ("Strain", "IIIB"), ("Experiment", "1"), ("Passage", "3")],
            &[("RefName", "R"), ("Cell line", "MT-4"), ("Strain", "IIIB"), ("Experiment", "2"), ("Passage", "3")],
        ]);
        let minimal = minimal_keys(rows.iter().map(|r| full_key(r, None)).collect());
        assert_eq!(minimal.column_names(), vec!["Experiment"]);
        assert_eq!(names(&rows), vec!["ivsel:R|exp:1", "ivsel:R|exp:2"]);
    }

    #[test]
    fn reduction_is_right_to_left() {
        // Strain and Passage each distinguish the rows on their own; Passage is
        // tested first and dropped, so Strain must stay.
        let rows = sheet(&[
            &[("RefName", "R"), ("Strain", "A"), ("Passage", "1")],
            &[("RefName", "R"), ("Strain", "B"), ("Passage", "2")],
        ]);
        let minimal = minimal_keys(rows.iter().map(|r| full_key(r, None)).collect());
        assert_eq!(minimal.column_names(), vec!["Strain", "Experiment"]);
        assert_eq!(names(&rows), vec!["ivsel:R|A|exp:", "ivsel:R|B|exp:"]);
    }

    #[test]
    fn combination_of_columns_is_kept_when_needed() {
        let rows = sheet(&[
            &[("RefName", "R"), ("Strain", "A"), ("Passage", "1")],
            &[("RefName", "R"), ("Strain", "A"), ("Passage", "2")],
            &[("RefName", "R"), ("Strain", "B"), ("Passage", "1")],
        ]);
        assert_eq!(
            names(&rows),
            vec!["ivsel:R|A|exp:|p1", "ivsel:R|A|exp:|p2", "ivsel:R|B|exp:|p1"]
        );
    }

    #[test]
    fn duplicate_signature_names_both_rows() {
        let rows = sheet(&[
            &[("RefName", "R"), ("Strain", "A"), ("Passage", "1")],
            &[("RefName", "R"), ("Strain", "B"), ("Passage", "1")],
            &[("RefName", "R"), ("Strain", "A"), ("Passage", "1")],
        ]);
        let err = gen_isolate_names(&rows, None, Some("x-ivsel.csv")).unwrap_err();
        match err {
            EtlError::DuplicateSignature { at, other_row, .. } => {
                assert_eq!(at.row, 4);
                assert_eq!(other_row, 2);
                assert_eq!(at.file.as_deref(), Some("x-ivsel.csv"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_ref_name_is_reported() {
        let rows = sheet(&[
            &[("RefName", "R"), ("Passage", "1")],
            &[("RefName", ""), ("Passage", "2")],
        ]);
        let err = gen_isolate_names(&rows, None, None).unwrap_err();
        assert_eq!(err.to_string(), "'RefName' is empty at row 3");
    }

    #[test]
    fn strain_aliases_are_canonicalised() {
        let rows = sheet(&[
            &[("RefName", "R"), ("Strain", "HXB2"), ("Passage", "1")],
            &[("RefName", "R"), ("Strain", "IIIB"), ("Passage", "1")],
        ]);
        let renames = RenameTable::from([("HXB2".to_string(), "IIIB".to_string())]);
        let err = gen_isolate_names(&rows, Some(&renames), None).unwrap_err();
        assert!(matches!(err, EtlError::DuplicateSignature { .. }));
    }

    #[test]
    fn single_row_keeps_experiment_only() {
        let rows = sheet(&[&[("RefName", "R"), ("Strain", "A"), ("Experiment", "e1")]]);
        assert_eq!(names(&rows), vec!["ivsel:R|exp:e1"]);
    }
}
