//! Worksheet rows in and out of CSV files.

use csv::{ReaderBuilder, WriterBuilder};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{EtlError, Result, RowLocation};

/// A worksheet row: column name -> cell. Blank cells are `None`.
pub type Row = HashMap<String, Option<String>>;

/// Reads a headed CSV file into rows.
pub fn load_csv(path: &Path) -> Result<Vec<Row>> {
    let file = File::open(path)?;
    read_rows(file)
}

/// Reads headed CSV from any reader. Cells are trimmed; blank cells become `None`.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<Row>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let cell = record
                    .get(idx)
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(String::from);
                (header.clone(), cell)
            })
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Writes rows to a CSV file in `headers` order, creating parent directories.
///
/// Returns the number of data rows written.
pub fn dump_csv<'a, I>(path: &Path, rows: I, headers: &[&str]) -> Result<usize>
where
    I: IntoIterator<Item = &'a Row>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    write_rows(file, rows, headers)
}

/// Writes rows as CSV to any writer. Unset or missing fields are left empty.
pub fn write_rows<'a, W, I>(writer: W, rows: I, headers: &[&str]) -> Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a Row>,
{
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(headers)?;
    let mut count = 0;
    for row in rows {
        wtr.write_record(
            headers
                .iter()
                .map(|h| field(row, h).unwrap_or("")),
        )?;
        count += 1;
    }
    wtr.flush()?;
    Ok(count)
}

/// Returns the non-blank value of `column`, if any.
pub fn field<'r>(row: &'r Row, column: &str) -> Option<&'r str> {
    row.get(column).and_then(|v| v.as_deref())
}

/// Returns the value of a column that must not be blank.
pub fn required<'r>(row: &'r Row, column: &str, at: &RowLocation) -> Result<&'r str> {
    field(row, column).ok_or_else(|| EtlError::MissingField {
        column: column.to_string(),
        at: at.clone(),
    })
}

/// Builds an output row from `(column, value)` pairs.
pub fn make_row<K, V, I>(cells: I) -> Row
where
    K: Into<String>,
    V: Into<Option<String>>,
    I: IntoIterator<Item = (K, V)>,
{
    cells
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Row number as shown in a spreadsheet: data rows start at 2, after the header.
pub fn sheet_row(index: usize) -> usize {
    index + 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cells_load_as_none() {
        let data = "\u{feff}RefName,Strain,Passage\nSmith2020, NL4-3 ,\n";
        let rows = read_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(field(&rows[0], "RefName"), Some("Smith2020"));
        assert_eq!(field(&rows[0], "Strain"), Some("NL4-3"));
        assert_eq!(rows[0].get("Passage"), Some(&None));
        assert_eq!(field(&rows[0], "Missing"), None);
    }

    #[test]
    fn short_records_fill_with_none() {
        let data = "A,B,C\n1\n";
        let rows = read_rows(data.as_bytes()).unwrap();
        assert_eq!(field(&rows[0], "A"), Some("1"));
        assert_eq!(field(&rows[0], "C"), None);
    }

    #[test]
    fn writes_in_header_order() {
        let rows = vec![
            make_row([("b", Some("2".to_string())), ("a", Some("1".to_string()))]),
            make_row([("a", None::<String>)]),
        ];
        let mut out = Vec::new();
        let n = write_rows(&mut out, &rows, &["a", "b"]).unwrap();
        assert_eq!(n, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "a,b\n1,2\n,\n");
    }

    #[test]
    fn required_reports_row_and_file() {
        let row = make_row([("Strain", None::<String>)]);
        let at = RowLocation {
            file: Some("a-ivsel.csv".to_string()),
            row: sheet_row(3),
        };
        let err = required(&row, "Strain", &at).unwrap_err();
        assert_eq!(err.to_string(), "'Strain' is empty at (a-ivsel.csv) row 5");
    }
}
