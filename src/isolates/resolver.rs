use std::collections::HashMap;

use crate::error::{AtRow, Result, RowLocation};
use crate::gene::{Gene, MutationMap, RefMap};
use crate::isolates::names::isolate_names;
use crate::isolates::{canonical_name, RefseqMutmaps, RenameTable};
use crate::mutations::{dump_mutations, load_mutations};
use crate::table::{field, required, Row};

/// Output columns of the isolate table.
pub const ISOLATE_HEADERS: [&str; 5] = [
    "IsolateName",
    "CA Mutations",
    "PR Mutations",
    "RT Mutations",
    "IN Mutations",
];

/// Experimental conditions of a selection-experiment isolate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExperimentMetadata {
    pub cell_line: Option<String>,
    pub strain: Option<String>,
    pub regimen: Option<String>,
    pub passage: Option<String>,
    pub culture_time: Option<String>,
    pub concentration: Option<String>,
}

impl ExperimentMetadata {
    pub fn from_row(row: &Row) -> Self {
        let get = |column: &str| field(row, column).map(String::from);
        Self {
            cell_line: get("Cell line"),
            strain: get("Strain"),
            regimen: get("Regimen"),
            passage: get("Passage"),
            culture_time: get("Cumulative culture time"),
            concentration: get("Concentration"),
        }
    }

    /// `column=value` pairs of the conditions that were filled in.
    pub fn describe(&self) -> String {
        [
            ("cell line", &self.cell_line),
            ("strain", &self.strain),
            ("regimen", &self.regimen),
            ("passage", &self.passage),
            ("culture time", &self.culture_time),
            ("concentration", &self.concentration),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_ref().map(|v| format!("{}={}", label, v)))
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IsolateRecord {
    pub name: String,
    pub mutations: MutationMap,
    /// Absent for baseline isolates, which come from no experiment row.
    pub metadata: Option<ExperimentMetadata>,
}

impl IsolateRecord {
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("IsolateName".to_string(), Some(self.name.clone()));
        for (column, text) in dump_mutations(&self.mutations) {
            row.insert(column, Some(text));
        }
        row
    }
}

/// Isolate records in first-seen order.
#[derive(Debug, Default)]
pub struct IsolateTable {
    records: Vec<IsolateRecord>,
    index: HashMap<String, usize>,
}

impl IsolateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new isolate, or overwrites an existing one's sites with
    /// `mutmap` (per site, later wins; call sets are replaced, not unioned).
    pub fn update(
        &mut self,
        name: &str,
        mutmap: MutationMap,
        metadata: Option<ExperimentMetadata>,
    ) {
        match self.index.get(name) {
            Some(&idx) => {
                let record = &mut self.records[idx];
                record.mutations.extend(mutmap);
                if metadata.is_some() {
                    record.metadata = metadata;
                }
            }
            None => {
                self.index.insert(name.to_string(), self.records.len());
                self.records.push(IsolateRecord {
                    name: name.to_string(),
                    mutations: mutmap,
                    metadata,
                });
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&IsolateRecord> {
        self.index.get(name).map(|&idx| &self.records[idx])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IsolateRecord> {
        self.records.iter()
    }

    pub fn to_rows(&self) -> Vec<Row> {
        self.records.iter().map(IsolateRecord::to_row).collect()
    }
}

/// Lookups shared by every worksheet of one run.
pub struct ResolverContext<'a> {
    pub refseq_mutmaps: &'a RefseqMutmaps,
    pub renames: &'a RenameTable,
    pub refmap: &'a RefMap,
}

/// Resolves one in-vitro selection worksheet into `isolates`.
///
/// For each row: the reference sequence's map (empty if unknown) plus the
/// row's `Baseline mutations` gives the baseline isolate, recorded unless it
/// is itself a reference sequence; that map plus `Delta mutations` gives the
/// row's own isolate. Rows are checked in sheet order and the first bad row
/// aborts the worksheet. Returns the number of rows processed.
pub fn ivsel_to_isolates(
    isolates: &mut IsolateTable,
    file: &str,
    rows: &[Row],
    ctx: &ResolverContext<'_>,
) -> Result<usize> {
    let mut processed = 0;
    for named in isolate_names(rows, Some(ctx.renames), Some(file))? {
        let named = named?;
        let at = RowLocation {
            file: Some(file.to_string()),
            row: named.row_number,
        };
        let row = &named.row;
        let refseq_name = required(row, "BaselineRefSeq", &at)?;
        let strain = required(row, "Strain", &at)?;
        let gene: Gene = required(row, "Gene", &at)?.parse::<Gene>().at_row(&at)?;
        let baseline_mutations = required(row, "Baseline mutations", &at)?;
        let delta_mutations = required(row, "Delta mutations", &at)?;

        let refseq_name = canonical_name(ctx.renames, refseq_name);
        let baseline_name = canonical_name(ctx.renames, strain);

        let baseline_mutmap = load_mutations(
            &[baseline_mutations],
            gene,
            ctx.refseq_mutmaps.get(refseq_name),
            Some(ctx.refmap),
        )
        .at_row(&at)?;

        if !ctx.refseq_mutmaps.contains_key(baseline_name) {
            isolates.update(baseline_name, baseline_mutmap.clone(), None);
        }

        let delta_mutmap = load_mutations(
            &[delta_mutations],
            gene,
            Some(&baseline_mutmap),
            Some(ctx.refmap),
        )
        .at_row(&at)?;
        isolates.update(
            &named.isolate_name,
            delta_mutmap,
            Some(ExperimentMetadata::from_row(row)),
        );
        processed += 1;
    }

    Ok(processed)
}
