use crate::error::{AtRow, Result, RowLocation};
use crate::gene::{Gene, GenePos, MutationMap, RefMap};
use crate::isolates::{RefseqMutmaps, RenameTable};
use crate::mutations::{load_mutations, split_mutation_list};
use crate::table::{field, required, sheet_row, Row};

fn at(idx: usize) -> RowLocation {
    RowLocation {
        file: None,
        row: sheet_row(idx),
    }
}

/// Builds the consensus lookup from rows of `Gene` and `AASeq`.
///
/// The i-th residue of `AASeq` (0-based) is the reference at position i+1.
pub fn load_consensus(rows: &[Row]) -> Result<RefMap> {
    let mut refmap = RefMap::new();
    for (idx, row) in rows.iter().enumerate() {
        let gene = required(row, "Gene", &at(idx))?
            .parse::<Gene>()
            .at_row(&at(idx))?;
        let seq = required(row, "AASeq", &at(idx))?;
        for (pos0, aa) in seq.chars().enumerate() {
            refmap.insert(GenePos::new(gene, pos0 as u32 + 1), aa);
        }
    }
    Ok(refmap)
}

/// Reads the baseline isolate sheet.
///
/// A row with `CanonName` is an alias of that canonical isolate and
/// contributes only a rename. Other rows fold their per-gene mutation columns,
/// in canonical gene order, into one mutation map keyed by `IsolateName`.
pub fn load_baseline(rows: &[Row]) -> Result<(RefseqMutmaps, RenameTable)> {
    let mut mutmaps = RefseqMutmaps::new();
    let mut renames = RenameTable::new();

    for (idx, row) in rows.iter().enumerate() {
        let name = required(row, "IsolateName", &at(idx))?;
        if let Some(canon) = field(row, "CanonName") {
            renames.insert(name.to_string(), canon.to_string());
            continue;
        }

        let mut mutmap = MutationMap::new();
        for gene in Gene::ALL {
            let Some(cell) = field(row, &gene.mutations_column()) else {
                continue;
            };
            mutmap = load_mutations(&split_mutation_list(cell), gene, Some(&mutmap), None)
                .at_row(&at(idx))?;
        }
        mutmaps.insert(name.to_string(), mutmap);
    }

    Ok((mutmaps, renames))
}
