use crate::error::Result;
use crate::gene::{Call, Gene, GenePos, MutationMap, RefMap};
use crate::mutations::grammar::scan;

/// Folds delta mutation strings onto a copy of `baseline`.
///
/// Matches are applied left to right across all `deltas`. A match without a
/// gene prefix uses `default_gene`. A call that is exactly the reference
/// residue at its site removes the site (a reversion); any other call
/// replaces whatever the site held before.
///
/// `baseline` is only read; the returned map is a fresh copy.
pub fn load_mutations<S: AsRef<str>>(
    deltas: &[S],
    default_gene: Gene,
    baseline: Option<&MutationMap>,
    refmap: Option<&RefMap>,
) -> Result<MutationMap> {
    let mut mutmap = baseline.cloned().unwrap_or_default();
    for delta in deltas {
        for found in scan(delta.as_ref()) {
            let found = found?;
            let gene = match found.gene {
                Some(name) => name.parse::<Gene>()?,
                None => default_gene,
            };
            let genepos = GenePos::new(gene, found.pos);
            let calls = found.calls();

            if is_reversion(&calls, refmap.and_then(|r| r.get(&genepos))) {
                mutmap.remove(&genepos);
            } else {
                mutmap.insert(genepos, calls);
            }
        }
    }
    Ok(mutmap)
}

fn is_reversion(calls: &std::collections::BTreeSet<Call>, reference: Option<&char>) -> bool {
    match reference {
        Some(aa) => calls.len() == 1 && calls.contains(&Call::Residue(*aa)),
        None => false,
    }
}
