use std::collections::{BTreeMap, BTreeSet};

use crate::gene::{Call, Gene, MutationMap};

/// Renders a mutation map as `"<GENE> Mutations" -> "41L+67N+184IV"`.
///
/// Positions ascend within each gene; genes without mutations get no entry.
pub fn dump_mutations(mutmap: &MutationMap) -> BTreeMap<String, String> {
    let mut per_gene: BTreeMap<Gene, Vec<String>> = BTreeMap::new();
    for (genepos, calls) in mutmap {
        per_gene
            .entry(genepos.gene)
            .or_default()
            .push(format!("{}{}", genepos.pos, calls_text(calls)));
    }
    per_gene
        .into_iter()
        .map(|(gene, fragments)| (gene.mutations_column(), fragments.join("+")))
        .collect()
}

/// Renders a mutation map on one line, naming the gene whenever it changes,
/// e.g. `RT:65R+184V+IN:148H`.
pub fn mutation_text(mutmap: &MutationMap) -> String {
    let mut fragments: Vec<String> = Vec::with_capacity(mutmap.len());
    let mut prev_gene: Option<Gene> = None;
    for (genepos, calls) in mutmap {
        if prev_gene == Some(genepos.gene) {
            fragments.push(format!("{}{}", genepos.pos, calls_text(calls)));
        } else {
            fragments.push(format!(
                "{}:{}{}",
                genepos.gene,
                genepos.pos,
                calls_text(calls)
            ));
            prev_gene = Some(genepos.gene);
        }
    }
    fragments.join("+")
}

/// Replaces any mutation suffix of a strain name with the given map's text,
/// e.g. `NL4-3 (RT:65R)` + `{RT184V}` -> `NL4-3 (RT:184V)`.
pub fn norm_strain(strain: &str, mutmap: &MutationMap) -> String {
    let base = strain.rsplit_once(" (").map_or(strain, |(head, _)| head);
    let text = mutation_text(mutmap);
    if text.is_empty() {
        base.to_string()
    } else {
        format!("{} ({})", base, text)
    }
}

fn calls_text(calls: &BTreeSet<Call>) -> String {
    let tokens = calls.iter().map(|c| c.to_string());
    if calls.iter().any(Call::is_indel) {
        tokens.collect::<Vec<_>>().join("/")
    } else {
        tokens.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::GenePos;
    use crate::mutations::load_mutations;

    fn map(text: &str, gene: Gene) -> MutationMap {
        load_mutations(&[text], gene, None, None).unwrap()
    }

    #[test]
    fn mixtures_sort_by_character() {
        let mutmap = MutationMap::from([(
            GenePos::new(Gene::RT, 184),
            BTreeSet::from([Call::Residue('V'), Call::Residue('I')]),
        )]);
        let dumped = dump_mutations(&mutmap);
        assert_eq!(dumped.len(), 1);
        assert_eq!(dumped["RT Mutations"], "184IV");
    }

    #[test]
    fn indels_join_with_slash() {
        assert_eq!(dump_mutations(&map("69ins", Gene::RT))["RT Mutations"], "69ins");
        assert_eq!(
            dump_mutations(&map("69del/ins", Gene::RT))["RT Mutations"],
            "69del/ins"
        );
        assert_eq!(dump_mutations(&map("67N/del", Gene::RT))["RT Mutations"], "67N/del");
    }

    #[test]
    fn positions_ascend_within_each_gene() {
        let mutmap = map("RT:184V+PR:90M+RT:41L+IN:148H+PR:10F", Gene::RT);
        let dumped = dump_mutations(&mutmap);
        assert_eq!(dumped.len(), 3);
        assert_eq!(dumped["PR Mutations"], "10F+90M");
        assert_eq!(dumped["RT Mutations"], "41L+184V");
        assert_eq!(dumped["IN Mutations"], "148H");
        assert!(!dumped.contains_key("CA Mutations"));
    }

    #[test]
    fn empty_map_dumps_nothing() {
        assert!(dump_mutations(&MutationMap::new()).is_empty());
        assert_eq!(mutation_text(&MutationMap::new()), "");
    }

    #[test]
    fn dumped_text_parses_back_to_the_same_map() {
        let original = map("M41L+D67N/del+K70R+T215YF+69ins+184*", Gene::RT);
        let dumped = dump_mutations(&original);
        let reparsed = load_mutations(&[dumped["RT Mutations"].as_str()], Gene::RT, None, None)
            .unwrap();
        assert_eq!(reparsed, original);
    }

    #[test]
    fn text_names_gene_on_change() {
        let mutmap = map("RT:65R+RT:184V+IN:148H", Gene::RT);
        assert_eq!(mutation_text(&mutmap), "RT:65R+184V+IN:148H");
    }

    #[test]
    fn strain_suffix_is_replaced() {
        let mutmap = map("184V", Gene::RT);
        assert_eq!(norm_strain("NL4-3 (RT:65R)", &mutmap), "NL4-3 (RT:184V)");
        assert_eq!(norm_strain("NL4-3 (RT:65R)", &MutationMap::new()), "NL4-3");
        assert_eq!(norm_strain("IIIB", &mutmap), "IIIB (RT:184V)");
    }
}
