use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::error::{EtlError, Result};
use crate::gene::Call;

// Residue letters exclude the ambiguous codes B, J, O, U, X and Z.
static MUTATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        (?:(?P<gene>\w+):)?                  # gene prefix
        [AC-IK-NP-TV-Y]?                     # reference residue, ignored
        (?P<pos>\d+)                         # position
        (?P<aas>
          (?:[AC-IK-NP-TV-Y*]|ins|del)
          (?:/?(?:[AC-IK-NP-TV-Y*]|ins|del))*
        )                                    # called residues
        ",
    )
    .expect("mutation pattern compiles")
});

static LIST_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\+\s*").expect("separator pattern compiles"));

/// One mutation recognised in free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationMatch<'t> {
    pub gene: Option<&'t str>,
    pub pos: u32,
    pub aas: &'t str,
}

impl MutationMatch<'_> {
    pub fn calls(&self) -> BTreeSet<Call> {
        parse_calls(self.aas)
    }
}

/// Lazily scans `text` for mutations such as `RT:M184V`, `184VI`, `69ins` or `T215Y/F`.
///
/// Text between matches is skipped.
pub fn scan(text: &str) -> impl Iterator<Item = Result<MutationMatch<'_>>> + '_ {
    MUTATION_PATTERN.captures_iter(text).map(|caps| {
        let (Some(pos), Some(aas)) = (caps.name("pos"), caps.name("aas")) else {
            return Err(EtlError::Grammar(format!(
                "match {:?} captured no position or residues",
                &caps[0]
            )));
        };
        let pos = pos.as_str().parse::<u32>().map_err(|e| {
            EtlError::Grammar(format!("position {:?} is not a u32: {}", pos.as_str(), e))
        })?;
        Ok(MutationMatch {
            gene: caps.name("gene").map(|g| g.as_str()),
            pos,
            aas: aas.as_str(),
        })
    })
}

/// Decomposes a residue token string into its call set.
///
/// Separators and indel words are stripped to get the single-letter calls,
/// then `ins`/`del` are added back if they occurred.
pub fn parse_calls(aas: &str) -> BTreeSet<Call> {
    let letters = aas.replace('/', "").replace("ins", "").replace("del", "");
    let mut calls: BTreeSet<Call> = letters.chars().map(Call::Residue).collect();
    if aas.contains("ins") {
        calls.insert(Call::Insertion);
    }
    if aas.contains("del") {
        calls.insert(Call::Deletion);
    }
    calls
}

/// Splits a worksheet mutation cell on `+`, tolerating surrounding spaces.
pub fn split_mutation_list(text: &str) -> Vec<&str> {
    LIST_SEPARATOR.split(text).collect()
}
