//! Genes, sites and residue calls.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::EtlError;

/// The HIV genomic regions tracked by the database, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Gene {
    CA,
    PR,
    RT,
    IN,
}

impl Gene {
    /// Canonical rank order, used for sorting and output.
    pub const ALL: [Gene; 4] = [Gene::CA, Gene::PR, Gene::RT, Gene::IN];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gene::CA => "CA",
            Gene::PR => "PR",
            Gene::RT => "RT",
            Gene::IN => "IN",
        }
    }

    /// Worksheet column holding this gene's mutation list, e.g. `RT Mutations`.
    pub fn mutations_column(&self) -> String {
        format!("{} Mutations", self.as_str())
    }
}

impl FromStr for Gene {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CA" => Ok(Gene::CA),
            "PR" => Ok(Gene::PR),
            "RT" => Ok(Gene::RT),
            "IN" => Ok(Gene::IN),
            other => Err(EtlError::UnknownGene(other.to_string())),
        }
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single residue site. Orders by gene rank, then position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenePos {
    pub gene: Gene,
    /// 1-based amino acid position.
    pub pos: u32,
}

impl GenePos {
    pub fn new(gene: Gene, pos: u32) -> Self {
        Self { gene, pos }
    }
}

/// One member of a call set.
///
/// Variant order makes the derived `Ord` agree with the byte order of the
/// rendered text: `*` and uppercase letters sort before `del`, then `ins`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Call {
    Residue(char),
    Deletion,
    Insertion,
}

impl Call {
    pub fn is_indel(&self) -> bool {
        matches!(self, Call::Deletion | Call::Insertion)
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Call::Residue(aa) => write!(f, "{}", aa),
            Call::Deletion => f.write_str("del"),
            Call::Insertion => f.write_str("ins"),
        }
    }
}

/// Site -> observed calls. Never holds an empty set.
pub type MutationMap = BTreeMap<GenePos, BTreeSet<Call>>;

/// Site -> consensus (wild-type) residue.
pub type RefMap = HashMap<GenePos, char>;
