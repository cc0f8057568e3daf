//! Isolate identity: synthetic names for worksheet rows, the baseline and
//! consensus lookups, and the cascade that turns selection worksheets into
//! per-isolate mutation maps.

use std::collections::HashMap;

use crate::gene::MutationMap;

pub mod names;
pub mod reference;
pub mod resolver;

pub use names::{gen_isolate_names, isolate_names, minimal_keys, MinimalKeys, NamedRow, KEY_COLUMNS};
pub use reference::{load_baseline, load_consensus};
pub use resolver::{
    ivsel_to_isolates, ExperimentMetadata, IsolateRecord, IsolateTable, ResolverContext,
    ISOLATE_HEADERS,
};

/// Isolate name -> canonical isolate name.
pub type RenameTable = HashMap<String, String>;

/// Reference-sequence isolate name -> its mutation map.
pub type RefseqMutmaps = HashMap<String, MutationMap>;

/// Follows one rename, if there is one.
pub fn canonical_name<'a>(renames: &'a RenameTable, name: &'a str) -> &'a str {
    renames.get(name).map_or(name, String::as_str)
}
