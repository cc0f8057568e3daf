//! Mutation shorthand: recognising it in free text, folding it into
//! mutation maps, and rendering maps back to shorthand.

pub mod dump;
pub mod grammar;
pub mod load;

pub use dump::{dump_mutations, mutation_text, norm_strain};
pub use grammar::{parse_calls, scan, split_mutation_list, MutationMatch};
pub use load::load_mutations;
