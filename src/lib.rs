//! ETL for the HIV drug-resistance database: curation worksheets in, flat
//! tables out.

pub mod commands;
pub mod config;
pub mod error;
pub mod gene;
pub mod isolates;
pub mod logging;
pub mod measure;
pub mod metrics;
pub mod mutations;
pub mod report;
pub mod runs;
pub mod table;
