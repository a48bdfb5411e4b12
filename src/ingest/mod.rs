//! Dataset ingestion
//!
//! Each dataset is a tab-delimited text file. A parser turns one line into
//! one typed record; the storage layer decides how records become rows.

pub mod framework;
pub mod parsers;

pub use framework::{read_records, Dataset, DatasetParser, DatasetPaths};
pub use parsers::{
    CausalityParser, CorrelationParser, MutationSignificanceParser, MutexParser, SifRelationParser,
};
