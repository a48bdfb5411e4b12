//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - correlations(id1, psite1, id2, psite2, corr, pval)
//! - causality(id1, psite1, id2, psite2, rel, uris)
//! - mutation_significance(id, pval)
//! - sif_relations(id1, id2, rel)
//! - mutex(id1, id2, id3, score)
//! - explained_correlations / unexplained_correlations (materialized joins)

pub mod schema;
pub mod sqlite;

pub use sqlite::{CorrelationView, SqliteStore, StoreStats};
