//! # Causality - Relationship store for biological datasets
//!
//! Loads five flat-file datasets into SQLite and answers relationship queries:
//! - causal edges between (gene, phosphosite) endpoints
//! - ranked correlations, split into causally explained and unexplained
//! - per-gene mutation significance
//! - common upstream regulators over an interaction network
//! - mutually exclusive mutation groups

pub mod site;
pub mod relation;
pub mod record;
pub mod ingest;
pub mod storage;
pub mod query;
pub mod store;
pub mod config;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use site::{GeneSite, SiteModification};
pub use relation::{CausalRelation, RelationFilter};
pub use record::{
    CausalEdge, CorrelatedEntity, Explainability, MutationSignificance, MutexGroup,
};
pub use ingest::{Dataset, DatasetPaths};
pub use query::{CursorScope, QueryEngine};
pub use storage::SqliteStore;
pub use store::RelationshipStore;

use std::path::PathBuf;

/// Result type alias for Causality operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Causality operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read {dataset} dataset at {}: {source}", path.display())]
    Dataset {
        dataset: Dataset,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {dataset} dataset, line {line}: {message}")]
    Parse {
        dataset: Dataset,
        line: usize,
        message: String,
    },

    #[error("Unknown relation: {0}")]
    UnknownRelation(String),
}
