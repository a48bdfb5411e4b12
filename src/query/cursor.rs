//! Correlation cursors
//!
//! "Find next correlation" discloses ranked results one at a time. A cursor
//! pair remembers how many explained and unexplained rows have already been
//! served. Cursors live in memory only and are never persisted.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How cursor pairs are keyed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CursorScope {
    /// One pair per queried gene
    #[default]
    PerGene,
    /// One pair for every gene; querying gene B continues from where gene A stopped
    Shared,
}

impl std::str::FromStr for CursorScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "per-gene" | "gene" => Ok(CursorScope::PerGene),
            "shared" | "global" => Ok(CursorScope::Shared),
            _ => Err(format!("Unknown cursor scope: {}", s)),
        }
    }
}

/// Positions in the explained and unexplained rankings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorPair {
    pub explained: usize,
    pub unexplained: usize,
}

#[derive(Debug, Default)]
pub struct CorrelationCursors {
    scope: CursorScope,
    shared: CursorPair,
    per_gene: HashMap<String, CursorPair>,
}

impl CorrelationCursors {
    pub fn new(scope: CursorScope) -> Self {
        Self {
            scope,
            ..Self::default()
        }
    }

    /// Cursor pair serving `gene` (expects a normalized identifier)
    pub fn pair_mut(&mut self, gene: &str) -> &mut CursorPair {
        match self.scope {
            CursorScope::Shared => &mut self.shared,
            CursorScope::PerGene => self.per_gene.entry(gene.to_string()).or_default(),
        }
    }

    pub fn position(&self, gene: &str) -> CursorPair {
        match self.scope {
            CursorScope::Shared => self.shared,
            CursorScope::PerGene => self.per_gene.get(gene).copied().unwrap_or_default(),
        }
    }

    /// Zero every cursor
    pub fn reset(&mut self) {
        self.shared = CursorPair::default();
        self.per_gene.clear();
    }
}
