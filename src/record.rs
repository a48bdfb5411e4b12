//! Typed records
//!
//! Two families live here:
//! - row records, one per table, produced by the dataset parsers
//! - result records, returned by the query operations

use crate::relation::CausalRelation;
use crate::site::{GeneSite, SiteModification, parse_modifications, trim_site};
use serde::{Deserialize, Serialize};
use std::fmt;

// ========== Row Records ==========

/// Observed co-abundance correlation between two (gene, site) endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRecord {
    pub first: GeneSite,
    pub second: GeneSite,
    pub correlation: f64,
    pub p_value: f64,
}

/// Directed causal assertion between two (gene, site) endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalRecord {
    pub source: GeneSite,
    pub target: GeneSite,
    pub relation: CausalRelation,
    pub source_uris: Vec<String>,
}

impl CausalRecord {
    /// The inverse row: endpoints swapped, inverse relation label.
    pub fn mirrored(&self) -> Self {
        Self {
            source: self.target.clone(),
            target: self.source.clone(),
            relation: self.relation.inverse(),
            source_uris: self.source_uris.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationSignificanceRecord {
    pub gene: String,
    pub p_value: f64,
}

/// Generic directed interaction edge from the interaction network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SifRelationRecord {
    pub gene1: String,
    pub gene2: String,
    pub relation: String,
}

/// Mutually exclusive mutation group of two or three genes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutexRecord {
    pub gene1: String,
    pub gene2: String,
    pub gene3: Option<String>,
    pub score: f64,
}

impl MutexRecord {
    pub fn members(&self) -> Vec<String> {
        let mut members = vec![self.gene1.clone(), self.gene2.clone()];
        if let Some(ref g) = self.gene3 {
            members.push(g.clone());
        }
        members
    }
}

// ========== Result Records ==========

/// A causal edge as returned by the causality lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalEdge {
    pub id1: String,
    pub mods1: Vec<SiteModification>,
    pub id2: String,
    pub mods2: Vec<SiteModification>,
    pub rel: CausalRelation,
    pub source_uris: Vec<String>,
}

impl From<&CausalRecord> for CausalEdge {
    fn from(record: &CausalRecord) -> Self {
        Self {
            id1: record.source.gene.clone(),
            mods1: parse_modifications(&record.source.site),
            id2: record.target.gene.clone(),
            mods2: parse_modifications(&record.target.site),
            rel: record.relation,
            source_uris: record.source_uris.clone(),
        }
    }
}

/// Whether a correlation has a causal edge between the same endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Explainability {
    Explainable,
    Unexplainable,
    /// Looked up directly rather than through one of the derived views
    Unassigned,
}

impl Explainability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Explainability::Explainable => "explainable",
            Explainability::Unexplainable => "unexplainable",
            Explainability::Unassigned => "unassigned",
        }
    }
}

impl fmt::Display for Explainability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A correlation as returned by the correlation lookups.
///
/// Sites are reported trimmed (`S473S` -> `473`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedEntity {
    pub id1: String,
    pub p_site1: String,
    pub id2: String,
    pub p_site2: String,
    pub correlation: f64,
    pub p_val: f64,
    pub explainable: Explainability,
}

impl CorrelatedEntity {
    pub fn from_record(record: &CorrelationRecord, explainable: Explainability) -> Self {
        Self {
            id1: record.first.gene.clone(),
            p_site1: trim_site(&record.first.site),
            id2: record.second.gene.clone(),
            p_site2: trim_site(&record.second.site),
            correlation: record.correlation,
            p_val: record.p_value,
            explainable,
        }
    }

    /// Swap endpoints when `gene` sits in the second slot so that `id1 == gene`.
    pub fn oriented_towards(mut self, gene: &str) -> Self {
        if self.id2 == gene && self.id1 != gene {
            std::mem::swap(&mut self.id1, &mut self.id2);
            std::mem::swap(&mut self.p_site1, &mut self.p_site2);
        }
        self
    }
}

/// Mutation significance class derived from a p-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MutationSignificance {
    HighlySignificant,
    Significant,
    NotSignificant,
}

impl MutationSignificance {
    pub fn from_p_value(p_value: f64) -> Self {
        if p_value < 0.01 {
            MutationSignificance::HighlySignificant
        } else if p_value < 0.05 {
            MutationSignificance::Significant
        } else {
            MutationSignificance::NotSignificant
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MutationSignificance::HighlySignificant => "highly significant",
            MutationSignificance::Significant => "significant",
            MutationSignificance::NotSignificant => "not significant",
        }
    }
}

impl fmt::Display for MutationSignificance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutex group as returned by [`find_mutex`](crate::query::QueryEngine::find_mutex).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutexGroup {
    pub group: Vec<String>,
    pub score: f64,
}

impl From<&MutexRecord> for MutexGroup {
    fn from(record: &MutexRecord) -> Self {
        Self {
            group: record.members(),
            score: record.score,
        }
    }
}
