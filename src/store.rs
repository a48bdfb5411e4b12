//! Relationship store
//!
//! Owns the SQLite connection and the correlation cursors. The database file
//! doubles as an ingestion cache: when it already exists at open time the
//! datasets are not read at all.

use std::path::{Path, PathBuf};
use serde::Serialize;
use crate::Result;
use crate::ingest::{Dataset, DatasetPaths};
use crate::query::{CorrelationCursors, CursorPair, CursorScope, QueryEngine};
use crate::record::{CausalEdge, CorrelatedEntity, MutationSignificance, MutexGroup};
use crate::site::{normalize_gene, GeneSite};
use crate::storage::{SqliteStore, StoreStats};

/// Everything needed to open a store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub database: PathBuf,
    pub datasets: DatasetPaths,
    pub cursor_scope: CursorScope,
}

impl StoreOptions {
    /// Default database and dataset file names inside `data_dir`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            database: data_dir.join(crate::config::DEFAULT_DATABASE_FILE),
            datasets: DatasetPaths::in_dir(data_dir),
            cursor_scope: CursorScope::default(),
        }
    }
}

/// Record counts from one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub correlations: usize,
    /// Asserted edges; the table holds twice as many rows
    pub causal_edges: usize,
    pub mutation_scores: usize,
    pub sif_relations: usize,
    pub mutex_groups: usize,
}

impl IngestSummary {
    pub fn count(&self, dataset: Dataset) -> usize {
        match dataset {
            Dataset::Correlations => self.correlations,
            Dataset::Causality => self.causal_edges,
            Dataset::MutationSignificance => self.mutation_scores,
            Dataset::SifRelations => self.sif_relations,
            Dataset::Mutex => self.mutex_groups,
        }
    }
}

pub struct RelationshipStore {
    sqlite: SqliteStore,
    cursors: CorrelationCursors,
}

impl RelationshipStore {
    /// Open the database, ingesting the datasets first if the file does not exist.
    ///
    /// If that first ingestion fails the half-written file is removed, so the
    /// next open starts over instead of trusting it.
    pub fn open(options: &StoreOptions) -> Result<Self> {
        if options.database.exists() {
            tracing::debug!("Using existing database {}", options.database.display());
            let sqlite = SqliteStore::open(&options.database)?;
            return Ok(Self::from_sqlite(sqlite, options.cursor_scope));
        }

        tracing::info!("No database at {}, ingesting datasets", options.database.display());
        match Self::rebuild(options) {
            Ok((store, _)) => Ok(store),
            Err(e) => {
                if let Err(rm) = std::fs::remove_file(&options.database) {
                    tracing::debug!("Could not remove {}: {}", options.database.display(), rm);
                }
                Err(e)
            }
        }
    }

    /// Open (or create) the database and always reload every dataset.
    pub fn rebuild(options: &StoreOptions) -> Result<(Self, IngestSummary)> {
        if let Some(parent) = options.database.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let sqlite = SqliteStore::open(&options.database)?;
        let mut store = Self::from_sqlite(sqlite, options.cursor_scope);
        let summary = store.ingest(&options.datasets)?;
        Ok((store, summary))
    }

    /// Wrap an already opened database
    pub fn from_sqlite(sqlite: SqliteStore, cursor_scope: CursorScope) -> Self {
        Self {
            sqlite,
            cursors: CorrelationCursors::new(cursor_scope),
        }
    }

    /// Drop-and-rebuild every table from `paths`. Cursors are reset.
    pub fn ingest(&mut self, paths: &DatasetPaths) -> Result<IngestSummary> {
        let summary = IngestSummary {
            correlations: self.sqlite.load_correlations(&paths.correlations)?,
            causal_edges: self.sqlite.load_causality(&paths.causality)?,
            mutation_scores: self.sqlite.load_mutation_significance(&paths.mutation_significance)?,
            sif_relations: self.sqlite.load_sif_relations(&paths.sif_relations)?,
            mutex_groups: self.sqlite.load_mutex(&paths.mutex)?,
        };
        self.sqlite.build_explained_views()?;
        self.cursors.reset();
        Ok(summary)
    }

    fn engine(&self) -> QueryEngine<'_> {
        QueryEngine::new(&self.sqlite)
    }

    // ========== Queries ==========

    pub fn find_causality(&self, source: &str, target: &str) -> Result<Option<CausalEdge>> {
        self.engine().find_causality(source, target)
    }

    pub fn find_causality_targets(&self, id: &str, relation: &str) -> Result<Vec<CausalEdge>> {
        self.engine().find_causality_targets(id, relation)
    }

    pub fn find_causality_sources(&self, target: &str, relation: &str) -> Result<Vec<CausalEdge>> {
        self.engine().find_causality_sources(target, relation)
    }

    /// Next correlation for `gene`: explained ones first, then unexplained
    pub fn find_next_correlation(&mut self, gene: &str) -> Result<Option<CorrelatedEntity>> {
        let gene = normalize_gene(gene);
        let engine = QueryEngine::new(&self.sqlite);
        engine.next_correlation(&gene, self.cursors.pair_mut(&gene))
    }

    pub fn find_next_unexplained_correlation(&mut self, gene: &str) -> Result<Option<CorrelatedEntity>> {
        let gene = normalize_gene(gene);
        let engine = QueryEngine::new(&self.sqlite);
        engine.next_unexplained_correlation(&gene, self.cursors.pair_mut(&gene))
    }

    pub fn reset_cursors(&mut self) {
        self.cursors.reset();
    }

    pub fn cursor_position(&self, gene: &str) -> CursorPair {
        self.cursors.position(&normalize_gene(gene))
    }

    pub fn get_correlation_between(
        &self,
        gene1: &str,
        site1: &str,
        gene2: &str,
        site2: &str,
    ) -> Result<Option<CorrelatedEntity>> {
        self.engine().get_correlation_between(
            &GeneSite::from_parts(gene1, site1),
            &GeneSite::from_parts(gene2, site2),
        )
    }

    pub fn find_mutation_significance(&self, gene: &str) -> Result<Option<MutationSignificance>> {
        self.engine().find_mutation_significance(gene)
    }

    pub fn find_common_upstreams<S: AsRef<str>>(&self, genes: &[S]) -> Result<Vec<String>> {
        self.engine().find_common_upstreams(genes)
    }

    pub fn find_mutex(&self, gene: &str) -> Result<Vec<MutexGroup>> {
        self.engine().find_mutex(gene)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        self.sqlite.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CausalRecord, CorrelationRecord, Explainability};
    use crate::relation::CausalRelation;

    fn store_with(scope: CursorScope) -> RelationshipStore {
        let mut sqlite = SqliteStore::open_in_memory().unwrap();
        let rows = [
            ("AKT1-S1S", "BRAF-S2S", 0.7611),
            ("AKT1-S1S", "PTPN1-S3S", 0.5810),
            ("AGPS-S4S", "AKT1-S1S", 0.9499),
            ("MAPK1-S5S", "JUND-S6S", 0.4),
        ];
        for (a, b, corr) in rows {
            sqlite.insert_correlation(&CorrelationRecord {
                first: GeneSite::parse(a),
                second: GeneSite::parse(b),
                correlation: corr,
                p_value: 0.01,
            }).unwrap();
        }
        for (a, b) in [("AKT1-S1S", "BRAF-S2S"), ("AKT1-S1S", "PTPN1-S3S"), ("MAPK1-S5S", "JUND-S6S")] {
            sqlite.insert_causal(&CausalRecord {
                source: GeneSite::parse(a),
                target: GeneSite::parse(b),
                relation: CausalRelation::Phosphorylates,
                source_uris: Vec::new(),
            }).unwrap();
        }
        sqlite.build_explained_views().unwrap();
        RelationshipStore::from_sqlite(sqlite, scope)
    }

    fn drain(store: &mut RelationshipStore, gene: &str) -> Vec<CorrelatedEntity> {
        std::iter::from_fn(|| store.find_next_correlation(gene).unwrap()).collect()
    }

    #[test]
    fn test_reset_reproduces_sequence() {
        let mut store = store_with(CursorScope::PerGene);
        let first_run = drain(&mut store, "AKT1");
        assert_eq!(first_run.len(), 3);

        store.reset_cursors();
        store.reset_cursors();
        let second_run = drain(&mut store, "AKT1");
        assert_eq!(first_run, second_run);
    }

    #[test]
    fn test_monotonic_exhaustion() {
        let mut store = store_with(CursorScope::PerGene);
        let results = drain(&mut store, "AKT1");

        let explained: Vec<f64> = results
            .iter()
            .filter(|r| r.explainable == Explainability::Explainable)
            .map(|r| r.correlation.abs())
            .collect();
        assert_eq!(explained.len(), 2);
        assert!(explained.windows(2).all(|w| w[0] >= w[1]));

        // Explained bucket first, then unexplained
        let first_unexplained = results
            .iter()
            .position(|r| r.explainable == Explainability::Unexplainable)
            .unwrap();
        assert_eq!(first_unexplained, 2);
        assert_eq!(results[2].id1, "AKT1");
        assert_eq!(results[2].id2, "AGPS");

        for _ in 0..3 {
            assert!(store.find_next_correlation("AKT1").unwrap().is_none());
        }
    }

    #[test]
    fn test_per_gene_cursors() {
        let mut store = store_with(CursorScope::PerGene);
        let akt1 = store.find_next_correlation("AKT1").unwrap().unwrap();
        assert_eq!(akt1.id2, "BRAF");

        let mapk1 = store.find_next_correlation("MAPK1").unwrap().unwrap();
        assert_eq!(mapk1.id2, "JUND");

        let akt1_again = store.find_next_correlation("akt1").unwrap().unwrap();
        assert_eq!(akt1_again.id2, "PTPN1");
        assert_eq!(store.cursor_position("AKT1").explained, 2);
    }

    #[test]
    fn test_shared_cursor_consumes_across_genes() {
        let mut store = store_with(CursorScope::Shared);
        store.find_next_correlation("AKT1").unwrap().unwrap();

        // The shared explained index is now 1; MAPK1 has a single explained row
        let mapk1 = store.find_next_correlation("MAPK1").unwrap();
        assert!(mapk1.is_none());
    }

    #[test]
    fn test_correlation_between_argument_order() {
        let store = store_with(CursorScope::PerGene);
        let ab = store.get_correlation_between("AKT1", "S1S", "BRAF", "S2S").unwrap();
        let ba = store.get_correlation_between("braf", "s2s", "akt1", "s1s").unwrap();
        assert!(ab.is_some());
        assert_eq!(ab, ba);
    }
}
