//! Query engine implementation
//!
//! Provides high-level query operations:
//! - Causal edge lookups (pair, outgoing targets, incoming sources)
//! - Ranked correlation disclosure through caller-owned cursors
//! - Mutation significance classification
//! - Common upstream regulators (iterative intersection)
//! - Mutually exclusive groups
//!
//! "Not found" is always `Ok(None)` or an empty vector; errors are reserved
//! for storage failures.

use crate::Result;
use crate::query::cursor::CursorPair;
use crate::record::{CausalEdge, CorrelatedEntity, Explainability, MutationSignificance, MutexGroup};
use crate::relation::{CausalRelation, RelationFilter, CONTROLS_STATE_CHANGE_OF};
use crate::site::{normalize_gene, GeneSite};
use crate::storage::{CorrelationView, SqliteStore};

/// Query engine over the relationship tables
pub struct QueryEngine<'a> {
    store: &'a SqliteStore,
}

impl<'a> QueryEngine<'a> {
    /// Create a new query engine
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    // ========== Causality ==========

    /// First causal edge from `source` to `target`, in source order
    pub fn find_causality(&self, source: &str, target: &str) -> Result<Option<CausalEdge>> {
        let records = self
            .store
            .causal_records_between(&normalize_gene(source), &normalize_gene(target))?;
        Ok(records.first().map(CausalEdge::from))
    }

    /// Outgoing edges of `id`. `MODULATES` matches every relation.
    pub fn find_causality_targets(&self, id: &str, relation: &str) -> Result<Vec<CausalEdge>> {
        let id = normalize_gene(id);
        let records = match RelationFilter::parse(relation) {
            RelationFilter::Any => self.store.causal_records_from(&id, None)?,
            RelationFilter::Label(label) => self.store.causal_records_from(&id, Some(&label))?,
        };
        Ok(records.iter().map(CausalEdge::from).collect())
    }

    /// Edges ending at `target` with the given relation, reported source → target.
    ///
    /// Answered through the mirrored inverse rows, so it costs the same
    /// indexed lookup as [`find_causality_targets`](Self::find_causality_targets).
    pub fn find_causality_sources(&self, target: &str, relation: &str) -> Result<Vec<CausalEdge>> {
        let target = normalize_gene(target);
        let records = match RelationFilter::parse(relation) {
            RelationFilter::Any => self.store.causal_records_from(&target, None)?,
            RelationFilter::Label(label) => match label.parse::<CausalRelation>() {
                Ok(rel) => self
                    .store
                    .causal_records_from(&target, Some(rel.inverse().as_str()))?,
                Err(_) => return Ok(Vec::new()),
            },
        };
        Ok(records
            .iter()
            .map(|record| CausalEdge::from(&record.mirrored()))
            .collect())
    }

    // ========== Correlations ==========

    /// Next explained correlation for `gene`, falling through to the
    /// unexplained ranking once the explained one is exhausted.
    pub fn next_correlation(&self, gene: &str, cursor: &mut CursorPair) -> Result<Option<CorrelatedEntity>> {
        let gene = normalize_gene(gene);

        if let Some(record) = self
            .store
            .ranked_correlation(CorrelationView::Explained, &gene, cursor.explained)?
        {
            cursor.explained += 1;
            let entity = CorrelatedEntity::from_record(&record, Explainability::Explainable);
            return Ok(Some(entity.oriented_towards(&gene)));
        }

        self.next_unexplained_correlation(&gene, cursor)
    }

    /// Next unexplained correlation for `gene`
    pub fn next_unexplained_correlation(
        &self,
        gene: &str,
        cursor: &mut CursorPair,
    ) -> Result<Option<CorrelatedEntity>> {
        let gene = normalize_gene(gene);

        let Some(record) = self
            .store
            .ranked_correlation(CorrelationView::Unexplained, &gene, cursor.unexplained)?
        else {
            return Ok(None);
        };

        cursor.unexplained += 1;
        let entity = CorrelatedEntity::from_record(&record, Explainability::Unexplainable);
        Ok(Some(entity.oriented_towards(&gene)))
    }

    /// Correlation between two endpoints regardless of argument order
    pub fn get_correlation_between(&self, a: &GeneSite, b: &GeneSite) -> Result<Option<CorrelatedEntity>> {
        let record = self.store.correlation_between(a, b)?;
        Ok(record.map(|r| CorrelatedEntity::from_record(&r, Explainability::Unassigned)))
    }

    // ========== Mutation Significance ==========

    pub fn find_mutation_significance(&self, gene: &str) -> Result<Option<MutationSignificance>> {
        let p_value = self.store.mutation_p_value(&normalize_gene(gene))?;
        Ok(p_value.map(MutationSignificance::from_p_value))
    }

    // ========== Interaction Network ==========

    /// Regulators with a `controls-state-change-of` edge into every gene.
    ///
    /// Seeds the candidate set from the first two genes and narrows it with
    /// each further gene. Fewer than two genes yields an empty list.
    pub fn find_common_upstreams<S: AsRef<str>>(&self, genes: &[S]) -> Result<Vec<String>> {
        if genes.len() < 2 {
            return Ok(Vec::new());
        }

        let genes: Vec<String> = genes.iter().map(|g| normalize_gene(g.as_ref())).collect();
        let mut candidates =
            self.store
                .shared_upstreams(&genes[0], &genes[1], CONTROLS_STATE_CHANGE_OF)?;

        for gene in &genes[2..] {
            if candidates.is_empty() {
                break;
            }
            let upstreams: std::collections::HashSet<String> = self
                .store
                .upstreams_of(gene, CONTROLS_STATE_CHANGE_OF)?
                .into_iter()
                .collect();
            candidates.retain(|c| upstreams.contains(c));
        }

        Ok(candidates)
    }

    // ========== Mutual Exclusivity ==========

    pub fn find_mutex(&self, gene: &str) -> Result<Vec<MutexGroup>> {
        let records = self.store.mutex_records_with(&normalize_gene(gene))?;
        Ok(records.iter().map(MutexGroup::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CausalRecord, CorrelationRecord, MutationSignificanceRecord, MutexRecord, SifRelationRecord};

    fn correlation(a: &str, b: &str, corr: f64) -> CorrelationRecord {
        CorrelationRecord {
            first: GeneSite::parse(a),
            second: GeneSite::parse(b),
            correlation: corr,
            p_value: 0.01,
        }
    }

    fn causal(a: &str, rel: CausalRelation, b: &str) -> CausalRecord {
        CausalRecord {
            source: GeneSite::parse(a),
            target: GeneSite::parse(b),
            relation: rel,
            source_uris: Vec::new(),
        }
    }

    fn controls(up: &str, down: &str) -> SifRelationRecord {
        SifRelationRecord {
            gene1: up.to_string(),
            gene2: down.to_string(),
            relation: CONTROLS_STATE_CHANGE_OF.to_string(),
        }
    }

    #[test]
    fn test_causality_both_directions() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_causal(&causal("MAPK1-T185T", CausalRelation::Phosphorylates, "CREB1-S133S")).unwrap();

        let engine = QueryEngine::new(&store);

        let forward = engine.find_causality("MAPK1", "CREB1").unwrap().unwrap();
        assert_eq!(forward.rel, CausalRelation::Phosphorylates);
        assert_eq!(forward.mods2[0].residue, "S");
        assert_eq!(forward.mods2[0].position, "133");

        let backward = engine.find_causality("creb1", "mapk1").unwrap().unwrap();
        assert_eq!(backward.rel, CausalRelation::IsPhosphorylatedBy);
        assert_eq!(backward.id1, "CREB1");

        assert!(engine.find_causality("MAPK1", "RAS").unwrap().is_none());
    }

    #[test]
    fn test_first_causal_row_wins() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_causal(&causal("A", CausalRelation::Phosphorylates, "B")).unwrap();
        store.insert_causal(&causal("A", CausalRelation::UpregulatesExpression, "B")).unwrap();

        let engine = QueryEngine::new(&store);
        let edge = engine.find_causality("A", "B").unwrap().unwrap();
        assert_eq!(edge.rel, CausalRelation::Phosphorylates);
    }

    #[test]
    fn test_targets_and_sources() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_causal(&causal("MAPK1", CausalRelation::Phosphorylates, "RPTOR-S863S")).unwrap();
        store.insert_causal(&causal("MAPK1", CausalRelation::UpregulatesExpression, "FOS")).unwrap();
        store.insert_causal(&causal("NRAS", CausalRelation::Phosphorylates, "MAPK1")).unwrap();

        let engine = QueryEngine::new(&store);

        let phos = engine.find_causality_targets("MAPK1", "phosphorylates").unwrap();
        assert_eq!(phos.len(), 1);
        assert_eq!(phos[0].id2, "RPTOR");
        assert_eq!(phos[0].mods2[0].position, "863");

        let all = engine.find_causality_targets("MAPK1", "modulates").unwrap();
        assert_eq!(all.len(), 3);

        assert!(engine.find_causality_targets("MAPK1", "activates").unwrap().is_empty());
        assert!(engine.find_causality_targets("ABC", "phosphorylates").unwrap().is_empty());

        let sources = engine.find_causality_sources("MAPK1", "phosphorylates").unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].id1, "NRAS");
        assert_eq!(sources[0].id2, "MAPK1");
        assert_eq!(sources[0].rel, CausalRelation::Phosphorylates);

        assert!(engine.find_causality_sources("MAPK1", "activates").unwrap().is_empty());
    }

    fn correlation_store() -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert_correlation(&correlation("AKT1-S473S", "BRAF-S365S", 0.7611)).unwrap();
        store.insert_correlation(&correlation("PTPN1-S50S", "AKT1-S473S", -0.5810)).unwrap();
        store.insert_correlation(&correlation("AKT1-S473S", "AGPS-S10S", 0.9499)).unwrap();
        store.insert_correlation(&correlation("AKT1-S473S", "GSK3B-S9S", 0.12)).unwrap();
        store.insert_causal(&causal("AKT1-S473S", CausalRelation::Phosphorylates, "BRAF-S365S")).unwrap();
        store.insert_causal(&causal("PTPN1-S50S", CausalRelation::Dephosphorylates, "AKT1-S473S")).unwrap();
        store.build_explained_views().unwrap();
        store
    }

    #[test]
    fn test_next_correlation_sequence() {
        let store = correlation_store();
        let engine = QueryEngine::new(&store);
        let mut cursor = CursorPair::default();

        let first = engine.next_correlation("AKT1", &mut cursor).unwrap().unwrap();
        assert_eq!(first.id1, "AKT1");
        assert_eq!(first.id2, "BRAF");
        assert_eq!(first.correlation, 0.7611);
        assert_eq!(first.explainable, Explainability::Explainable);

        let second = engine.next_correlation("AKT1", &mut cursor).unwrap().unwrap();
        assert_eq!(second.id1, "AKT1");
        assert_eq!(second.p_site1, "473");
        assert_eq!(second.id2, "PTPN1");
        assert_eq!(second.p_site2, "50");
        assert_eq!(second.explainable, Explainability::Explainable);

        let third = engine.next_correlation("AKT1", &mut cursor).unwrap().unwrap();
        assert_eq!(third.id2, "AGPS");
        assert_eq!(third.explainable, Explainability::Unexplainable);

        let fourth = engine.next_correlation("AKT1", &mut cursor).unwrap().unwrap();
        assert_eq!(fourth.id2, "GSK3B");

        assert!(engine.next_correlation("AKT1", &mut cursor).unwrap().is_none());
        assert!(engine.next_correlation("AKT1", &mut cursor).unwrap().is_none());
        assert_eq!(cursor, CursorPair { explained: 2, unexplained: 2 });
    }

    #[test]
    fn test_next_unexplained_only() {
        let store = correlation_store();
        let engine = QueryEngine::new(&store);
        let mut cursor = CursorPair::default();

        let first = engine.next_unexplained_correlation("AKT1", &mut cursor).unwrap().unwrap();
        assert_eq!(first.id2, "AGPS");
        assert_eq!(cursor.explained, 0);
        assert!(engine.next_correlation("ABC", &mut CursorPair::default()).unwrap().is_none());
    }

    #[test]
    fn test_correlation_between_is_symmetric() {
        let store = correlation_store();
        let engine = QueryEngine::new(&store);

        let akt1 = GeneSite::from_parts("AKT1", "S473S");
        let braf = GeneSite::from_parts("BRAF", "S365S");
        let ab = engine.get_correlation_between(&akt1, &braf).unwrap().unwrap();
        let ba = engine.get_correlation_between(&braf, &akt1).unwrap().unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.explainable, Explainability::Unassigned);

        let missing = GeneSite::from_parts("BRAF", "");
        assert!(engine.get_correlation_between(&akt1, &missing).unwrap().is_none());
    }

    #[test]
    fn test_mutation_significance() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_mutation_significance(&MutationSignificanceRecord { gene: "TP53".into(), p_value: 0.001 }).unwrap();
        store.insert_mutation_significance(&MutationSignificanceRecord { gene: "ACTN4".into(), p_value: 0.5 }).unwrap();

        let engine = QueryEngine::new(&store);
        assert_eq!(engine.find_mutation_significance("TP53").unwrap(), Some(MutationSignificance::HighlySignificant));
        assert_eq!(engine.find_mutation_significance("ACTN4").unwrap(), Some(MutationSignificance::NotSignificant));
        assert_eq!(engine.find_mutation_significance("ABC").unwrap(), None);
    }

    #[test]
    fn test_common_upstreams() {
        let store = SqliteStore::open_in_memory().unwrap();
        for gene in ["AKT1", "BRAF", "MAPK1"] {
            store.insert_sif_relation(&controls("EGF", gene)).unwrap();
        }
        store.insert_sif_relation(&controls("PDPK1", "AKT1")).unwrap();
        store.insert_sif_relation(&controls("PDPK1", "BRAF")).unwrap();
        store.insert_sif_relation(&controls("KRAS", "MAPK1")).unwrap();
        store.insert_sif_relation(&SifRelationRecord {
            gene1: "SRC".into(),
            gene2: "AKT1".into(),
            relation: "in-complex-with".into(),
        }).unwrap();

        let engine = QueryEngine::new(&store);
        assert_eq!(engine.find_common_upstreams(&["AKT1", "BRAF", "MAPK1"]).unwrap(), vec!["EGF"]);

        let pair = engine.find_common_upstreams(&["AKT1", "BRAF"]).unwrap();
        assert_eq!(pair, vec!["EGF", "PDPK1"]);

        assert!(engine.find_common_upstreams(&["AKT1"]).unwrap().is_empty());
        assert!(engine.find_common_upstreams::<&str>(&[]).unwrap().is_empty());
        assert!(engine.find_common_upstreams(&["UGT2B10", "PTEN"]).unwrap().is_empty());
    }

    #[test]
    fn test_find_mutex() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_mutex(&MutexRecord { gene1: "TP53".into(), gene2: "CDH1".into(), gene3: None, score: 0.0 }).unwrap();
        store.insert_mutex(&MutexRecord {
            gene1: "GATA3".into(),
            gene2: "TP53".into(),
            gene3: Some("CDH1".into()),
            score: 0.0,
        }).unwrap();

        let engine = QueryEngine::new(&store);
        let groups = engine.find_mutex("TP53").unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group, vec!["TP53", "CDH1"]);
        assert_eq!(groups[1].group, vec!["GATA3", "TP53", "CDH1"]);
        assert!(groups.iter().all(|g| g.score == 0.0));

        assert!(engine.find_mutex("BRAF").unwrap().is_empty());
    }
}
