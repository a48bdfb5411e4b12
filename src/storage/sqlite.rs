//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, OptionalExtension, params};
use crate::Result;
use crate::ingest::{
    read_records, CausalityParser, CorrelationParser, MutationSignificanceParser, MutexParser,
    SifRelationParser,
};
use crate::record::{
    CausalRecord, CorrelationRecord, MutationSignificanceRecord, MutexRecord, SifRelationRecord,
};
use crate::relation::CausalRelation;
use crate::site::GeneSite;
use super::schema;

const INSERT_CORRELATION: &str =
    "INSERT INTO correlations (id1, psite1, id2, psite2, corr, pval) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
const INSERT_CAUSALITY: &str =
    "INSERT INTO causality (id1, psite1, id2, psite2, rel, uris) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
const INSERT_MUTATION_SIGNIFICANCE: &str =
    "INSERT INTO mutation_significance (id, pval) VALUES (?1, ?2)";
const INSERT_SIF_RELATION: &str = "INSERT INTO sif_relations (id1, id2, rel) VALUES (?1, ?2, ?3)";
const INSERT_MUTEX: &str = "INSERT INTO mutex (id1, id2, id3, score) VALUES (?1, ?2, ?3, ?4)";

const CORRELATION_COLUMNS: &str = "id1, psite1, id2, psite2, corr, pval";
const CAUSALITY_COLUMNS: &str = "id1, psite1, id2, psite2, rel, uris";

/// One of the two materialized correlation views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CorrelationView {
    Explained,
    Unexplained,
}

impl CorrelationView {
    pub fn table(&self) -> &'static str {
        match self {
            CorrelationView::Explained => "explained_correlations",
            CorrelationView::Unexplained => "unexplained_correlations",
        }
    }
}

/// SQLite-backed storage for the relationship tables
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== Ingestion ==========

    /// Replace the correlation table with the contents of `path`
    pub fn load_correlations(&mut self, path: &Path) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM correlations", [])?;
        let count = read_records(&CorrelationParser, path, |record| {
            insert_correlation_row(&tx, &record)
        })?;
        tx.commit()?;
        tracing::info!("Loaded {} correlations from {}", count, path.display());
        Ok(count)
    }

    /// Replace the causality table; every line yields a forward and a mirrored row
    pub fn load_causality(&mut self, path: &Path) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM causality", [])?;
        let count = read_records(&CausalityParser, path, |record| {
            insert_causal_rows(&tx, &record)
        })?;
        tx.commit()?;
        tracing::info!("Loaded {} causal edges (x2 with inverses) from {}", count, path.display());
        Ok(count)
    }

    pub fn load_mutation_significance(&mut self, path: &Path) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM mutation_significance", [])?;
        let count = read_records(&MutationSignificanceParser, path, |record| {
            insert_mutation_significance_row(&tx, &record)
        })?;
        tx.commit()?;
        tracing::info!("Loaded {} mutation significance scores from {}", count, path.display());
        Ok(count)
    }

    pub fn load_sif_relations(&mut self, path: &Path) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM sif_relations", [])?;
        let count = read_records(&SifRelationParser, path, |record| {
            insert_sif_relation_row(&tx, &record)
        })?;
        tx.commit()?;
        tracing::info!("Loaded {} interaction edges from {}", count, path.display());
        Ok(count)
    }

    pub fn load_mutex(&mut self, path: &Path) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM mutex", [])?;
        let count = read_records(&MutexParser, path, |record| insert_mutex_row(&tx, &record))?;
        tx.commit()?;
        tracing::info!("Loaded {} mutex groups from {}", count, path.display());
        Ok(count)
    }

    /// Rematerialize the explained/unexplained correlation views
    pub fn build_explained_views(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        for stmt in schema::DROP_VIEWS {
            tx.execute(stmt, [])?;
        }
        for stmt in schema::view_statements() {
            tx.execute(stmt, [])?;
        }
        tx.commit()?;

        tracing::debug!(
            "Correlation views: {} explained, {} unexplained",
            self.count_rows(CorrelationView::Explained.table())?,
            self.count_rows(CorrelationView::Unexplained.table())?
        );
        Ok(())
    }

    // ========== Row Operations ==========

    pub fn insert_correlation(&self, record: &CorrelationRecord) -> Result<()> {
        insert_correlation_row(&self.conn, record)
    }

    /// Insert a causal record together with its mirrored inverse
    pub fn insert_causal(&self, record: &CausalRecord) -> Result<()> {
        insert_causal_rows(&self.conn, record)
    }

    pub fn insert_mutation_significance(&self, record: &MutationSignificanceRecord) -> Result<()> {
        insert_mutation_significance_row(&self.conn, record)
    }

    pub fn insert_sif_relation(&self, record: &SifRelationRecord) -> Result<()> {
        insert_sif_relation_row(&self.conn, record)
    }

    pub fn insert_mutex(&self, record: &MutexRecord) -> Result<()> {
        insert_mutex_row(&self.conn, record)
    }

    // ========== Causality Queries ==========

    /// Causal rows from `id1` to `id2`, in source order
    pub fn causal_records_between(&self, id1: &str, id2: &str) -> Result<Vec<CausalRecord>> {
        let sql = format!(
            "SELECT {} FROM causality WHERE id1 = ?1 AND id2 = ?2 ORDER BY rowid",
            CAUSALITY_COLUMNS
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let records = stmt
            .query_map(params![id1, id2], |row| self.row_to_causal(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// Causal rows leaving `id1`, optionally restricted to one relation label
    pub fn causal_records_from(&self, id1: &str, relation: Option<&str>) -> Result<Vec<CausalRecord>> {
        let records = match relation {
            Some(rel) => {
                let sql = format!(
                    "SELECT {} FROM causality WHERE id1 = ?1 AND rel = ?2 ORDER BY rowid",
                    CAUSALITY_COLUMNS
                );
                let mut stmt = self.conn.prepare_cached(&sql)?;
                stmt.query_map(params![id1, rel], |row| self.row_to_causal(row))?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM causality WHERE id1 = ?1 ORDER BY rowid",
                    CAUSALITY_COLUMNS
                );
                let mut stmt = self.conn.prepare_cached(&sql)?;
                stmt.query_map([id1], |row| self.row_to_causal(row))?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(records)
    }

    fn row_to_causal(&self, row: &rusqlite::Row) -> rusqlite::Result<CausalRecord> {
        let rel_str: String = row.get(4)?;
        let relation: CausalRelation = rel_str.parse().map_err(|e: crate::Error| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let uris: String = row.get(5)?;

        Ok(CausalRecord {
            source: GeneSite::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?),
            target: GeneSite::new(row.get::<_, String>(2)?, row.get::<_, String>(3)?),
            relation,
            source_uris: uris.split_whitespace().map(str::to_string).collect(),
        })
    }

    // ========== Correlation Queries ==========

    /// The correlation involving `gene` at rank `offset` (0-based) in `view`,
    /// ordered by descending |correlation| with ties in source order
    pub fn ranked_correlation(
        &self,
        view: CorrelationView,
        gene: &str,
        offset: usize,
    ) -> Result<Option<CorrelationRecord>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id1 = ?1 OR id2 = ?1 ORDER BY ABS(corr) DESC, rowid LIMIT 1 OFFSET ?2",
            CORRELATION_COLUMNS,
            view.table()
        );
        self.conn
            .query_row(&sql, params![gene, offset as i64], |row| self.row_to_correlation(row))
            .optional()
            .map_err(Into::into)
    }

    /// First correlation between the two endpoints, in either orientation
    pub fn correlation_between(&self, a: &GeneSite, b: &GeneSite) -> Result<Option<CorrelationRecord>> {
        let sql = format!(
            "SELECT {} FROM correlations
             WHERE (id1 = ?1 AND psite1 = ?2 AND id2 = ?3 AND psite2 = ?4)
                OR (id1 = ?3 AND psite1 = ?4 AND id2 = ?1 AND psite2 = ?2)
             ORDER BY rowid LIMIT 1",
            CORRELATION_COLUMNS
        );
        self.conn
            .query_row(&sql, params![a.gene, a.site, b.gene, b.site], |row| {
                self.row_to_correlation(row)
            })
            .optional()
            .map_err(Into::into)
    }

    fn row_to_correlation(&self, row: &rusqlite::Row) -> rusqlite::Result<CorrelationRecord> {
        Ok(CorrelationRecord {
            first: GeneSite::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?),
            second: GeneSite::new(row.get::<_, String>(2)?, row.get::<_, String>(3)?),
            correlation: row.get(4)?,
            p_value: row.get(5)?,
        })
    }

    // ========== Mutation Significance Queries ==========

    /// p-value of the first score row for `gene`
    pub fn mutation_p_value(&self, gene: &str) -> Result<Option<f64>> {
        self.conn
            .query_row(
                "SELECT pval FROM mutation_significance WHERE id = ?1 ORDER BY rowid LIMIT 1",
                [gene],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    // ========== Interaction Network Queries ==========

    /// Distinct sources of `relation` edges pointing at both genes, in first-seen order
    pub fn shared_upstreams(&self, gene1: &str, gene2: &str, relation: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT s1.id1 FROM sif_relations s1
             INNER JOIN sif_relations s2 ON s2.id1 = s1.id1
             WHERE s1.id2 = ?1 AND s2.id2 = ?2 AND s1.rel = ?3 AND s2.rel = ?3
             ORDER BY s1.rowid",
        )?;
        let rows = stmt
            .query_map(params![gene1, gene2, relation], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(dedup_in_order(rows))
    }

    /// Distinct sources of `relation` edges pointing at `gene`
    pub fn upstreams_of(&self, gene: &str, relation: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id1 FROM sif_relations WHERE id2 = ?1 AND rel = ?2 ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map(params![gene, relation], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(dedup_in_order(rows))
    }

    // ========== Mutex Queries ==========

    /// Mutex groups with `gene` in any slot, in source order
    pub fn mutex_records_with(&self, gene: &str) -> Result<Vec<MutexRecord>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id1, id2, id3, score FROM mutex
             WHERE id1 = ?1 OR id2 = ?1 OR id3 = ?1 ORDER BY rowid",
        )?;
        let records = stmt
            .query_map([gene], |row| {
                Ok(MutexRecord {
                    gene1: row.get(0)?,
                    gene2: row.get(1)?,
                    gene3: row.get(2)?,
                    score: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    // ========== Statistics ==========

    fn count_rows(&self, table: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            correlations: self.count_rows("correlations")?,
            causal_rows: self.count_rows("causality")?,
            mutation_scores: self.count_rows("mutation_significance")?,
            sif_relations: self.count_rows("sif_relations")?,
            mutex_groups: self.count_rows("mutex")?,
            explained: self.count_rows(CorrelationView::Explained.table())?,
            unexplained: self.count_rows(CorrelationView::Unexplained.table())?,
        })
    }
}

fn insert_correlation_row(conn: &Connection, record: &CorrelationRecord) -> Result<()> {
    conn.prepare_cached(INSERT_CORRELATION)?.execute(params![
        record.first.gene,
        record.first.site,
        record.second.gene,
        record.second.site,
        record.correlation,
        record.p_value,
    ])?;
    Ok(())
}

fn insert_causal_rows(conn: &Connection, record: &CausalRecord) -> Result<()> {
    let mut stmt = conn.prepare_cached(INSERT_CAUSALITY)?;
    for row in [record.clone(), record.mirrored()] {
        stmt.execute(params![
            row.source.gene,
            row.source.site,
            row.target.gene,
            row.target.site,
            row.relation.as_str(),
            row.source_uris.join(" "),
        ])?;
    }
    Ok(())
}

fn insert_mutation_significance_row(conn: &Connection, record: &MutationSignificanceRecord) -> Result<()> {
    conn.prepare_cached(INSERT_MUTATION_SIGNIFICANCE)?
        .execute(params![record.gene, record.p_value])?;
    Ok(())
}

fn insert_sif_relation_row(conn: &Connection, record: &SifRelationRecord) -> Result<()> {
    conn.prepare_cached(INSERT_SIF_RELATION)?
        .execute(params![record.gene1, record.gene2, record.relation])?;
    Ok(())
}

fn insert_mutex_row(conn: &Connection, record: &MutexRecord) -> Result<()> {
    conn.prepare_cached(INSERT_MUTEX)?.execute(params![
        record.gene1,
        record.gene2,
        record.gene3,
        record.score,
    ])?;
    Ok(())
}

fn dedup_in_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}

/// Row counts per table
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    pub correlations: usize,
    /// Includes the mirrored inverse rows
    pub causal_rows: usize,
    pub mutation_scores: usize,
    pub sif_relations: usize,
    pub mutex_groups: usize,
    pub explained: usize,
    pub unexplained: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Correlations: {}", self.correlations)?;
        writeln!(f, "    Explained: {}", self.explained)?;
        writeln!(f, "    Unexplained: {}", self.unexplained)?;
        writeln!(f, "  Causal rows: {}", self.causal_rows)?;
        writeln!(f, "  Mutation scores: {}", self.mutation_scores)?;
        writeln!(f, "  Interaction edges: {}", self.sif_relations)?;
        writeln!(f, "  Mutex groups: {}", self.mutex_groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

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
            source_uris: vec!["http://pathwaycommons.org/pc2/x".to_string()],
        }
    }

    #[test]
    fn test_causal_rows_are_mirrored() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_causal(&causal("MAPK1", CausalRelation::Phosphorylates, "JUND-S100S")).unwrap();

        let forward = store.causal_records_between("MAPK1", "JUND").unwrap();
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].relation, CausalRelation::Phosphorylates);
        assert_eq!(forward[0].source_uris.len(), 1);

        let backward = store.causal_records_between("JUND", "MAPK1").unwrap();
        assert_eq!(backward.len(), 1);
        assert_eq!(backward[0].relation, CausalRelation::IsPhosphorylatedBy);
        assert_eq!(backward[0].source.site, "S100S");

        assert_eq!(store.stats().unwrap().causal_rows, 2);
    }

    #[test]
    fn test_causal_records_from_filters_relation() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_causal(&causal("MAPK1", CausalRelation::Phosphorylates, "JUND")).unwrap();
        store.insert_causal(&causal("MAPK1", CausalRelation::UpregulatesExpression, "FOS")).unwrap();
        store.insert_causal(&causal("BRAF", CausalRelation::Phosphorylates, "MAPK1")).unwrap();

        let all = store.causal_records_from("MAPK1", None).unwrap();
        assert_eq!(all.len(), 3); // two forward, one inverse from BRAF

        let phos = store.causal_records_from("MAPK1", Some("phosphorylates")).unwrap();
        assert_eq!(phos.len(), 1);
        assert_eq!(phos[0].target.gene, "JUND");
    }

    #[test]
    fn test_views_split_correlations() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert_correlation(&correlation("AKT1-S1S", "BRAF-S2S", 0.76)).unwrap();
        store.insert_correlation(&correlation("AKT1-S1S", "AGPS", 0.95)).unwrap();
        store.insert_causal(&causal("AKT1-S1S", CausalRelation::Phosphorylates, "BRAF-S2S")).unwrap();
        store.build_explained_views().unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.explained, 1);
        assert_eq!(stats.unexplained, 1);

        let top = store.ranked_correlation(CorrelationView::Explained, "AKT1", 0).unwrap().unwrap();
        assert_eq!(top.second.gene, "BRAF");
        assert!(store.ranked_correlation(CorrelationView::Explained, "AKT1", 1).unwrap().is_none());

        // Rebuilding must not duplicate rows
        store.build_explained_views().unwrap();
        assert_eq!(store.stats().unwrap().explained, 1);
    }

    #[test]
    fn test_ranked_correlation_orders_by_magnitude() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert_correlation(&correlation("A", "B", 0.2)).unwrap();
        store.insert_correlation(&correlation("C", "A", -0.9)).unwrap();
        store.insert_correlation(&correlation("A", "D", 0.5)).unwrap();
        store.insert_correlation(&correlation("E", "F", 0.99)).unwrap();
        store.build_explained_views().unwrap();

        let ranked: Vec<f64> = (0..4)
            .filter_map(|i| store.ranked_correlation(CorrelationView::Unexplained, "A", i).unwrap())
            .map(|r| r.correlation)
            .collect();
        assert_eq!(ranked, vec![-0.9, 0.5, 0.2]);
    }

    #[test]
    fn test_load_is_idempotent() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "EGF\tcontrols-state-change-of\tAKT1").unwrap();
        writeln!(file, "EGF\tcontrols-state-change-of\tBRAF").unwrap();

        let mut store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.load_sif_relations(file.path()).unwrap(), 2);
        assert_eq!(store.load_sif_relations(file.path()).unwrap(), 2);
        assert_eq!(store.stats().unwrap().sif_relations, 2);

        let shared = store.shared_upstreams("AKT1", "BRAF", "controls-state-change-of").unwrap();
        assert_eq!(shared, vec!["EGF"]);
    }

    #[test]
    fn test_failed_load_rolls_back() {
        let mut good = tempfile::NamedTempFile::new().unwrap();
        writeln!(good, "A\tB\t0.5\t0.01").unwrap();
        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "A\tB\t0.5\t0.01").unwrap();
        writeln!(bad, "A\tB\tx\t0.01").unwrap();

        let mut store = SqliteStore::open_in_memory().unwrap();
        store.load_correlations(good.path()).unwrap();
        assert!(store.load_correlations(bad.path()).is_err());
        assert_eq!(store.stats().unwrap().correlations, 1);
    }

    #[test]
    fn test_mutex_records_with() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_mutex(&MutexRecord {
            gene1: "TP53".into(),
            gene2: "CDH1".into(),
            gene3: None,
            score: 0.0,
        }).unwrap();
        store.insert_mutex(&MutexRecord {
            gene1: "GATA3".into(),
            gene2: "TP53".into(),
            gene3: Some("CDH1".into()),
            score: 0.0,
        }).unwrap();

        assert_eq!(store.mutex_records_with("TP53").unwrap().len(), 2);
        assert_eq!(store.mutex_records_with("GATA3").unwrap().len(), 1);
        assert!(store.mutex_records_with("BRAF").unwrap().is_empty());
    }
}
