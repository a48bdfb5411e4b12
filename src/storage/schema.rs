//! Database schema definitions
//!
//! Base tables are emptied before each load; the two correlation views are
//! dropped and rematerialized.

pub const DROP_VIEWS: &[&str] = &[
    "DROP TABLE IF EXISTS explained_correlations",
    "DROP TABLE IF EXISTS unexplained_correlations",
];

pub const CREATE_CORRELATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS correlations (
    id1 TEXT NOT NULL,
    psite1 TEXT NOT NULL,
    id2 TEXT NOT NULL,
    psite2 TEXT NOT NULL,
    corr REAL NOT NULL,
    pval REAL NOT NULL
)
"#;

/// `uris` holds the source URI list joined by single spaces
pub const CREATE_CAUSALITY_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS causality (
    id1 TEXT NOT NULL,
    psite1 TEXT NOT NULL,
    id2 TEXT NOT NULL,
    psite2 TEXT NOT NULL,
    rel TEXT NOT NULL,
    uris TEXT NOT NULL
)
"#;

pub const CREATE_MUTATION_SIGNIFICANCE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS mutation_significance (
    id TEXT NOT NULL,
    pval REAL NOT NULL
)
"#;

pub const CREATE_SIF_RELATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sif_relations (
    id1 TEXT NOT NULL,
    id2 TEXT NOT NULL,
    rel TEXT NOT NULL
)
"#;

pub const CREATE_MUTEX_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS mutex (
    id1 TEXT NOT NULL,
    id2 TEXT NOT NULL,
    id3 TEXT,
    score REAL NOT NULL
)
"#;

/// Correlations with a causal row on exactly the same endpoints
pub const CREATE_EXPLAINED_VIEW: &str = r#"
CREATE TABLE IF NOT EXISTS explained_correlations AS
SELECT c.id1, c.psite1, c.id2, c.psite2, c.corr, c.pval
FROM correlations c
WHERE EXISTS (
    SELECT 1 FROM causality k
    WHERE k.id1 = c.id1 AND k.psite1 = c.psite1 AND k.id2 = c.id2 AND k.psite2 = c.psite2
)
ORDER BY c.rowid
"#;

/// Correlations without any such causal row
pub const CREATE_UNEXPLAINED_VIEW: &str = r#"
CREATE TABLE IF NOT EXISTS unexplained_correlations AS
SELECT c.id1, c.psite1, c.id2, c.psite2, c.corr, c.pval
FROM correlations c
WHERE NOT EXISTS (
    SELECT 1 FROM causality k
    WHERE k.id1 = c.id1 AND k.psite1 = c.psite1 AND k.id2 = c.id2 AND k.psite2 = c.psite2
)
ORDER BY c.rowid
"#;

pub const CREATE_BASE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_correlations_endpoints ON correlations(id1, psite1, id2, psite2)",
    "CREATE INDEX IF NOT EXISTS idx_causality_pair ON causality(id1, id2)",
    "CREATE INDEX IF NOT EXISTS idx_causality_rel ON causality(id1, rel)",
    "CREATE INDEX IF NOT EXISTS idx_causality_endpoints ON causality(id1, psite1, id2, psite2)",
    "CREATE INDEX IF NOT EXISTS idx_mutsig_id ON mutation_significance(id)",
    "CREATE INDEX IF NOT EXISTS idx_sif_target ON sif_relations(id2, rel)",
    "CREATE INDEX IF NOT EXISTS idx_mutex_id1 ON mutex(id1)",
    "CREATE INDEX IF NOT EXISTS idx_mutex_id2 ON mutex(id2)",
    "CREATE INDEX IF NOT EXISTS idx_mutex_id3 ON mutex(id3)",
];

pub const CREATE_VIEW_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_explained_id1 ON explained_correlations(id1)",
    "CREATE INDEX IF NOT EXISTS idx_explained_id2 ON explained_correlations(id2)",
    "CREATE INDEX IF NOT EXISTS idx_unexplained_id1 ON unexplained_correlations(id1)",
    "CREATE INDEX IF NOT EXISTS idx_unexplained_id2 ON unexplained_correlations(id2)",
];

/// Statements creating the five base tables and their indexes
pub fn base_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_CORRELATIONS_TABLE,
        CREATE_CAUSALITY_TABLE,
        CREATE_MUTATION_SIGNIFICANCE_TABLE,
        CREATE_SIF_RELATIONS_TABLE,
        CREATE_MUTEX_TABLE,
    ];
    stmts.extend(CREATE_BASE_INDEXES.iter().copied());
    stmts
}

/// Statements materializing the explained/unexplained views (no-op if present)
pub fn view_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_EXPLAINED_VIEW, CREATE_UNEXPLAINED_VIEW];
    stmts.extend(CREATE_VIEW_INDEXES.iter().copied());
    stmts
}

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = base_schema_statements();
    stmts.extend(view_statements());
    stmts
}
