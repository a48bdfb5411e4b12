//! Core ingestion framework
//!
//! Defines the parser trait every dataset implements and the line reader
//! that streams a file through it.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// The five source datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dataset {
    Correlations,
    Causality,
    MutationSignificance,
    SifRelations,
    Mutex,
}

impl Dataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Correlations => "correlations",
            Dataset::Causality => "causality",
            Dataset::MutationSignificance => "mutation-significance",
            Dataset::SifRelations => "sif-relations",
            Dataset::Mutex => "mutex",
        }
    }

    /// File name used when the configuration does not override it
    pub fn default_file_name(&self) -> &'static str {
        match self {
            Dataset::Correlations => "PNNL-ovarian-correlations.txt",
            Dataset::Causality => "causative-data-centric.sif",
            Dataset::MutationSignificance => "scores-mutsig.txt",
            Dataset::SifRelations => "PC.sif",
            Dataset::Mutex => "ranked-groups.txt",
        }
    }

    pub fn all() -> &'static [Dataset] {
        &[
            Dataset::Correlations,
            Dataset::Causality,
            Dataset::MutationSignificance,
            Dataset::SifRelations,
            Dataset::Mutex,
        ]
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved locations of the five dataset files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub correlations: PathBuf,
    pub causality: PathBuf,
    pub mutation_significance: PathBuf,
    pub sif_relations: PathBuf,
    pub mutex: PathBuf,
}

impl DatasetPaths {
    /// Default file names inside `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            correlations: dir.join(Dataset::Correlations.default_file_name()),
            causality: dir.join(Dataset::Causality.default_file_name()),
            mutation_significance: dir.join(Dataset::MutationSignificance.default_file_name()),
            sif_relations: dir.join(Dataset::SifRelations.default_file_name()),
            mutex: dir.join(Dataset::Mutex.default_file_name()),
        }
    }

    pub fn path_for(&self, dataset: Dataset) -> &Path {
        match dataset {
            Dataset::Correlations => &self.correlations,
            Dataset::Causality => &self.causality,
            Dataset::MutationSignificance => &self.mutation_significance,
            Dataset::SifRelations => &self.sif_relations,
            Dataset::Mutex => &self.mutex,
        }
    }
}

/// Trait for dataset line parsers
///
/// A parser sees one tab-split line at a time and either produces a record
/// or explains why the line is malformed.
pub trait DatasetParser {
    type Record;

    fn dataset(&self) -> Dataset;

    /// Lines the format marks as unusable; skipped silently
    fn skip_line(&self, _line: &str) -> bool {
        false
    }

    /// Whether line 1 is a column header. Only consulted for the first line;
    /// a header must still have the full column count.
    fn is_header(&self, _fields: &[&str]) -> bool {
        false
    }

    fn parse_fields(&self, fields: &[&str]) -> std::result::Result<Self::Record, String>;
}

/// Stream `path` line by line through `parser`, handing each record to `sink`.
///
/// Returns the number of records produced. The first malformed line aborts
/// the read.
pub fn read_records<P, F>(parser: &P, path: &Path, mut sink: F) -> Result<usize>
where
    P: DatasetParser,
    F: FnMut(P::Record) -> Result<()>,
{
    let dataset = parser.dataset();
    let io_err = |source: std::io::Error| Error::Dataset {
        dataset,
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let reader = BufReader::new(file);
    let mut count = 0;

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(io_err)?;
        let line_no = idx + 1;

        if line.trim().is_empty() {
            continue;
        }
        if parser.skip_line(&line) {
            tracing::debug!("Skipping {} line {}: {}", dataset, line_no, line);
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if line_no == 1 && parser.is_header(&fields) {
            tracing::debug!("Treating first {} line as header", dataset);
            continue;
        }
        match parser.parse_fields(&fields) {
            Ok(record) => {
                sink(record)?;
                count += 1;
            }
            Err(message) => {
                return Err(Error::Parse {
                    dataset,
                    line: line_no,
                    message,
                });
            }
        }
    }

    Ok(count)
}

/// Require at least `n` fields
pub(crate) fn require_fields(fields: &[&str], n: usize) -> std::result::Result<(), String> {
    if fields.len() < n {
        return Err(format!("expected at least {} columns, found {}", n, fields.len()));
    }
    Ok(())
}

/// True when the line is wide enough but `column` is not a number
pub(crate) fn non_numeric_at(fields: &[&str], min_fields: usize, column: usize) -> bool {
    fields.len() >= min_fields && fields[column].trim().parse::<f64>().is_err()
}

pub(crate) fn parse_f64(field: &str, what: &str) -> std::result::Result<f64, String> {
    field
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid {} '{}'", what, field))
}
