use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::ingest::{Dataset, DatasetPaths};
use crate::query::CursorScope;
use crate::store::StoreOptions;

pub const DEFAULT_DATABASE_FILE: &str = "pnnl-dataset.db";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CausalityConfig {
    pub data_dir: Option<String>,
    /// Relative paths resolve against `data_dir`
    pub database: Option<String>,
    pub cursor_scope: Option<CursorScope>,
    #[serde(default)]
    pub datasets: DatasetFiles,
}

/// Per-dataset file name overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatasetFiles {
    pub correlations: Option<String>,
    pub causality: Option<String>,
    pub mutation_significance: Option<String>,
    pub sif_relations: Option<String>,
    pub mutex: Option<String>,
}

impl DatasetFiles {
    fn get(&self, dataset: Dataset) -> Option<&str> {
        match dataset {
            Dataset::Correlations => self.correlations.as_deref(),
            Dataset::Causality => self.causality.as_deref(),
            Dataset::MutationSignificance => self.mutation_significance.as_deref(),
            Dataset::SifRelations => self.sif_relations.as_deref(),
            Dataset::Mutex => self.mutex.as_deref(),
        }
    }
}

impl CausalityConfig {
    /// Config with every default spelled out, as written by `causality init`
    pub fn with_defaults(data_dir: &str) -> Self {
        Self {
            data_dir: Some(data_dir.to_string()),
            database: Some(DEFAULT_DATABASE_FILE.to_string()),
            cursor_scope: Some(CursorScope::default()),
            datasets: DatasetFiles {
                correlations: Some(Dataset::Correlations.default_file_name().to_string()),
                causality: Some(Dataset::Causality.default_file_name().to_string()),
                mutation_significance: Some(Dataset::MutationSignificance.default_file_name().to_string()),
                sif_relations: Some(Dataset::SifRelations.default_file_name().to_string()),
                mutex: Some(Dataset::Mutex.default_file_name().to_string()),
            },
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Resolve file names into concrete paths
    pub fn store_options(&self) -> StoreOptions {
        let base = self.data_dir();
        let resolve = |name: &str| {
            let p = Path::new(name);
            if p.is_absolute() { p.to_path_buf() } else { base.join(p) }
        };
        let dataset_path = |dataset: Dataset| {
            resolve(self.datasets.get(dataset).unwrap_or(dataset.default_file_name()))
        };

        StoreOptions {
            database: resolve(self.database.as_deref().unwrap_or(DEFAULT_DATABASE_FILE)),
            datasets: DatasetPaths {
                correlations: dataset_path(Dataset::Correlations),
                causality: dataset_path(Dataset::Causality),
                mutation_significance: dataset_path(Dataset::MutationSignificance),
                sif_relations: dataset_path(Dataset::SifRelations),
                mutex: dataset_path(Dataset::Mutex),
            },
            cursor_scope: self.cursor_scope.unwrap_or_default(),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("causality.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<CausalityConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: CausalityConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &CausalityConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}
