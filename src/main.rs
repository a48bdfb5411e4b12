//! Causality CLI - Command-line interface for the relationship store

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use causality::config::{self, CausalityConfig};
use causality::query::CursorScope;
use causality::store::{RelationshipStore, StoreOptions};
use causality::ui::{self, Icons, Spinner};
use causality::{CausalEdge, CorrelatedEntity, SiteModification};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "causality")]
#[command(version)]
#[command(about = "Relationship store for causal, correlation and mutation queries over biological datasets")]
#[command(long_about = r#"
Causality loads five tab-delimited datasets into a SQLite cache and answers:
  • Causal edges between genes/phosphosites
  • Ranked correlations, explained or unexplained by a causal edge
  • Mutation significance per gene
  • Common upstream regulators
  • Mutually exclusive mutation groups

Example usage:
  causality --data-dir ./resources ingest
  causality causality --source MAPK1 --target JUND
  causality next-correlation --gene AKT1 -n 3
  causality --cursor-scope shared next-correlation -g AKT1 -g MAPK1 -n 2
  causality upstreams AKT1 BRAF MAPK1
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to ./causality.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the datasets and the database
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Path to the database file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Cursor scope when one invocation pages through several genes (per-gene, shared)
    #[arg(long, global = true)]
    cursor_scope: Option<CursorScope>,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file with every default spelled out
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Drop and rebuild every table from the datasets
    Ingest,

    /// Show row counts per table
    Stats,

    /// Find the causal edge from source to target
    Causality {
        #[arg(short, long)]
        source: String,

        #[arg(short, long)]
        target: String,
    },

    /// Find outgoing causal edges of a gene
    Targets {
        #[arg(short, long)]
        id: String,

        /// Relation label, or MODULATES for every relation
        #[arg(short, long, default_value = "MODULATES")]
        rel: String,
    },

    /// Find incoming causal edges of a gene
    Sources {
        #[arg(short, long)]
        target: String,

        /// Relation label, or MODULATES for every relation
        #[arg(short, long, default_value = "MODULATES")]
        rel: String,
    },

    /// Disclose the next correlations of one or more genes, explained ones first
    NextCorrelation {
        /// Repeat to page through several genes in turn
        #[arg(short, long = "gene", required = true)]
        genes: Vec<String>,

        /// Number of rounds to fetch
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },

    /// Disclose the next unexplained correlations of one or more genes
    Unexplained {
        #[arg(short, long = "gene", required = true)]
        genes: Vec<String>,

        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },

    /// Look up the correlation between two endpoints
    Correlation {
        #[arg(long)]
        gene1: String,

        #[arg(long, default_value = "")]
        site1: String,

        #[arg(long)]
        gene2: String,

        #[arg(long, default_value = "")]
        site2: String,
    },

    /// Classify the mutation significance of a gene
    Mutsig {
        #[arg(short, long)]
        gene: String,
    },

    /// Find regulators controlling every listed gene
    Upstreams {
        #[arg(required = true, num_args = 1..)]
        genes: Vec<String>,
    },

    /// Find mutually exclusive groups containing a gene
    Mutex {
        #[arg(short, long)]
        gene: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    causality::output::set_quiet(cli.json);

    let mut config = config::load_config(cli.config.as_deref())?.unwrap_or_default();
    if let Some(ref dir) = cli.data_dir {
        config.data_dir = Some(dir.to_string_lossy().to_string());
    }
    if let Some(ref db) = cli.database {
        config.database = Some(db.to_string_lossy().to_string());
    }
    if let Some(scope) = cli.cursor_scope {
        config.cursor_scope = Some(scope);
    }
    let options = config.store_options();

    match cli.command {
        Commands::Init { force } => {
            let path = cli.config.clone().unwrap_or_else(config::default_config_path);
            let data_dir = config.data_dir.clone().unwrap_or_else(|| ".".to_string());
            config::write_config(&path, &CausalityConfig::with_defaults(&data_dir), force)?;
            ui::success(&format!("Wrote {}", path.display()));
        }

        Commands::Ingest => {
            ui::header("Rebuilding relationship store");
            ui::info("Database", &options.database.display().to_string());
            let spinner = Spinner::new("Loading datasets...");
            let (store, summary) = RelationshipStore::rebuild(&options)?;
            let elapsed = spinner.finish();

            if cli.json {
                emit_json(&summary)?;
            } else {
                for dataset in causality::Dataset::all() {
                    ui::summary_row(
                        &format!("{} {}", Icons::FILE, dataset),
                        &format!(
                            "{} {}",
                            summary.count(*dataset),
                            ui::dim(&options.datasets.path_for(*dataset).display().to_string())
                        ),
                    );
                }
                print_stats(&store)?;
                ui::timing(&elapsed);
                ui::success("Ingestion complete");
            }
        }

        Commands::Stats => {
            let store = open_store(&options)?;
            if cli.json {
                emit_json(&store.stats()?)?;
            } else {
                ui::header(&format!("{} {}", Icons::DATABASE, options.database.display()));
                print_stats(&store)?;
            }
        }

        Commands::Causality { source, target } => {
            let store = open_store(&options)?;
            let edge = store.find_causality(&source, &target)?;
            if cli.json {
                emit_json(&edge)?;
            } else {
                match edge {
                    Some(edge) => println!("{}", format_edge(&edge)),
                    None => ui::not_found(&format!("No causal edge from {} to {}", source, target)),
                }
            }
        }

        Commands::Targets { id, rel } => {
            let store = open_store(&options)?;
            let edges = store.find_causality_targets(&id, &rel)?;
            print_edges(&edges, cli.json, &format!("No {} targets of {}", rel, id))?;
        }

        Commands::Sources { target, rel } => {
            let store = open_store(&options)?;
            let edges = store.find_causality_sources(&target, &rel)?;
            print_edges(&edges, cli.json, &format!("No {} sources of {}", rel, target))?;
        }

        Commands::NextCorrelation { genes, count } => {
            let mut store = open_store(&options)?;
            let results = page_correlations(&mut store, &genes, count, RelationshipStore::find_next_correlation)?;
            print_correlations(&results, cli.json, &format!("No more correlations for {}", genes.join(", ")))?;
        }

        Commands::Unexplained { genes, count } => {
            let mut store = open_store(&options)?;
            let results = page_correlations(
                &mut store,
                &genes,
                count,
                RelationshipStore::find_next_unexplained_correlation,
            )?;
            print_correlations(
                &results,
                cli.json,
                &format!("No more unexplained correlations for {}", genes.join(", ")),
            )?;
        }

        Commands::Correlation { gene1, site1, gene2, site2 } => {
            let store = open_store(&options)?;
            let found = store.get_correlation_between(&gene1, &site1, &gene2, &site2)?;
            let results: Vec<CorrelatedEntity> = found.into_iter().collect();
            print_correlations(&results, cli.json, &format!("No correlation between {} and {}", gene1, gene2))?;
        }

        Commands::Mutsig { gene } => {
            let store = open_store(&options)?;
            let significance = store.find_mutation_significance(&gene)?;
            if cli.json {
                emit_json(&significance.map(|s| s.as_str()))?;
            } else {
                match significance {
                    Some(s) => println!("{} {}: {}", Icons::CHART, ui::gene(&gene.to_uppercase()), s),
                    None => ui::not_found(&format!("No mutation significance score for {}", gene)),
                }
            }
        }

        Commands::Upstreams { genes } => {
            let store = open_store(&options)?;
            let upstreams = store.find_common_upstreams(&genes)?;
            if cli.json {
                emit_json(&upstreams)?;
            } else if upstreams.is_empty() {
                ui::not_found(&format!("No common upstream of {}", genes.join(", ")));
            } else {
                for upstream in upstreams {
                    println!("{} {}", Icons::UP, ui::gene(&upstream));
                }
            }
        }

        Commands::Mutex { gene } => {
            let store = open_store(&options)?;
            let groups = store.find_mutex(&gene)?;
            if cli.json {
                emit_json(&groups)?;
            } else if groups.is_empty() {
                ui::not_found(&format!("No mutually exclusive group contains {}", gene));
            } else {
                for group in groups {
                    let members: Vec<String> = group.group.iter().map(|g| ui::gene(g)).collect();
                    println!("- ({}) {}", members.join(" "), ui::dim(&format!("score {}", group.score)));
                }
            }
        }
    }

    Ok(())
}

/// Open the store, showing a spinner when the first open has to ingest
fn open_store(options: &StoreOptions) -> anyhow::Result<RelationshipStore> {
    if options.database.exists() {
        return Ok(RelationshipStore::open(options)?);
    }

    let spinner = Spinner::new("First run: loading datasets...");
    let store = RelationshipStore::open(options);
    let elapsed = spinner.finish();
    match store {
        Ok(store) => {
            tracing::info!("Initial ingestion finished in {}", elapsed);
            Ok(store)
        }
        Err(e) => {
            ui::error("Initial ingestion failed, nothing was cached");
            Err(e.into())
        }
    }
}

/// Fetch `rounds` results per gene, visiting the genes in turn each round.
/// A gene drops out once it is exhausted.
fn page_correlations<F>(
    store: &mut RelationshipStore,
    genes: &[String],
    rounds: usize,
    mut next: F,
) -> anyhow::Result<Vec<CorrelatedEntity>>
where
    F: FnMut(&mut RelationshipStore, &str) -> causality::Result<Option<CorrelatedEntity>>,
{
    let mut results = Vec::new();
    let mut active: Vec<&String> = genes.iter().collect();
    for _ in 0..rounds {
        let mut still_active = Vec::with_capacity(active.len());
        for gene in active {
            if let Some(entity) = next(&mut *store, gene.as_str())? {
                results.push(entity);
                still_active.push(gene);
            }
        }
        active = still_active;
        if active.is_empty() {
            break;
        }
    }
    for gene in genes {
        tracing::debug!("Cursor for {}: {:?}", gene, store.cursor_position(gene));
    }
    Ok(results)
}

fn emit_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_stats(store: &RelationshipStore) -> anyhow::Result<()> {
    let stats = store.stats()?;
    let rows = [
        ("correlations", stats.correlations.to_string()),
        ("explained", stats.explained.to_string()),
        ("unexplained", stats.unexplained.to_string()),
        ("causal rows", stats.causal_rows.to_string()),
        ("mutation scores", stats.mutation_scores.to_string()),
        ("interaction edges", stats.sif_relations.to_string()),
        ("mutex groups", stats.mutex_groups.to_string()),
    ];
    println!("{}", ui::stats_table(&rows));
    Ok(())
}

fn format_sites(mods: &[SiteModification]) -> String {
    if mods.is_empty() {
        return String::new();
    }
    let sites: Vec<String> = mods
        .iter()
        .map(|m| format!("{}{}", m.residue, m.position))
        .collect();
    format!(" ({})", sites.join(","))
}

fn format_edge(edge: &CausalEdge) -> String {
    format!(
        "{}{} -[{}]-> {}{}",
        ui::gene(&edge.id1),
        format_sites(&edge.mods1),
        edge.rel,
        ui::gene(&edge.id2),
        format_sites(&edge.mods2)
    )
}

fn print_edges(edges: &[CausalEdge], json: bool, empty: &str) -> anyhow::Result<()> {
    if json {
        return emit_json(&edges);
    }
    if edges.is_empty() {
        ui::not_found(empty);
        return Ok(());
    }
    for edge in edges {
        println!("- {}", format_edge(edge));
    }
    ui::summary_row("edges", &edges.len().to_string());
    Ok(())
}

fn print_correlations(results: &[CorrelatedEntity], json: bool, empty: &str) -> anyhow::Result<()> {
    if json {
        return emit_json(&results);
    }
    if results.is_empty() {
        ui::not_found(empty);
        return Ok(());
    }
    for c in results {
        println!(
            "{} {} {} {}  r={}  p={}  {}",
            Icons::LINK,
            format_endpoint(&c.id1, &c.p_site1),
            Icons::RIGHT,
            format_endpoint(&c.id2, &c.p_site2),
            c.correlation,
            c.p_val,
            ui::muted(&format!("[{}]", c.explainable))
        );
    }
    Ok(())
}

fn format_endpoint(gene: &str, site: &str) -> String {
    if site.is_empty() {
        ui::gene(gene)
    } else {
        format!("{} {}", ui::gene(gene), ui::dim(site))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use causality::record::{CausalRecord, CorrelationRecord};
    use causality::{CausalRelation, GeneSite, SqliteStore};

    fn store(scope: CursorScope) -> RelationshipStore {
        let mut sqlite = SqliteStore::open_in_memory().unwrap();
        for (a, b, corr) in [("AKT1-S1S", "BRAF-S2S", 0.9), ("AKT1-S1S", "PTPN1-S3S", 0.5), ("MAPK1-S5S", "JUND-S6S", 0.4)] {
            sqlite
                .insert_correlation(&CorrelationRecord {
                    first: GeneSite::parse(a),
                    second: GeneSite::parse(b),
                    correlation: corr,
                    p_value: 0.01,
                })
                .unwrap();
            sqlite
                .insert_causal(&CausalRecord {
                    source: GeneSite::parse(a),
                    target: GeneSite::parse(b),
                    relation: CausalRelation::Phosphorylates,
                    source_uris: Vec::new(),
                })
                .unwrap();
        }
        sqlite.build_explained_views().unwrap();
        RelationshipStore::from_sqlite(sqlite, scope)
    }

    fn partners(results: &[CorrelatedEntity]) -> Vec<&str> {
        results.iter().map(|c| c.id2.as_str()).collect()
    }

    #[test]
    fn test_paging_alternates_genes() {
        let mut store = store(CursorScope::PerGene);
        let genes = vec!["AKT1".to_string(), "MAPK1".to_string()];
        let results = page_correlations(&mut store, &genes, 3, RelationshipStore::find_next_correlation).unwrap();
        assert_eq!(partners(&results), vec!["BRAF", "JUND", "PTPN1"]);
    }

    #[test]
    fn test_paging_with_shared_cursor() {
        let mut store = store(CursorScope::Shared);
        let genes = vec!["AKT1".to_string(), "MAPK1".to_string()];
        let results = page_correlations(&mut store, &genes, 2, RelationshipStore::find_next_correlation).unwrap();
        // MAPK1 starts at the shared position 1 and has nothing there
        assert_eq!(partners(&results), vec!["BRAF", "PTPN1"]);
    }
}
