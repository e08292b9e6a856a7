//! vbabind CLI - resolve VBA member-access expressions against a declaration graph

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vbabind::config::{self, BinderConfig};
use vbabind::storage::SqliteStore;
use vbabind::ui::{self, Icons};
use vbabind::{
    resolve_chain, BindingContext, ChainResolution, DeclarationGraph, DeclarationId, EnclosingScope,
    GraphFinder, GraphSnapshot, QualifiedName, ResolutionResult, ResolutionStats,
};

#[derive(Parser)]
#[command(name = "vbabind")]
#[command(version = "0.0.1")]
#[command(about = "VBA member-access name resolution over a declaration graph")]
#[command(long_about = r#"
vbabind binds dotted VBA expressions to the declarations they name:
  • Project, module, UDT and enumeration resolution
  • Project references and accessibility rules
  • Class module supertype/subtype hierarchy

Example usage:
  vbabind load --graph project.json
  vbabind resolve "VBAProject.Module1.Point" --module VBAProject.Module1
  vbabind hierarchy VBAProject.Circle
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default vbabind.toml
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Import a graph snapshot into the database
    Load {
        /// Snapshot file (JSON or TOML)
        #[arg(short, long)]
        graph: Option<PathBuf>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Resolve member-access expressions
    Resolve {
        /// Expressions such as `VBAProject.Module1.Point`
        #[arg(required = true)]
        expressions: Vec<String>,

        /// Enclosing module, as `Project.Module`
        #[arg(short, long)]
        module: Option<String>,

        /// Snapshot file to bind against
        #[arg(short, long)]
        graph: Option<PathBuf>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show supertypes and subtypes of a class module
    Hierarchy {
        /// Class module, as `Project.Class`
        class: String,

        #[arg(short, long)]
        graph: Option<PathBuf>,

        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Show declaration counts
    Stats {
        #[arg(short, long)]
        graph: Option<PathBuf>,

        #[arg(short, long)]
        database: Option<PathBuf>,
    },
}

/// Where a command reads its graph from, after applying config defaults.
enum GraphSource {
    Snapshot(PathBuf),
    Database(PathBuf),
}

impl GraphSource {
    fn select(graph: Option<PathBuf>, database: Option<PathBuf>, config: &BinderConfig) -> Self {
        if let Some(path) = graph {
            return Self::Snapshot(path);
        }
        if let Some(path) = database {
            return Self::Database(path);
        }
        if let Some(path) = &config.graph {
            return Self::Snapshot(PathBuf::from(path));
        }
        Self::Database(database_path(None, config))
    }

    fn load(&self) -> anyhow::Result<DeclarationGraph> {
        match self {
            Self::Snapshot(path) => {
                let snapshot = GraphSnapshot::from_path(path)
                    .with_context(|| format!("failed to read snapshot {}", path.display()))?;
                Ok(DeclarationGraph::from_snapshot(&snapshot)?)
            }
            Self::Database(path) => {
                if !path.exists() {
                    anyhow::bail!("no database at {} (run `vbabind load` first)", path.display());
                }
                let store = SqliteStore::open(path)?;
                store
                    .load_graph()?
                    .with_context(|| format!("database {} holds no graph", path.display()))
            }
        }
    }
}

fn database_path(flag: Option<PathBuf>, config: &BinderConfig) -> PathBuf {
    flag.or_else(|| config.database.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| config::default_database_path_in(Path::new(".")))
}

#[derive(Serialize)]
struct SegmentReport {
    name: String,
    classification: String,
    step: String,
    declaration: String,
}

#[derive(Serialize)]
struct ResolveReport {
    expression: String,
    resolved: bool,
    segments: Vec<SegmentReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unresolved: Option<String>,
}

impl ResolveReport {
    fn new(graph: &DeclarationGraph, resolution: &ChainResolution) -> Self {
        let segments = resolution
            .steps
            .iter()
            .map(|step| SegmentReport {
                name: step.name.clone(),
                classification: step.classification.to_string(),
                step: step.step.to_string(),
                declaration: qualified(graph, step.declaration),
            })
            .collect();
        let unresolved = match &resolution.outcome {
            ResolutionResult::Unresolved { name } => Some(name.clone()),
            ResolutionResult::Resolved { .. } => None,
        };
        Self {
            expression: resolution.text.clone(),
            resolved: resolution.is_resolved(),
            segments,
            unresolved,
        }
    }
}

fn qualified(graph: &DeclarationGraph, id: DeclarationId) -> String {
    graph
        .get(id)
        .map(|d| d.qualified_name.to_string())
        .unwrap_or_else(|| id.to_string())
}

fn enclosing_scope(graph: &DeclarationGraph, module: &str) -> anyhow::Result<EnclosingScope> {
    let name = QualifiedName::parse(module)?;
    let declaration = graph
        .find_by_qualified_name(&name)
        .filter(|d| d.kind.is_module())
        .with_context(|| format!("no module named {}", module))?;
    Ok(EnclosingScope::enclosing(graph, declaration.id)?)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref())?.unwrap_or_default();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(config.log_level.as_deref().unwrap_or("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            let defaults = BinderConfig {
                database: Some(".vbabind/vbabind.db".to_string()),
                module: Some("VBAProject.Module1".to_string()),
                log_level: Some("info".to_string()),
                ..Default::default()
            };
            config::write_config(&path, &defaults, force)?;
            ui::success(&format!("Wrote {}", path.display()));
        }

        Commands::Load { graph, database } => {
            let snapshot_path = graph
                .or_else(|| config.graph.as_ref().map(PathBuf::from))
                .context("no snapshot given (use --graph or set `graph` in vbabind.toml)")?;
            let db_path = database_path(database, &config);

            ui::header("Loading declaration graph");
            ui::status(Icons::FILE, "Snapshot", &snapshot_path.display().to_string());
            ui::status(Icons::DATABASE, "Database", &db_path.display().to_string());

            let snapshot = GraphSnapshot::from_path(&snapshot_path)
                .with_context(|| format!("failed to read snapshot {}", snapshot_path.display()))?;
            let graph = DeclarationGraph::from_snapshot(&snapshot)?;

            config::ensure_db_dir(&db_path)?;
            let mut store = SqliteStore::open(&db_path)?;
            let status = store.save_graph(&graph)?;
            ui::snapshot_status(status, &snapshot_path.display().to_string());

            ui::section("Graph");
            println!("{}", ui::graph_stats_table(&graph.stats()));
        }

        Commands::Resolve { expressions, module, graph, database, format } => {
            let source = GraphSource::select(graph, database, &config);
            let graph = source.load()?;
            let module = module
                .or_else(|| config.module.clone())
                .context("no enclosing module given (use --module or set `module` in vbabind.toml)")?;
            let scope = enclosing_scope(&graph, &module)?;

            let finder = GraphFinder::new(&graph);
            let context = BindingContext::new(&finder, scope);

            let mut stats = ResolutionStats::default();
            let mut reports = Vec::with_capacity(expressions.len());
            for text in &expressions {
                let resolution = resolve_chain(context, text)?;
                stats.record(&resolution.outcome);

                if format == OutputFormat::Text {
                    ui::section(text);
                    let table = ui::chain_table(&resolution.steps, |step| qualified(&graph, step.declaration));
                    if !table.is_empty() {
                        println!("{}", table);
                    }
                    if let ResolutionResult::Unresolved { name } = &resolution.outcome {
                        ui::unresolved(name);
                    }
                }
                reports.push(ResolveReport::new(&graph, &resolution));
            }

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
                OutputFormat::Text => {
                    println!();
                    println!("{}", stats);
                }
            }
        }

        Commands::Hierarchy { class, graph, database } => {
            let graph = GraphSource::select(graph, database, &config).load()?;
            let name = QualifiedName::parse(&class)?;
            let declaration = graph
                .find_by_qualified_name(&name)
                .with_context(|| format!("no declaration named {}", class))?;
            let class_module = graph
                .class_module(declaration.id)
                .with_context(|| format!("{} is not a class module", class))?;

            ui::header(&ui::declaration(declaration));

            let sections = [
                (Icons::UP, "Supertypes", class_module.supertypes().to_vec()),
                (Icons::UP, "All supertypes", graph.all_supertypes(declaration.id)),
                (Icons::DOWN, "Subtypes", class_module.subtypes().to_vec()),
                (Icons::DOWN, "All subtypes", graph.all_subtypes(declaration.id)),
            ];
            for (icon, title, ids) in sections {
                ui::section(title);
                if ids.is_empty() {
                    println!("  {}", ui::muted("(none)"));
                }
                for id in ids {
                    match graph.get(id) {
                        Some(related) => println!("  {} {}", icon, ui::declaration(related)),
                        None => ui::warn(&format!("dangling handle {}", id)),
                    }
                }
            }
        }

        Commands::Stats { graph, database } => {
            let source = GraphSource::select(graph, database, &config);
            let loaded = source.load()?;

            println!("{} vbabind Statistics", Icons::STATS);
            println!("------------------------------------");
            println!("{}", ui::graph_stats_table(&loaded.stats()));

            if let GraphSource::Database(path) = &source {
                let store = SqliteStore::open(path)?;
                println!("{}", store.stats()?);
            }
        }
    }

    Ok(())
}
