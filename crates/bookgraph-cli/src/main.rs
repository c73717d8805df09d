//! Bookgraph CLI - build concept prerequisite graphs from books

use std::process::ExitCode;

use bookgraph_core::commands::{self, graph::GraphQuery};
use bookgraph_core::config::Config;
use bookgraph_core::extraction::ExtractionOptions;
use bookgraph_core::llm::CompletionClient;
use bookgraph_core::prereqs::ClassifierOptions;
use bookgraph_core::storage::ArtifactStore;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

#[derive(Parser)]
#[command(name = "bookgraph")]
#[command(author, version, about = "Concept prerequisite graphs from books", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract concepts from a book's sections
    Concepts {
        /// Book title
        book: String,
    },

    /// Classify prerequisites for every concept of a book
    Prereqs {
        /// Book title
        book: String,
    },

    /// Derive the edge list from classified prerequisites
    Edges {
        /// Book title
        book: String,
    },

    /// Build the knowledge graph and report on it
    Graph {
        /// Book title
        book: String,
        /// How many concepts to list per degree ranking
        #[arg(long, default_value_t = 5)]
        top_k: usize,
        /// List the prerequisites of this concept
        #[arg(short, long)]
        concept: Option<String>,
        /// Follow prerequisites transitively
        #[arg(short, long, requires = "concept")]
        transitive: bool,
        /// List the concepts that directly require this one
        #[arg(short, long)]
        dependents: Option<String>,
    },

    /// Check that the completion server is reachable
    Ping,

    /// List models available on the completion server
    Models,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_directive = if cli.quiet { "bookgraph=warn" } else { "bookgraph=info" };
    let filter = match default_directive.parse::<tracing_subscriber::filter::Directive>() {
        Ok(directive) => tracing_subscriber::EnvFilter::from_default_env().add_directive(directive),
        Err(_) => tracing_subscriber::EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let out = Output {
        format: cli.format,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Concepts { book } => cmd_concepts(&book, out).await,
        Commands::Prereqs { book } => cmd_prereqs(&book, out).await,
        Commands::Edges { book } => cmd_edges(&book, out),
        Commands::Graph {
            book,
            top_k,
            concept,
            transitive,
            dependents,
        } => {
            let query = GraphQuery {
                top_k,
                concept,
                transitive,
                dependents,
            };
            cmd_graph(&book, &query, out)
        }
        Commands::Ping => cmd_ping(out).await,
        Commands::Models => cmd_models(out).await,
        Commands::Config { action } => cmd_config(action, out.quiet),
    }
}

/// Print the core error code and suggestion when there is one
fn report_error(e: &anyhow::Error) {
    match e.downcast_ref::<bookgraph_core::Error>() {
        Some(core) => {
            eprintln!("Error [{}]: {}", core.code(), core);
            if let Some(suggestion) = core.suggestion() {
                eprintln!("  Try: {}", suggestion);
            }
        }
        None => eprintln!("Error: {:#}", e),
    }
}

#[derive(Clone, Copy)]
struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    /// Print `value` as JSON, or run `text` unless quiet
    fn emit<T: Serialize>(self, value: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text if !self.quiet => text(value),
            OutputFormat::Text => {}
        }
        Ok(())
    }
}

fn store_for(config: &Config) -> ArtifactStore {
    ArtifactStore::new(&config.storage.results_dir)
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_concepts(book: &str, out: Output) -> anyhow::Result<()> {
    let config = Config::load()?;
    let client = CompletionClient::from_config(&config.llm)?;
    debug!(model = %client.model(), host = %client.host(), "Using completion server");

    let summary = commands::concepts::run(
        &store_for(&config),
        book,
        &client,
        &config.generation,
        ExtractionOptions::from(&config.pipeline),
    )
    .await?;

    out.emit(&summary, |s| {
        println!("Concepts extracted for '{}'", s.book);
        println!("  Sections parsed: {}", s.sections_parsed);
        println!("  Unique concepts: {}", s.unique_concepts);
        println!("  Errors: {}", s.errors);
        println!("  Saved to: {}", s.saved_to.display());
        println!("\nNext: bookgraph prereqs \"{}\"", s.book);
    })
}

async fn cmd_prereqs(book: &str, out: Output) -> anyhow::Result<()> {
    let config = Config::load()?;
    let client = CompletionClient::from_config(&config.llm)?;
    debug!(model = %client.model(), host = %client.host(), "Using completion server");

    let summary = commands::prereqs::run(
        &store_for(&config),
        book,
        &client,
        &config.generation,
        ClassifierOptions::from(&config.pipeline),
    )
    .await?;

    out.emit(&summary, |s| {
        println!("Prerequisites classified for '{}'", s.book);
        println!("  Concepts processed: {}", s.concepts);
        println!("  Edges: {}", s.edges);
        println!("  Noisy: {}", s.noisy);
        if s.with_context {
            println!("  Corrected on recheck: {}", s.rechecked);
        } else {
            println!("  Recheck skipped: no section text available");
        }
        println!("  Errors: {}", s.errors);
        println!("  Saved to: {}", s.saved_to.display());
        println!("\nNext: bookgraph edges \"{}\"", s.book);
    })
}

fn cmd_edges(book: &str, out: Output) -> anyhow::Result<()> {
    let config = Config::load()?;
    let summary = commands::edges::run(&store_for(&config), book)?;

    out.emit(&summary, |s| {
        println!("Edges for '{}': {} nodes, {} edges", s.book, s.nodes, s.edges);
        println!("  Saved to: {}", s.saved_to.display());
    })
}

fn cmd_graph(book: &str, query: &GraphQuery, out: Output) -> anyhow::Result<()> {
    let config = Config::load()?;
    let report = commands::graph::run(&store_for(&config), book, query)?;

    out.emit(&report, |r| {
        let stats = &r.stats;
        println!("Knowledge graph for '{}'", r.book);
        println!("  Nodes: {}", stats.nodes);
        println!("  Edges: {} ({} skipped)", stats.edges, r.skipped);
        println!("  Foundations: {}", stats.foundations_count);
        println!("  Targets: {}", stats.targets_count);
        println!("  Longest prerequisite chain: {}", stats.longest_prereq_chain);

        if !stats.top_by_out_degree.is_empty() {
            println!("\nMost prerequisites:");
            for entry in &stats.top_by_out_degree {
                println!("  {:>4}  {}", entry.degree, entry.concept);
            }
        }
        if !stats.top_by_in_degree.is_empty() {
            println!("\nMost depended on:");
            for entry in &stats.top_by_in_degree {
                println!("  {:>4}  {}", entry.degree, entry.concept);
            }
        }

        if let Some(prereqs) = &r.prerequisites {
            println!("\nPrerequisites of '{}':", prereqs.concept);
            print_names(&prereqs.names);
        }
        if let Some(dependents) = &r.dependents {
            println!("\nDependents of '{}':", dependents.concept);
            print_names(&dependents.names);
        }
        println!("\nSaved to: {}", r.saved_to.display());
    })
}

fn print_names(names: &[String]) {
    if names.is_empty() {
        println!("  (none)");
    }
    for name in names {
        println!("  - {}", name);
    }
}

#[derive(Serialize)]
struct PingReport {
    host: String,
    reachable: bool,
}

async fn cmd_ping(out: Output) -> anyhow::Result<()> {
    let config = Config::load()?;
    let client = CompletionClient::from_config(&config.llm)?;
    let report = PingReport {
        host: client.host().to_string(),
        reachable: client.ping().await,
    };

    out.emit(&report, |r| {
        if r.reachable {
            println!("[OK] Completion server: {}", r.host);
        } else {
            println!("[!!] Completion server unreachable: {}", r.host);
        }
    })?;

    if !report.reachable {
        return Err(anyhow::anyhow!("completion server at {} is unreachable", report.host));
    }
    Ok(())
}

async fn cmd_models(out: Output) -> anyhow::Result<()> {
    let config = Config::load()?;
    let client = CompletionClient::from_config(&config.llm)?;
    let models = client.models().await;

    out.emit(&models, |models| {
        if models.is_empty() {
            println!("No models found on {}.", client.host());
            println!("\nCheck the server with: bookgraph ping");
            return;
        }
        for model in models {
            let marker = if model == client.model() { "*" } else { " " };
            println!("{} {}", marker, model);
        }
    })
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_from(&Config::config_path()?)?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
