use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use refscope_extractor::{ReferenceExtractor, SourceScanner, SourceUnit, UnitSource};
use refscope_graph::{GraphBuilder, NodeProperty, ReferenceGraph};
use refscope_layout::{
    run_batched, synthetic_nodes, LayoutMode, LayoutPlan, LayoutSession, LayoutState, Rect,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};

mod config;

use config::{load_sizes, FileConfig};

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    print_stdout(&text)
}

#[derive(Parser)]
#[command(name = "refscope")]
#[command(about = "Reference graphs and layouts for source projects", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// TOML settings file ([extractor] and [layout] sections)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the reference graph of a directory and print it as an adjacency list
    Graph(GraphArgs),

    /// Build the reference graph and print its layout
    Layout(LayoutArgs),

    /// Lay out synthetic nodes in batches and print timing metrics
    Batch(BatchArgs),
}

#[derive(Args)]
struct SourceArgs {
    /// Project directory to scan
    path: PathBuf,

    /// Source file extension (repeatable, overrides the config)
    #[arg(short, long = "extension")]
    extensions: Vec<String>,

    /// Extraction workers (env: REFSCOPE_EXTRACT_CONCURRENCY)
    #[arg(long)]
    jobs: Option<usize>,
}

#[derive(Args)]
struct GraphArgs {
    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Args)]
struct LayoutArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Layout mode: grid, grouped, force or uniform
    #[arg(long, default_value = "grouped")]
    mode: LayoutMode,

    /// JSON file mapping node ids to {"width", "height"}
    #[arg(long)]
    sizes: Option<PathBuf>,

    /// Lay out only nodes with at least one edge
    #[arg(long)]
    connected_only: bool,

    /// Seed for the force simulation
    #[arg(long)]
    seed: Option<u64>,

    /// Padding between nodes inside a group
    #[arg(long)]
    padding: Option<f32>,
}

#[derive(Args)]
struct BatchArgs {
    /// Number of nodes to create (defaults to the configured maximum)
    #[arg(long)]
    nodes: Option<usize>,

    /// Nodes per batch
    #[arg(long)]
    batch_size: Option<usize>,
}

pub async fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let mut config = FileConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Graph(args) => run_graph(args, config, cli.pretty).await?,
        Commands::Layout(args) => {
            if let Some(seed) = args.seed {
                config.layout.force.seed = Some(seed);
            }
            if let Some(padding) = args.padding {
                config.layout.grid.padding = padding;
            }
            run_layout(args, config, cli.pretty).await?
        }
        Commands::Batch(args) => {
            if let Some(nodes) = args.nodes {
                config.layout.batch.max_nodes = nodes;
            }
            if let Some(batch_size) = args.batch_size {
                config.layout.batch.batch_size = batch_size;
            }
            run_batch(config, cli.pretty)?
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct GraphOutput {
    root: String,
    node_count: usize,
    edge_count: usize,
    #[serde(flatten)]
    graph: refscope_graph::AdjacencyList,
}

#[derive(Serialize)]
struct LayoutOutput {
    mode: LayoutMode,
    hidden: Vec<String>,
    state: LayoutState,
}

async fn run_graph(args: GraphArgs, config: FileConfig, pretty: bool) -> Result<()> {
    let graph = build_graph(&args.source, config).await?;
    let output = GraphOutput {
        root: args.source.path.display().to_string(),
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        graph: graph.to_adjacency_list(),
    };
    print_json(&output, pretty)
}

async fn run_layout(args: LayoutArgs, config: FileConfig, pretty: bool) -> Result<()> {
    let sizes = match &args.sizes {
        Some(path) => load_sizes(path)?,
        None => HashMap::new(),
    };
    let default_size = config.layout.uniform.default_size;
    let layout_config = config.layout.clone();

    let graph = build_graph(&args.source, config).await?;
    let plan = if args.connected_only {
        LayoutPlan::connected_only(&graph)
    } else {
        LayoutPlan::from_graph(&graph)
    };
    let node_ids = plan.nodes.clone();

    let session = LayoutSession::new(
        plan,
        args.mode,
        layout_config,
        BTreeMap::<String, Rect>::new(),
    )?;
    for id in &node_ids {
        let size = sizes.get(id).copied().unwrap_or(default_size);
        session.report_size(id, size);
    }

    let Some(state) = session.state() else {
        bail!(
            "layout did not run: every node needs a positive width and height ({} nodes)",
            node_ids.len()
        );
    };

    let output = LayoutOutput {
        mode: session.mode(),
        hidden: session.hidden().to_vec(),
        state,
    };
    print_json(&output, pretty)
}

fn run_batch(config: FileConfig, pretty: bool) -> Result<()> {
    let nodes = synthetic_nodes(config.layout.batch.max_nodes);
    let run = run_batched(&nodes, &config.layout.batch, &config.layout.uniform)?;
    print_json(&run.report, pretty)
}

async fn build_graph(source: &SourceArgs, mut config: FileConfig) -> Result<ReferenceGraph> {
    if !source.extensions.is_empty() {
        config.extractor.extensions = source
            .extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_string())
            .collect();
    }
    config.validate()?;

    let root = source
        .path
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", source.path.display()))?;
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }

    let units = SourceScanner::new(&root, &config.extractor).units();
    let groups: HashMap<String, (String, Option<String>)> = units
        .iter()
        .map(|unit| (unit.id.clone(), unit_location(&root, unit)))
        .collect();

    let mut builder = GraphBuilder::new(ReferenceExtractor::new(config.extractor));
    if let Some(jobs) = source.jobs {
        builder = builder.with_concurrency(jobs);
    }
    let mut graph = builder.build(units).await;

    let max_properties = config.layout.max_properties;
    for id in graph.node_ids() {
        let Some((path, group)) = groups.get(&id) else {
            continue;
        };
        if let Some(group) = group {
            graph.set_group(&id, group.clone())?;
        }
        let properties = vec![
            NodeProperty::new("path", path.clone()),
            NodeProperty::new("dependencies", graph.dependencies(&id).len().to_string()),
            NodeProperty::new("dependents", graph.dependents(&id).len().to_string()),
        ];
        graph.set_properties(&id, properties, max_properties)?;
    }

    Ok(graph)
}

/// Relative path of a unit and its group (the directory it lives in, none at the root)
fn unit_location(root: &Path, unit: &SourceUnit) -> (String, Option<String>) {
    let UnitSource::File(path) = &unit.source else {
        return (unit.id.clone(), None);
    };
    let relative = path.strip_prefix(root).unwrap_or(path);
    let group = relative
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(|parent| parent.to_string_lossy().replace('\\', "/"));
    (relative.to_string_lossy().replace('\\', "/"), group)
}
