//! Homesense CLI
//!
//! Inspect smart-home event-log datasets and export them as dense matrices.

use anyhow::Context;
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use homesense::{
    config::DatasetRegistry,
    core::{label_matrix, sensor_feature_matrix, DanglingEndPolicy, EventReader, HomeGraph},
    home::{ActivityKind, HomeModel},
    VERSION,
};
use ndarray::{Array2, Array3};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "homesense")]
#[command(version = VERSION)]
#[command(about = "Smart-home event logs as machine-learning matrices", long_about = None)]
struct Cli {
    /// Dataset registry file (defaults to the per-user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory relative data paths resolve against (defaults to `.data`
    /// next to the registry)
    #[arg(long, global = true)]
    data_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a dataset's layout: sensors, locations, activities, graph size
    Info {
        /// Registered dataset name
        dataset: String,
    },

    /// Read a window of log lines and report what it contains
    Read {
        /// Registered dataset name
        dataset: String,

        /// First line of the window (0-based)
        #[arg(long, default_value = "0")]
        start: usize,

        /// Number of lines to read (whole file if omitted)
        #[arg(long)]
        window: Option<usize>,

        /// Treat an `end` edge with no open `begin` as an already-closed
        /// interval instead of failing
        #[arg(long)]
        tolerate_dangling_end: bool,
    },

    /// Export a window as a JSON dataset descriptor
    Export {
        /// Registered dataset name
        dataset: String,

        /// First line of the window (0-based)
        #[arg(long, default_value = "0")]
        start: usize,

        /// Number of lines to read (whole file if omitted)
        #[arg(long)]
        window: Option<usize>,

        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Treat an `end` edge with no open `begin` as an already-closed
        /// interval instead of failing
        #[arg(long)]
        tolerate_dangling_end: bool,
    },
}

/// Everything a training pipeline needs from one window, in one document.
#[derive(Serialize)]
struct DatasetDescriptor<'a> {
    dataset: &'a str,
    start: usize,
    stop: usize,
    truncated: bool,
    /// Row order of `features`.
    sensors: Vec<&'a str>,
    /// Node order of the graph matrices: sensors first, then locations.
    nodes: Vec<&'a str>,
    /// Row order of `labels`; the implicit last row means "no activity".
    activities: Vec<ActivityKind>,
    times: Vec<NaiveDateTime>,
    features: Array2<f64>,
    labels: Array2<f64>,
    /// `(nodes x node kinds x timesteps)` one-hot/value tensor.
    node_features: Array3<f64>,
    adjacency: &'a Array2<f64>,
    symnorm_adjacency: &'a Array2<f64>,
    normalized_laplacian: &'a Array2<f64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = load_registry(cli.config, cli.data_root)?;

    match cli.command {
        Commands::Info { dataset } => cmd_info(&registry, &dataset),
        Commands::Read {
            dataset,
            start,
            window,
            tolerate_dangling_end,
        } => cmd_read(&registry, &dataset, start, window, tolerate_dangling_end),
        Commands::Export {
            dataset,
            start,
            window,
            output,
            tolerate_dangling_end,
        } => cmd_export(
            &registry,
            &dataset,
            start,
            window,
            output,
            tolerate_dangling_end,
        ),
    }
}

fn load_registry(
    config: Option<PathBuf>,
    data_root: Option<PathBuf>,
) -> anyhow::Result<DatasetRegistry> {
    let path = config.unwrap_or_else(DatasetRegistry::default_path);
    let registry = match data_root {
        Some(root) => DatasetRegistry::load_with_data_root(&path, root),
        None => DatasetRegistry::load(&path),
    };
    registry.with_context(|| format!("loading dataset registry from {}", path.display()))
}

fn cmd_info(registry: &DatasetRegistry, dataset: &str) -> anyhow::Result<()> {
    let config = registry.get(dataset)?;
    let model = HomeModel::build(config)?;
    let graph = HomeGraph::new(&model);

    println!("Dataset: {}", config.name());
    println!("Data file: {}", config.data_file().display());
    println!();

    println!("Locations ({}):", model.num_locations());
    for location in model.locations() {
        let sensors = config.location_sensors(&location.name);
        println!(
            "  {} ({:?}): {} sensor(s), {} neighbor(s)",
            location.name,
            location.kind,
            sensors.len(),
            location.adjacent.len()
        );
    }
    println!();

    println!("Sensors ({}):", model.num_sensors());
    for sensor in model.sensors() {
        let location = model.location(sensor.location);
        println!("  {} ({:?}) in {}", sensor.name, sensor.kind, location.name);
    }
    println!();

    let activities = config.activity_kinds();
    println!("Activity kinds ({}):", activities.len());
    for kind in &activities {
        println!("  {kind}");
    }
    println!();

    println!(
        "Graph: {} nodes, {} node kinds",
        graph.num_nodes(),
        graph.num_features()
    );

    Ok(())
}

fn cmd_read(
    registry: &DatasetRegistry,
    dataset: &str,
    start: usize,
    window: Option<usize>,
    tolerate_dangling_end: bool,
) -> anyhow::Result<()> {
    let config = registry.get(dataset)?;
    let model = HomeModel::build(config)?;
    let mut reader = EventReader::new(&model, config, config.data_file())?
        .with_dangling_end_policy(dangling_policy(tolerate_dangling_end));

    println!("File length: {} lines", reader.file_length());
    let slice = reader.read_window(start, window)?;

    println!("Window: lines {}..{}", slice.start, slice.stop);
    if slice.truncated {
        println!("  (truncated at end of file)");
    }
    println!(
        "  {} of {} lines accepted ({} skipped)",
        slice.lines_processed(),
        slice.lines_total,
        slice.lines_skipped
    );
    println!("  {} activity event(s)", slice.activity_events.len());
    println!("  {} interval(s)", slice.intervals.len());
    if !slice.waiting.is_empty() {
        let mut open: Vec<&str> = slice.waiting.keys().map(String::as_str).collect();
        open.sort_unstable();
        println!("  still open at window end: {}", open.join(", "));
    }
    if let (Some(first), Some(last)) = (slice.sensor_events.first(), slice.sensor_events.last()) {
        println!("  time span: {} .. {}", first.timestamp, last.timestamp);
    }

    Ok(())
}

fn cmd_export(
    registry: &DatasetRegistry,
    dataset: &str,
    start: usize,
    window: Option<usize>,
    output: Option<PathBuf>,
    tolerate_dangling_end: bool,
) -> anyhow::Result<()> {
    let config = registry.get(dataset)?;
    let model = HomeModel::build(config)?;
    let mut reader = EventReader::new(&model, config, config.data_file())?
        .with_dangling_end_policy(dangling_policy(tolerate_dangling_end));
    let slice = reader.read_window(start, window)?;

    let (features, times) = sensor_feature_matrix(&model, slice);
    let activities = config.activity_kinds();
    let labels = label_matrix(&activities, slice);

    let graph = HomeGraph::new(&model);
    let (node_features, _) = graph.node_feature_tensor(slice);
    let descriptor = DatasetDescriptor {
        dataset: config.name(),
        start: slice.start,
        stop: slice.stop,
        truncated: slice.truncated,
        sensors: model.sensors().iter().map(|s| s.name.as_str()).collect(),
        nodes: graph.nodes().iter().map(|n| n.name.as_str()).collect(),
        activities,
        times,
        features,
        labels,
        node_features,
        adjacency: graph.adjacency(),
        symnorm_adjacency: graph.symnorm_adjacency(),
        normalized_laplacian: graph.normalized_laplacian(),
    };

    let json = serde_json::to_string_pretty(&descriptor)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
            println!("Exported window to {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn dangling_policy(tolerate: bool) -> DanglingEndPolicy {
    if tolerate {
        DanglingEndPolicy::AdoptClosed
    } else {
        DanglingEndPolicy::Fail
    }
}
