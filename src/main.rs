use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use fourcolor_map::adjacency::GeometricOracle;
use fourcolor_map::config::{AppConfig, DatasetConfig};
use fourcolor_map::geometry::{self, BoundingBox};
use fourcolor_map::index::RegionIndex;
use fourcolor_map::neighbors::AdjacencyGraph;
use fourcolor_map::types::Region;
use fourcolor_map::{data, report, server, validate};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a coloring for adjacent regions sharing a color
    Check {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(short, long)]
        dataset: String,
        /// JSON object mapping region id to color index
        #[arg(long, value_name = "FILE")]
        coloring: PathBuf,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
        /// Number of violations listed in the summary
        #[arg(long, default_value_t = report::DEFAULT_SHOWN_VIOLATIONS)]
        limit: usize,
        /// Only evaluate pairs whose bounding boxes are close (R-tree)
        #[arg(long)]
        indexed: bool,
    },
    /// List every pair of adjacent regions
    Neighbors {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(short, long)]
        dataset: String,
        /// Write the pairs as CSV instead of printing them
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Explain how two regions meet
    Pair {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(short, long)]
        dataset: String,
        first: String,
        second: String,
    },
    /// Serve the datasets and the checker over HTTP
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

fn load(config: &Path, dataset: &str) -> Result<(AppConfig, DatasetConfig, Vec<Region>)> {
    let app_config = AppConfig::load_from_file(config)?;
    let dataset_config = app_config.dataset(dataset)?.clone();
    let policy = dataset_config.identifier_policy()?;
    let regions = data::load_regions(&dataset_config.path, &policy)?;
    Ok((app_config, dataset_config, regions))
}

fn find<'a>(regions: &'a [Region], id: &str) -> Result<&'a Region> {
    regions
        .iter()
        .find(|r| r.id == id)
        .ok_or_else(|| anyhow!("No region named '{}'", id))
}

fn describe_bbox(bbox: Option<BoundingBox>) -> String {
    match bbox {
        Some(b) => format!(
            "lng {:.4}..{:.4}, lat {:.4}..{:.4}",
            b.min_lng, b.max_lng, b.min_lat, b.max_lat
        ),
        None => "no coordinates".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            config,
            dataset,
            coloring,
            json,
            limit,
            indexed,
        } => {
            let (app_config, dataset_config, regions) = load(&config, &dataset)?;
            let coloring = data::load_coloring(&coloring, &app_config.palette)?;
            let oracle = GeometricOracle::new(app_config.adjacency.tolerance);

            let result = if indexed {
                let index = RegionIndex::build(&regions);
                validate::validate_indexed(&regions, &coloring, &oracle, &index, oracle.tolerance())
            } else {
                validate::validate(&regions, &coloring, &oracle)
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", report::summary(&result, &dataset_config.label, limit));
            }
        }
        Commands::Neighbors {
            config,
            dataset,
            output,
        } => {
            let (app_config, dataset_config, regions) = load(&config, &dataset)?;
            let oracle = GeometricOracle::new(app_config.adjacency.tolerance);
            let graph = AdjacencyGraph::build(&regions, &oracle);

            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create output file: {:?}", path))?;
                    graph.write_csv(BufWriter::new(file))?;
                    println!("Wrote {} pairs to {:?}", graph.pairs().len(), path);
                }
                None => {
                    for pair in graph.pairs() {
                        println!("{} - {}", pair.first, pair.second);
                    }
                    println!(
                        "{} adjacent pairs among {} {}",
                        graph.pairs().len(),
                        regions.len(),
                        dataset_config.label
                    );
                    if let Some((id, degree)) = graph.max_degree() {
                        println!("Most neighbours: {} ({})", id, degree);
                    }
                }
            }
        }
        Commands::Pair {
            config,
            dataset,
            first,
            second,
        } => {
            let (app_config, _, regions) = load(&config, &dataset)?;
            let a = find(&regions, &first)?;
            let b = find(&regions, &second)?;
            let oracle = GeometricOracle::new(app_config.adjacency.tolerance);

            println!("{}: {}", a.id, describe_bbox(BoundingBox::of(&a.geometry)));
            println!("{}: {}", b.id, describe_bbox(BoundingBox::of(&b.geometry)));

            match geometry::relation(&a.geometry, &b.geometry) {
                Ok(r) => {
                    println!("touches:    {}", r.touches);
                    println!("overlaps:   {}", r.overlaps);
                    println!("intersects: {}", r.intersects);
                }
                Err(e) => println!("relation unavailable: {}", e),
            }

            let assessment = oracle.assess(a, b);
            println!("assessment: {:?}", assessment);
            println!("adjacent:   {}", assessment.is_adjacent());
        }
        Commands::Serve { config } => {
            let app_config = AppConfig::load_from_file(&config)?;
            server::start_server(app_config).await?;
        }
    }

    Ok(())
}
