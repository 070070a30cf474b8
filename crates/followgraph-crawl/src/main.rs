//! CLI entry point for the followgraph crawler.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use followgraph_crawl::config::{normalize_seeds, FollowgraphConfig};
use followgraph_crawl::Crawler;
use followgraph_graph::FileSink;
use followgraph_twitter::TwitterClient;

#[derive(Parser)]
#[command(name = "followgraph")]
#[command(about = "Crawl who seed accounts follow and export the graph as GraphSON")]
struct Cli {
    /// Seed screen name; repeat or comma-separate for several (overrides config).
    #[arg(short, long = "seed", value_delimiter = ',')]
    seeds: Vec<String>,

    /// Output file (overrides crawl.output_path).
    #[arg(short, long)]
    output: Option<String>,

    /// Config file prefix (default: followgraph).
    #[arg(short, long, default_value = "followgraph")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = FollowgraphConfig::load(&cli.config)?;

    if !cli.seeds.is_empty() {
        config.crawl.seeds = normalize_seeds(&cli.seeds);
    }
    if let Some(output) = cli.output {
        config.crawl.output_path = output;
    }
    config.validate()?;

    let client = TwitterClient::new(config.twitter.clone())?;
    let sink = FileSink::new(&config.crawl.output_path);

    let mut crawler = Crawler::new(client, sink, config.crawl.seeds.clone())
        .with_batch_size(config.crawl.batch_size);
    let summary = crawler.run().await?;

    tracing::info!(path = %summary.destination, "GraphSON file successfully saved");
    println!("{}", serde_json::to_string(&summary)?);

    Ok(())
}
