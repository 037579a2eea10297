use clap::Parser;
use mr::{load_documents, make_coordinator, Config};
use std::error::Error;
use std::path::PathBuf;
use std::process;
use tracing::{debug, error, trace};
use tracing_subscriber::EnvFilter;

/// Count how often every word occurs in each of three documents
#[derive(Parser, Debug)]
#[command(name = "coordinator", version)]
struct Cli {
    /// The three documents to index
    #[arg(required = true, num_args = 3, value_name = "FILE")]
    files: Vec<PathBuf>,

    /// JSON file with lines_per_chunk, reduce_batch_size, max_workers, keep_empty_words
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the result as JSON instead of the map notation
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_thread_ids(verbose >= 3)
        .with_line_number(verbose >= 3)
        .init();

    debug!("coordinator started with verbosity level: {}", verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    debug!("{:?}", config);

    let documents = load_documents(&cli.files).await?;
    let report = make_coordinator(documents, config).await?;

    println!("Number of Map Phase Threads created: {}", report.map.workers);
    println!("Number of map tasks: {}", report.map.tasks);
    if cli.json {
        println!("{}", serde_json::to_string(&report.output)?);
    } else {
        println!("{}", report.output);
    }
    println!("Number of individual words found: {}", report.distinct_words());
    println!(
        "Time taken for map phase: {}ms",
        report.timings.map.as_millis()
    );
    println!(
        "Time taken for group phase: {}ms",
        report.timings.group.as_millis()
    );
    println!(
        "Time taken for reduce phase: {}ms",
        report.timings.reduce.as_millis()
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("Fatal error: {}", e);
        eprintln!("Error: {e}");
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        process::exit(1);
    }
}
