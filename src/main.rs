use clap::{Parser, Subcommand};
use humansize::{DECIMAL, format_size};
use media_cache::{
    Cache, Config, Content, Error, HttpFetcher, Materialized, hash, materialize,
    materialize_by_id, prefetch_record,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Fetch-once cache for remote media artwork
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Cache directory (overrides the configuration file)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Fetch straight from the network without storing anything
    #[arg(long, global = true)]
    no_cache: bool,

    /// Log cache hits and skipped files
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the cache key for a URL
    Key { url: String },

    /// Fetch a URL into the cache
    Fetch {
        url: String,

        /// Re-fetch even if the URL is already cached
        #[arg(long)]
        force: bool,
    },

    /// Copy the artwork of a record into an output directory
    Materialize {
        /// Record file (JSON)
        record: PathBuf,

        /// Output directory (overrides the configuration file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite files that already exist
        #[arg(long)]
        force: bool,

        /// Use the per-item layout `<ID>/.<from>/...`
        #[arg(long)]
        by_id: bool,

        /// Also copy sample images
        #[arg(long)]
        sample: bool,

        /// Also write the metadata sidecar
        #[arg(long)]
        info: bool,

        /// Warm the cache concurrently before copying
        #[arg(long)]
        prefetch: bool,

        /// Worker threads used by --prefetch
        #[arg(long, default_value_t = 4)]
        workers: usize,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn load_config(cli: &Cli) -> Result<Config, Error> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(dir) = &cli.cache_dir {
        config.cache.root = Some(dir.clone());
    }
    if cli.no_cache {
        config.cache.enabled = false;
    }

    Ok(config)
}

fn open_cache(config: &Config) -> Result<Cache, Error> {
    let fetcher = HttpFetcher::new(config.cache.timeout(), config.cache.user_agent.as_deref())?;
    Ok(Cache::open(&config.cache, fetcher)?)
}

fn load_record(path: &Path) -> Result<Content, Error> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn print_materialized(produced: &Materialized) {
    for path in &produced.written {
        println!("written  {}", path.display());
    }
    for path in &produced.kept {
        println!("kept     {}", path.display());
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let config = load_config(&cli)?;

    match cli.command {
        Command::Key { url } => {
            println!("{}", hash(&url));
        }
        Command::Fetch { url, force } => {
            let cache = open_cache(&config)?;
            let size = if force {
                cache.force_get(&url)?.len()
            } else {
                cache.read_bytes(&url)?.len()
            };
            if cache.is_enabled() {
                println!("{}", cache.entry_path(&url).display());
            }
            println!("{}", format_size(size, DECIMAL));
        }
        Command::Materialize {
            record,
            output,
            force,
            by_id,
            sample,
            info,
            prefetch,
            workers,
        } => {
            let cache = open_cache(&config)?;
            let record = load_record(&record)?;

            let mut options = config.output.clone();
            if let Some(output) = output {
                options.output_path = output;
            }
            options.force |= force;
            options.copy_sample |= sample;
            options.copy_info |= info;

            if prefetch && !options.force {
                let report = prefetch_record(&cache, &record, options.copy_sample, workers);
                println!(
                    "prefetched {} new, {} cached, {} failed",
                    report.fetched,
                    report.cached,
                    report.failed.len()
                );
            }

            let result = if by_id {
                materialize_by_id(&cache, &record, &options)
            } else {
                materialize(&cache, &record, &options)
            };

            match result {
                Ok(produced) => print_materialized(&produced),
                Err(e) => {
                    print_materialized(&e.outcome);
                    for failure in &e.failures {
                        eprintln!("failed   {}", failure);
                    }
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("\nError: {}", e);
        process::exit(1);
    }
}
