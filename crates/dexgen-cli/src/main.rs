use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dexgen_core::{ConfigManager, DexgenConfig, JsonFetcher};
use dexgen_evolution::{EvolutionCache, EvolutionResolver};
use dexgen_pipeline::{
    BasicsPipeline, DetailsPipeline, EvolutionMergePipeline, JsonFileStore, LanguagePreference,
    RunSummary,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

#[derive(Parser)]
#[command(name = "dexgen")]
#[command(about = "Dexgen - offline Pokédex data generator", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./.dexgen.toml, then ~/.dexgen/config.toml)
    #[arg(short, long, global = true, env = "DEXGEN_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the species basics list
    Basics {
        /// Output file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Build the details document (stats, abilities, evolution)
    Details {
        /// Basics list to read ids from
        #[arg(short, long)]
        basics: Option<PathBuf>,

        /// Output file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Refresh only the evolution field of an existing details document
    AddEvolution {
        /// Basics list to read ids from
        #[arg(short, long)]
        basics: Option<PathBuf>,

        /// Details document rewritten in place
        #[arg(short, long)]
        details: Option<PathBuf>,
    },
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

const LOG_TARGETS: [&str; 5] = [
    "dexgen",
    "dexgen_core",
    "dexgen_fetch",
    "dexgen_evolution",
    "dexgen_pipeline",
];

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Installed before the config loads so its log lines are kept.
    let rust_log_set = std::env::var_os(EnvFilter::DEFAULT_ENV).is_some();
    let filter = init_tracing(cli.verbose);

    let config = ConfigManager::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .into_config();

    if let Some(directives) = configured_filter(&config.logging.level, cli.verbose, rust_log_set) {
        if let Err(e) = filter.reload(EnvFilter::new(&directives)) {
            warn!("Could not apply log level {:?}: {}", config.logging.level, e);
        }
    }

    let summary = execute_command(&cli.command, &config).await?;

    let status = if summary.is_complete() {
        "Done:".green().bold()
    } else {
        "Done with skipped ids:".yellow().bold()
    };
    println!("{} {}", status, summary);
    Ok(())
}

/// Bootstrap filter: `RUST_LOG` if set, else `info` (`debug` with `--verbose`) for the dexgen crates.
fn init_tracing(verbose: bool) -> FilterHandle {
    let bootstrap = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(scoped_directives(if verbose { "debug" } else { "info" })));
    let (filter, handle) = reload::Layer::new(bootstrap);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    handle
}

/// Directives to switch to once the config is known (including a `RUST_LOG` read from `.env`).
/// `--verbose` and a `RUST_LOG` present at startup keep the bootstrap filter.
fn configured_filter(level: &str, verbose: bool, rust_log_set: bool) -> Option<String> {
    if verbose || rust_log_set {
        None
    } else {
        Some(scoped_directives(level))
    }
}

/// A bare level applies to the dexgen crates only; a full directive passes through.
fn scoped_directives(level: &str) -> String {
    if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        LOG_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

async fn execute_command(command: &Commands, config: &DexgenConfig) -> Result<RunSummary> {
    let fetcher: Arc<dyn JsonFetcher> = Arc::new(
        dexgen_fetch::http_fetcher(config).context("Failed to build HTTP client")?,
    );
    let languages = LanguagePreference::from(&config.localization);
    let paths = &config.paths;

    match command {
        Commands::Basics { out } => {
            let output = JsonFileStore::new(out.clone().unwrap_or_else(|| paths.basics_output.clone()));
            BasicsPipeline::new(fetcher, config.api.clone(), languages, output)
                .with_concurrency(config.basics.concurrency)
                .with_progress_every(config.basics.progress_every)
                .run()
                .await
                .context("Basics generation failed")
        }
        Commands::Details { basics, out } => {
            let input = JsonFileStore::new(basics.clone().unwrap_or_else(|| paths.basics_input.clone()));
            let output = JsonFileStore::new(out.clone().unwrap_or_else(|| paths.details_output.clone()));
            let resolver = resolver(fetcher.clone(), config);
            DetailsPipeline::new(fetcher, resolver, config.api.clone(), languages, input, output)
                .run()
                .await
                .context("Details generation failed")
        }
        Commands::AddEvolution { basics, details } => {
            let input = JsonFileStore::new(basics.clone().unwrap_or_else(|| paths.basics_input.clone()));
            let target = JsonFileStore::new(
                details
                    .clone()
                    .unwrap_or_else(|| paths.details_merge_target.clone()),
            );
            EvolutionMergePipeline::new(resolver(fetcher, config), input, target)
                .run()
                .await
                .context("Evolution merge failed")
        }
    }
}

fn resolver(fetcher: Arc<dyn JsonFetcher>, config: &DexgenConfig) -> Arc<EvolutionResolver> {
    Arc::new(EvolutionResolver::new(
        fetcher,
        Arc::new(EvolutionCache::new()),
        config.api.clone(),
    ))
}
