use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use plate_cache::cache::CacheStats;
use plate_cache::config::Config;
use plate_cache::{logging, HttpPlateService, PlateInfoProvider};

#[derive(Parser, Debug)]
#[command(name = "plate-cache")]
#[command(about = "Look up plates and plate types through a caching provider")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/plate-cache/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Requester identity (default: remote.requester from the config file)
  #[arg(short, long)]
  requester: Option<String>,

  /// How many times to run the command; repeats are served from the cache
  #[arg(long, default_value_t = 1)]
  repeat: u32,

  /// Print cache counters to stderr when done
  #[arg(long)]
  stats: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Resolve a raw plate id into a plate identifier
  PlateId { raw: String },
  /// Show a single plate
  Plate { id: String },
  /// Show a plate type by id
  PlateType { id: String },
  /// List all plate types
  PlateTypes,
}

#[derive(Serialize)]
struct Stats {
  plates: CacheStats,
  plate_types: CacheStats,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  let _log_guard = logging::init(config.logging.file.as_deref());

  let requester = args
    .requester
    .clone()
    .or_else(|| config.remote.requester.clone())
    .ok_or_else(|| eyre!("No requester given. Pass --requester or set remote.requester"))?;

  let service = HttpPlateService::new(&config.remote, Config::get_api_token())?;
  let provider = PlateInfoProvider::new(
    Arc::new(service),
    config.cache.plate_cache()?,
    Arc::new(config.cache.plate_type_cache()),
  );

  for _ in 0..args.repeat.max(1) {
    let output = run(&provider, &requester, &args.command).await?;
    println!("{}", output);
  }

  if args.stats {
    let stats = Stats {
      plates: provider.plate_stats(),
      plate_types: provider.plate_type_stats(),
    };
    eprintln!("{}", serde_json::to_string_pretty(&stats)?);
  }

  Ok(())
}

async fn run(
  provider: &PlateInfoProvider<HttpPlateService>,
  requester: &str,
  command: &Command,
) -> Result<String> {
  let output = match command {
    Command::PlateId { raw } => serde_json::to_string_pretty(&provider.plate_id(requester, raw)?)?,
    Command::Plate { id } => serde_json::to_string_pretty(&provider.plate(requester, id).await?)?,
    Command::PlateType { id } => {
      serde_json::to_string_pretty(&provider.plate_type(requester, id).await?)?
    }
    Command::PlateTypes => {
      let types = provider.plate_types(requester).await?;
      serde_json::to_string_pretty(&types.as_deref().map(Vec::as_slice).unwrap_or_default())?
    }
  };
  Ok(output)
}
