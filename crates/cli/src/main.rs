use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use config::Config;
use fcat_chatlog::BoostAggregator;
use fcat_esi::{
    Authenticator, Credential, EsiClient, SharedGateway, StaticAuthenticator, TokenVerifier,
};
use fcat_roles::{RoleCache, ShipClassifier};
use fcat_sync::{FleetEvent, FleetMonitor, PollPipeline, RefreshScheduler};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast::error::RecvError;

mod config;
mod render;

#[derive(Parser)]
#[command(name = "fcat")]
#[command(about = "Fleet commander assistant for EVE Online", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ~/.config/fcat/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text (implies --quiet)
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(long, global = true)]
    quiet: bool,

    /// Character id to poll for (overrides FCAT_CHARACTER_ID)
    #[arg(long, global = true)]
    character_id: Option<i64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll on the configured interval and print every update
    Watch(WatchArgs),

    /// Run one poll cycle and print the result
    Poll,

    /// Classify ship type ids through the role cache
    Classify(ClassifyArgs),

    /// Read boost announcements from chat logs only
    Boosts(BoostsArgs),
}

#[derive(Args)]
struct WatchArgs {
    /// Override the refresh interval in seconds
    #[arg(long)]
    interval: Option<u64>,
}

#[derive(Args)]
struct ClassifyArgs {
    /// Ship type ids
    #[arg(required = true)]
    type_ids: Vec<i64>,
}

#[derive(Args)]
struct BoostsArgs {
    /// Channel to read (repeatable; default: configured channels)
    #[arg(long = "channel")]
    channels: Vec<String>,

    /// Chat log directory
    #[arg(long)]
    dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers.
    if cli.json {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(id) = cli.character_id {
        config.auth.character_id = Some(id);
    }

    match cli.command {
        Commands::Watch(args) => run_watch(config, args, cli.json).await?,
        Commands::Poll => run_poll(config, cli.json).await?,
        Commands::Classify(args) => run_classify(config, args, cli.json).await?,
        Commands::Boosts(args) => run_boosts(&config, args, cli.json)?,
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn authenticate(config: &Config) -> Result<Credential> {
    let Some(token) = config.auth.access_token.clone() else {
        bail!(
            "No ESI access token configured (set {})",
            config::ENV_ACCESS_TOKEN
        );
    };
    let credential = match config.auth.character_id {
        Some(id) => StaticAuthenticator::new(Credential::new(token, id))
            .authenticate()
            .await?,
        None => TokenVerifier::new(&config.esi_config(), token)?
            .authenticate()
            .await
            .context("Failed to verify access token")?,
    };
    log::info!("Authenticated as character {}", credential.character_id);
    Ok(credential)
}

async fn build_pipeline(config: &Config) -> Result<Arc<PollPipeline>> {
    let credential = authenticate(config).await?;
    let character_id = credential.character_id;
    let gateway: SharedGateway = Arc::new(EsiClient::new(&config.esi_config(), credential)?);
    let cache_path = config.role_cache_path();
    let cache = RoleCache::load(&cache_path);
    log::debug!(
        "Role cache {} holds {} ship types",
        cache_path.display(),
        cache.len()
    );
    let classifier = Arc::new(ShipClassifier::new(gateway.clone(), cache));
    let aggregator = Arc::new(
        BoostAggregator::new(config.chatlog_dir(), config.taxonomy())
            .context("Invalid boost taxonomy")?,
    );
    Ok(Arc::new(PollPipeline::new(
        gateway,
        classifier,
        aggregator,
        character_id,
    )))
}

async fn run_poll(config: Config, json: bool) -> Result<()> {
    let pipeline = build_pipeline(&config).await?;
    let scheduler = config.scheduler_config();
    let started = Instant::now();
    let data = tokio::time::timeout(scheduler.deadline, pipeline.run(&scheduler.channels))
        .await
        .map_err(|_| fcat_sync::SyncError::Deadline(scheduler.deadline))??;
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let mut monitor = FleetMonitor::new(scheduler.override_threshold, scheduler.alert_thresholds);
    let update = monitor.apply(data, duration_ms);
    if json {
        print_json(&update)
    } else {
        print!("{}", render::update(&update));
        Ok(())
    }
}

async fn run_watch(mut config: Config, args: WatchArgs, json: bool) -> Result<()> {
    if let Some(interval) = args.interval {
        config.refresh.interval_secs = interval;
        config.validate()?;
    }
    let pipeline = build_pipeline(&config).await?;
    let scheduler = RefreshScheduler::start(pipeline, config.scheduler_config());
    let mut events = scheduler.subscribe();
    log::info!(
        "Polling every {}s; press Ctrl-C to stop",
        config.refresh.interval_secs
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Stopping");
                break;
            }
            event = events.recv() => match event {
                Ok(FleetEvent::Updated(update)) => {
                    if json {
                        print_json(&FleetEvent::Updated(update))?;
                    } else {
                        println!("{}", render::update(&update));
                    }
                }
                Ok(FleetEvent::Failed { message, transient }) => {
                    if json {
                        print_json(&FleetEvent::Failed { message, transient })?;
                    } else {
                        eprintln!("Poll failed: {message}");
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    log::warn!("Dropped {missed} fleet updates");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    scheduler.shutdown().await?;
    Ok(())
}

#[derive(Serialize)]
struct ClassifiedType {
    type_id: i64,
    role: fcat_protocol::TacticalRole,
}

async fn run_classify(config: Config, args: ClassifyArgs, json: bool) -> Result<()> {
    let pipeline = build_pipeline(&config).await?;
    let classifier = pipeline.classifier();
    let mut rows = Vec::with_capacity(args.type_ids.len());
    for type_id in args.type_ids {
        rows.push((type_id, classifier.classify(type_id).await));
    }

    if json {
        let body: Vec<_> = rows
            .iter()
            .map(|(type_id, role)| ClassifiedType {
                type_id: *type_id,
                role: *role,
            })
            .collect();
        print_json(&body)
    } else {
        print!("{}", render::classification(&rows));
        Ok(())
    }
}

fn run_boosts(config: &Config, args: BoostsArgs, json: bool) -> Result<()> {
    let channels = if args.channels.is_empty() {
        config.boosts.channels.clone()
    } else {
        args.channels
    };
    if channels.is_empty() {
        bail!("No boost channels configured; pass --channel or set boosts.channels");
    }
    let dir = args.dir.unwrap_or_else(|| config.chatlog_dir());
    if !dir.is_dir() {
        log::warn!("Chat log directory {} does not exist", dir.display());
    }

    let aggregator = BoostAggregator::new(dir, config.taxonomy()).context("Invalid boost taxonomy")?;
    let index = aggregator.aggregate(&channels);
    if json {
        print_json(&index)
    } else {
        print!("{}", render::boosts(&index));
        Ok(())
    }
}
