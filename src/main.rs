use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod artwork;
mod config;
mod error;
mod shortcuts;
mod steam;

use artwork::compose::GridCompositor;
use artwork::griddb::SteamGridDbClient;
use artwork::igdb::IgdbClient;
use artwork::pipeline::ArtworkPipeline;
use artwork::sources::{CoverSource, HttpFetcher};
use artwork::task::{GridImageTask, RunTally, TaskStatus};
use config::GridfillConfig;
use shortcuts::appid::derive_app_id;
use shortcuts::record::readable;
use steam::library::SteamLibrary;

/// Fill in Steam library grid images for non-Steam shortcuts
#[derive(Debug, Parser)]
#[command(name = "gridfill", version)]
struct Cli {
    /// Steam installation root (overrides GRIDFILL_STEAM_PATH)
    #[arg(long, global = true)]
    steam_path: Option<PathBuf>,

    /// Debug-level logging unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List non-Steam shortcuts with their app ids
    List {
        /// Only this account (numeric userdata directory)
        #[arg(long)]
        user: Option<String>,
    },
    /// Print the app id Steam assigns to a name and exe
    Appid { name: String, exe: String },
    /// Download or create grid images for every shortcut
    Fetch {
        #[arg(long)]
        user: Option<String>,
        /// Shortcuts resolved concurrently
        #[arg(long, default_value_t = 1)]
        jobs: usize,
        /// Show what would be fetched without calling any service
        #[arg(long)]
        dry_run: bool,
        /// Print a JSON report on stdout
        #[arg(long)]
        json: bool,
    },
}

/// Per-task line of the JSON report
#[derive(Serialize)]
struct TaskReport<'a> {
    owner: &'a str,
    app_id: String,
    name: String,
    status: TaskStatus,
    target: String,
    failure: Option<&'a str>,
}

#[derive(Serialize)]
struct RunReport<'a> {
    tally: RunTally,
    tasks: Vec<TaskReport<'a>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match cli.command {
        Command::Appid { name, exe } => {
            println!("{}", derive_app_id(&name, &exe));
            Ok(())
        }
        Command::List { user } => {
            let config = GridfillConfig::from_env().context("invalid configuration")?;
            let library = open_library(cli.steam_path, &config)?;
            list(&library, user.as_deref())
        }
        Command::Fetch {
            user,
            jobs,
            dry_run,
            json,
        } => {
            let config = GridfillConfig::from_env().context("invalid configuration")?;
            let library = open_library(cli.steam_path, &config)?;
            fetch(&config, &library, user.as_deref(), jobs, dry_run, json).await
        }
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let default_filter = if verbose { "gridfill=debug" } else { "gridfill=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn open_library(explicit: Option<PathBuf>, config: &GridfillConfig) -> Result<SteamLibrary> {
    let root = explicit.or_else(|| config.steam_path.clone());
    let library = SteamLibrary::locate(root)?;
    info!(root = %library.root().display(), "using Steam installation");
    Ok(library)
}

fn list(library: &SteamLibrary, user: Option<&str>) -> Result<()> {
    let accounts = library.load_all(user).context("could not read shortcuts")?;

    let mut total = 0;
    for account in &accounts {
        if !account.malformed.is_empty() {
            eprintln!(
                "Skipped {} unreadable shortcut(s) for account {}.",
                account.malformed.len(),
                account.owner_user_id
            );
        }
        for record in &account.records {
            println!(
                "{}\t{}\t{}\t{}",
                record.owner_user_id,
                record.app_id,
                readable(&record.display_name),
                readable(&record.executable_path)
            );
            total += 1;
        }
    }

    if total == 0 {
        println!("Could not find any non-Steam games in your Steam library.");
    }
    Ok(())
}

async fn fetch(
    config: &GridfillConfig,
    library: &SteamLibrary,
    user: Option<&str>,
    jobs: usize,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let tasks: Vec<GridImageTask> = library
        .load_all(user)
        .context("could not read shortcuts")?
        .into_iter()
        .flat_map(|account| account.records)
        .map(|record| {
            let target = library.grid_image_path(&record);
            GridImageTask::new(record, target)
        })
        .collect();

    if tasks.is_empty() {
        println!("Could not find any non-Steam games in your Steam library.");
        return Ok(());
    }

    if dry_run {
        for task in &tasks {
            let state = if task.target_path.exists() { "exists" } else { "would fetch" };
            println!(
                "{}\t{}\t{}",
                task.record.app_id,
                readable(&task.record.display_name),
                state
            );
        }
        return Ok(());
    }

    let pipeline = build_pipeline(config)?;
    let (done, tally) = pipeline.run(tasks, jobs).await;

    if json {
        let report = RunReport {
            tally,
            tasks: done
                .iter()
                .map(|task| TaskReport {
                    owner: &task.record.owner_user_id,
                    app_id: task.record.app_id_string(),
                    name: readable(&task.record.display_name),
                    status: task.status(),
                    target: task.target_path.display().to_string(),
                    failure: task.failure.as_deref(),
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    info!(
        total = tally.total(),
        found = tally.found,
        alternate = tally.alternate,
        synthesized = tally.synthesized,
        failed = tally.failed,
        existing = tally.skipped_existing,
        "run complete"
    );

    if tally.updated() {
        eprintln!("Grid images updated. Please restart Steam to see the changes.");
    } else {
        eprintln!("Nothing was updated.");
    }
    Ok(())
}

fn build_pipeline(config: &GridfillConfig) -> Result<ArtworkPipeline> {
    let api_key = config.require_steamgriddb_key()?;
    let grids = SteamGridDbClient::new(&config.steamgriddb.api_url, api_key, config.request_timeout)?;

    let covers: Option<Arc<dyn CoverSource>> = match &config.igdb {
        Some(igdb) => {
            let client = IgdbClient::new(
                &igdb.api_url,
                &igdb.client_id,
                &igdb.token,
                config.request_timeout,
            )?;
            Some(Arc::new(client) as Arc<dyn CoverSource>)
        }
        None => {
            warn!("IGDB credentials not set, custom grid images are disabled");
            None
        }
    };

    let compositor = match &config.font_path {
        Some(path) => GridCompositor::with_font_file(path)?,
        None => GridCompositor::new(),
    };
    if !compositor.has_font() {
        info!("no title font configured, custom grids will have no text");
    }

    Ok(ArtworkPipeline::new(
        Arc::new(grids),
        covers,
        Arc::new(HttpFetcher::new(config.request_timeout)?),
        Arc::new(compositor),
    ))
}
