//! Anime Explorer CLI.
//!
//! Browses the Jikan anime listing with optional genre filters and keeps a
//! persistent list of favourites.

use anime_explorer::{AnimeDetails, AnimeListStore, AnimeRecord, FetchOutcome, GenreFilter, JikanClient};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shared::{Config, JsonFileStore, KeyValueStore, MemoryStore, SqliteStore, StorageBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List anime, newest listing first
    List {
        /// Number of pages to load
        #[arg(short, long, default_value_t = 1)]
        pages: u32,

        /// Page size (1-25), defaults to the configured value
        #[arg(short, long)]
        limit: Option<u32>,

        /// Only show anime with at least one of these genre ids
        #[arg(short, long = "genre")]
        genres: Vec<u32>,

        /// Only show favourites
        #[arg(short, long)]
        favourites_only: bool,
    },

    /// Add or remove an anime from favourites
    Toggle {
        /// MyAnimeList id
        id: u32,
    },

    /// Show favourite ids
    Favourites,

    /// Show details for one anime
    Details {
        /// MyAnimeList id
        id: u32,
    },

    /// Show the available genres
    Genres,

    /// Write a configuration file with default values
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let command = match args.command {
        Command::InitConfig { force } => return init_config(&args.config, force),
        command => command,
    };

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    shared::logging::init(shared::LogConfig::from_config(&config, "anime-explorer", args.verbose))?;

    info!("Anime Explorer starting");
    info!(config_file = %args.config.display(), "Loaded configuration");

    let storage = open_storage(&config)?;
    let client = JikanClient::from_config(&config.api).context("Failed to create API client")?;
    info!(base_url = %client.base_url(), "API client ready");

    let page_limit = match &command {
        Command::List { limit: Some(limit), .. } => *limit,
        _ => config.api.page_limit,
    };
    let store = Arc::new(AnimeListStore::new(client, storage).with_page_limit(page_limit));
    let _events = store.subscribe(|event| debug!(event = ?event, "Store changed"));
    store.initialize();

    match command {
        Command::List {
            pages,
            genres,
            favourites_only,
            ..
        } => list(&store, pages, genres, favourites_only).await?,
        Command::Toggle { id } => {
            let is_favourite = store.toggle_favourite(id)?;
            if is_favourite {
                println!("Added {} to favourites", id);
            } else {
                println!("Removed {} from favourites", id);
            }
        }
        Command::Favourites => {
            let ids = store.favourites();
            if ids.is_empty() {
                println!("No favourites yet");
            }
            for id in ids {
                println!("{}", id);
            }
        }
        Command::Details { id } => {
            let record = store
                .client()
                .fetch_anime(id)
                .await
                .with_context(|| format!("Failed to fetch anime {}", id))?;
            print!("{}", AnimeDetails::new(&record, store.has_favourite(id)));
        }
        Command::Genres => {
            let genres = store
                .client()
                .fetch_genres()
                .await
                .context("Failed to fetch genres")?;
            for genre in genres {
                println!("{:>4}  {} ({})", genre.id, genre.name, genre.count);
            }
        }
        Command::InitConfig { .. } => {}
    }

    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists, use --force to overwrite", path.display());
    }
    Config::default()
        .save(path)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Open the configured favourites backend
fn open_storage(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    let path = config.storage_path();
    info!(backend = %config.storage.backend, path = %path.display(), "Opening storage");

    let storage: Arc<dyn KeyValueStore> = match config.storage.backend {
        StorageBackend::Json => Arc::new(
            JsonFileStore::open(&path).context("Failed to open JSON storage")?,
        ),
        StorageBackend::Sqlite => Arc::new(
            SqliteStore::open(&path).context("Failed to open SQLite storage")?,
        ),
        StorageBackend::Memory => {
            warn!("Using in-memory storage, favourites will not survive this run");
            Arc::new(MemoryStore::new())
        }
    };

    Ok(storage)
}

async fn list(
    store: &AnimeListStore<JikanClient>,
    pages: u32,
    genres: Vec<u32>,
    favourites_only: bool,
) -> Result<()> {
    store.set_favourites_only(favourites_only);

    let filter: GenreFilter = genres.into_iter().collect();
    if let FetchOutcome::Failed(failure) = store.set_genre_filter(filter).await {
        bail!("Failed to load anime: {}", failure);
    }

    for _ in 1..pages {
        match store.load_more().await {
            FetchOutcome::Applied { .. } | FetchOutcome::Stale { .. } => {}
            FetchOutcome::Exhausted { page } => {
                info!(page = page, "Reached the last page");
                break;
            }
            FetchOutcome::Failed(failure) => {
                warn!(page = store.current_page() + 1, error = %failure, "Stopping early");
                break;
            }
        }
    }

    let shown = store.derived_list();
    for record in &shown {
        print_row(record, store.has_favourite(record.id));
    }
    println!("{} shown, {} loaded", shown.len(), store.records().len());

    Ok(())
}

fn print_row(record: &AnimeRecord, is_favourite: bool) {
    let marker = if is_favourite { '★' } else { ' ' };
    let genres: Vec<&str> = record.genres.iter().map(|g| g.name.as_str()).collect();
    println!("{:>6} {} {}  [{}]", record.id, marker, record.title, genres.join(", "));
}
