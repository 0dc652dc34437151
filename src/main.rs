use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use nuvion_launcher::api::ApiClient;
use nuvion_launcher::config::Config;
use nuvion_launcher::news::{FeedEvent, NewsFeedSync, TagFilter};
use nuvion_launcher::storage::{
    Database, DatabaseError, MemoryStore, PreferenceStore, ReadCursorStore,
};
use nuvion_launcher::theme::{ThemeId, ThemePreference};

/// Get the config directory path (~/.config/nuvion/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("nuvion"))
}

/// Create the config directory if needed and restrict it to the current user.
fn ensure_config_dir(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir).context("Failed to create config directory")?;
        tracing::info!(path = %config_dir.display(), "Created config directory");
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }

    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "nuvion", about = "Nuvion launcher news feed")]
struct Args {
    /// Config file (default: ~/.config/nuvion/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Only show entries with this tag: all, update, announcement, event
    #[arg(long, default_value = "all")]
    tag: TagFilter,

    /// Case-insensitive search over title, description and tag
    #[arg(long, short, default_value = "")]
    query: String,

    /// Mark every loaded entry as read
    #[arg(long)]
    mark_read: bool,

    /// Print the filtered entries as JSON
    #[arg(long)]
    json: bool,

    /// Set the launcher theme (cyan, indigo, emerald, rose)
    #[arg(long, value_name = "ID")]
    theme: Option<ThemeId>,

    /// Also query backend health and player counts
    #[arg(long)]
    stats: bool,

    /// Keep the read position in memory only
    #[arg(long)]
    no_persist: bool,

    /// Reset database (delete and recreate)
    #[arg(long)]
    reset_db: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so --json output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    ensure_config_dir(&config_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    let store = open_store(&args, &config_dir).await?;

    // Theme: stored choice wins over config.toml
    let themes = ThemePreference::new(Arc::clone(&store));
    let default_theme = ThemeId::from_str_name(&config.theme).unwrap_or_else(|| {
        tracing::warn!(theme = %config.theme, "Unknown theme in config, using default");
        ThemeId::default()
    });
    if let Some(theme) = args.theme {
        match themes.write(theme).await {
            Ok(()) => println!("Theme set to {}", theme),
            Err(e) => eprintln!("Warning: theme not saved: {}", e),
        }
    }
    let theme = themes.read(default_theme).await;

    let api = Arc::new(
        ApiClient::new(&config.api_base_url(), config.request_timeout())
            .context("Invalid API configuration")?,
    );

    if args.stats {
        print_backend_status(&api).await;
    }

    let mut feed = NewsFeedSync::activate(api.clone(), ReadCursorStore::new(store)).await;

    let (event_tx, mut event_rx) = mpsc::channel::<FeedEvent>(4);
    feed.spawn_load(event_tx);

    tokio::select! {
        event = event_rx.recv() => {
            if let Some(event) = event {
                feed.handle_event(event).await;
            }
        }
        _ = tokio::signal::ctrl_c() => {
            feed.deactivate();
            eprintln!("Cancelled.");
            return Ok(());
        }
    }

    if let Some(error) = &feed.state().error {
        eprintln!("News unavailable: {}", error);
        eprintln!("Run again to retry.");
    }

    if args.mark_read {
        feed.mark_all_read().await;
    }

    if args.json {
        print_json(&feed, &args)?;
    } else {
        print_feed(&feed, &args, theme);
    }

    if let Some(warning) = &feed.state().persist_warning {
        eprintln!("Warning: {}", warning);
    }

    feed.deactivate();
    Ok(())
}

async fn open_store(args: &Args, config_dir: &Path) -> Result<Arc<dyn PreferenceStore>> {
    if args.no_persist {
        return Ok(Arc::new(MemoryStore::new()));
    }

    let db_path = config_dir.join("launcher.db");
    if args.reset_db && db_path.exists() {
        std::fs::remove_file(&db_path).context("Failed to delete database")?;
        println!("Database reset.");
    }

    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    match Database::open(db_path_str).await {
        Ok(db) => Ok(Arc::new(db)),
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of the launcher appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => Err(anyhow::anyhow!("Failed to open database: {}", e)),
    }
}

async fn print_backend_status(api: &ApiClient) {
    match api.health().await {
        Ok(health) => println!(
            "Backend {}: {} (up {}s)",
            api.base_url(),
            health.status,
            health.uptime.round()
        ),
        Err(e) => println!("Backend {} unreachable: {}", api.base_url(), e),
    }
    match api.stats().await {
        Ok(stats) => println!(
            "Players: {} online / {} registered",
            stats.online_users, stats.total_users
        ),
        Err(e) => println!("Player stats unavailable: {}", e),
    }
}

fn print_feed(feed: &NewsFeedSync, args: &Args, theme: ThemeId) {
    let state = feed.state();
    let visible = feed.visible(&args.query, args.tag);

    println!(
        "News [{}] {} unread, showing {} of {} (tag: {})",
        theme,
        state.unread_count,
        visible.len(),
        state.entries.len(),
        args.tag
    );

    let cursor = feed.cursor().get();
    for entry in visible {
        let marker = if entry.id > cursor { "*" } else { " " };
        let image = if entry.has_image() { " [img]" } else { "" };
        println!(
            "{} {:<13} {}  {}{}",
            marker,
            format!("[{}]", entry.tag),
            entry.created_display(),
            entry.title,
            image
        );
        if !entry.description.trim().is_empty() {
            println!("      {}", entry.description.trim());
        }
    }
}

fn print_json(feed: &NewsFeedSync, args: &Args) -> Result<()> {
    let state = feed.state();
    let output = serde_json::json!({
        "unread_count": state.unread_count,
        "read_cursor": feed.cursor().get(),
        "error": state.error,
        "entries": feed.visible(&args.query, args.tag),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
