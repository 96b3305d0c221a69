use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use moodlists::config::db_path_from_env;
use moodlists::generator::{DEFAULT_LIMIT, DEFAULT_MOODS};
use moodlists::{Config, MoodPlaylistGenerator, PlaylistStore, TokenPolicy};

#[derive(Parser)]
#[command(name = "moodlists")]
#[command(about = "Generate mood playlists from Spotify recommendations")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate playlists for the given moods (chill, energetic, romantic by default)
    Generate {
        /// Mood labels, used as seed genres and playlist names
        moods: Vec<String>,

        /// Number of recommendations to request per mood
        #[arg(
            long,
            default_value_t = DEFAULT_LIMIT,
            value_parser = clap::value_parser!(u32).range(1..=100)
        )]
        limit: u32,

        /// SQLite database holding the playlist history (overrides MOODLISTS_DB_PATH)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Reuse the access token across moods while it is valid
        #[arg(long)]
        reuse_token: bool,
    },

    /// Show previously generated playlists
    History {
        /// SQLite database holding the playlist history (overrides MOODLISTS_DB_PATH)
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Show setup guide
    Setup,
}

fn setup_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // history reads MOODLISTS_DB_PATH without loading the full config
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Generate {
            moods,
            limit,
            db,
            reuse_token,
        }) => {
            generate(moods, limit, db, reuse_token).await?;
        }
        Some(Commands::History { db }) => {
            show_history(db.unwrap_or_else(db_path_from_env))?;
        }
        Some(Commands::Setup) => {
            show_setup_guide();
        }
        None => {
            generate(Vec::new(), DEFAULT_LIMIT, None, false).await?;
        }
    }

    Ok(())
}

async fn generate(
    moods: Vec<String>,
    limit: u32,
    db: Option<PathBuf>,
    reuse_token: bool,
) -> Result<()> {
    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            println!("{} {}", "Configuration error:".red(), e);
            println!(
                "\n{}",
                "Run `moodlists setup` to see how to provide Spotify credentials.".yellow()
            );
            std::process::exit(1);
        }
    };

    let missing = config.get_missing_config();
    if !missing.is_empty() {
        println!("{}", "Missing configuration:".red());
        for item in &missing {
            println!("   - {}", item);
        }
        std::process::exit(1);
    }

    if let Some(db) = db {
        config.db_path = db;
    }
    if reuse_token {
        config.token_policy = TokenPolicy::Reuse;
    }

    let moods = if moods.is_empty() {
        DEFAULT_MOODS.iter().map(|m| m.to_string()).collect()
    } else {
        moods
    };

    let generator = MoodPlaylistGenerator::from_config(&config, limit)
        .context("Failed to initialize playlist generator")?;

    let mut stdout = std::io::stdout();
    generator.run(moods.as_slice(), &mut stdout).await;

    Ok(())
}

fn show_history(db: PathBuf) -> Result<()> {
    println!("{}", "Generated Playlists".cyan().bold());
    println!("{}", "=".repeat(50));

    let store = PlaylistStore::open(&db)
        .with_context(|| format!("Failed to open {}", db.display()))?;
    store.ensure_schema().context("Failed to prepare playlist store")?;

    let records = store.list_playlists().context("Failed to read playlist history")?;

    if records.is_empty() {
        println!("{}", "No playlists generated yet".yellow());
        return Ok(());
    }

    for (i, record) in records.iter().enumerate() {
        println!(
            "{:2}. {} ({} tracks) - {}",
            i + 1,
            record.name.green(),
            record.track_count,
            record.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    println!("\n{}", format!("Total: {} playlists", records.len()).cyan());

    Ok(())
}

fn show_setup_guide() {
    println!("{}", "Mood Playlist Generator Setup Guide".cyan().bold());
    println!("{}", "=".repeat(50));

    println!("\n{}", "1. Spotify API Setup".yellow());
    println!("   - Go to https://developer.spotify.com/dashboard/");
    println!("   - Create a new app");
    println!("   - Copy your Client ID and Client Secret");

    println!("\n{}", "2. Configuration".yellow());
    println!("   - Create a .env file with:");
    println!("     SPOTIFY_CLIENT_ID=your_spotify_client_id");
    println!("     SPOTIFY_CLIENT_SECRET=your_spotify_client_secret");
    println!("   - Optional settings:");
    println!("     MOODLISTS_DB_PATH=spotify_playlists.db");
    println!("     MOODLISTS_HTTP_TIMEOUT_SECS=30");
    println!("     MOODLISTS_REUSE_TOKEN=1");

    println!("\n{}", "3. Usage".yellow());
    println!("   - moodlists                              (chill, energetic, romantic)");
    println!("   - moodlists generate jazz ambient        (specific moods)");
    println!("   - moodlists generate lofi --limit 50     (more tracks per mood)");
    println!("   - moodlists history                      (previously generated playlists)");

    println!("\n{}", "Ready to generate!".green());
}
