mod partners;
mod session;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use radar_core::AppConfig;
use radar_geocode::{GeminiClient, Geocoder, GeocoderSettings};
use radar_storage::{ImageFile, StorageClient, StorageSettings};
use tracing_subscriber::EnvFilter;

use crate::partners::PartnerCommands;

#[derive(Debug, Parser)]
#[command(name = "radar-cli")]
#[command(about = "Partner radar command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Upsert partners from a seed file
    Seed {
        /// Seed file to load (defaults to RADAR_PARTNERS_PATH)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// List and manage stored partners
    Partners {
        #[command(subcommand)]
        command: PartnerCommands,
    },
    /// Resolve an address, place name or map link to a coordinate
    Geocode {
        /// Free text or a pasted map link
        text: String,
    },
    /// Upload an image to the object store and print its public URL
    Upload {
        /// Local image file
        path: PathBuf,
    },
    /// Drive the directory interactively from stdin
    Session,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = radar_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(Commands::Migrate) => {
            let pool = connect(&config).await?;
            radar_db::run_migrations(&pool).await?;
            println!("migrations applied");
        }
        Some(Commands::Seed { path }) => {
            let path = path.unwrap_or_else(|| config.partners_path.clone());
            let file = radar_core::load_partners(&path)?;
            let pool = connect(&config).await?;
            let count = radar_db::seed_partners(&pool, &file.partners).await?;
            println!("seeded {count} partners from {}", path.display());
        }
        Some(Commands::Partners { command }) => {
            let pool = connect(&config).await?;
            partners::run(&pool, command).await?;
        }
        Some(Commands::Geocode { text }) => {
            let geocoder = build_geocoder(&config)?;
            let resolution = geocoder.resolve_detailed(&text).await;
            println!(
                "{} ({:?})",
                resolution.coordinates, resolution.resolved_by
            );
        }
        Some(Commands::Upload { path }) => {
            let Some(client) = build_storage(&config)? else {
                anyhow::bail!("object store is not configured; set RADAR_STORAGE_URL and RADAR_STORAGE_KEY");
            };
            let file = ImageFile::read(&path).await?;
            let url = client.upload(&file).await?;
            println!("{url}");
        }
        Some(Commands::Session) => {
            let pool = connect(&config).await?;
            session::run(&config, pool).await?;
        }
        None => println!("radar-cli ready; run with --help for commands"),
    }

    Ok(())
}

async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = radar_db::PoolConfig::from_app_config(config);
    let pool = radar_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}

/// Object store client, or `None` when no store URL and key are configured.
fn build_storage(config: &AppConfig) -> anyhow::Result<Option<StorageClient>> {
    let (Some(base_url), Some(service_key)) = (&config.storage_url, &config.storage_key) else {
        return Ok(None);
    };
    let client = StorageClient::new(StorageSettings {
        base_url: base_url.clone(),
        service_key: service_key.clone(),
        bucket: config.storage_bucket.clone(),
        prefix: config.storage_prefix.clone(),
        timeout_secs: config.http_timeout_secs,
        max_retries: config.http_max_retries,
        backoff_base_ms: config.http_retry_backoff_ms,
    })?;
    Ok(Some(client))
}

fn build_geocoder(config: &AppConfig) -> anyhow::Result<Geocoder> {
    let client = match &config.gemini_api_key {
        Some(key) => Some(GeminiClient::new(key, config.http_timeout_secs)?),
        None => {
            tracing::warn!("no model API key configured; geocoding falls back to map links and the home coordinate");
            None
        }
    };
    Ok(Geocoder::new(
        client,
        GeocoderSettings {
            model: config.geocode_model.clone(),
            fallback_model: config.geocode_fallback_model.clone(),
            region: config.home_region.clone(),
            home: config.home,
        },
    ))
}

#[cfg(test)]
mod tests;
