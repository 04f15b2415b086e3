//! Database operations for the `settings` table.
//!
//! The landing configuration is a singleton row stored under a fixed key
//! (see [`radar_core::LANDING_CONFIG_KEY`]).

use chrono::{DateTime, Utc};
use radar_core::LandingConfig;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `settings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SettingsRow {
    pub id: String,
    pub hero_image: String,
    pub ad_image: String,
    pub updated_at: DateTime<Utc>,
}

impl From<SettingsRow> for LandingConfig {
    fn from(row: SettingsRow) -> Self {
        LandingConfig {
            hero_image: row.hero_image,
            ad_banner_image: row.ad_image,
        }
    }
}

/// Returns the landing configuration stored under `key`, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_landing_config(pool: &PgPool, key: &str) -> Result<Option<LandingConfig>, DbError> {
    let row = sqlx::query_as::<_, SettingsRow>(
        "SELECT id, hero_image, ad_image, updated_at FROM settings WHERE id = $1",
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(LandingConfig::from))
}

/// Creates the configuration row under `key`, or overwrites it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn upsert_landing_config(
    pool: &PgPool,
    key: &str,
    config: &LandingConfig,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO settings (id, hero_image, ad_image) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (id) DO UPDATE SET \
             hero_image = EXCLUDED.hero_image, \
             ad_image   = EXCLUDED.ad_image, \
             updated_at = NOW()",
    )
    .bind(key)
    .bind(&config.hero_image)
    .bind(&config.ad_banner_image)
    .execute(pool)
    .await?;

    Ok(())
}
