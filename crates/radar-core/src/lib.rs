pub mod app_config;
pub mod config;
pub mod filter;
pub mod geo;
pub mod partners;
pub mod stats;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use filter::{filter_partners, SectorFilter};
pub use geo::{Bounds, Coordinates};
pub use partners::{
    generate_partner_id, load_partners, Business, LandingConfig, PartnerStatus, PartnersFile,
    Sector, ValidationError, LANDING_CONFIG_KEY,
};
pub use stats::DirectoryStats;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read partners file {path}: {source}")]
    PartnersFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse partners file: {0}")]
    PartnersFileParse(#[from] serde_yaml::Error),

    #[error("partners file validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown sector: {0}")]
    UnknownSector(String),

    #[error("unknown partner status: {0}")]
    UnknownStatus(String),
}
