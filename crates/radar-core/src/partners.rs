use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ConfigError, Coordinates, CoreError};

/// Store key of the singleton landing configuration row.
pub const LANDING_CONFIG_KEY: &str = "landing_config";

/// Fixed partner category. Serialized with the labels the record store
/// holds (`"Logistica"`, `"Salud"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sector {
    #[serde(rename = "Industrial")]
    Industrial,
    #[serde(rename = "Logistica")]
    Logistics,
    #[serde(rename = "Corporativo")]
    Corporate,
    #[serde(rename = "Salud")]
    Health,
    #[serde(rename = "Comercio")]
    Commerce,
    #[serde(rename = "Construccion")]
    Construction,
}

impl Sector {
    pub const ALL: [Sector; 6] = [
        Sector::Industrial,
        Sector::Logistics,
        Sector::Corporate,
        Sector::Health,
        Sector::Commerce,
        Sector::Construction,
    ];

    /// Stored label, also the text matched by directory search.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Sector::Industrial => "Industrial",
            Sector::Logistics => "Logistica",
            Sector::Corporate => "Corporativo",
            Sector::Health => "Salud",
            Sector::Commerce => "Comercio",
            Sector::Construction => "Construccion",
        }
    }

    fn english(self) -> &'static str {
        match self {
            Sector::Industrial => "industrial",
            Sector::Logistics => "logistics",
            Sector::Corporate => "corporate",
            Sector::Health => "health",
            Sector::Commerce => "commerce",
            Sector::Construction => "construction",
        }
    }
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Sector {
    type Err = CoreError;

    /// Accepts the stored label or the English name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Sector::ALL
            .into_iter()
            .find(|sector| sector.label().to_lowercase() == wanted || sector.english() == wanted)
            .ok_or_else(|| CoreError::UnknownSector(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartnerStatus {
    #[default]
    Active,
    Warning,
    Offline,
}

impl std::fmt::Display for PartnerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartnerStatus::Active => write!(f, "active"),
            PartnerStatus::Warning => write!(f, "warning"),
            PartnerStatus::Offline => write!(f, "offline"),
        }
    }
}

impl std::str::FromStr for PartnerStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(PartnerStatus::Active),
            "warning" => Ok(PartnerStatus::Warning),
            "offline" => Ok(PartnerStatus::Offline),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

/// One mapped organization in the directory.
///
/// `x` is the latitude and `y` the longitude, matching the store's columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub id: String,
    pub name: String,
    pub sector: Sector,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub office_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
    pub x: f64,
    pub y: f64,
    pub rating: f64,
    pub reliability: u8,
    #[serde(default)]
    pub status: PartnerStatus,
    pub logo: String,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industrial_capacity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("partner name must be non-empty")]
    MissingName,
    #[error("partner logo must be non-empty")]
    MissingLogo,
    #[error("rating {0} is outside 1.0-5.0")]
    RatingOutOfRange(f64),
    #[error("reliability {0} is above 100")]
    ReliabilityOutOfRange(u8),
    #[error("coordinate {0} is not a valid location")]
    InvalidCoordinates(Coordinates),
}

impl Business {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.x, self.y)
    }

    /// Checks the invariants a record must hold before it is persisted.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found; name and logo are
    /// checked first.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.logo.trim().is_empty() {
            return Err(ValidationError::MissingLogo);
        }
        if !(1.0..=5.0).contains(&self.rating) {
            return Err(ValidationError::RatingOutOfRange(self.rating));
        }
        if self.reliability > 100 {
            return Err(ValidationError::ReliabilityOutOfRange(self.reliability));
        }
        if !self.coordinates().is_valid() {
            return Err(ValidationError::InvalidCoordinates(self.coordinates()));
        }
        Ok(())
    }

    /// Turn-by-turn directions to this partner's coordinate.
    #[must_use]
    pub fn directions_url(&self) -> String {
        format!(
            "https://www.google.com/maps/dir/?api=1&destination={},{}",
            self.x, self.y
        )
    }

    /// Chat link for the partner's WhatsApp number, when one is set.
    #[must_use]
    pub fn whatsapp_url(&self) -> Option<String> {
        self.whatsapp
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| format!("https://wa.me/{n}"))
    }
}

/// Client-side id for a newly created partner.
#[must_use]
pub fn generate_partner_id(now: DateTime<Utc>) -> String {
    format!("CH-{}", now.timestamp_millis())
}

/// Landing-page imagery. A singleton in the store and the local cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandingConfig {
    pub hero_image: String,
    pub ad_banner_image: String,
}

impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            hero_image: "https://images.unsplash.com/photo-1581091226825-a6a2a5aee158?auto=format&fit=crop&w=1200&q=80".to_string(),
            ad_banner_image: "https://images.unsplash.com/photo-1565514020179-026b92b84bb6?auto=format&fit=crop&w=1200&q=80".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PartnersFile {
    pub partners: Vec<Business>,
}

/// Load and validate a seed file of partners.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_partners(path: &Path) -> Result<PartnersFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PartnersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let partners_file: PartnersFile = serde_yaml::from_str(&content)?;
    validate_partners(&partners_file)?;

    Ok(partners_file)
}

fn validate_partners(partners_file: &PartnersFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for partner in &partners_file.partners {
        if partner.id.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "partner '{}' has an empty id",
                partner.name
            )));
        }

        partner.validate().map_err(|e| {
            ConfigError::Validation(format!("partner '{}': {e}", partner.id))
        })?;

        if !seen_ids.insert(partner.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate partner id: '{}'",
                partner.id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "partners_test.rs"]
mod tests;
