//! Free text to coordinate resolution that always yields a coordinate.
//!
//! Stages, first hit wins:
//! 1. coordinates embedded in a pasted map link;
//! 2. grounded model lookup (an answer without a coordinate falls straight
//!    through to the home coordinate);
//! 3. JSON-mode model lookup, only when stage 2 errored;
//! 4. the configured home coordinate.

use radar_core::Coordinates;

use crate::client::GeminiClient;
use crate::links::coordinates_from_link;

#[derive(Debug, Clone)]
pub struct GeocoderSettings {
    pub model: String,
    pub fallback_model: String,
    /// Appended to every model query, e.g. `"San Luis Potosí, México"`.
    pub region: String,
    pub home: Coordinates,
}

/// Which stage produced a [`Resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedBy {
    Link,
    Grounded,
    Fallback,
    Home,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub coordinates: Coordinates,
    pub resolved_by: ResolvedBy,
}

pub struct Geocoder {
    client: Option<GeminiClient>,
    settings: GeocoderSettings,
}

impl Geocoder {
    /// `client` is optional; without one only link shortcuts and the home
    /// coordinate are available.
    #[must_use]
    pub fn new(client: Option<GeminiClient>, settings: GeocoderSettings) -> Self {
        Self { client, settings }
    }

    #[must_use]
    pub fn home(&self) -> Coordinates {
        self.settings.home
    }

    /// Resolves `input` to a coordinate. Never fails.
    pub async fn resolve(&self, input: &str) -> Coordinates {
        self.resolve_detailed(input).await.coordinates
    }

    /// Like [`Geocoder::resolve`], also reporting which stage answered.
    pub async fn resolve_detailed(&self, input: &str) -> Resolution {
        let input = input.trim();
        if let Some(coordinates) = coordinates_from_link(input).filter(Coordinates::is_valid) {
            tracing::debug!(%coordinates, "coordinate taken from map link");
            return Resolution {
                coordinates,
                resolved_by: ResolvedBy::Link,
            };
        }

        if let (Some(client), false) = (&self.client, input.is_empty()) {
            let query = self.query_for(input);
            if let Some(resolution) = self.model_stages(client, &query).await {
                return resolution;
            }
        }

        Resolution {
            coordinates: self.settings.home,
            resolved_by: ResolvedBy::Home,
        }
    }

    fn query_for(&self, input: &str) -> String {
        if self.settings.region.trim().is_empty() {
            input.to_owned()
        } else {
            format!("{input}, {}", self.settings.region)
        }
    }

    async fn model_stages(&self, client: &GeminiClient, query: &str) -> Option<Resolution> {
        match client
            .grounded_lookup(&self.settings.model, query, self.settings.home)
            .await
        {
            Ok(Some(coordinates)) if coordinates.is_valid() => {
                tracing::info!(%coordinates, query, "location calibrated");
                Some(Resolution {
                    coordinates,
                    resolved_by: ResolvedBy::Grounded,
                })
            }
            Ok(_) => {
                tracing::warn!(query, "grounded lookup returned no usable coordinate");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, query, "grounded lookup failed, trying fallback model");
                match client.json_lookup(&self.settings.fallback_model, query).await {
                    Ok(coordinates) if coordinates.is_valid() => Some(Resolution {
                        coordinates,
                        resolved_by: ResolvedBy::Fallback,
                    }),
                    Ok(coordinates) => {
                        tracing::warn!(%coordinates, query, "fallback model returned an invalid coordinate");
                        None
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, query, "fallback lookup failed");
                        None
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(region: &str) -> GeocoderSettings {
        GeocoderSettings {
            model: "m".to_owned(),
            fallback_model: "f".to_owned(),
            region: region.to_owned(),
            home: Coordinates::new(22.1567, -100.9855),
        }
    }

    #[tokio::test]
    async fn link_shortcut_needs_no_client() {
        let geocoder = Geocoder::new(None, settings("SLP"));
        let r = geocoder
            .resolve_detailed("https://maps.google.com/@22.2,-100.8,15z")
            .await;
        assert_eq!(r.resolved_by, ResolvedBy::Link);
        assert_eq!(r.coordinates, Coordinates::new(22.2, -100.8));
    }

    #[tokio::test]
    async fn without_client_falls_back_to_home() {
        let geocoder = Geocoder::new(None, settings("SLP"));
        let r = geocoder.resolve_detailed("Lanzagorta 330").await;
        assert_eq!(r.resolved_by, ResolvedBy::Home);
        assert_eq!(r.coordinates, geocoder.home());
    }

    #[tokio::test]
    async fn out_of_range_link_is_ignored() {
        let geocoder = Geocoder::new(None, settings("SLP"));
        let r = geocoder.resolve_detailed("@95.0,-100.0").await;
        assert_eq!(r.resolved_by, ResolvedBy::Home);
    }

    #[test]
    fn query_appends_region() {
        let geocoder = Geocoder::new(None, settings("San Luis Potosí, México"));
        assert_eq!(
            geocoder.query_for("Lanzagorta 330"),
            "Lanzagorta 330, San Luis Potosí, México"
        );
        let bare = Geocoder::new(None, settings(" "));
        assert_eq!(bare.query_for("Lanzagorta 330"), "Lanzagorta 330");
    }
}
