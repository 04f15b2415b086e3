//! HTTP client for the Gemini `generateContent` REST endpoint.

use std::sync::LazyLock;
use std::time::Duration;

use radar_core::Coordinates;
use regex::Regex;
use reqwest::{Client, Url};

use crate::error::GeocodeError;
use crate::types::{
    GenerateRequest, GenerateResponse, GenerationConfig, LatLng, LatLngAnswer, RetrievalConfig,
    Tool, ToolConfig,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";

static ANSWER_PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[?(-?\d+\.\d+),\s*(-?\d+\.\d+)\]?").expect("valid coordinate pair regex")
});

/// First `lat, lng` pair (optionally bracketed) in free model text.
pub(crate) fn parse_coordinate_pair(text: &str) -> Option<Coordinates> {
    let caps = ANSWER_PAIR_RE.captures(text)?;
    let lat = caps.get(1)?.as_str().parse().ok()?;
    let lng = caps.get(2)?.as_str().parse().ok()?;
    Some(Coordinates::new(lat, lng))
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl GeminiClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, GeocodeError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`GeocodeError::InvalidUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("radar/0.1 (partner-directory)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| GeocodeError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Asks `model`, with the maps grounding tool biased towards `near`, for
    /// the entrance coordinate of `query`.
    ///
    /// Returns `Ok(None)` when the model answers without a coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request fails or the API rejects it.
    pub async fn grounded_lookup(
        &self,
        model: &str,
        query: &str,
        near: Coordinates,
    ) -> Result<Option<Coordinates>, GeocodeError> {
        let prompt = format!(
            "Find the PRECISE entrance coordinates for the specific building number: \"{query}\".\n\
             Do NOT return the street center when a building number is given; return the exact \
             point of that number.\n\
             FORMAT: [lat, lng]"
        );
        let mut request = GenerateRequest::prompt(prompt);
        request.tools = vec![Tool {
            google_maps: serde_json::json!({}),
        }];
        request.tool_config = Some(ToolConfig {
            retrieval_config: RetrievalConfig {
                lat_lng: LatLng {
                    latitude: near.lat,
                    longitude: near.lng,
                },
            },
        });

        let text = self.generate(model, &request).await?;
        Ok(parse_coordinate_pair(&text))
    }

    /// Asks `model` in JSON mode for `{"lat": .., "lng": ..}`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Deserialize`] if the answer is not that shape,
    /// or any request error.
    pub async fn json_lookup(&self, model: &str, query: &str) -> Result<Coordinates, GeocodeError> {
        let prompt = format!("Exact coordinates for \"{query}\". JSON only: {{\"lat\": 0, \"lng\": 0}}");
        let mut request = GenerateRequest::prompt(prompt);
        request.generation_config = Some(GenerationConfig {
            response_mime_type: "application/json".to_owned(),
        });

        let text = self.generate(model, &request).await?;
        let answer: LatLngAnswer = serde_json::from_str(text.trim())?;
        Ok(Coordinates::new(answer.lat, answer.lng))
    }

    fn endpoint(&self, model: &str) -> Result<Url, GeocodeError> {
        let relative = format!("v1beta/models/{model}:generateContent");
        self.base_url
            .join(&relative)
            .map_err(|e| GeocodeError::InvalidUrl {
                url: relative,
                reason: e.to_string(),
            })
    }

    async fn generate(&self, model: &str, request: &GenerateRequest) -> Result<String, GeocodeError> {
        let url = self.endpoint(model)?;
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("error")
                        .and_then(|e| e.get("message"))
                        .and_then(serde_json::Value::as_str)
                        .map(str::to_owned)
                })
                .unwrap_or(body);
            return Err(GeocodeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)?;
        parsed.text().ok_or(GeocodeError::EmptyResponse)
    }
}
