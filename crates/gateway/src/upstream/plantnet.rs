//! Pl@ntNet species identification client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use fg_domain::config::PlantNetConfig;
use fg_domain::error::{Error, Result};

use super::{from_reqwest, status_error};

const PROVIDER: &str = "plantnet";

/// An uploaded image forwarded to the provider.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesMatch {
    pub scientific_name: String,
    pub common_names: Vec<String>,
    pub family: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identification {
    pub species: SpeciesMatch,
    /// Confidence as a whole percentage.
    pub score: u32,
}

// ── Wire format ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    results: Vec<WireResult>,
}

#[derive(Debug, Deserialize)]
struct WireResult {
    #[serde(default)]
    score: f64,
    #[serde(default)]
    species: Option<WireSpecies>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSpecies {
    #[serde(default)]
    scientific_name_without_author: String,
    #[serde(default)]
    common_names: Vec<String>,
    #[serde(default)]
    family: Option<WireFamily>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFamily {
    #[serde(default)]
    scientific_name_without_author: String,
}

impl From<WireResult> for Identification {
    fn from(r: WireResult) -> Self {
        let species = r.species.unwrap_or(WireSpecies {
            scientific_name_without_author: String::new(),
            common_names: Vec::new(),
            family: None,
        });
        Identification {
            species: SpeciesMatch {
                scientific_name: species.scientific_name_without_author,
                common_names: species.common_names,
                family: species
                    .family
                    .map(|f| f.scientific_name_without_author)
                    .unwrap_or_default(),
            },
            score: (r.score.clamp(0.0, 1.0) * 100.0).round() as u32,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct PlantNetClient {
    base_url: String,
    api_key: Option<String>,
    max_results: u32,
    lang: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl PlantNetClient {
    pub fn new(cfg: &PlantNetConfig, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder().build().map_err(from_reqwest)?;
        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key,
            max_results: cfg.max_results,
            lang: cfg.lang.clone(),
            timeout: Duration::from_millis(cfg.timeout_ms),
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Identify the plant in `image`.  `organs` is one of `auto`, `leaf`,
    /// `flower`, `fruit` or `bark`.
    pub async fn identify(&self, image: ImageUpload, organs: &str) -> Result<Vec<Identification>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("PlantNet API key is not configured".into()))?;

        let part = reqwest::multipart::Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.mime_type)
            .map_err(from_reqwest)?;
        let form = reqwest::multipart::Form::new()
            .part("images", part)
            .text("organs", organs.to_owned());

        let nb_results = self.max_results.to_string();
        let url = format!("{}/v2/identify/all", self.base_url);

        tracing::debug!(organs, "plantnet request");

        let resp = self
            .client
            .post(&url)
            .query(&[
                ("include-related-images", "false"),
                ("no-reject", "false"),
                ("nb-results", nb_results.as_str()),
                ("lang", self.lang.as_str()),
                ("api-key", api_key),
            ])
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        let text = resp.text().await.map_err(from_reqwest)?;
        if !status.is_success() {
            return Err(status_error(PROVIDER, status, &text));
        }

        parse_response(&text)
    }
}

fn parse_response(text: &str) -> Result<Vec<Identification>> {
    let wire: WireResponse = serde_json::from_str(text)?;
    Ok(wire.results.into_iter().map(Identification::from).collect())
}
