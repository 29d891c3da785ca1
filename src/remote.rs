//! Remote species APIs
//!
//! Thin clients for the observation search and the plant identification
//! services. Both are consumed as opaque JSON; only the fields the app shows
//! are read.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::Observation;

/// Results requested per search.
pub const MAX_RESULTS: u32 = 50;

/// Identification candidates kept, best first.
pub const MAX_CANDIDATES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: u32,
    pub taxon: Option<String>,
}

/// One ranked identification result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Confidence in percent, one decimal
    pub score: f64,
    pub nom: String,
    pub nom_sci: String,
}

// == Species API Trait ==
#[async_trait]
pub trait SpeciesApi: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Observation>>;
    async fn identify(&self, jpeg: Vec<u8>) -> Result<Vec<Candidate>>;
}

// == Wire Types ==
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct IdentifyResponse {
    #[serde(default)]
    results: Vec<IdentifyResult>,
}

#[derive(Debug, Deserialize)]
struct IdentifyResult {
    score: f64,
    species: IdentifiedSpecies,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentifiedSpecies {
    scientific_name_without_author: String,
    #[serde(default)]
    common_names: Vec<String>,
}

fn candidates_from(response: IdentifyResponse) -> Vec<Candidate> {
    response
        .results
        .into_iter()
        .take(MAX_CANDIDATES)
        .map(|result| {
            let nom_sci = result.species.scientific_name_without_author;
            let nom = result
                .species
                .common_names
                .into_iter()
                .next()
                .unwrap_or_else(|| nom_sci.clone());
            Candidate {
                score: (result.score * 1000.0).round() / 10.0,
                nom,
                nom_sci,
            }
        })
        .collect()
}

// == HTTP Client ==
pub struct HttpSpeciesApi {
    client: reqwest::Client,
    observations_url: String,
    plantnet_url: String,
    plantnet_api_key: String,
}

impl HttpSpeciesApi {
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout))
            .build()
            .map_err(|e| AppError::Internal(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            observations_url: config.observations_url.clone(),
            plantnet_url: config.plantnet_url.clone(),
            plantnet_api_key: config.plantnet_api_key.clone(),
        })
    }
}

fn upstream(context: &str, e: impl std::fmt::Display) -> AppError {
    error!("{} failed: {}", context, e);
    AppError::Upstream(format!("{}: {}", context, e))
}

#[async_trait]
impl SpeciesApi for HttpSpeciesApi {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Observation>> {
        let mut params = vec![
            ("lat", query.lat.to_string()),
            ("lng", query.lng.to_string()),
            ("radius", query.radius_km.to_string()),
            ("photos", "true".to_string()),
            ("per_page", MAX_RESULTS.to_string()),
        ];
        if let Some(taxon) = &query.taxon {
            params.push(("iconic_taxa", taxon.clone()));
        }

        let response = self
            .client
            .get(&self.observations_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| upstream("observation search", e))?;
        if !response.status().is_success() {
            return Err(upstream("observation search", format!("HTTP {}", response.status())));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| upstream("observation search", e))?;
        info!("Observation search returned {} results", body.results.len());
        Ok(body.results)
    }

    async fn identify(&self, jpeg: Vec<u8>) -> Result<Vec<Candidate>> {
        let part = Part::bytes(jpeg)
            .file_name("photo.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let form = Form::new().part("images", part).text("organs", "auto");

        let response = self
            .client
            .post(&self.plantnet_url)
            .query(&[("api-key", &self.plantnet_api_key)])
            .multipart(form)
            .send()
            .await
            .map_err(|e| upstream("plant identification", e))?;
        if !response.status().is_success() {
            return Err(upstream("plant identification", format!("HTTP {}", response.status())));
        }

        let body: IdentifyResponse = response
            .json()
            .await
            .map_err(|e| upstream("plant identification", e))?;
        Ok(candidates_from(body))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_ranked_and_truncated() {
        let body: IdentifyResponse = serde_json::from_str(
            r#"{"results":[
                {"score":0.91234,"species":{"scientificNameWithoutAuthor":"Bellis perennis","commonNames":["Pâquerette","Petite marguerite"]}},
                {"score":0.05,"species":{"scientificNameWithoutAuthor":"Leucanthemum vulgare","commonNames":[]}},
                {"score":0.02,"species":{"scientificNameWithoutAuthor":"Anthemis arvensis"}},
                {"score":0.01,"species":{"scientificNameWithoutAuthor":"Matricaria chamomilla"}}
            ]}"#,
        )
        .unwrap();

        let candidates = candidates_from(body);

        assert_eq!(candidates.len(), MAX_CANDIDATES);
        assert_eq!(candidates[0].nom, "Pâquerette");
        assert_eq!(candidates[0].nom_sci, "Bellis perennis");
        assert!((candidates[0].score - 91.2).abs() < 1e-9);
        // No common name: the scientific name stands in
        assert_eq!(candidates[1].nom, "Leucanthemum vulgare");
        assert_eq!(candidates[2].nom, "Anthemis arvensis");
    }

    #[test]
    fn test_empty_identification() {
        let body: IdentifyResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(candidates_from(body).is_empty());
    }

    #[test]
    fn test_search_response_parses_results() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"total_results":1,"results":[{"id":9,"taxon":{"name":"Turdus merula","preferred_common_name":"Merle noir"},"photos":[]}]}"#,
        )
        .unwrap();
        assert_eq!(body.results.len(), 1);
        assert_eq!(body.results[0].display_name(), "Merle noir");
    }
}
