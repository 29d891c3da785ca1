//! Persisted record types
//!
//! Shapes stored as JSON text in the key-value store. Field names follow the
//! stored format so records written by earlier clients keep loading.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name used for a favorite whose observation carries no taxon.
pub const UNKNOWN_SPECIES: &str = "Inconnu";

/// Category stamped on every discovery log entry.
pub const PLANT_CATEGORY: &str = "Plantae";

// == Position ==
/// Last known user position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Map center used before any fix is known.
    pub fn default_center() -> Self {
        Self::new(46.603354, 1.888334)
    }

    /// Returns true when both coordinates are finite and in range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

// == Observation ==
/// Sighting record returned by the observation search API.
///
/// Unknown fields are kept in `extra` so the cached results round-trip
/// without losing anything the API sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxon: Option<Taxon>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_guess: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geojson: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxon {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_common_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Observation {
    /// Common name when known, scientific name otherwise.
    pub fn display_name(&self) -> String {
        match &self.taxon {
            Some(taxon) => match taxon.preferred_common_name.as_deref() {
                Some(common) if !common.is_empty() => common.to_string(),
                _ => taxon.name.clone(),
            },
            None => UNKNOWN_SPECIES.to_string(),
        }
    }

    /// URL of the first photo, or an empty string.
    pub fn first_photo_url(&self) -> String {
        self.photos
            .first()
            .map(|photo| photo.url.clone())
            .unwrap_or_default()
    }
}

// == Favorite ==
/// A starred observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: u64,
    pub nom: String,
    #[serde(default)]
    pub image: String,
}

impl From<&Observation> for Favorite {
    fn from(observation: &Observation) -> Self {
        Self {
            id: observation.id,
            nom: observation.display_name(),
            image: observation.first_photo_url(),
        }
    }
}

// == Discovery Entry ==
/// One identified plant in the discovery log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryEntry {
    /// Creation timestamp in milliseconds, doubles as the image key
    pub id: u64,
    pub nom: String,
    pub nom_sci: String,
    pub has_image: bool,
    pub categorie: String,
    /// Local date, dd/mm/yyyy
    pub date: String,
}
