//! Request DTOs for the companion API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for POST /api/search
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub lat: f64,
    pub lng: f64,
    /// Search radius in kilometres (keeps the current one if omitted)
    #[serde(default)]
    pub radius: Option<u32>,
    /// Iconic taxon filter, e.g. "Aves"; empty string clears it
    #[serde(default)]
    pub taxon: Option<String>,
}

impl SearchRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lng) {
            return Some("Coordinates out of range".to_string());
        }
        if self.radius == Some(0) {
            return Some("Radius must be at least 1 km".to_string());
        }
        None
    }
}

/// Request body for POST /api/favorites/toggle
#[derive(Debug, Clone, Deserialize)]
pub struct ToggleFavoriteRequest {
    pub id: u64,
}

/// Request body for POST /api/discoveries
#[derive(Debug, Clone, Deserialize)]
pub struct AddDiscoveryRequest {
    pub nom: String,
    #[serde(alias = "nomSci")]
    pub nom_sci: String,
    /// Photo as a data URL
    #[serde(default)]
    pub image: Option<String>,
}

impl AddDiscoveryRequest {
    pub fn validate(&self) -> Option<String> {
        if self.nom_sci.trim().is_empty() {
            return Some("Scientific name cannot be empty".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_deserialize() {
        let req: SearchRequest = serde_json::from_str(r#"{"lat": 48.8, "lng": 2.3}"#).unwrap();
        assert!(req.radius.is_none());
        assert!(req.taxon.is_none());
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_search_request_out_of_range() {
        let req: SearchRequest = serde_json::from_str(r#"{"lat": 120, "lng": 2.3}"#).unwrap();
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_search_request_zero_radius() {
        let req: SearchRequest =
            serde_json::from_str(r#"{"lat": 1, "lng": 2, "radius": 0}"#).unwrap();
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_add_discovery_accepts_camel_case() {
        let req: AddDiscoveryRequest =
            serde_json::from_str(r#"{"nom": "Pâquerette", "nomSci": "Bellis perennis"}"#).unwrap();
        assert_eq!(req.nom_sci, "Bellis perennis");
        assert!(req.image.is_none());
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_add_discovery_empty_name() {
        let req = AddDiscoveryRequest {
            nom: "x".into(),
            nom_sci: "  ".into(),
            image: None,
        };
        assert!(req.validate().is_some());
    }
}
