//! Geocoding tool backed by the Open-Meteo geocoding API

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{GEOCODE_TOOL, Tool, ToolError, check_status, str_arg};
use crate::schema::{Field, Shape};

/// Resolves free-text locations to coordinates
pub struct GeocodeTool {
    http: Client,
    base_url: String,
}

/// Geocoding response from `OpenMeteo`
#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    admin1: Option<String>,
}

/// What the model sees after a geocoding call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodedPlace {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: Option<String>,
    pub admin1: Option<String>,
}

impl From<GeocodingResult> for GeocodedPlace {
    fn from(result: GeocodingResult) -> Self {
        Self {
            name: result.name,
            latitude: result.latitude,
            longitude: result.longitude,
            country: result.country,
            admin1: result.admin1,
        }
    }
}

impl GeocodeTool {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn search(&self, name: &str) -> Result<Vec<GeocodingResult>, ToolError> {
        let url = format!(
            "{}/search?name={}&count=5&language=en&format=json",
            self.base_url,
            urlencoding::encode(name)
        );
        debug!("OpenMeteo geocoding request URL: {}", url);

        let response = check_status(self.http.get(url).send().await?).await?;
        let parsed: GeocodingResponse = response.json().await?;
        Ok(parsed.results.unwrap_or_default())
    }

    /// Geocode `location`, retrying with the first comma segment when the
    /// full text matches nothing
    pub async fn geocode(&self, location: &str) -> Result<GeocodedPlace, ToolError> {
        let results = self.search(location).await?;
        if let Some(first) = results.into_iter().next() {
            return Ok(first.into());
        }

        let Some((head, qualifier)) = location.split_once(',') else {
            return Err(ToolError::NotFound(format!("Location not found: {location}")));
        };
        debug!("No match for '{}', retrying with '{}'", location, head.trim());
        let results = self.search(head.trim()).await?;
        pick_best(results, qualifier)
            .map(GeocodedPlace::from)
            .ok_or_else(|| ToolError::NotFound(format!("Location not found: {location}")))
    }
}

/// Prefer the candidate whose country or region matches `qualifier`
fn pick_best(results: Vec<GeocodingResult>, qualifier: &str) -> Option<GeocodingResult> {
    let wanted = qualifier.trim().to_lowercase();
    let matches = |field: &Option<String>| {
        field
            .as_deref()
            .is_some_and(|value| !wanted.is_empty() && value.to_lowercase() == wanted)
    };
    results
        .iter()
        .find(|r| matches(&r.country) || matches(&r.admin1))
        .cloned()
        .or_else(|| results.into_iter().next())
}

#[async_trait]
impl Tool for GeocodeTool {
    fn name(&self) -> &str {
        GEOCODE_TOOL
    }

    fn description(&self) -> &str {
        "Look up the coordinates, region and country of a place name such as a city."
    }

    fn parameters(&self) -> Shape {
        Shape::object([Field::required("location", Shape::NonEmptyString)
            .describe("Place to look up, e.g. \"Paris, France\"")])
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let location = str_arg(&args, "location")?;
        let place = self.geocode(location).await?;
        info!(
            "Geocoded '{}' to {} ({:.4}, {:.4})",
            location, place.name, place.latitude, place.longitude
        );
        Ok(serde_json::to_value(place)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, country: &str, admin1: &str) -> GeocodingResult {
        GeocodingResult {
            name: name.to_string(),
            latitude: 0.0,
            longitude: 0.0,
            country: Some(country.to_string()),
            admin1: Some(admin1.to_string()),
        }
    }

    #[test]
    fn test_pick_best_prefers_matching_country() {
        let results = vec![
            result("Paris", "United States", "Texas"),
            result("Paris", "France", "Ile-de-France"),
        ];
        let best = pick_best(results, " France").unwrap();
        assert_eq!(best.country.as_deref(), Some("France"));
    }

    #[test]
    fn test_pick_best_matches_region() {
        let results = vec![
            result("Springfield", "United States", "Missouri"),
            result("Springfield", "United States", "Illinois"),
        ];
        let best = pick_best(results, "illinois").unwrap();
        assert_eq!(best.admin1.as_deref(), Some("Illinois"));
    }

    #[test]
    fn test_pick_best_falls_back_to_first() {
        let results = vec![result("Paris", "United States", "Texas")];
        let best = pick_best(results, "Nowhere").unwrap();
        assert_eq!(best.admin1.as_deref(), Some("Texas"));
        assert!(pick_best(Vec::new(), "France").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"results":[{"id":2988507,"name":"Paris","latitude":48.85341,"longitude":2.3488,
            "country":"France","admin1":"Île-de-France","timezone":"Europe/Paris"}]}"#;
        let parsed: GeocodingResponse = serde_json::from_str(body).unwrap();
        let place: GeocodedPlace = parsed.results.unwrap().remove(0).into();
        assert_eq!(place.name, "Paris");
        assert_eq!(place.admin1.as_deref(), Some("Île-de-France"));

        let empty: GeocodingResponse = serde_json::from_str(r#"{"generationtime_ms":0.5}"#).unwrap();
        assert!(empty.results.is_none());
    }
}
