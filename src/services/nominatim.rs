//! Nominatim geocoding client

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::types::Coordinates;

/// Nominatim search result
#[derive(Debug, Deserialize)]
pub struct NominatimResult {
    pub lat: String,
    pub lon: String,
}

/// Nominatim geocoding client
pub struct NominatimClient {
    base_url: String,
    client: reqwest::Client,
}

impl NominatimClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("courier-planner/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn search_url(&self, address: &str) -> String {
        format!(
            "{}/search?q={}&format=json&countrycodes=in&limit=1",
            self.base_url,
            urlencoding::encode(address)
        )
    }

    /// Geocode a free-form address
    pub async fn geocode(&self, address: &str) -> Result<Option<Coordinates>> {
        let response = self
            .client
            .get(self.search_url(address))
            .send()
            .await
            .context("Failed to send geocoding request")?;

        if !response.status().is_success() {
            anyhow::bail!("Nominatim answered {}", response.status());
        }

        let results: Vec<NominatimResult> = response
            .json()
            .await
            .context("Failed to parse geocoding response")?;

        match results.first() {
            Some(result) => {
                let lat: f64 = result.lat.parse().context("Invalid latitude")?;
                let lng: f64 = result.lon.parse().context("Invalid longitude")?;
                Ok(Some(Coordinates { lat, lng }))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_the_address() {
        let client = NominatimClient::new("https://nominatim.example.org/").unwrap();
        let url = client.search_url("Near Vastrapur Lake, Ahmedabad");
        assert_eq!(
            url,
            "https://nominatim.example.org/search?q=Near%20Vastrapur%20Lake%2C%20Ahmedabad&format=json&countrycodes=in&limit=1"
        );
    }

    #[test]
    fn parses_search_results() {
        let body = r#"[{"lat": "23.0395", "lon": "72.5293", "display_name": "Vastrapur"}]"#;
        let results: Vec<NominatimResult> = serde_json::from_str(body).unwrap();
        assert_eq!(results[0].lat, "23.0395");
    }

    // Needs network access to the public instance
    #[tokio::test]
    #[ignore]
    async fn geocodes_known_landmark() {
        let client = NominatimClient::new("https://nominatim.openstreetmap.org").unwrap();
        let coords = client
            .geocode("Vastrapur Lake, Ahmedabad")
            .await
            .unwrap()
            .unwrap();
        assert!((coords.lat - 23.04).abs() < 0.1);
        assert!((coords.lng - 72.53).abs() < 0.1);
    }
}
