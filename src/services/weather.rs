use crate::domain::sun::{is_good_conditions, weather_description, UvLevel};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";
const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const MELBOURNE: (f64, f64) = (-37.8136, 144.9631);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Weather {
    pub location: String,
    pub condition: String,
    pub temp: i64,
    pub uv_index: f64,
    pub humidity: i64,
}

impl Weather {
    /// Served when the upstream lookup fails.
    pub fn melbourne_default() -> Self {
        Self {
            location: "Melbourne, Australia".to_string(),
            condition: "Partly Cloudy".to_string(),
            temp: 22,
            uv_index: 5.0,
            humidity: 60,
        }
    }

    pub fn uv_level(&self) -> UvLevel {
        UvLevel::from_index(self.uv_index)
    }

    pub fn is_good_conditions(&self) -> bool {
        is_good_conditions(self.uv_index)
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_for_city(&self, city: &str) -> Result<Weather>;
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeocodeResult {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    current: CurrentConditions,
}

#[derive(Debug, Default, Deserialize)]
struct CurrentConditions {
    temperature_2m: Option<f64>,
    relative_humidity_2m: Option<f64>,
    weather_code: Option<i64>,
    uv_index: Option<f64>,
}

/// Open-Meteo geocoding + forecast. Free, no API key.
#[derive(Clone)]
pub struct OpenMeteoClient {
    http: reqwest::Client,
}

impl OpenMeteoClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build weather http client")?;
        Ok(Self { http })
    }

    async fn geocode(&self, city: &str) -> Result<Option<GeocodeResult>> {
        let resp: GeocodeResponse = self
            .http
            .get(GEOCODING_URL)
            .query(&[("name", city), ("count", "1"), ("language", "en"), ("format", "json")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.results.into_iter().next())
    }

    async fn forecast(&self, lat: f64, lon: f64) -> Result<ForecastResponse> {
        let resp = self
            .http
            .get(FORECAST_URL)
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                (
                    "current",
                    "temperature_2m,relative_humidity_2m,weather_code,uv_index".to_string(),
                ),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp)
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn current_for_city(&self, city: &str) -> Result<Weather> {
        let city = city.trim();
        if city.is_empty() {
            return Err(anyhow!("city is empty"));
        }

        let (lat, lon, location) = match self.geocode(city).await? {
            Some(place) => (place.latitude, place.longitude, place_label(&place)),
            None => {
                tracing::warn!(%city, "city not found by geocoder, using Melbourne");
                (MELBOURNE.0, MELBOURNE.1, "Melbourne, Australia".to_string())
            }
        };

        let forecast = self.forecast(lat, lon).await?;
        Ok(weather_from_current(location, &forecast.current))
    }
}

fn place_label(place: &GeocodeResult) -> String {
    format!("{}, {}", place.name, place.country.as_deref().unwrap_or(""))
        .trim_end_matches([',', ' '])
        .to_string()
}

/// Missing readings fall back to the Melbourne defaults; values are rounded.
fn weather_from_current(location: String, current: &CurrentConditions) -> Weather {
    let fallback = Weather::melbourne_default();
    Weather {
        location,
        condition: weather_description(current.weather_code.unwrap_or(0)).to_string(),
        temp: current
            .temperature_2m
            .map(|t| t.round() as i64)
            .unwrap_or(fallback.temp),
        uv_index: current.uv_index.map(f64::round).unwrap_or(fallback.uv_index),
        humidity: current
            .relative_humidity_2m
            .map(|h| h.round() as i64)
            .unwrap_or(fallback.humidity),
    }
}

/// Current weather for `city`, or the Melbourne default when the lookup fails.
pub async fn current_or_default(provider: &dyn WeatherProvider, city: &str) -> Weather {
    match provider.current_for_city(city).await {
        Ok(weather) => weather,
        Err(e) => {
            tracing::warn!(%city, error = %e, "weather lookup failed, serving default");
            Weather::melbourne_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingProvider;

    #[async_trait]
    impl WeatherProvider for FailingProvider {
        async fn current_for_city(&self, _city: &str) -> Result<Weather> {
            Err(anyhow!("offline"))
        }
    }

    #[test]
    fn test_forecast_parsing() {
        let forecast: ForecastResponse = serde_json::from_value(serde_json::json!({
            "current": {
                "temperature_2m": 18.6,
                "relative_humidity_2m": 71.2,
                "weather_code": 3,
                "uv_index": 6.55
            }
        }))
        .unwrap();
        let weather = weather_from_current("Hobart, Australia".into(), &forecast.current);
        assert_eq!(weather.temp, 19);
        assert_eq!(weather.humidity, 71);
        assert_eq!(weather.condition, "Overcast");
        assert_eq!(weather.uv_index, 7.0);
        assert!(weather.is_good_conditions());
        assert_eq!(weather.uv_level(), UvLevel::High);
    }

    #[test]
    fn test_forecast_missing_fields() {
        let forecast: ForecastResponse = serde_json::from_str("{}").unwrap();
        let weather = weather_from_current("Somewhere".into(), &forecast.current);
        assert_eq!(weather.temp, 22);
        assert_eq!(weather.uv_index, 5.0);
        assert_eq!(weather.condition, "Clear Sky");
    }

    #[test]
    fn test_place_label() {
        let place = GeocodeResult {
            name: "Darwin".into(),
            latitude: -12.46,
            longitude: 130.84,
            country: None,
        };
        assert_eq!(place_label(&place), "Darwin");
        let place = GeocodeResult {
            country: Some("Australia".into()),
            ..place
        };
        assert_eq!(place_label(&place), "Darwin, Australia");
    }

    #[tokio::test]
    async fn test_default_on_failure() {
        let weather = current_or_default(&FailingProvider, "Perth").await;
        assert_eq!(weather, Weather::melbourne_default());
    }
}
