//! Current conditions from an OpenWeatherMap-compatible endpoint.
//!
//! Failures are strict: transport errors, non-2xx statuses and a missing
//! `main.temp` / `main.humidity` all come back as a `SourceError` carrying
//! the cause. Missing `rain.1h` is not an error; rainfall defaults to 0.0.

use crate::adapters::http::read_json;
use crate::domain::model::{Coordinates, WeatherSample};
use crate::domain::ports::WeatherSource;
use crate::utils::error::SourceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    main: Option<MainBlock>,
    rain: Option<RainBlock>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RainBlock {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

impl CurrentWeather {
    fn into_sample(self) -> Result<WeatherSample, SourceError> {
        let main = self.main.ok_or_else(|| SourceError::missing("main"))?;
        let temperature = main.temp.ok_or_else(|| SourceError::missing("main.temp"))?;
        let humidity = main
            .humidity
            .ok_or_else(|| SourceError::missing("main.humidity"))?;
        let rainfall = self.rain.and_then(|r| r.one_hour).unwrap_or(0.0);

        Ok(WeatherSample {
            temperature,
            humidity,
            rainfall,
        })
    }
}

#[derive(Debug, Clone)]
pub struct OpenWeatherMap {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl OpenWeatherMap {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherMap {
    async fn fetch_current(&self, coords: Coordinates) -> Result<WeatherSample, SourceError> {
        tracing::debug!("Fetching current weather for {}", coords);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?;

        let body: CurrentWeather = read_json(response).await?;
        let sample = body.into_sample()?;

        tracing::debug!(
            "Weather: {:.1}°C, {:.0}% humidity, {:.1}mm rain",
            sample.temperature,
            sample.humidity,
            sample.rainfall
        );
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn provider(server: &MockServer) -> OpenWeatherMap {
        OpenWeatherMap::new(Client::new(), server.url("/weather"), "test-key")
    }

    #[tokio::test]
    async fn test_missing_rain_defaults_to_zero() {
        let server = MockServer::start();
        let weather_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/weather")
                .query_param("lat", "7.3775")
                .query_param("lon", "3.947")
                .query_param("appid", "test-key")
                .query_param("units", "metric");
            then.status(200)
                .json_body(serde_json::json!({"main": {"temp": 27.0, "humidity": 65}}));
        });

        let sample = provider(&server)
            .fetch_current(Coordinates::new(7.3775, 3.9470))
            .await
            .unwrap();

        weather_mock.assert();
        assert_eq!(sample.temperature, 27.0);
        assert_eq!(sample.humidity, 65.0);
        assert_eq!(sample.rainfall, 0.0);
    }

    #[tokio::test]
    async fn test_rain_one_hour_is_used() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/weather");
            then.status(200).json_body(serde_json::json!({
                "main": {"temp": 30.0, "humidity": 80},
                "rain": {"1h": 2.5}
            }));
        });

        let sample = provider(&server)
            .fetch_current(Coordinates::new(6.45, 3.39))
            .await
            .unwrap();
        assert_eq!(sample.rainfall, 2.5);
    }

    #[tokio::test]
    async fn test_rain_without_one_hour_window_defaults_to_zero() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/weather");
            then.status(200).json_body(serde_json::json!({
                "main": {"temp": 30.0, "humidity": 80},
                "rain": {"3h": 7.0}
            }));
        });

        let sample = provider(&server)
            .fetch_current(Coordinates::new(6.45, 3.39))
            .await
            .unwrap();
        assert_eq!(sample.rainfall, 0.0);
    }

    #[tokio::test]
    async fn test_missing_humidity_is_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/weather");
            then.status(200)
                .json_body(serde_json::json!({"main": {"temp": 30.0}}));
        });

        let err = provider(&server)
            .fetch_current(Coordinates::new(6.45, 3.39))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::MissingField { ref field } if field == "main.humidity"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/weather");
            then.status(401)
                .json_body(serde_json::json!({"cod": 401, "message": "Invalid API key"}));
        });

        let err = provider(&server)
            .fetch_current(Coordinates::new(6.45, 3.39))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Status { status: 401 }));
    }

    #[tokio::test]
    async fn test_transport_failure_does_not_leak_api_key() {
        let unreachable = OpenWeatherMap::new(Client::new(), "http://127.0.0.1:1/weather", "test-key");

        let err = unreachable
            .fetch_current(Coordinates::new(6.45, 3.39))
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Transport(_)));
        assert!(!err.to_string().contains("test-key"));
        assert!(!format!("{:?}", err).contains("test-key"));
    }
}
