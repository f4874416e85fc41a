//! Daily temperature and rainfall history from NASA POWER.

use crate::adapters::http::read_json;
use crate::domain::model::Coordinates;
use crate::domain::ports::{ClimateHistory, ClimateSource};
use crate::utils::error::SourceError;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

const TEMPERATURE_PARAMETER: &str = "T2M";
const RAINFALL_PARAMETER: &str = "PRECTOT";
// POWER 以 -999 表示無資料
const FILL_VALUE: f64 = -999.0;
const DATE_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Deserialize)]
struct PowerResponse {
    properties: Option<PowerProperties>,
}

#[derive(Debug, Deserialize)]
struct PowerProperties {
    #[serde(default)]
    parameter: HashMap<String, HashMap<String, f64>>,
}

fn parse_series(raw: Option<&HashMap<String, f64>>) -> Result<BTreeMap<NaiveDate, f64>, SourceError> {
    let mut series = BTreeMap::new();
    for (day, value) in raw.into_iter().flatten() {
        if *value <= FILL_VALUE {
            continue;
        }
        let date = NaiveDate::parse_from_str(day, DATE_FORMAT).map_err(|e| SourceError::Decode {
            message: format!("bad date '{}': {}", day, e),
        })?;
        series.insert(date, *value);
    }
    Ok(series)
}

#[derive(Debug, Clone)]
pub struct NasaPowerClimate {
    client: Client,
    endpoint: String,
}

impl NasaPowerClimate {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ClimateSource for NasaPowerClimate {
    async fn fetch_history(
        &self,
        coords: Coordinates,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ClimateHistory, SourceError> {
        tracing::debug!("Fetching climate history for {} from {} to {}", coords, start, end);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                (
                    "parameters",
                    format!("{},{}", TEMPERATURE_PARAMETER, RAINFALL_PARAMETER),
                ),
                ("community", "ag".to_string()),
                ("longitude", coords.longitude.to_string()),
                ("latitude", coords.latitude.to_string()),
                ("start", start.format(DATE_FORMAT).to_string()),
                ("end", end.format(DATE_FORMAT).to_string()),
                ("format", "JSON".to_string()),
            ])
            .send()
            .await?;

        let body: PowerResponse = read_json(response).await?;
        let parameters = body
            .properties
            .ok_or_else(|| SourceError::missing("properties"))?
            .parameter;

        let history = ClimateHistory {
            temperature: parse_series(parameters.get(TEMPERATURE_PARAMETER))?,
            rainfall: parse_series(parameters.get(RAINFALL_PARAMETER))?,
        };

        if history.days() == 0 {
            return Err(SourceError::missing("properties.parameter"));
        }

        tracing::debug!("Climate history covers {} days", history.days());
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_fetch_history_skips_fill_values() {
        let server = MockServer::start();
        let power_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/daily/point")
                .query_param("parameters", "T2M,PRECTOT")
                .query_param("community", "ag")
                .query_param("start", "20240101")
                .query_param("end", "20240103")
                .query_param("format", "JSON");
            then.status(200).json_body(serde_json::json!({
                "properties": {
                    "parameter": {
                        "T2M": {"20240101": 26.0, "20240102": 28.0, "20240103": -999.0},
                        "PRECTOT": {"20240101": 0.0, "20240102": 4.5, "20240103": 1.5}
                    }
                }
            }));
        });

        let climate = NasaPowerClimate::new(Client::new(), server.url("/daily/point"));
        let history = climate
            .fetch_history(
                Coordinates::new(7.3775, 3.9470),
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            )
            .await
            .unwrap();

        power_mock.assert();
        assert_eq!(history.temperature.len(), 2);
        assert_eq!(history.mean_temperature(), Some(27.0));
        assert_eq!(history.total_rainfall(), Some(6.0));
        assert_eq!(history.days(), 3);
    }

    #[tokio::test]
    async fn test_empty_parameters_is_missing_field() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/daily/point");
            then.status(200)
                .json_body(serde_json::json!({"properties": {"parameter": {}}}));
        });

        let climate = NasaPowerClimate::new(Client::new(), server.url("/daily/point"));
        let err = climate
            .fetch_history(
                Coordinates::new(0.0, 0.0),
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::MissingField { .. }));
    }
}
