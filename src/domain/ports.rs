use crate::domain::model::{ClimateSummary, Coordinates, SoilSample, WeatherSample};
use crate::utils::error::{Result, SourceError};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `None` covers both "no match" and transport failures.
    async fn resolve(&self, address: &str) -> Option<Coordinates>;
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_current(
        &self,
        coords: Coordinates,
    ) -> std::result::Result<WeatherSample, SourceError>;
}

#[async_trait]
pub trait SoilSource: Send + Sync {
    async fn fetch_ph(&self, coords: Coordinates) -> std::result::Result<SoilSample, SourceError>;
}

/// 每日氣候時間序列（溫度 °C、降雨 mm）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClimateHistory {
    pub temperature: BTreeMap<NaiveDate, f64>,
    pub rainfall: BTreeMap<NaiveDate, f64>,
}

impl ClimateHistory {
    pub fn mean_temperature(&self) -> Option<f64> {
        if self.temperature.is_empty() {
            return None;
        }
        Some(self.temperature.values().sum::<f64>() / self.temperature.len() as f64)
    }

    pub fn total_rainfall(&self) -> Option<f64> {
        if self.rainfall.is_empty() {
            return None;
        }
        Some(self.rainfall.values().sum())
    }

    pub fn days(&self) -> usize {
        self.temperature.len().max(self.rainfall.len())
    }

    pub fn summarize(&self, coordinates: Coordinates, start: NaiveDate, end: NaiveDate) -> ClimateSummary {
        ClimateSummary {
            coordinates,
            start,
            end,
            days: self.days(),
            mean_temperature: self.mean_temperature(),
            total_rainfall: self.total_rainfall(),
        }
    }
}

#[async_trait]
pub trait ClimateSource: Send + Sync {
    async fn fetch_history(
        &self,
        coords: Coordinates,
        start: NaiveDate,
        end: NaiveDate,
    ) -> std::result::Result<ClimateHistory, SourceError>;
}

/// A pre-trained model seen only through its input width and `predict`.
pub trait Classifier: Send + Sync {
    fn input_width(&self) -> usize;
    fn predict(&self, features: &[f64]) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn test_summary_serializes_for_json_output() {
        let history = ClimateHistory {
            temperature: BTreeMap::from([(date(1), 26.0), (date(2), 28.0)]),
            rainfall: BTreeMap::from([(date(1), 1.5), (date(2), 0.5)]),
        };

        let summary = history.summarize(Coordinates::new(7.3775, 3.947), date(1), date(2));
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["start"], "2024-06-01");
        assert_eq!(json["end"], "2024-06-02");
        assert_eq!(json["days"], 2);
        assert_eq!(json["mean_temperature"], 27.0);
        assert_eq!(json["total_rainfall"], 2.0);
        assert_eq!(json["coordinates"]["latitude"], 7.3775);
    }

    #[test]
    fn test_empty_history_has_no_aggregates() {
        let summary = ClimateHistory::default().summarize(Coordinates::new(0.0, 0.0), date(1), date(1));
        assert_eq!(summary.days, 0);
        assert!(summary.mean_temperature.is_none());

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["total_rainfall"].is_null());
    }
}
