//! Daily weather forecast tool backed by the Open-Meteo forecast API

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{FORECAST_TOOL, Tool, ToolError, check_status, f64_arg};
use crate::schema::{Field, Shape};

/// Longest horizon the forecast API serves
pub const MAX_FORECAST_DAYS: u32 = 16;

/// Fetches a multi-day forecast for a coordinate pair
pub struct ForecastTool {
    http: Client,
    base_url: String,
}

/// Daily forecast response from `OpenMeteo`
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: Option<DailyData>,
}

/// Daily weather data from `OpenMeteo`
#[derive(Debug, Deserialize)]
struct DailyData {
    time: Vec<String>,
    #[serde(rename = "temperature_2m_max")]
    temperature_max: Option<Vec<Option<f32>>>,
    #[serde(rename = "temperature_2m_min")]
    temperature_min: Option<Vec<Option<f32>>>,
    #[serde(rename = "windspeed_10m_max")]
    wind_speed_max: Option<Vec<Option<f32>>>,
    #[serde(rename = "precipitation_sum")]
    precipitation: Option<Vec<Option<f32>>>,
    #[serde(rename = "weathercode")]
    weather_code: Option<Vec<Option<u8>>>,
}

/// One day of forecast as handed back to the model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    pub date: String,
    pub description: String,
    pub temperature_max: Option<f32>,
    pub temperature_min: Option<f32>,
    pub precipitation_mm: Option<f32>,
    pub wind_speed_max: Option<f32>,
}

fn nth<T: Copy>(series: &Option<Vec<Option<T>>>, idx: usize) -> Option<T> {
    series.as_ref().and_then(|values| values.get(idx).copied().flatten())
}

impl DailyData {
    fn into_days(self) -> Vec<DailyForecast> {
        self.time
            .iter()
            .enumerate()
            .map(|(i, date)| DailyForecast {
                date: date.clone(),
                description: nth(&self.weather_code, i)
                    .map_or("Unknown", weather_code_to_description)
                    .to_string(),
                temperature_max: nth(&self.temperature_max, i),
                temperature_min: nth(&self.temperature_min, i),
                precipitation_mm: nth(&self.precipitation, i),
                wind_speed_max: nth(&self.wind_speed_max, i),
            })
            .collect()
    }
}

/// Convert `OpenMeteo` weather code to human-readable description
#[must_use]
pub fn weather_code_to_description(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

impl ForecastTool {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Daily forecast for the next `days` days, clamped to the API horizon
    pub async fn daily_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        days: u32,
    ) -> Result<Vec<DailyForecast>, ToolError> {
        let days = days.clamp(1, MAX_FORECAST_DAYS);
        let url = format!(
            "{}/forecast?latitude={}&longitude={}&daily=weathercode,temperature_2m_max,temperature_2m_min,precipitation_sum,windspeed_10m_max&timezone=auto&forecast_days={}",
            self.base_url, latitude, longitude, days
        );
        debug!("OpenMeteo forecast request URL: {}", url);

        let response = check_status(self.http.get(url).send().await?).await?;
        let parsed: ForecastResponse = response.json().await?;
        let daily = parsed
            .daily
            .ok_or_else(|| ToolError::NotFound("No daily forecast data in response".to_string()))?;
        Ok(daily.into_days())
    }
}

fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), ToolError> {
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(ToolError::InvalidArguments(format!(
            "coordinates out of range: {latitude}, {longitude}"
        )));
    }
    Ok(())
}

#[async_trait]
impl Tool for ForecastTool {
    fn name(&self) -> &str {
        FORECAST_TOOL
    }

    fn description(&self) -> &str {
        "Get the daily weather forecast (conditions, temperatures in Celsius, precipitation, wind) for coordinates."
    }

    fn parameters(&self) -> Shape {
        Shape::object([
            Field::required("latitude", Shape::Number),
            Field::required("longitude", Shape::Number),
            Field::required("days", Shape::positive_integer())
                .describe("Number of days to forecast, starting today"),
        ])
    }

    async fn call(&self, args: Value) -> Result<Value, ToolError> {
        let latitude = f64_arg(&args, "latitude")?;
        let longitude = f64_arg(&args, "longitude")?;
        validate_coordinates(latitude, longitude)?;
        let days = f64_arg(&args, "days").map_or(1, |d| d.max(1.0) as u32);

        let forecast = self.daily_forecast(latitude, longitude, days).await?;
        info!(
            "Fetched {} forecast days for {:.4}, {:.4}",
            forecast.len(),
            latitude,
            longitude
        );
        Ok(serde_json::json!({ "days": forecast }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_data_conversion() {
        let body = r#"{
            "latitude": 48.86, "longitude": 2.35,
            "daily": {
                "time": ["2026-10-18", "2026-10-19"],
                "weathercode": [61, null],
                "temperature_2m_max": [14.2, 16.0],
                "temperature_2m_min": [8.1, null],
                "precipitation_sum": [3.4, 0.0],
                "windspeed_10m_max": [18.0, 11.5]
            }
        }"#;
        let parsed: ForecastResponse = serde_json::from_str(body).unwrap();
        let days = parsed.daily.unwrap().into_days();

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].description, "Slight rain");
        assert_eq!(days[0].precipitation_mm, Some(3.4));
        assert_eq!(days[1].description, "Unknown");
        assert_eq!(days[1].temperature_min, None);
    }

    #[test]
    fn test_missing_series_is_tolerated() {
        let data = DailyData {
            time: vec!["2026-10-18".to_string()],
            temperature_max: None,
            temperature_min: None,
            wind_speed_max: None,
            precipitation: None,
            weather_code: Some(vec![Some(0)]),
        };
        let days = data.into_days();
        assert_eq!(days[0].description, "Clear sky");
        assert!(days[0].temperature_max.is_none());
    }

    #[test]
    fn test_serialized_field_names() {
        let day = DailyForecast {
            date: "2026-10-18".to_string(),
            description: "Fog".to_string(),
            temperature_max: Some(10.0),
            temperature_min: Some(4.0),
            precipitation_mm: None,
            wind_speed_max: None,
        };
        let json = serde_json::to_value(&day).unwrap();
        assert_eq!(json["temperatureMax"], 10.0);
        assert!(json.get("precipitationMm").is_some());
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(validate_coordinates(48.85, 2.35).is_ok());
        assert!(validate_coordinates(91.0, 0.0).is_err());
        assert!(validate_coordinates(0.0, -181.0).is_err());
    }

    #[test]
    fn test_weather_codes() {
        assert_eq!(weather_code_to_description(95), "Thunderstorm");
        assert_eq!(weather_code_to_description(42), "Unknown");
    }
}
