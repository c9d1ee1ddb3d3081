use std::sync::Arc;
use std::time::Duration;

use agrocast_core::{with_retry, Config, RetryConfig};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::instrument;

use crate::types::{
    AllWeatherResponse, DailyResponse, HourlyResponse, SevenDayResponse, WeatherError,
    WeatherSnapshot,
};

#[derive(Debug, Serialize)]
struct CityRequest<'a> {
    city: &'a str,
}

/// Client for the prediction backend's `/api/predict/*` endpoints.
///
/// Every endpoint is a `POST` with `{city}` and has no side effects, so all
/// calls go through the retry policy.
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: String,
    retry: RetryConfig,
}

impl WeatherProvider {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        retry: RetryConfig,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            retry,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, WeatherError> {
        Self::new(
            &config.api.base_url,
            Duration::from_secs(config.api.timeout_secs),
            config.retry.to_retry_config(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Today's summary
    #[instrument(skip(self), level = "debug")]
    pub async fn daily(&self, city: &str) -> Result<DailyResponse, WeatherError> {
        self.post("daily", city).await
    }

    /// Hourly predictions starting at the current hour
    #[instrument(skip(self), level = "debug")]
    pub async fn hourly(&self, city: &str) -> Result<HourlyResponse, WeatherError> {
        self.post("hourly", city).await
    }

    /// Seven daily aggregates starting tomorrow
    #[instrument(skip(self), level = "debug")]
    pub async fn seven_day(&self, city: &str) -> Result<SevenDayResponse, WeatherError> {
        self.post("7days", city).await
    }

    /// All three views in one round trip, as a snapshot.
    #[instrument(skip(self), level = "info")]
    pub async fn all(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
        let response: AllWeatherResponse = self.post("all", city).await?;
        tracing::info!(
            "Fetched weather for {}: {} hourly, {} daily",
            response.city,
            response.hourly_forecast.len(),
            response.seven_day_forecast.len()
        );
        Ok(WeatherSnapshot::from_response(response))
    }

    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        city: &str,
    ) -> Result<T, WeatherError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::EmptyCity);
        }

        let url = format!("{}/api/predict/{}", self.base_url, endpoint);
        let body = CityRequest { city };
        tracing::debug!("POST {}", url);

        let response = with_retry(&self.retry, || {
            self.client.post(&url).json(&body).send()
        })
        .await?;

        handle_response(response).await
    }
}

async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, WeatherError> {
    let status = response.status();

    if status.is_success() {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| WeatherError::Parse(e.to_string()))
    } else {
        let text = response.text().await.unwrap_or_default();
        Err(WeatherError::Api {
            status: status.as_u16(),
            detail: error_detail(&text),
        })
    }
}

/// FastAPI-style error bodies carry `{"detail": "..."}`; anything else is
/// returned verbatim.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(uri: &str) -> WeatherProvider {
        WeatherProvider::new(uri, Duration::from_secs(5), RetryConfig::new(1, 1, 5)).unwrap()
    }

    fn all_body(city: &str) -> serde_json::Value {
        serde_json::json!({
            "city": city,
            "today_forecast": {
                "time": "2025-06-01",
                "weather_code": 2,
                "weather_description": "Partly cloudy",
                "raw_data": { "temperature_2m_mean": 29.0 }
            },
            "hourly_forecast": [
                { "time": "2025-06-01T10:00", "weather_code": 61, "raw_data": { "temperature_2m": 28.0 } }
            ],
            "seven_day_forecast": [
                { "date": "2025-06-02", "weather_code": 80, "temperature_2m_max": 32.0 }
            ]
        })
    }

    #[tokio::test]
    async fn test_all_returns_snapshot() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/predict/all"))
            .and(body_json(serde_json::json!({ "city": "Hue" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(all_body("Hue")))
            .mount(&mock_server)
            .await;

        let snapshot = provider(&mock_server.uri()).all("Hue").await.unwrap();

        assert_eq!(snapshot.city, "Hue");
        assert_eq!(snapshot.today.raw_data.temperature(), Some(29.0));
        assert_eq!(snapshot.hourly.len(), 1);
        assert_eq!(snapshot.seven_day[0].readings.temperature_max(), Some(32.0));
    }

    #[tokio::test]
    async fn test_error_detail_surfaced() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/predict/all"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({ "detail": "Unknown city" })),
            )
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server.uri()).all("Atlantis").await.unwrap_err();
        match err {
            WeatherError::Api { status, detail } => {
                assert_eq!(status, 404);
                assert_eq!(detail, "Unknown city");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/predict/all"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/predict/all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(all_body("Hue")))
            .mount(&mock_server)
            .await;

        let snapshot = provider(&mock_server.uri()).all("Hue").await.unwrap();
        assert_eq!(snapshot.city, "Hue");
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/predict/all"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server.uri()).all("Hue").await.unwrap_err();
        assert!(matches!(err, WeatherError::Parse(_)));
    }

    #[tokio::test]
    async fn test_empty_city_makes_no_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server.uri()).all("   ").await.unwrap_err();
        assert!(matches!(err, WeatherError::EmptyCity));
    }

    #[tokio::test]
    async fn test_seven_day_endpoint() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/predict/7days"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "city": "Hue",
                "predictions": [
                    { "time": "2025-06-02", "winddirection_10m_dominant": 180.0 },
                    { "date": "2025-06-03", "wind_direction_10m_dominant": 90.0 }
                ]
            })))
            .mount(&mock_server)
            .await;

        let response = provider(&mock_server.uri()).seven_day("Hue").await.unwrap();
        assert_eq!(response.predictions.len(), 2);
        assert_eq!(response.predictions[0].readings.wind_direction(), Some(180.0));
        assert_eq!(response.predictions[1].date, "2025-06-03");
    }

    #[tokio::test]
    async fn test_daily_and_hourly_endpoints() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/predict/daily"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "city": "Hue",
                "time": "2025-06-01",
                "weather_code": 0,
                "weather_description": "Clear sky",
                "raw_data": {}
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/predict/hourly"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "city": "Hue",
                "predictions": []
            })))
            .mount(&mock_server)
            .await;

        let p = provider(&mock_server.uri());
        let daily = p.daily("Hue").await.unwrap();
        assert_eq!(daily.record.weather_description, "Clear sky");
        assert!(p.hourly("Hue").await.unwrap().predictions.is_empty());
    }

    #[test]
    fn test_error_detail_falls_back_to_body() {
        assert_eq!(error_detail("{\"detail\":\"x\"}"), "x");
        assert_eq!(error_detail("gateway down"), "gateway down");
    }
}
