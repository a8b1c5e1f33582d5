//! Performance insights via the PageSpeed API, with a basic timing probe as
//! the fallback when the API is unavailable

use crate::analyzer::PerformanceInsights;
use crate::Result;
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

const DEFAULT_API_URL: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client for per-site performance lookups
pub struct InsightsClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
}

impl InsightsClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_url: DEFAULT_API_URL.to_string(),
            api_key,
        })
    }

    /// Points the client at a different API endpoint (tests)
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.to_string();
        self
    }

    /// Fetches insights for `url`; `None` means no data could be gathered
    pub async fn fetch(&self, url: &str) -> Option<PerformanceInsights> {
        match self.fetch_from_api(url).await {
            Some(insights) => Some(insights),
            None => {
                tracing::debug!("PageSpeed lookup failed for {}, using timing probe", url);
                self.basic_probe(url).await
            }
        }
    }

    async fn fetch_from_api(&self, url: &str) -> Option<PerformanceInsights> {
        let mut params = vec![
            ("url", url),
            ("category", "performance"),
            ("category", "seo"),
            ("category", "accessibility"),
            ("strategy", "mobile"),
        ];
        if let Some(key) = &self.api_key {
            params.push(("key", key));
        }

        let response = self
            .client
            .get(&self.api_url)
            .query(&params)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body: Value = response.json().await.ok()?;
        Some(parse_lighthouse(&body))
    }

    /// Times a plain fetch and buckets it into a rough performance score
    async fn basic_probe(&self, url: &str) -> Option<PerformanceInsights> {
        let start = Instant::now();
        let response = self.client.get(url).send().await.ok()?;
        let bytes = response.bytes().await.ok()?;
        let load_time = start.elapsed().as_secs_f64();

        let performance_score = if load_time < 1.0 {
            90
        } else if load_time < 3.0 {
            70
        } else if load_time < 5.0 {
            50
        } else {
            30
        };

        let mut metrics = BTreeMap::new();
        metrics.insert("load_time".to_string(), format!("{:.2}s", load_time));
        metrics.insert(
            "page_size".to_string(),
            format!("{:.1} KB", bytes.len() as f64 / 1024.0),
        );

        Some(PerformanceInsights {
            performance_score,
            seo_score: 0,
            accessibility_score: 0,
            metrics,
        })
    }
}

fn category_score(categories: &Value, name: &str) -> i32 {
    categories
        .get(name)
        .and_then(|c| c.get("score"))
        .and_then(Value::as_f64)
        .map(|s| (s * 100.0).round() as i32)
        .unwrap_or(0)
}

fn audit_display(audits: &Value, name: &str) -> String {
    audits
        .get(name)
        .and_then(|a| a.get("displayValue"))
        .and_then(Value::as_str)
        .unwrap_or("N/A")
        .to_string()
}

fn parse_lighthouse(body: &Value) -> PerformanceInsights {
    let lighthouse = body.get("lighthouseResult").cloned().unwrap_or_default();
    let categories = lighthouse.get("categories").cloned().unwrap_or_default();
    let audits = lighthouse.get("audits").cloned().unwrap_or_default();

    let mut metrics = BTreeMap::new();
    metrics.insert(
        "first_contentful_paint".to_string(),
        audit_display(&audits, "first-contentful-paint"),
    );
    metrics.insert("speed_index".to_string(), audit_display(&audits, "speed-index"));
    metrics.insert(
        "time_to_interactive".to_string(),
        audit_display(&audits, "interactive"),
    );
    metrics.insert(
        "total_blocking_time".to_string(),
        audit_display(&audits, "total-blocking-time"),
    );

    PerformanceInsights {
        performance_score: category_score(&categories, "performance"),
        seo_score: category_score(&categories, "seo"),
        accessibility_score: category_score(&categories, "accessibility"),
        metrics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn lighthouse_body() -> Value {
        json!({
            "lighthouseResult": {
                "categories": {
                    "performance": { "score": 0.93 },
                    "seo": { "score": 0.85 },
                    "accessibility": { "score": 0.7 }
                },
                "audits": {
                    "first-contentful-paint": { "displayValue": "1.2 s" },
                    "speed-index": { "displayValue": "2.0 s" },
                    "interactive": { "displayValue": "3.1 s" },
                    "total-blocking-time": { "displayValue": "40 ms" }
                }
            }
        })
    }

    #[tokio::test]
    async fn test_fetch_parses_lighthouse_scores() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/runPagespeed"))
            .and(query_param("strategy", "mobile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(lighthouse_body()))
            .mount(&server)
            .await;

        let client = InsightsClient::new(None)
            .unwrap()
            .with_api_url(&format!("{}/runPagespeed", server.uri()));
        let insights = client.fetch("https://example.com").await.unwrap();

        assert_eq!(insights.performance_score, 93);
        assert_eq!(insights.seo_score, 85);
        assert_eq!(insights.accessibility_score, 70);
        assert_eq!(
            insights.metrics.get("first_contentful_paint").map(String::as_str),
            Some("1.2 s")
        );
        assert_eq!(
            insights.metrics.get("total_blocking_time").map(String::as_str),
            Some("40 ms")
        );
    }

    #[tokio::test]
    async fn test_api_failure_falls_back_to_timing_probe() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/runPagespeed"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let client = InsightsClient::new(None)
            .unwrap()
            .with_api_url(&format!("{}/runPagespeed", server.uri()));
        let insights = client
            .fetch(&format!("{}/page", server.uri()))
            .await
            .unwrap();

        // Local mock answers in well under a second
        assert_eq!(insights.performance_score, 90);
        assert_eq!(insights.seo_score, 0);
        assert!(insights.metrics.contains_key("load_time"));
        assert!(insights.metrics.contains_key("page_size"));
    }

    #[tokio::test]
    async fn test_unreachable_everything_yields_none() {
        let client = InsightsClient::new(None)
            .unwrap()
            .with_api_url("http://127.0.0.1:1/runPagespeed");
        assert!(client.fetch("http://127.0.0.1:1/page").await.is_none());
    }

    #[test]
    fn test_missing_fields_default() {
        let insights = parse_lighthouse(&json!({}));
        assert_eq!(insights.performance_score, 0);
        assert_eq!(
            insights.metrics.get("speed_index").map(String::as_str),
            Some("N/A")
        );
    }
}
