//! Competitor discovery: ask the AI for direct competitors, fall back to
//! web search, and degrade to nothing when neither capability is available

use crate::ai::RotatingGenerator;
use crate::url::{bare_domain_name, ensure_scheme, registered_domain};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Hard cap on discovered competitors per site
pub const MAX_COMPETITORS: usize = 3;

/// Pause between fallback search queries
const SEARCH_PAUSE: Duration = Duration::from_secs(2);

/// Web-search capability: a query in, result URLs out
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> crate::Result<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct CompetitorList {
    #[serde(default)]
    competitors: Vec<CompetitorEntry>,
}

#[derive(Debug, Deserialize)]
struct CompetitorEntry {
    #[serde(default)]
    url: String,
    #[serde(default)]
    #[allow(dead_code)]
    reason: String,
}

/// Finds up to [`MAX_COMPETITORS`] competitor URLs for a site
pub struct CompetitorFinder {
    generator: Option<Arc<RotatingGenerator>>,
    search: Option<Arc<dyn WebSearch>>,
    search_pause: Duration,
}

impl CompetitorFinder {
    pub fn new(
        generator: Option<Arc<RotatingGenerator>>,
        search: Option<Arc<dyn WebSearch>>,
    ) -> Self {
        Self {
            generator,
            search,
            search_pause: SEARCH_PAUSE,
        }
    }

    /// Removes the inter-query pause (tests)
    pub fn without_search_pause(mut self) -> Self {
        self.search_pause = Duration::ZERO;
        self
    }

    /// Discovers competitors for `site`; never fails, an empty list is the
    /// floor when no capability can produce anything
    pub async fn find(&self, site: &Url) -> Vec<String> {
        if let Some(generator) = &self.generator {
            match self.find_with_ai(generator, site).await {
                Some(competitors) if !competitors.is_empty() => return competitors,
                _ => {
                    tracing::debug!("AI competitor discovery yielded nothing for {}", site);
                }
            }
        }
        self.find_with_search(site).await
    }

    async fn find_with_ai(
        &self,
        generator: &RotatingGenerator,
        site: &Url,
    ) -> Option<Vec<String>> {
        let prompt = competitor_prompt(site);
        let response = match generator.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Competitor generation failed for {}: {}", site, e);
                return None;
            }
        };

        let cleaned = strip_code_fences(&response);
        let parsed: CompetitorList = match serde_json::from_str(&cleaned) {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("Unparseable competitor response for {}: {}", site, e);
                return None;
            }
        };

        let competitors: Vec<String> = parsed
            .competitors
            .into_iter()
            .filter(|entry| !entry.url.is_empty())
            .map(|entry| ensure_scheme(&entry.url))
            .take(MAX_COMPETITORS)
            .collect();
        Some(competitors)
    }

    /// Search fallback: canned queries, dedup by registered domain, seed
    /// domain excluded
    async fn find_with_search(&self, site: &Url) -> Vec<String> {
        let search = match &self.search {
            Some(s) => s,
            None => return Vec::new(),
        };
        let name = match bare_domain_name(site) {
            Some(n) => n,
            None => return Vec::new(),
        };
        let own_domain = site
            .host_str()
            .and_then(registered_domain)
            .map(|(n, s)| format!("{}.{}", n, s));

        let queries = [format!("{} competitors", name), format!("sites like {}", name)];
        let mut found = Vec::new();

        for (i, query) in queries.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.search_pause).await;
            }
            let results = match search.search(query).await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Search failed for '{}': {}", query, e);
                    continue;
                }
            };

            for result in results {
                let Ok(url) = Url::parse(&ensure_scheme(&result)) else {
                    continue;
                };
                let Some((rname, rsuffix)) = url.host_str().and_then(registered_domain) else {
                    continue;
                };
                let domain = format!("{}.{}", rname, rsuffix);
                if Some(&domain) == own_domain.as_ref() {
                    continue;
                }
                let candidate = format!("https://{}", domain);
                if found.contains(&candidate) {
                    continue;
                }
                found.push(candidate);
                if found.len() >= MAX_COMPETITORS {
                    return found;
                }
            }
        }

        found
    }
}

fn competitor_prompt(site: &Url) -> String {
    format!(
        r#"Analyze the website {site} and identify its top 3 direct competitors.

IMPORTANT: Return ONLY a JSON object with no markdown formatting, no backticks, no explanations.
The response must be EXACTLY in this format:

{{"competitors": [
  {{"url": "https://competitor1.com", "reason": "Brief reason why they compete"}},
  {{"url": "https://competitor2.com", "reason": "Brief reason why they compete"}},
  {{"url": "https://competitor3.com", "reason": "Brief reason why they compete"}}
]}}

Focus on:
1. Companies in the same industry/niche
2. Similar target audience
3. Competing for same keywords/services
4. Similar business model

Return ONLY the JSON object, nothing else."#
    )
}

/// Strips markdown code fences the model sometimes wraps JSON in
fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{GenerateError, TextGenerator};

    struct FixedGenerator(String);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
            Ok(self.0.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
            Err(GenerateError::Other("unavailable".to_string()))
        }
    }

    struct FixedSearch(Vec<Vec<String>>);

    #[async_trait]
    impl WebSearch for FixedSearch {
        async fn search(&self, query: &str) -> crate::Result<Vec<String>> {
            let index = if query.contains("sites like") { 1 } else { 0 };
            Ok(self.0.get(index).cloned().unwrap_or_default())
        }
    }

    fn ai_finder(response: &str) -> CompetitorFinder {
        let generator = RotatingGenerator::new(vec![
            Arc::new(FixedGenerator(response.to_string())) as Arc<dyn TextGenerator>,
        ]);
        CompetitorFinder::new(Some(Arc::new(generator)), None).without_search_pause()
    }

    fn seed() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[tokio::test]
    async fn test_no_capabilities_returns_empty() {
        let finder = CompetitorFinder::new(None, None);
        assert!(finder.find(&seed()).await.is_empty());
    }

    #[tokio::test]
    async fn test_ai_path_parses_strict_json() {
        let finder = ai_finder(
            r#"{"competitors": [
                {"url": "https://a.com", "reason": "same niche"},
                {"url": "b.com", "reason": "same audience"}
            ]}"#,
        );
        assert_eq!(
            finder.find(&seed()).await,
            vec!["https://a.com", "https://b.com"]
        );
    }

    #[tokio::test]
    async fn test_ai_path_strips_code_fences() {
        let finder = ai_finder(
            "```json\n{\"competitors\": [{\"url\": \"https://a.com\", \"reason\": \"r\"}]}\n```",
        );
        assert_eq!(finder.find(&seed()).await, vec!["https://a.com"]);
    }

    #[tokio::test]
    async fn test_ai_path_caps_at_three() {
        let finder = ai_finder(
            r#"{"competitors": [
                {"url": "https://a.com", "reason": "r"},
                {"url": "https://b.com", "reason": "r"},
                {"url": "https://c.com", "reason": "r"},
                {"url": "https://d.com", "reason": "r"}
            ]}"#,
        );
        assert_eq!(finder.find(&seed()).await.len(), 3);
    }

    #[tokio::test]
    async fn test_unparseable_ai_response_without_search_is_empty() {
        let finder = ai_finder("Sure! Here are some competitors: a.com, b.com");
        assert!(finder.find(&seed()).await.is_empty());
    }

    #[tokio::test]
    async fn test_ai_failure_falls_back_to_search() {
        let generator =
            RotatingGenerator::new(vec![Arc::new(FailingGenerator) as Arc<dyn TextGenerator>])
                .with_base_delay(Duration::from_millis(1));
        let search = FixedSearch(vec![vec![
            "https://rival.com/page".to_string(),
            "https://other.net".to_string(),
        ]]);
        let finder =
            CompetitorFinder::new(Some(Arc::new(generator)), Some(Arc::new(search)))
                .without_search_pause();

        assert_eq!(
            finder.find(&seed()).await,
            vec!["https://rival.com", "https://other.net"]
        );
    }

    #[tokio::test]
    async fn test_search_excludes_seed_domain_and_duplicates() {
        let search = FixedSearch(vec![vec![
            "https://example.com/about".to_string(),
            "https://www.example.com/".to_string(),
            "https://rival.com/a".to_string(),
            "https://blog.rival.com/b".to_string(),
        ]]);
        let finder = CompetitorFinder::new(None, Some(Arc::new(search))).without_search_pause();

        assert_eq!(finder.find(&seed()).await, vec!["https://rival.com"]);
    }

    #[tokio::test]
    async fn test_search_stops_at_three_across_queries() {
        let search = FixedSearch(vec![
            vec![
                "https://a.com".to_string(),
                "https://b.com".to_string(),
            ],
            vec![
                "https://c.com".to_string(),
                "https://d.com".to_string(),
            ],
        ]);
        let finder = CompetitorFinder::new(None, Some(Arc::new(search))).without_search_pause();

        assert_eq!(
            finder.find(&seed()).await,
            vec!["https://a.com", "https://b.com", "https://c.com"]
        );
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("{}"), "{}");
    }
}
