//! Pipeline coordinator - run orchestration logic
//!
//! A run moves through three phases, each under its own wall-clock budget:
//! 1. Discovery: find competitors for every seed site
//! 2. Analysis: analyze seeds and competitors with bounded concurrency
//! 3. Outreach: compose a message per main site from its and its
//!    competitors' results
//!
//! Units of work report back over a channel; nothing shares mutable state.
//! Work still outstanding when a phase budget elapses is abandoned, and the
//! run proceeds with whatever completed.

use crate::ai::{CompetitorFinder, OutreachComposer, RotatingGenerator, WebSearch};
use crate::analyzer::{AnalysisResult, SiteAnalyzer};
use crate::config::Config;
use crate::insights::InsightsClient;
use crate::report::RunReport;
use crate::screenshot::{resize_to_thumbnail, ScreenshotCapture};
use crate::url::{canonicalize, ensure_scheme};
use crate::Result;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::{timeout_at, Instant};

/// Dispatch-dedup key: canonical URL string where the URL parses, else the
/// lowercased raw string
fn dedup_key(raw: &str) -> String {
    canonicalize(raw)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| raw.to_lowercase())
}

/// One URL scheduled for analysis
struct WorkItem {
    url: String,
    is_competitor: bool,
    main_site: String,
}

/// Drives a full run over a list of seed sites
pub struct Coordinator {
    config: Arc<Config>,
    analyzer: Arc<SiteAnalyzer>,
    generator: Option<Arc<RotatingGenerator>>,
    search: Option<Arc<dyn WebSearch>>,
    capture: Option<Arc<dyn ScreenshotCapture>>,
    insights: Option<Arc<InsightsClient>>,
}

impl Coordinator {
    /// Creates a coordinator with no optional capabilities attached
    pub fn new(config: Config) -> Result<Self> {
        let analyzer = Arc::new(SiteAnalyzer::new(&config.analyzer)?);
        Ok(Self {
            config: Arc::new(config),
            analyzer,
            generator: None,
            search: None,
            capture: None,
            insights: None,
        })
    }

    /// Attaches the AI text-generation capability
    pub fn with_text_generator(mut self, generator: Arc<RotatingGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Attaches the web-search fallback capability
    pub fn with_web_search(mut self, search: Arc<dyn WebSearch>) -> Self {
        self.search = Some(search);
        self
    }

    /// Attaches the screenshot capability
    pub fn with_screenshot_capture(mut self, capture: Arc<dyn ScreenshotCapture>) -> Self {
        self.capture = Some(capture);
        self
    }

    /// Attaches the performance-insights capability
    pub fn with_insights_client(mut self, insights: Arc<InsightsClient>) -> Self {
        self.insights = Some(insights);
        self
    }

    /// Runs the full pipeline over the seed sites
    pub async fn run(&self, seeds: &[String]) -> Result<RunReport> {
        // Normalize seeds, dropping duplicates but keeping order
        let mut seen = HashSet::new();
        let seeds: Vec<String> = seeds
            .iter()
            .map(|s| ensure_scheme(s.trim()))
            .filter(|s| seen.insert(s.to_lowercase()))
            .collect();

        tracing::info!("Starting run over {} seed site(s)", seeds.len());

        let competitor_map = self.discovery_phase(&seeds).await;
        let results = self.analysis_phase(&seeds, &competitor_map).await;
        let outreach = self.outreach_phase(&seeds, &competitor_map, &results).await;

        Ok(RunReport::new(
            results,
            competitor_map,
            outreach,
            self.config.features.clone(),
        ))
    }

    /// Phase 1: competitor discovery per seed
    async fn discovery_phase(&self, seeds: &[String]) -> BTreeMap<String, Vec<String>> {
        let mut competitor_map = BTreeMap::new();
        if !self.config.features.competitors || seeds.is_empty() {
            return competitor_map;
        }

        let finder = Arc::new(CompetitorFinder::new(
            self.generator.clone(),
            self.search.clone(),
        ));
        let (tx, mut rx) = mpsc::channel(seeds.len());
        let mut dispatched = 0usize;

        for seed in seeds {
            let url = match canonicalize(seed) {
                Ok(u) => u,
                Err(_) => continue,
            };
            let finder = Arc::clone(&finder);
            let tx = tx.clone();
            let seed = seed.clone();
            dispatched += 1;
            tokio::spawn(async move {
                let competitors = finder.find(&url).await;
                let _ = tx.send((seed, competitors)).await;
            });
        }
        drop(tx);

        let deadline = Instant::now() + Duration::from_secs(self.config.phases.discovery_budget_secs);
        loop {
            match timeout_at(deadline, rx.recv()).await {
                Ok(Some((seed, competitors))) => {
                    tracing::info!("Found {} competitor(s) for {}", competitors.len(), seed);
                    competitor_map.insert(seed, competitors);
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        "Discovery budget elapsed with {}/{} lookups done",
                        competitor_map.len(),
                        dispatched
                    );
                    break;
                }
            }
        }
        competitor_map
    }

    /// Phase 2: analyze every seed and every discovered competitor
    async fn analysis_phase(
        &self,
        seeds: &[String],
        competitor_map: &BTreeMap<String, Vec<String>>,
    ) -> Vec<AnalysisResult> {
        // Each URL is dispatched exactly once; a competitor that is also a
        // seed keeps its seed role
        let mut dispatched = HashSet::new();
        let mut work = Vec::new();
        for seed in seeds {
            if dispatched.insert(dedup_key(seed)) {
                work.push(WorkItem {
                    url: seed.clone(),
                    is_competitor: false,
                    main_site: seed.clone(),
                });
            }
        }
        for (seed, competitors) in competitor_map {
            for competitor in competitors {
                if dispatched.insert(dedup_key(competitor)) {
                    work.push(WorkItem {
                        url: competitor.clone(),
                        is_competitor: true,
                        main_site: seed.clone(),
                    });
                }
            }
        }

        let total = work.len();
        let semaphore = Arc::new(Semaphore::new(self.config.analyzer.max_concurrent_sites));
        let stagger = Duration::from_millis(self.config.analyzer.request_stagger_ms);
        let (tx, mut rx) = mpsc::channel(total.max(1));

        for (i, item) in work.into_iter().enumerate() {
            let analyzer = Arc::clone(&self.analyzer);
            let semaphore = Arc::clone(&semaphore);
            let capture = self.config.features.screenshots.then(|| self.capture.clone()).flatten();
            let insights = self.config.features.performance.then(|| self.insights.clone()).flatten();
            let tx = tx.clone();

            tokio::spawn(async move {
                tokio::time::sleep(stagger * i as u32).await;
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };

                let mut result = analyzer.analyze(&item.url).await;
                result.is_competitor = item.is_competitor;
                result.main_site = item.main_site;

                if let Some(capture) = capture {
                    match capture.capture(&item.url).await {
                        Ok(png) => match resize_to_thumbnail(&png) {
                            Ok(thumb) => result.screenshot = Some(thumb),
                            Err(e) => tracing::warn!("Screenshot resize failed for {}: {}", item.url, e),
                        },
                        Err(e) => tracing::warn!("Screenshot failed for {}: {}", item.url, e),
                    }
                }
                if result.error.is_none() {
                    if let Some(insights) = insights {
                        result.performance = insights.fetch(&item.url).await;
                    }
                }

                let _ = tx.send(result).await;
            });
        }
        drop(tx);

        let mut results = Vec::with_capacity(total);
        let deadline = Instant::now() + Duration::from_secs(self.config.phases.analysis_budget_secs);
        loop {
            match timeout_at(deadline, rx.recv()).await {
                Ok(Some(result)) => {
                    results.push(result);
                    tracing::info!("Analyzed {}/{} sites", results.len(), total);
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        "Analysis budget elapsed with {}/{} sites done",
                        results.len(),
                        total
                    );
                    break;
                }
            }
        }
        results
    }

    /// Phase 3: compose outreach per main site from the merged results
    async fn outreach_phase(
        &self,
        seeds: &[String],
        competitor_map: &BTreeMap<String, Vec<String>>,
        results: &[AnalysisResult],
    ) -> BTreeMap<String, String> {
        let mut outreach = BTreeMap::new();
        if !self.config.features.outreach {
            return outreach;
        }

        let composer = Arc::new(OutreachComposer::new(self.generator.clone()));
        let (tx, mut rx) = mpsc::channel(seeds.len().max(1));
        let mut dispatched = 0usize;

        for seed in seeds {
            // Outreach needs the site's own attempted analysis; competitors
            // that never completed just mean fewer comparison points
            let Some(main_result) = results
                .iter()
                .find(|r| !r.is_competitor && r.main_site == *seed)
            else {
                continue;
            };
            let competitor_keys: HashSet<String> = competitor_map
                .get(seed)
                .map(|urls| urls.iter().map(|c| dedup_key(c)).collect())
                .unwrap_or_default();
            let competitor_results: Vec<AnalysisResult> = results
                .iter()
                .filter(|r| r.is_competitor)
                .filter(|r| competitor_keys.contains(&r.url) || r.main_site == *seed)
                .cloned()
                .collect();

            let composer = Arc::clone(&composer);
            let tx = tx.clone();
            let seed = seed.clone();
            let main_result = main_result.clone();
            dispatched += 1;
            tokio::spawn(async move {
                let message = composer.compose(&main_result, &competitor_results).await;
                let _ = tx.send((seed, message)).await;
            });
        }
        drop(tx);

        let deadline = Instant::now() + Duration::from_secs(self.config.phases.outreach_budget_secs);
        loop {
            match timeout_at(deadline, rx.recv()).await {
                Ok(Some((seed, message))) => {
                    outreach.insert(seed, message);
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        "Outreach budget elapsed with {}/{} messages done",
                        outreach.len(),
                        dispatched
                    );
                    break;
                }
            }
        }
        outreach
    }
}
