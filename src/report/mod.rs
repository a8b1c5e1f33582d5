//! Run report: everything an exporter needs to render a run without
//! reaching back into the pipeline

use crate::analyzer::AnalysisResult;
use crate::config::FeatureConfig;
use serde::Serialize;
use std::collections::BTreeMap;

/// Complete output of one pipeline run
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// One entry per dispatched URL, seeds and competitors alike
    pub results: Vec<AnalysisResult>,
    /// Seed site URL to its discovered competitor URLs (at most 3)
    pub competitor_map: BTreeMap<String, Vec<String>>,
    /// Main site URL to its outreach message; competitor URLs never appear
    pub outreach: BTreeMap<String, String>,
    pub metadata: RunMetadata,
}

/// Summary facts about the run
#[derive(Debug, Serialize)]
pub struct RunMetadata {
    pub generated_at: String,
    pub features: FeatureConfig,
    pub main_site_count: usize,
    pub competitor_count: usize,
    pub failed_count: usize,
    pub outreach_count: usize,
    /// Mean score over results that analyzed successfully
    pub average_score: f64,
}

impl RunReport {
    pub fn new(
        results: Vec<AnalysisResult>,
        competitor_map: BTreeMap<String, Vec<String>>,
        outreach: BTreeMap<String, String>,
        features: FeatureConfig,
    ) -> Self {
        let main_site_count = results.iter().filter(|r| !r.is_competitor).count();
        let competitor_count = results.iter().filter(|r| r.is_competitor).count();
        let failed_count = results.iter().filter(|r| r.error.is_some()).count();
        let scored: Vec<i32> = results
            .iter()
            .filter(|r| r.error.is_none())
            .map(|r| r.seo_score)
            .collect();
        let average_score = if scored.is_empty() {
            0.0
        } else {
            scored.iter().sum::<i32>() as f64 / scored.len() as f64
        };

        let metadata = RunMetadata {
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            features,
            main_site_count,
            competitor_count,
            failed_count,
            outreach_count: outreach.len(),
            average_score,
        };

        Self {
            results,
            competitor_map,
            outreach,
            metadata,
        }
    }

    /// Looks up the result for a URL
    pub fn result_for(&self, url: &str) -> Option<&AnalysisResult> {
        self.results.iter().find(|r| r.url == url)
    }
}
