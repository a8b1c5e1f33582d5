//! Site analyzer: one URL in, one result record out
//!
//! `analyze` never returns an error. Fetch failures, parse trouble, and
//! anything else that goes wrong are captured into the result's `error`
//! field with a zero score; the pipeline depends on receiving exactly one
//! result per URL it dispatched.

use crate::analyzer::extract::Extractor;
use crate::analyzer::fetcher::{build_http_client, fetch_page, probe_aux_file, FetchOutcome};
use crate::analyzer::quality::analyze_content_quality;
use crate::analyzer::scorer;
use crate::analyzer::types::{AnalysisResult, BasicInfo};
use crate::config::AnalyzerConfig;
use crate::url::{canonicalize, origin};
use crate::Result;
use reqwest::Client;

/// Analyzes single sites: fetch, extract, auxiliary checks, score
pub struct SiteAnalyzer {
    client: Client,
    extractor: Extractor,
    aux_timeout_secs: u64,
}

impl SiteAnalyzer {
    pub fn new(config: &AnalyzerConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config.page_timeout_secs)?,
            extractor: Extractor::new()?,
            aux_timeout_secs: config.aux_timeout_secs,
        })
    }

    /// Runs a full analysis of one site
    pub async fn analyze(&self, raw_url: &str) -> AnalysisResult {
        let url = match canonicalize(raw_url) {
            Ok(u) => u,
            Err(e) => {
                return AnalysisResult::failed(
                    raw_url,
                    e.to_string(),
                    format!("Analysis error: {}", e),
                )
            }
        };
        let canonical = url.to_string();

        tracing::debug!("Analyzing {}", canonical);

        let fetched = match fetch_page(&self.client, &url).await {
            FetchOutcome::Success {
                status_code,
                final_url,
                redirect_count,
                body,
                page_size_bytes,
                encoding,
                load_time_seconds,
            } => {
                let mut result = AnalysisResult::new(&canonical);
                result.basic_info = BasicInfo {
                    status_code,
                    load_time_seconds,
                    load_time_score: BasicInfo::band_load_time(load_time_seconds),
                    final_url,
                    redirect_count,
                    page_size_bytes,
                    encoding,
                };
                (result, body)
            }
            FetchOutcome::Timeout => {
                return AnalysisResult::failed(
                    &canonical,
                    "Website took too long to respond",
                    "Timeout error",
                )
            }
            FetchOutcome::Unreachable { message } => {
                tracing::debug!("Connection failure for {}: {}", canonical, message);
                return AnalysisResult::failed(
                    &canonical,
                    "Could not connect to website",
                    "Connection error",
                );
            }
            FetchOutcome::Failed { message } => {
                return AnalysisResult::failed(
                    &canonical,
                    message.clone(),
                    format!("Analysis error: {}", message),
                )
            }
        };
        let (mut result, body) = fetched;

        // All document inspection is synchronous; the parsed DOM never
        // crosses an await point.
        let extract = self.extractor.extract(&body, &url);
        result.seo_signals = extract.seo;
        result.technical_signals.viewport_present = extract.technical.viewport_present;
        result.technical_signals.viewport_content = extract.technical.viewport_content;
        result.technical_signals.lang_attribute = extract.technical.lang_attribute;
        result.technical_signals.charset = extract.technical.charset;
        result.technical_signals.is_https = extract.technical.is_https;
        result.open_graph = extract.open_graph;
        result.emails = extract.emails;
        result.social_media = extract.social_media;
        result.content_quality = analyze_content_quality(&extract.cleaned_text);

        append_page_issues(&mut result);

        // Auxiliary checks must settle before scoring; the score depends on
        // their outcome.
        if let Some(site_origin) = origin(&url) {
            let (robots, sitemap) = tokio::join!(
                probe_aux_file(
                    &self.client,
                    &site_origin,
                    "/robots.txt",
                    self.aux_timeout_secs
                ),
                probe_aux_file(
                    &self.client,
                    &site_origin,
                    "/sitemap.xml",
                    self.aux_timeout_secs
                ),
            );
            result.technical_signals.robots_txt_present = robots;
            result.technical_signals.sitemap_xml_present = sitemap;
        }

        append_aux_issues(&mut result);

        let (score, breakdown) = scorer::score(&result);
        result.seo_score = score;
        result.score_breakdown = breakdown;

        tracing::debug!("{} scored {}/100", canonical, score);
        result
    }
}

/// Appends issues and recommendations derived from on-page signals
fn append_page_issues(result: &mut AnalysisResult) {
    let seo = result.seo_signals.clone();
    let issues = &mut result.issues;
    let recommendations = &mut result.recommendations;

    // Title
    if seo.title.is_none() {
        issues.push("Missing title tag".to_string());
        recommendations.push("Add a unique, descriptive title tag (30-60 characters)".to_string());
    } else if seo.title_length < 30 {
        issues.push("Title too short (< 30 chars)".to_string());
        recommendations.push("Expand title to 30-60 characters with relevant keywords".to_string());
    } else if seo.title_length > 60 {
        issues.push("Title too long (> 60 chars)".to_string());
        recommendations.push("Shorten title to under 60 characters".to_string());
    }

    // Meta description
    if seo.meta_description.is_none() {
        issues.push("Missing meta description".to_string());
        recommendations.push("Add a compelling meta description (120-160 characters)".to_string());
    } else if seo.meta_description_length < 120 {
        issues.push("Meta description too short (< 120 chars)".to_string());
        recommendations.push("Expand meta description to 120-160 characters".to_string());
    } else if seo.meta_description_length > 160 {
        issues.push("Meta description too long (> 160 chars)".to_string());
        recommendations.push("Shorten meta description to under 160 characters".to_string());
    }

    // Headers
    let h1_count = seo.header_counts.get(&1).copied().unwrap_or(0);
    if h1_count == 0 {
        issues.push("Missing H1 tag".to_string());
        recommendations.push("Add one H1 tag with main keyword".to_string());
    } else if h1_count > 1 {
        issues.push(format!("Multiple H1 tags ({})", h1_count));
        recommendations.push("Use only one H1 tag per page".to_string());
    }

    // Images
    if seo.images_without_alt > 0 {
        issues.push(format!("{} images missing alt text", seo.images_without_alt));
        recommendations.push("Add descriptive alt text to all images".to_string());
    }
    if seo.images_without_lazy > 5 {
        recommendations.push("Implement lazy loading for images".to_string());
    }

    // Structured data and social preview
    if !seo.has_schema {
        recommendations.push("Add Schema.org structured data".to_string());
    }
    if result.open_graph.is_empty() {
        recommendations.push("Add Open Graph tags for better social sharing".to_string());
    }

    // Technical
    if !result.technical_signals.viewport_present {
        issues.push("Missing viewport meta tag (not mobile-friendly)".to_string());
        recommendations.push("Add viewport meta tag for mobile responsiveness".to_string());
    }
    if result.technical_signals.lang_attribute.is_none() {
        issues.push("Missing language attribute".to_string());
        recommendations.push("Add lang attribute to html tag".to_string());
    }
    if !result.technical_signals.is_https {
        issues.push("Not using HTTPS".to_string());
        recommendations.push("Implement SSL certificate for HTTPS".to_string());
    }
}

/// Appends issues for missing auxiliary files once the probes settle
fn append_aux_issues(result: &mut AnalysisResult) {
    if !result.technical_signals.robots_txt_present {
        result.issues.push("No robots.txt file found".to_string());
        result.recommendations.push("Create robots.txt file".to_string());
    }
    if !result.technical_signals.sitemap_xml_present {
        result.issues.push("No sitemap.xml file found".to_string());
        result.recommendations.push("Create XML sitemap".to_string());
    }
}
