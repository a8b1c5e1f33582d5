use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// Complete analysis record for one URL
///
/// The pipeline guarantees exactly one of these per dispatched URL, whether
/// the analysis succeeded or not. Failures carry `error` plus a zero score
/// instead of aborting the run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Canonical URL with scheme
    pub url: String,
    /// Wall-clock timestamp of the analysis ("%Y-%m-%d %H:%M:%S")
    pub timestamp: String,
    pub basic_info: BasicInfo,
    pub seo_signals: SeoSignals,
    pub technical_signals: TechnicalSignals,
    pub content_quality: ContentQuality,
    /// Open Graph property → content
    pub open_graph: BTreeMap<String, String>,
    /// Filtered contact addresses, business-sounding first, at most 10
    pub emails: Vec<String>,
    /// Platform → first matching profile URL
    pub social_media: BTreeMap<String, String>,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    /// Deterministic rubric score in [0, 100]
    pub seo_score: i32,
    /// Ordered (label, signed delta) pairs explaining the score
    pub score_breakdown: Vec<ScoreDelta>,
    pub is_competitor: bool,
    /// The seed site this result belongs to; self when not a competitor
    pub main_site: String,
    pub error: Option<String>,
    /// PNG bytes, resized to max width 800, when capture was enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceInsights>,
}

impl AnalysisResult {
    /// Creates an empty result shell for a URL; fields are filled in as the
    /// analysis progresses.
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            basic_info: BasicInfo::default(),
            seo_signals: SeoSignals::default(),
            technical_signals: TechnicalSignals::default(),
            content_quality: ContentQuality::default(),
            open_graph: BTreeMap::new(),
            emails: Vec::new(),
            social_media: BTreeMap::new(),
            issues: Vec::new(),
            recommendations: Vec::new(),
            seo_score: 0,
            score_breakdown: Vec::new(),
            is_competitor: false,
            main_site: url.to_string(),
            error: None,
            screenshot: None,
            performance: None,
        }
    }

    /// Creates a terminal failure result: error recorded, score zero, one
    /// issue describing what went wrong.
    pub fn failed(url: &str, error: impl Into<String>, issue: impl Into<String>) -> Self {
        let mut result = Self::new(url);
        result.error = Some(error.into());
        result.issues.push(issue.into());
        result.seo_score = 0;
        result
    }
}

/// Response-level facts about the fetch
#[derive(Debug, Clone, Default, Serialize)]
pub struct BasicInfo {
    pub status_code: u16,
    pub load_time_seconds: f64,
    /// Banded score derived from load time: <1s→100, <3s→80, <5s→50, else 20.
    /// Values under 50 trigger the slow-load penalty.
    pub load_time_score: i32,
    pub final_url: String,
    pub redirect_count: u32,
    pub page_size_bytes: usize,
    pub encoding: String,
}

impl BasicInfo {
    /// Bands a load time into the score used by the slow-load rubric entry
    pub fn band_load_time(load_time_seconds: f64) -> i32 {
        if load_time_seconds < 1.0 {
            100
        } else if load_time_seconds < 3.0 {
            80
        } else if load_time_seconds < 5.0 {
            50
        } else {
            20
        }
    }
}

/// On-page SEO signals extracted from the document
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeoSignals {
    pub title: Option<String>,
    pub title_length: usize,
    pub meta_description: Option<String>,
    pub meta_description_length: usize,
    pub meta_keywords: Option<String>,
    pub canonical_url: Option<String>,
    pub robots_meta: Option<String>,
    /// Header level (1-6) → count
    pub header_counts: BTreeMap<u8, usize>,
    /// First three H1 texts, in document order
    pub h1_texts: Vec<String>,
    pub image_total: usize,
    pub images_without_alt: usize,
    pub images_without_lazy: usize,
    pub schema_types: BTreeSet<String>,
    pub has_schema: bool,
}

/// Technical signals: mobile readiness, transport, auxiliary files
#[derive(Debug, Clone, Default, Serialize)]
pub struct TechnicalSignals {
    pub viewport_present: bool,
    pub viewport_content: Option<String>,
    pub lang_attribute: Option<String>,
    pub charset: Option<String>,
    pub is_https: bool,
    pub robots_txt_present: bool,
    pub sitemap_xml_present: bool,
}

/// Text-level quality metrics
///
/// Readability indices are unreliable on very short texts, so they are only
/// populated when the page holds more than 50 words.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContentQuality {
    pub word_count: usize,
    pub insufficient_content: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readability: Option<Readability>,
}

/// Readability indices computed over the cleaned page text
#[derive(Debug, Clone, Serialize)]
pub struct Readability {
    pub flesch_reading_ease: f64,
    pub flesch_kincaid_grade: f64,
    pub smog_index: f64,
    pub automated_readability_index: f64,
    pub syllable_count: usize,
}

/// One labeled adjustment in the score breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreDelta {
    pub label: String,
    pub delta: i32,
}

impl ScoreDelta {
    pub fn new(label: impl Into<String>, delta: i32) -> Self {
        Self {
            label: label.into(),
            delta,
        }
    }
}

/// Performance capability output
#[derive(Debug, Clone, Default, Serialize)]
pub struct PerformanceInsights {
    pub performance_score: i32,
    pub seo_score: i32,
    pub accessibility_score: i32,
    pub metrics: BTreeMap<String, String>,
}
