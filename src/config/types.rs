use serde::{Deserialize, Serialize};

/// Main configuration structure for SiteGauge
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub phases: PhaseConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Seed sites to analyze; CLI arguments take precedence when given
    #[serde(default)]
    pub sites: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerConfig::default(),
            features: FeatureConfig::default(),
            ai: AiConfig::default(),
            phases: PhaseConfig::default(),
            output: OutputConfig::default(),
            sites: Vec::new(),
        }
    }
}

/// Fetch and analysis behavior
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    /// Timeout for the main page fetch, in seconds
    #[serde(rename = "page-timeout-secs", default = "default_page_timeout")]
    pub page_timeout_secs: u64,

    /// Timeout for robots.txt / sitemap.xml presence probes, in seconds
    #[serde(rename = "aux-timeout-secs", default = "default_aux_timeout")]
    pub aux_timeout_secs: u64,

    /// Maximum number of sites analyzed concurrently
    #[serde(rename = "max-concurrent-sites", default = "default_concurrency")]
    pub max_concurrent_sites: usize,

    /// Delay between dispatching consecutive site analyses, in milliseconds
    #[serde(rename = "request-stagger-ms", default = "default_stagger")]
    pub request_stagger_ms: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            page_timeout_secs: default_page_timeout(),
            aux_timeout_secs: default_aux_timeout(),
            max_concurrent_sites: default_concurrency(),
            request_stagger_ms: default_stagger(),
        }
    }
}

/// Optional pipeline features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Discover up to 3 competitors per seed site
    #[serde(default = "default_true")]
    pub competitors: bool,

    /// Generate an outreach message per main site
    #[serde(default = "default_true")]
    pub outreach: bool,

    /// Capture a screenshot per analyzed site (requires a capture capability)
    #[serde(default)]
    pub screenshots: bool,

    /// Query the performance-insights endpoint per analyzed site
    #[serde(default)]
    pub performance: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            competitors: true,
            outreach: true,
            screenshots: false,
            performance: false,
        }
    }
}

/// AI credential configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Path to the JSON credential store
    #[serde(rename = "keys-file", default = "default_keys_file")]
    pub keys_file: String,

    /// Optional API key for the performance-insights endpoint
    #[serde(rename = "pagespeed-api-key", default)]
    pub pagespeed_api_key: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            keys_file: default_keys_file(),
            pagespeed_api_key: None,
        }
    }
}

/// Wall-clock budget per pipeline phase; work still outstanding when the
/// budget elapses is abandoned and the phase proceeds with what completed.
#[derive(Debug, Clone, Deserialize)]
pub struct PhaseConfig {
    #[serde(rename = "discovery-budget-secs", default = "default_discovery_budget")]
    pub discovery_budget_secs: u64,

    #[serde(rename = "analysis-budget-secs", default = "default_analysis_budget")]
    pub analysis_budget_secs: u64,

    #[serde(rename = "outreach-budget-secs", default = "default_outreach_budget")]
    pub outreach_budget_secs: u64,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            discovery_budget_secs: default_discovery_budget(),
            analysis_budget_secs: default_analysis_budget(),
            outreach_budget_secs: default_outreach_budget(),
        }
    }
}

/// Report output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path the JSON run report is written to
    #[serde(rename = "report-path", default = "default_report_path")]
    pub report_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: default_report_path(),
        }
    }
}

fn default_page_timeout() -> u64 {
    30
}

fn default_aux_timeout() -> u64 {
    10
}

fn default_concurrency() -> usize {
    3
}

fn default_stagger() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

fn default_keys_file() -> String {
    "./gemini_keys.json".to_string()
}

fn default_discovery_budget() -> u64 {
    45
}

fn default_analysis_budget() -> u64 {
    90
}

fn default_outreach_budget() -> u64 {
    60
}

fn default_report_path() -> String {
    "./report.json".to_string()
}
