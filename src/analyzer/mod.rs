//! Single-site analysis: fetching, signal extraction, content quality,
//! and rubric scoring

pub mod extract;
pub mod fetcher;
pub mod quality;
pub mod scorer;
pub mod site;
pub mod types;

pub use extract::Extractor;
pub use site::SiteAnalyzer;
pub use types::{AnalysisResult, BasicInfo, PerformanceInsights, ScoreDelta};
