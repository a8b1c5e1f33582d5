//! Configuration loading, types, and validation

mod parser;
mod types;
mod validation;

pub use parser::load_config;
pub use types::{
    AiConfig, AnalyzerConfig, Config, FeatureConfig, OutputConfig, PhaseConfig,
};
pub use validation::validate;
