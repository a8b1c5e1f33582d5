//! Pipeline orchestration: discovery, fan-out analysis, outreach

mod coordinator;

pub use crate::report::RunReport;
pub use coordinator::Coordinator;
