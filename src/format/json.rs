//! JSON output formatter

use crate::error::Result;
use crate::format::{OutputFormatter, RankingReport, ResolutionReport};

/// JSON formatter - outputs full report as pretty-printed JSON
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "Full JSON report"
    }

    fn format_ranking(&self, report: &RankingReport) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }

    fn format_resolution(&self, report: &ResolutionReport) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }
}
