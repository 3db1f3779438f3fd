//! Human-readable text output formatter

use crate::error::Result;
use crate::format::{OutputFormatter, RankingReport, ResolutionReport};

/// Text formatter - outputs human-readable summary
pub struct TextFormatter;

impl OutputFormatter for TextFormatter {
    fn name(&self) -> &str {
        "text"
    }

    fn description(&self) -> &str {
        "Human-readable text"
    }

    fn format_ranking(&self, report: &RankingReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&format!("Field: {} ({})\n", report.field, report.direction));
        output.push_str(&format!(
            "Ranked: {} of {}\n\n",
            report.ranked_count(),
            report.ids.len()
        ));

        for (position, id) in report.ids.iter().enumerate() {
            let distance = match report.distance(*id) {
                Some(km) => format!("{:.2} km", km),
                None => "-".to_string(),
            };
            output.push_str(&format!("  {:>3}. #{:<8} {}\n", position + 1, id, distance));
        }

        Ok(output)
    }

    fn format_resolution(&self, report: &ResolutionReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&format!("Address: {}\n", report.address));
        if let Some(country) = &report.country {
            output.push_str(&format!("Country: {}\n", country));
        }

        match report.coords {
            Some(coords) => {
                output.push_str(&format!("Coordinates: {}\n", coords));
                if let Some(provenance) = &report.provenance {
                    output.push_str(&format!("Source: {}\n", provenance));
                }
                output.push_str(&format!("Cached: {}\n", if report.cached { "yes" } else { "no" }));
            }
            None => output.push_str("Not found\n"),
        }

        Ok(output)
    }
}
