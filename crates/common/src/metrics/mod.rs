//! Metrics and observability utilities
//!
//! Metric recording goes through the `metrics` facade with standardized
//! naming. Nothing is exported unless the embedding process installs a
//! recorder.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Duration;

/// Metrics prefix for all PaperScout metrics
pub const METRICS_PREFIX: &str = "paperscout";

/// Outcome of one judgment call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgmentOutcome {
    Success,
    /// Service answered with something unparseable
    Malformed,
    /// Transport failure
    Error,
}

impl JudgmentOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            JudgmentOutcome::Success => "success",
            JudgmentOutcome::Malformed => "malformed",
            JudgmentOutcome::Error => "error",
        }
    }
}

/// Which formula produced a combined score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinedPath {
    Judged,
    HeuristicOnly,
}

impl CombinedPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            CombinedPath::Judged => "judged",
            CombinedPath::HeuristicOnly => "heuristic_only",
        }
    }
}

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_heuristic_scores_total", METRICS_PREFIX),
        Unit::Count,
        "Heuristic scores written"
    );

    describe_counter!(
        format!("{}_judgment_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Judgment requests by outcome"
    );

    describe_histogram!(
        format!("{}_judgment_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Judgment request latency in seconds"
    );

    describe_counter!(
        format!("{}_combined_scores_total", METRICS_PREFIX),
        Unit::Count,
        "Combined scores written by path"
    );

    describe_counter!(
        format!("{}_papers_ingested_total", METRICS_PREFIX),
        Unit::Count,
        "New papers ingested"
    );

    describe_counter!(
        format!("{}_enrichment_applied_total", METRICS_PREFIX),
        Unit::Count,
        "Enrichment records applied"
    );

    tracing::debug!("Metrics registered");
}

pub fn record_heuristic() {
    counter!(format!("{}_heuristic_scores_total", METRICS_PREFIX)).increment(1);
}

/// Helper to record judgment metrics
pub fn record_judgment(outcome: JudgmentOutcome, model: &str, elapsed: Duration) {
    counter!(
        format!("{}_judgment_requests_total", METRICS_PREFIX),
        "model" => model.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    histogram!(
        format!("{}_judgment_duration_seconds", METRICS_PREFIX),
        "model" => model.to_string()
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_combined(path: CombinedPath) {
    counter!(
        format!("{}_combined_scores_total", METRICS_PREFIX),
        "path" => path.as_str()
    )
    .increment(1);
}

pub fn record_ingestion(new_papers: usize) {
    counter!(format!("{}_papers_ingested_total", METRICS_PREFIX)).increment(new_papers as u64);
}

pub fn record_enrichment(found: bool) {
    counter!(
        format!("{}_enrichment_applied_total", METRICS_PREFIX),
        "found" => if found { "true" } else { "false" }
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder() {
        register_metrics();
        record_heuristic();
        record_judgment(JudgmentOutcome::Malformed, "mock", Duration::from_millis(5));
        record_combined(CombinedPath::HeuristicOnly);
        // Just verify it runs without panic
    }

    #[test]
    fn test_label_values() {
        assert_eq!(JudgmentOutcome::Error.as_str(), "error");
        assert_eq!(CombinedPath::HeuristicOnly.as_str(), "heuristic_only");
    }
}
