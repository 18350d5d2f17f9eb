//! Upload response bodies.
//!
//! Every outcome of an upload is reported in-band with HTTP 200: either the
//! merged report built by [`build_reel_report`] or an [`ErrorBody`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::AnalysisMap;

/// Label for failures anywhere in the upload pipeline.
pub const PROCESSING_FAILED: &str = "Processing failed";

/// Label for LLM output that held no parseable JSON object.
pub const ANALYSIS_FAILED: &str = "Failed to analyze content";

/// Detail message paired with [`ANALYSIS_FAILED`].
pub const ANALYSIS_FAILED_DETAILS: &str =
    "The AI response couldn't be processed. Please try again.";

/// Two-field in-band error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

impl ErrorBody {
    /// Failure while storing, probing or calling the LLM.
    pub fn processing_failed(details: impl Into<String>) -> Self {
        Self {
            error: PROCESSING_FAILED.to_string(),
            details: details.into(),
        }
    }

    /// The LLM answered but no JSON object could be extracted.
    pub fn analysis_unparseable() -> Self {
        Self {
            error: ANALYSIS_FAILED.to_string(),
            details: ANALYSIS_FAILED_DETAILS.to_string(),
        }
    }
}

/// Body of `POST /upload-reel/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UploadResponse {
    /// Merged report, or an LLM object passed through as-is
    Report(AnalysisMap),
    Error(ErrorBody),
}

/// Merge upload metadata with the analysis object.
///
/// `filename` and `duration_seconds` come first; analysis keys follow in
/// their original order and win on a name clash.
pub fn build_reel_report(
    filename: &str,
    duration_seconds: f64,
    analysis: AnalysisMap,
) -> AnalysisMap {
    let mut report = AnalysisMap::new();
    report.insert("filename".to_string(), Value::String(filename.to_string()));
    report.insert("duration_seconds".to_string(), Value::from(duration_seconds));

    for (key, value) in analysis {
        report.insert(key, value);
    }

    report
}
