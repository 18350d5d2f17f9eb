//! Virality analysis data models.
//!
//! The LLM is asked to return a fixed ten-field JSON object. The response body
//! is always built from the raw [`AnalysisMap`] so nothing the model returned is
//! dropped; [`ViralAnalysis`] is the typed view used to check that object
//! against the documented schema.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Raw JSON object extracted from the LLM response.
pub type AnalysisMap = serde_json::Map<String, Value>;

/// Inclusive upper bound for every 0-100 score field.
pub const MAX_SCORE: i64 = 100;

/// Hashtags grouped by audience size.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HashtagStrategy {
    /// 100k-1M posts
    pub broad: Vec<String>,
    /// 10k-100k posts
    pub medium: Vec<String>,
    /// <10k posts
    pub niche: Vec<String>,
}

/// Typed view of the ten-field analysis schema.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ViralAnalysis {
    pub current_caption_score: i64,
    pub caption_feedback: String,
    pub suggested_captions: Vec<String>,
    pub hashtag_strategy: HashtagStrategy,
    pub viral_score: i64,
    /// High / Medium / Low, usually with a confidence percentage
    pub viral_chance: String,
    pub viral_reasons: Vec<String>,
    pub pro_tips: Vec<String>,
    pub optimal_post_times: Vec<String>,
    pub algorithm_insights: String,
}

/// Ways an LLM object can deviate from the documented schema.
#[derive(Debug, Error)]
pub enum SchemaViolation {
    #[error("analysis does not decode: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{field} = {value} is outside 0-{}", MAX_SCORE)]
    ScoreOutOfRange { field: &'static str, value: i64 },

    #[error("{field} has {actual} entries, expected {expected}")]
    WrongLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl ViralAnalysis {
    /// Decode and validate a raw analysis object.
    pub fn from_map(map: &AnalysisMap) -> Result<Self, SchemaViolation> {
        let analysis: Self = serde_json::from_value(Value::Object(map.clone()))?;
        analysis.validate()?;
        Ok(analysis)
    }

    /// Check score ranges and list sizes.
    pub fn validate(&self) -> Result<(), SchemaViolation> {
        check_score("current_caption_score", self.current_caption_score)?;
        check_score("viral_score", self.viral_score)?;

        check_len("suggested_captions", &self.suggested_captions, 3)?;
        check_len("hashtag_strategy.broad", &self.hashtag_strategy.broad, 3)?;
        check_len("hashtag_strategy.medium", &self.hashtag_strategy.medium, 4)?;
        check_len("hashtag_strategy.niche", &self.hashtag_strategy.niche, 3)?;
        check_len("viral_reasons", &self.viral_reasons, 3)?;
        check_len("pro_tips", &self.pro_tips, 5)?;
        check_len("optimal_post_times", &self.optimal_post_times, 3)?;

        Ok(())
    }
}

fn check_score(field: &'static str, value: i64) -> Result<(), SchemaViolation> {
    if (0..=MAX_SCORE).contains(&value) {
        Ok(())
    } else {
        Err(SchemaViolation::ScoreOutOfRange { field, value })
    }
}

fn check_len(
    field: &'static str,
    items: &[String],
    expected: usize,
) -> Result<(), SchemaViolation> {
    if items.len() == expected {
        Ok(())
    } else {
        Err(SchemaViolation::WrongLength {
            field,
            expected,
            actual: items.len(),
        })
    }
}
