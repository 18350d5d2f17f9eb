//! Virality analysis requests.

use std::sync::Arc;
use std::time::Instant;

use reelcheck_models::{AnalysisMap, ViralAnalysis};
use tracing::{info, warn};

use crate::error::ApiResult;
use crate::metrics;
use crate::services::extract::extract_json_object;
use crate::services::openai::AnalysisService;

/// Builds the analysis prompt, sends it, and extracts the JSON answer.
#[derive(Clone)]
pub struct AnalysisRequester {
    service: Arc<dyn AnalysisService>,
}

impl AnalysisRequester {
    pub fn new(service: Arc<dyn AnalysisService>) -> Self {
        Self { service }
    }

    /// Analyze a reel.
    ///
    /// Returns `Ok(None)` when the LLM answered but no JSON object could be
    /// extracted from its text.
    pub async fn analyze(
        &self,
        caption: &str,
        duration_seconds: f64,
    ) -> ApiResult<Option<AnalysisMap>> {
        let prompt = build_analysis_prompt(caption, duration_seconds);

        let start = Instant::now();
        let text = self.service.complete(&prompt).await?;
        metrics::record_llm_duration(start.elapsed().as_secs_f64());

        let Some(analysis) = extract_json_object(text.trim()) else {
            warn!(response_len = text.len(), "No JSON object in LLM response");
            return Ok(None);
        };

        match ViralAnalysis::from_map(&analysis) {
            Ok(typed) => {
                metrics::record_viral_score(typed.viral_score);
                info!(
                    viral_score = typed.viral_score,
                    caption_score = typed.current_caption_score,
                    "Analysis received"
                );
            }
            Err(e) => warn!(error = %e, "LLM analysis deviates from the requested schema"),
        }

        Ok(Some(analysis))
    }
}

/// Render the fixed analysis prompt.
pub fn build_analysis_prompt(caption: &str, duration_seconds: f64) -> String {
    format!(
        r#"
You are an Instagram growth expert with 5+ years of experience creating viral content.
Analyze this Instagram Reel with professional depth:

VIDEO DETAILS:
- Duration: {duration_seconds:?} seconds
- Current Caption: "{caption}"

YOUR TASK:
1) current_caption_score (0-100): Evaluate based on:
   - Emotional resonance (0-30pts)
   - Curiosity gap (0-25pts)
   - Trend alignment (0-20pts)
   - Call-to-action (0-15pts)
   - Hashtag strategy (0-10pts)

2) caption_feedback: Provide 3-5 specific, actionable improvements

3) suggested_caption: Create 3 viral options following this structure:
   - Start with [EMOJI] + attention-grabber
   - Use "|" separators for scannability
   - Include 1 curiosity gap
   - Add subtle CTA
   Example: "🔥 Did you know THIS about...? | The results shocked me! | Try it & tag me 👇"

4) hashtags: Provide 8-10 relevant hashtags in this structure:
   - 3 broad (100k-1M posts)
   - 4 medium (10k-100k posts)
   - 3 niche (<10k posts)

5) viral_score (0-100): Calculate based on:
   - Content uniqueness (30%)
   - Engagement potential (25%)
   - Trend relevance (20%)
   - Production quality (15%)
   - Caption strength (10%)

6) viral_chance: High (>80)/Medium (50-80)/Low (<50) with confidence %

7) viral_reason: 3 data-backed reasons with Instagram algorithm insights

8) tips: 5 professional growth hacks including:
   - Hook timing suggestions
   - Text overlay improvements
   - Trending audio recommendations
   - Collaboration opportunities
   - Engagement boost strategies

9) best_post_time: 3 optimal posting windows with timezone
   Example: ["Weekdays 7-9PM EST", "Saturday 10-11AM EST", "Sunday 4-6PM EST"]

10) best_post_time_reason: Audience behavior analytics

Return ONLY this JSON structure:
{{
  "current_caption_score": int,
  "caption_feedback": str,
  "suggested_captions": [str, str, str],
  "hashtag_strategy": {{
    "broad": [str, str, str],
    "medium": [str, str, str, str],
    "niche": [str, str, str]
  }},
  "viral_score": int,
  "viral_chance": str,
  "viral_reasons": [str, str, str],
  "pro_tips": [str, str, str, str, str],
  "optimal_post_times": [str, str, str],
  "algorithm_insights": str
}}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::services::openai::MockAnalysisService;
    use serde_json::json;

    const CANONICAL: &str = r##"{
        "current_caption_score": 55,
        "caption_feedback": "Open with a question.",
        "suggested_captions": ["a", "b", "c"],
        "hashtag_strategy": {"broad": ["#a", "#b", "#c"], "medium": ["#d", "#e", "#f", "#g"], "niche": ["#h", "#i", "#j"]},
        "viral_score": 67,
        "viral_chance": "Medium (65% confidence)",
        "viral_reasons": ["x", "y", "z"],
        "pro_tips": ["1", "2", "3", "4", "5"],
        "optimal_post_times": ["Mon 7PM EST", "Sat 10AM EST", "Sun 5PM EST"],
        "algorithm_insights": "Watch time dominates."
    }"##;

    #[test]
    fn test_prompt_embeds_inputs() {
        let prompt = build_analysis_prompt("Check this out!", 10.0);
        assert!(prompt.contains("- Duration: 10.0 seconds"));
        assert!(prompt.contains("- Current Caption: \"Check this out!\""));
        assert!(prompt.contains("Return ONLY this JSON structure:"));
        assert!(prompt.contains("\"medium\": [str, str, str, str]"));
        assert!(prompt.contains("\"algorithm_insights\": str\n}"));
    }

    #[test]
    fn test_prompt_keeps_fractional_duration() {
        let prompt = build_analysis_prompt("", 12.345);
        assert!(prompt.contains("- Duration: 12.345 seconds"));
        assert!(prompt.contains("- Current Caption: \"\""));
    }

    #[tokio::test]
    async fn test_analyze_returns_extracted_object() {
        let mut service = MockAnalysisService::new();
        service
            .expect_complete()
            .withf(|prompt| prompt.contains("\"Check this out!\""))
            .times(1)
            .returning(|_| Ok(format!("  {}\n", CANONICAL)));

        let requester = AnalysisRequester::new(Arc::new(service));
        let analysis = requester.analyze("Check this out!", 10.0).await.unwrap().unwrap();

        assert_eq!(analysis["viral_score"], json!(67));
        assert_eq!(analysis.len(), 10);
    }

    #[tokio::test]
    async fn test_analyze_keeps_off_schema_objects() {
        let mut service = MockAnalysisService::new();
        service
            .expect_complete()
            .returning(|_| Ok(r#"{"viral_score": "very"}"#.to_string()));

        let requester = AnalysisRequester::new(Arc::new(service));
        let analysis = requester.analyze("", 0.0).await.unwrap().unwrap();

        assert_eq!(analysis["viral_score"], json!("very"));
    }

    #[tokio::test]
    async fn test_analyze_unparseable_text() {
        let mut service = MockAnalysisService::new();
        service
            .expect_complete()
            .returning(|_| Ok("I cannot help with that".to_string()));

        let requester = AnalysisRequester::new(Arc::new(service));
        assert!(requester.analyze("caption", 3.0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_analyze_propagates_service_errors() {
        let mut service = MockAnalysisService::new();
        service
            .expect_complete()
            .returning(|_| Err(ApiError::llm("connection refused")));

        let requester = AnalysisRequester::new(Arc::new(service));
        let err = requester.analyze("caption", 3.0).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}
