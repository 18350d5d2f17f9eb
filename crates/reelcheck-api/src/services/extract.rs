//! JSON object extraction from free-form LLM output.

use std::sync::LazyLock;

use regex::Regex;
use reelcheck_models::AnalysisMap;

/// First `{` through the last `}`, across newlines.
static JSON_SPAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// Parse the greedy brace span of `text` as a JSON object.
///
/// This is not balanced-brace matching: two sibling objects (`{..}{..}`) form
/// one span and fail to parse, and braces inside string values can shift the
/// span. Callers rely on that exact behavior.
pub fn extract_json_object(text: &str) -> Option<AnalysisMap> {
    let span = JSON_SPAN.find(text)?;
    serde_json::from_str(span.as_str()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_object() {
        let map = extract_json_object(r#"{"viral_score": 80, "tags": ["a"]}"#).unwrap();
        assert_eq!(map["viral_score"], json!(80));
        assert_eq!(map["tags"], json!(["a"]));
    }

    #[test]
    fn test_object_surrounded_by_prose() {
        let text = "Sure! Here is the analysis:\n```json\n{\n  \"viral_score\": 42\n}\n```\nGood luck.";
        let map = extract_json_object(text).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["viral_score"], json!(42));
    }

    #[test]
    fn test_nested_object_extracted_whole() {
        let text = r##"{"hashtag_strategy": {"broad": ["#a"]}, "viral_score": 1}"##;
        let map = extract_json_object(text).unwrap();
        assert_eq!(map["hashtag_strategy"], json!({"broad": ["#a"]}));
        assert_eq!(map["viral_score"], json!(1));
    }

    #[test]
    fn test_hashtags_in_prose_around_object() {
        let text = r##"Tags like "#reels" work. {"niche": ["#n1", "#n2"]} Use "#fyp" too."##;
        let map = extract_json_object(text).unwrap();
        assert_eq!(map["niche"], json!(["#n1", "#n2"]));
    }

    #[test]
    fn test_closing_brace_inside_string_value() {
        let map = extract_json_object(r#"x {"a": "}"} y"#).unwrap();
        assert_eq!(map["a"], json!("}"));
    }

    #[test]
    fn test_duplicate_keys_keep_last_value() {
        let map = extract_json_object(r#"{"viral_score": 10, "viral_score": 90}"#).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["viral_score"], json!(90));
    }

    #[test]
    fn test_no_braces() {
        assert!(extract_json_object("I cannot help with that").is_none());
        assert!(extract_json_object("").is_none());
    }

    #[test]
    fn test_braces_in_wrong_order() {
        assert!(extract_json_object("} nothing here {").is_none());
        assert!(extract_json_object("only an opener {").is_none());
    }

    #[test]
    fn test_sibling_objects_form_one_span() {
        assert!(extract_json_object(r#"{"a": 1}{"b": 2}"#).is_none());
        assert!(extract_json_object("first {\"a\": 1} then {\"b\": 2}").is_none());
    }

    #[test]
    fn test_trailing_brace_in_prose_breaks_span() {
        assert!(extract_json_object(r#"{"a": 1} and a stray }"#).is_none());
    }

    #[test]
    fn test_invalid_json_inside_braces() {
        assert!(extract_json_object("{not json}").is_none());
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let text = "prefix {\"viral_score\": 55, \"viral_chance\": \"Medium\"} suffix";
        assert_eq!(extract_json_object(text), extract_json_object(text));
        assert!(extract_json_object(text).is_some());
    }
}
