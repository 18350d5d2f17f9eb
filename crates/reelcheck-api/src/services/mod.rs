//! Analysis services.

pub mod analysis;
pub mod extract;
pub mod openai;

pub use analysis::{build_analysis_prompt, AnalysisRequester};
pub use extract::extract_json_object;
pub use openai::{AnalysisService, MockAnalysisService, OpenAiClient};
