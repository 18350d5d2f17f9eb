//! Shared data models for the ReelCheck backend.
//!
//! This crate provides Serde-serializable types for:
//! - The virality analysis schema requested from the LLM
//! - Hashtag tiers
//! - Upload response bodies (merged report and in-band errors)

pub mod analysis;
pub mod response;

// Re-export common types
pub use analysis::{AnalysisMap, HashtagStrategy, SchemaViolation, ViralAnalysis};
pub use response::{build_reel_report, ErrorBody, UploadResponse};
