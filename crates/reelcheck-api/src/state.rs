//! Application state.

use std::sync::Arc;

use reelcheck_media::{DurationProber, FfprobeDurationProber, UploadStore};

use crate::config::{ApiConfig, OpenAiConfig};
use crate::error::ApiResult;
use crate::services::{AnalysisRequester, AnalysisService, OpenAiClient};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub uploads: UploadStore,
    pub prober: Arc<dyn DurationProber>,
    pub analysis: AnalysisRequester,
}

impl AppState {
    /// Create application state backed by ffprobe and the OpenAI API.
    pub fn new(config: ApiConfig, openai: OpenAiConfig) -> ApiResult<Self> {
        let prober = FfprobeDurationProber::new(&config.ffprobe_path);
        let client = OpenAiClient::new(openai)?;

        Ok(Self::with_services(config, Arc::new(prober), Arc::new(client)))
    }

    /// Create application state from explicit collaborators.
    pub fn with_services(
        config: ApiConfig,
        prober: Arc<dyn DurationProber>,
        service: Arc<dyn AnalysisService>,
    ) -> Self {
        let uploads = UploadStore::new(config.upload_dir.clone());

        Self {
            config,
            uploads,
            prober,
            analysis: AnalysisRequester::new(service),
        }
    }
}
