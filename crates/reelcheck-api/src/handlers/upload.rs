//! Reel upload handler.
//!
//! Every outcome, including internal failures, is answered with HTTP 200 and
//! a JSON body: the merged report or a two-field `{error, details}` object.

use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::Json;
use tracing::{debug, error, info, warn};

use reelcheck_media::{StoredFile, UploadStore};
use reelcheck_models::{build_reel_report, ErrorBody, UploadResponse};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Multipart part carrying the video.
const FILE_FIELD: &str = "file";
/// Multipart part carrying the caption.
const CAPTION_FIELD: &str = "caption";

/// Upload a reel and return its virality analysis.
pub async fn upload_reel(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Json<UploadResponse> {
    let outcome = match multipart {
        Ok(multipart) => process_upload(&state, multipart).await,
        Err(rejection) => Err(ApiError::upload(rejection.body_text())),
    };

    let response = match outcome {
        Ok(response) => {
            metrics::record_upload(upload_outcome(&response));
            response
        }
        Err(e) => {
            error!(error = %e, "Upload processing failed");
            metrics::record_upload("failed");
            UploadResponse::Error(ErrorBody::processing_failed(e.to_string()))
        }
    };

    Json(response)
}

/// Outcome label for `reelcheck_uploads_total`.
fn upload_outcome(response: &UploadResponse) -> &'static str {
    match response {
        UploadResponse::Report(map) if map.contains_key("error") => "llm_error",
        UploadResponse::Report(_) => "analyzed",
        UploadResponse::Error(_) => "unparseable",
    }
}

async fn process_upload(state: &AppState, mut multipart: Multipart) -> ApiResult<UploadResponse> {
    let mut caption = String::new();
    let mut upload: Option<(String, StoredFile)> = None;

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FILE_FIELD if upload.is_none() => {
                let filename = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
                    .ok_or_else(|| ApiError::upload("uploaded file has no filename"))?;
                let stored = store_field(&state.uploads, &filename, &mut field).await?;
                upload = Some((filename, stored));
            }
            CAPTION_FIELD => caption = field.text().await?,
            _ => debug!(field = %name, "Ignoring multipart field"),
        }
    }

    let (filename, stored) =
        upload.ok_or_else(|| ApiError::upload("missing required field `file`"))?;

    info!(
        filename = %filename,
        path = %stored.path.display(),
        size = stored.size,
        "Stored upload"
    );
    metrics::record_upload_size(stored.size);

    let duration_seconds = match state.prober.probe_duration(&stored.path).await {
        Ok(duration) => duration,
        Err(e) => {
            warn!(error = %e, filename = %filename, "Duration probe failed, using 0.0");
            metrics::record_probe_failure();
            0.0
        }
    };

    let response = match state.analysis.analyze(&caption, duration_seconds).await? {
        None => UploadResponse::Error(ErrorBody::analysis_unparseable()),
        // The model reported its own error object; pass it through untouched.
        Some(analysis) if analysis.contains_key("error") => UploadResponse::Report(analysis),
        Some(analysis) => {
            UploadResponse::Report(build_reel_report(&filename, duration_seconds, analysis))
        }
    };

    Ok(response)
}

/// Stream a multipart field into the upload store.
async fn store_field(
    store: &UploadStore,
    filename: &str,
    field: &mut Field<'_>,
) -> ApiResult<StoredFile> {
    let mut pending = store.begin(filename).await?;

    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                pending.discard().await;
                return Err(e.into());
            }
        };

        if let Err(e) = pending.write_chunk(&chunk).await {
            pending.discard().await;
            return Err(e.into());
        }
    }

    Ok(pending.finish().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelcheck_models::AnalysisMap;
    use serde_json::json;

    fn report(value: serde_json::Value) -> UploadResponse {
        match value {
            serde_json::Value::Object(map) => UploadResponse::Report(map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_upload_outcome_labels() {
        let merged = build_reel_report("reel.mp4", 10.0, AnalysisMap::new());
        assert_eq!(upload_outcome(&UploadResponse::Report(merged)), "analyzed");

        let passthrough = report(json!({"error": "Content policy", "details": "no"}));
        assert_eq!(upload_outcome(&passthrough), "llm_error");

        let unparseable = UploadResponse::Error(ErrorBody::analysis_unparseable());
        assert_eq!(upload_outcome(&unparseable), "unparseable");
    }
}
