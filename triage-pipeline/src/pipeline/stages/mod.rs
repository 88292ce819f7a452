use common::error::AppError;
use tracing::{debug, instrument, warn};

use super::services::PipelineServices;
use crate::types::{AudioUpload, Stage, StageResult, UploadReceipt};

/// Presence check done before anything reaches the network.
pub fn validate_upload(file: Option<AudioUpload>) -> Result<AudioUpload, AppError> {
    let upload = file.ok_or_else(|| {
        AppError::Validation("select an audio file before submitting".to_string())
    })?;

    if upload.is_empty() {
        return Err(AppError::Validation(format!(
            "{} is empty",
            upload.file_name
        )));
    }

    Ok(upload)
}

#[instrument(level = "trace", skip_all, fields(file_name = %upload.file_name))]
pub async fn submit_upload(
    services: &dyn PipelineServices,
    upload: &AudioUpload,
) -> Result<UploadReceipt, AppError> {
    let receipt = services
        .upload_audio(upload)
        .await
        .map_err(into_upload_error)?;

    debug!(status = %receipt.status, "audio upload accepted");
    Ok(receipt)
}

/// Always yields a result; transport failures become error results.
#[instrument(level = "trace", skip_all, fields(stage = %stage))]
pub async fn run_step(services: &dyn PipelineServices, stage: Stage) -> StageResult {
    match services.request_step(stage).await {
        Ok(response) => response.into_stage_result(stage),
        Err(err) => {
            warn!(stage = %stage, error = %err, "stage call did not complete");
            StageResult::error(
                stage,
                format!(
                    "Local failure during {}: {}",
                    stage.display_label().to_lowercase(),
                    error_message(err)
                ),
            )
        }
    }
}

#[instrument(level = "trace", skip_all)]
pub async fn fetch_score(services: &dyn PipelineServices) -> Result<f64, AppError> {
    let response = services
        .fetch_score()
        .await
        .map_err(into_score_error)?;

    response.into_score()
}

fn error_message(err: AppError) -> String {
    match err {
        AppError::Transport(message)
        | AppError::Upload(message)
        | AppError::ScoreFetch(message)
        | AppError::Stage(message) => message,
        other => other.to_string(),
    }
}

fn into_upload_error(err: AppError) -> AppError {
    AppError::Upload(error_message(err))
}

fn into_score_error(err: AppError) -> AppError {
    AppError::ScoreFetch(error_message(err))
}
