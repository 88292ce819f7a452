use common::error::AppError;
use serde::{Deserialize, Serialize};

use super::{Stage, StageResult};

/// Body of a successful `POST /upload-audio/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub status: String,
}

/// Body of `POST /run-step/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResponse {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StepResponse {
    pub fn is_empty(&self) -> bool {
        self.output.is_none() && self.error.is_none()
    }

    /// Non-empty output wins, then error, then an empty output.
    pub fn into_stage_result(self, stage: Stage) -> StageResult {
        match (self.output, self.error) {
            (Some(output), _) if !output.is_empty() => StageResult::output(stage, output),
            (_, Some(error)) => StageResult::error(stage, error),
            (Some(output), None) => StageResult::output(stage, output),
            (None, None) => StageResult::error(
                stage,
                format!(
                    "{} returned neither output nor error",
                    stage.display_label()
                ),
            ),
        }
    }
}

/// Body of `GET /get-score/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ScoreResponse {
    pub fn into_score(self) -> Result<f64, AppError> {
        match (self.score, self.error) {
            (Some(score), _) if score.is_finite() => Ok(score),
            (Some(score), _) => Err(AppError::ScoreFetch(format!(
                "score is not a finite number: {score}"
            ))),
            (None, Some(error)) => Err(AppError::ScoreFetch(error)),
            (None, None) => Err(AppError::ScoreFetch(
                "response carried no score".to_string(),
            )),
        }
    }
}
