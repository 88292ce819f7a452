use common::error::AppError;

use super::Stage;

/// Exactly one of output or error, never both and never neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Output(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
    pub stage: Stage,
    pub outcome: StageOutcome,
}

impl StageResult {
    pub fn output(stage: Stage, text: impl Into<String>) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Output(text.into()),
        }
    }

    pub fn error(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Error(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, StageOutcome::Error(_))
    }

    /// Text to render, whichever side of the outcome it came from.
    pub fn text(&self) -> &str {
        match &self.outcome {
            StageOutcome::Output(text) | StageOutcome::Error(text) => text,
        }
    }

    pub fn error_text(&self) -> Option<&str> {
        match &self.outcome {
            StageOutcome::Error(message) => Some(message),
            StageOutcome::Output(_) => None,
        }
    }

    pub fn into_output(self) -> Result<String, AppError> {
        match self.outcome {
            StageOutcome::Output(text) => Ok(text),
            StageOutcome::Error(message) => Err(AppError::Stage(format!(
                "{} failed: {message}",
                self.stage.display_label()
            ))),
        }
    }
}
