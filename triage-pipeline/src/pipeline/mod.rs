mod config;
mod services;
mod stages;
mod state;

pub use config::PipelineConfig;
pub use services::{HttpPipelineServices, PipelineServices};
pub use state::{PipelineState, SessionState};

use std::sync::Arc;

use common::{error::AppError, utils::config::AppConfig};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use self::state::SessionTransition;
use crate::{
    display::DisplaySurface,
    triage::{classify, Action},
    types::{AudioUpload, Stage, StageResult, UploadReceipt},
};

/// Drives one user session through upload, the ordered stages and the
/// final triage reveal. At most one remote call is outstanding at a time;
/// requests arriving while one is in flight are rejected.
pub struct TriageSession {
    session_id: Uuid,
    state: Mutex<PipelineState>,
    services: Arc<dyn PipelineServices>,
    display: Arc<dyn DisplaySurface>,
}

impl TriageSession {
    pub fn new(config: &AppConfig, display: Arc<dyn DisplaySurface>) -> Result<Self, AppError> {
        let services = HttpPipelineServices::new(PipelineConfig::from(config))?;

        Ok(Self::with_services(Arc::new(services), display))
    }

    pub fn with_services(
        services: Arc<dyn PipelineServices>,
        display: Arc<dyn DisplaySurface>,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            state: Mutex::new(PipelineState::default()),
            services,
            display,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub async fn snapshot(&self) -> PipelineState {
        self.state.lock().await.clone()
    }

    async fn transition(&self, event: SessionTransition) -> Result<SessionState, AppError> {
        self.state.lock().await.apply(event).map_err(|err| {
            warn!(session_id = %self.session_id, error = %err, "rejected session request");
            err
        })
    }

    #[tracing::instrument(skip_all, fields(session_id = %self.session_id))]
    pub async fn submit_upload(&self, file: Option<AudioUpload>) -> Result<UploadReceipt, AppError> {
        let upload = match stages::validate_upload(file) {
            Ok(upload) => upload,
            Err(err) => {
                self.display.show_fatal_error("upload", &err.to_string());
                return Err(err);
            }
        };

        self.transition(SessionTransition::BeginUpload).await?;

        match stages::submit_upload(self.services.as_ref(), &upload).await {
            Ok(receipt) => {
                self.transition(SessionTransition::UploadSucceeded).await?;
                info!(
                    session_id = %self.session_id,
                    file_name = %upload.file_name,
                    bytes = upload.len(),
                    "audio upload completed"
                );
                self.display.show_upload_result(&receipt.status);
                self.display.enable_next_control(Stage::first());
                Ok(receipt)
            }
            Err(err) => {
                self.transition(SessionTransition::UploadFailed).await?;
                warn!(session_id = %self.session_id, error = %err, "audio upload failed");
                self.display.show_fatal_error("upload", &err.to_string());
                Err(err)
            }
        }
    }

    /// Runs whichever stage is currently unlocked.
    pub async fn run_next_stage(&self) -> Result<StageResult, AppError> {
        let lifecycle = self.state.lock().await.lifecycle;
        match lifecycle {
            SessionState::StageReady(stage) => self.run_stage(stage).await,
            other => {
                warn!(session_id = %self.session_id, state = %other, "no stage is ready to run");
                Err(AppError::InvalidTransition(format!(
                    "no stage is ready to run in state {other}"
                )))
            }
        }
    }

    /// Runs `stage`, which must be the unlocked one. A stage error is shown
    /// and leaves the same stage unlocked for a retry.
    #[tracing::instrument(skip_all, fields(session_id = %self.session_id, stage = %stage))]
    pub async fn run_stage(&self, stage: Stage) -> Result<StageResult, AppError> {
        {
            let mut state = self.state.lock().await;
            if state.lifecycle != SessionState::StageReady(stage) {
                let err = AppError::InvalidTransition(format!(
                    "cannot run {stage} in state {}",
                    state.lifecycle
                ));
                warn!(
                    session_id = %self.session_id,
                    busy = state.lifecycle.is_busy(),
                    error = %err,
                    "rejected stage request"
                );
                return Err(err);
            }
            state.apply(SessionTransition::StartStage)?;
        }

        self.display.show_stage_pending(stage);
        let result = stages::run_step(self.services.as_ref(), stage).await;
        self.display
            .show_stage_output(stage, result.text(), result.is_error());

        let event = if result.is_error() {
            SessionTransition::StageFailed
        } else {
            SessionTransition::StageSucceeded
        };
        let next = {
            let mut state = self.state.lock().await;
            state.last_result = Some(result.clone());
            state.apply(event)?
        };

        match next {
            SessionState::StageReady(unlocked) => {
                if result.is_error() {
                    warn!(
                        session_id = %self.session_id,
                        stage = %stage,
                        error = result.text(),
                        "stage reported an error; retry required"
                    );
                } else {
                    info!(session_id = %self.session_id, stage = %stage, "stage completed");
                }
                self.display.enable_next_control(unlocked);
            }
            SessionState::AllStagesComplete => {
                info!(session_id = %self.session_id, stage = %stage, "all stages completed");
                self.display.enable_reveal_control();
            }
            _ => {}
        }

        Ok(result)
    }

    /// Fetches the final score and renders the recommended action.
    #[tracing::instrument(skip_all, fields(session_id = %self.session_id))]
    pub async fn reveal_action(&self) -> Result<Action, AppError> {
        self.transition(SessionTransition::BeginReveal).await?;

        match stages::fetch_score(self.services.as_ref()).await {
            Ok(score) => {
                let action = classify(score);
                self.transition(SessionTransition::RevealSucceeded).await?;
                info!(
                    session_id = %self.session_id,
                    score,
                    tier = action.tier.as_str(),
                    "triage action revealed"
                );
                self.display.reveal_action(&action);
                Ok(action)
            }
            Err(err) => {
                self.transition(SessionTransition::RevealFailed).await?;
                warn!(session_id = %self.session_id, error = %err, "score fetch failed");
                self.display.show_fatal_error("score", &err.to_string());
                Err(err)
            }
        }
    }
}
