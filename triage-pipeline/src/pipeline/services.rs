use async_trait::async_trait;
use common::error::AppError;
use reqwest::{
    multipart::{Form, Part},
    Client, ClientBuilder, Response,
};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::config::PipelineConfig;
use crate::types::{AudioUpload, ScoreResponse, Stage, StepResponse, UploadReceipt};

const UPLOAD_PATH: &str = "upload-audio/";
const RUN_STEP_PATH: &str = "run-step/";
const GET_SCORE_PATH: &str = "get-score/";
const UPLOAD_FIELD: &str = "file";

/// Remote collaborators invoked by the session. One call per method
/// invocation, no retries.
#[async_trait]
pub trait PipelineServices: Send + Sync {
    async fn upload_audio(&self, upload: &AudioUpload) -> Result<UploadReceipt, AppError>;

    async fn request_step(&self, stage: Stage) -> Result<StepResponse, AppError>;

    async fn fetch_score(&self) -> Result<ScoreResponse, AppError>;
}

pub struct HttpPipelineServices {
    client: Client,
    config: PipelineConfig,
}

impl HttpPipelineServices {
    pub fn new(config: PipelineConfig) -> Result<Self, AppError> {
        let client = ClientBuilder::new()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { client, config })
    }

    fn transport_error(&self, endpoint: &str, err: &reqwest::Error) -> AppError {
        if err.is_timeout() {
            AppError::Transport(format!(
                "{endpoint} timed out after {}s",
                self.config.request_timeout.as_secs_f64()
            ))
        } else {
            AppError::Transport(format!("{endpoint}: {err}"))
        }
    }

    async fn decode_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        response: Response,
    ) -> Result<T, AppError> {
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Transport(format!(
                "{endpoint} returned status {status}"
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| self.transport_error(endpoint, &err))?;
        serde_json::from_slice(&body)
            .map_err(|err| AppError::Transport(format!("{endpoint} returned malformed body: {err}")))
    }
}

#[async_trait]
impl PipelineServices for HttpPipelineServices {
    async fn upload_audio(&self, upload: &AudioUpload) -> Result<UploadReceipt, AppError> {
        let endpoint = self.config.endpoint(UPLOAD_PATH);
        let part = Part::bytes(upload.bytes.to_vec())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type())
            .map_err(|err| self.transport_error(&endpoint, &err))?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        debug!(
            endpoint = %endpoint,
            file_name = %upload.file_name,
            bytes = upload.len(),
            "submitting audio upload"
        );

        let response = self
            .client
            .post(&endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|err| self.transport_error(&endpoint, &err))?;

        self.decode_json(&endpoint, response).await
    }

    async fn request_step(&self, stage: Stage) -> Result<StepResponse, AppError> {
        let endpoint = self.config.endpoint(RUN_STEP_PATH);
        let response = self
            .client
            .post(&endpoint)
            .query(&[("step", stage.as_str())])
            .send()
            .await
            .map_err(|err| self.transport_error(&endpoint, &err))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| self.transport_error(&endpoint, &err))?;

        // A remote-reported error keeps its message even on a failure status.
        match serde_json::from_slice::<StepResponse>(&body) {
            Ok(step) if !step.is_empty() => Ok(step),
            _ if !status.is_success() => Err(AppError::Transport(format!(
                "{endpoint} returned status {status}"
            ))),
            Ok(step) => Ok(step),
            Err(err) => Err(AppError::Transport(format!(
                "{endpoint} returned malformed body: {err}"
            ))),
        }
    }

    async fn fetch_score(&self) -> Result<ScoreResponse, AppError> {
        let endpoint = self.config.endpoint(GET_SCORE_PATH);
        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|err| self.transport_error(&endpoint, &err))?;

        self.decode_json(&endpoint, response).await
    }
}
