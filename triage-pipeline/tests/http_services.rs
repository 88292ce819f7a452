use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use common::error::AppError;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use triage_pipeline::{
    types::StageOutcome, Action, AudioUpload, DisplaySurface, HttpPipelineServices,
    PipelineConfig, PipelineServices, SessionState, Stage, TriageSession,
};

#[derive(Debug, Clone)]
struct ReceivedPart {
    field: String,
    file_name: Option<String>,
    content_type: Option<String>,
    len: usize,
}

#[derive(Default)]
struct RemoteLog {
    parts: Mutex<Vec<ReceivedPart>>,
    steps: Mutex<Vec<String>>,
}

#[derive(Deserialize)]
struct StepQuery {
    step: String,
}

async fn upload_audio(
    State(log): State<Arc<RemoteLog>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        let field_name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.expect("field bytes");
        log.parts.lock().await.push(ReceivedPart {
            field: field_name,
            file_name,
            content_type,
            len: bytes.len(),
        });
    }
    Json(json!({ "status": "File received" }))
}

async fn run_step(
    State(log): State<Arc<RemoteLog>>,
    Query(query): Query<StepQuery>,
) -> impl IntoResponse {
    log.steps.lock().await.push(query.step.clone());
    match query.step.as_str() {
        "transcription" => Json(json!({ "output": "Patient reports chest pain" })),
        "comprehension" => Json(json!({ "error": "model unavailable" })),
        other => Json(json!({ "error": format!("unknown step: {other}") })),
    }
}

async fn get_score() -> impl IntoResponse {
    Json(json!({ "score": 35 }))
}

async fn spawn_remote(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let address = listener.local_addr().expect("local address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve remote");
    });
    format!("http://{address}")
}

fn services(base_url: String, timeout: Duration) -> HttpPipelineServices {
    HttpPipelineServices::new(PipelineConfig {
        base_url,
        request_timeout: timeout,
    })
    .expect("http client")
}

async fn healthy_remote() -> (HttpPipelineServices, Arc<RemoteLog>) {
    let log = Arc::new(RemoteLog::default());
    let router = Router::new()
        .route("/upload-audio/", post(upload_audio))
        .route("/run-step/", post(run_step))
        .route("/get-score/", get(get_score))
        .with_state(Arc::clone(&log));
    let base_url = spawn_remote(router).await;
    (services(base_url, Duration::from_secs(5)), log)
}

#[tokio::test]
async fn upload_sends_multipart_file_field() {
    let (services, log) = healthy_remote().await;

    let receipt = services
        .upload_audio(&AudioUpload::new("call.mp3", vec![7_u8; 128]))
        .await
        .expect("upload accepted");

    assert_eq!(receipt.status, "File received");
    let parts = log.parts.lock().await.clone();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].field, "file");
    assert_eq!(parts[0].file_name.as_deref(), Some("call.mp3"));
    assert_eq!(parts[0].content_type.as_deref(), Some("audio/mpeg"));
    assert_eq!(parts[0].len, 128);
}

#[tokio::test]
async fn step_request_carries_stage_in_query() {
    let (services, log) = healthy_remote().await;

    let transcription = services
        .request_step(Stage::Transcription)
        .await
        .expect("step response")
        .into_stage_result(Stage::Transcription);
    let comprehension = services
        .request_step(Stage::Comprehension)
        .await
        .expect("step response")
        .into_stage_result(Stage::Comprehension);

    assert_eq!(
        transcription.outcome,
        StageOutcome::Output("Patient reports chest pain".into())
    );
    assert_eq!(
        comprehension.outcome,
        StageOutcome::Error("model unavailable".into())
    );
    assert_eq!(
        log.steps.lock().await.clone(),
        vec!["transcription".to_string(), "comprehension".to_string()]
    );
}

#[tokio::test]
async fn score_is_decoded_from_json() {
    let (services, _) = healthy_remote().await;

    let response = services.fetch_score().await.expect("score response");
    assert_eq!(response.score, Some(35.0));
}

#[tokio::test]
async fn failure_status_on_upload_is_a_transport_error() {
    let router = Router::new().route(
        "/upload-audio/",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "disk full") }),
    );
    let services = services(spawn_remote(router).await, Duration::from_secs(5));

    let err = services
        .upload_audio(&AudioUpload::new("call.m4a", vec![1_u8; 4]))
        .await
        .expect_err("upload rejected");

    assert!(matches!(err, AppError::Transport(message) if message.contains("500")));
}

#[derive(Default)]
struct FatalErrors {
    messages: std::sync::Mutex<Vec<String>>,
}

impl DisplaySurface for FatalErrors {
    fn show_upload_result(&self, _status: &str) {}

    fn show_stage_output(&self, _stage: Stage, _text: &str, _is_error: bool) {}

    fn enable_next_control(&self, _stage: Stage) {}

    fn enable_reveal_control(&self) {}

    fn reveal_action(&self, _action: &Action) {}

    fn show_fatal_error(&self, context: &str, message: &str) {
        self.messages
            .lock()
            .expect("surface lock")
            .push(format!("{context}: {message}"));
    }
}

fn receipt_without_status() -> Router {
    Router::new().route(
        "/upload-audio/",
        post(|| async { Json(json!({ "ok": true })) }),
    )
}

#[tokio::test]
async fn upload_receipt_without_status_is_malformed() {
    let services = services(
        spawn_remote(receipt_without_status()).await,
        Duration::from_secs(5),
    );

    let err = services
        .upload_audio(&AudioUpload::new("call.m4a", vec![1_u8; 4]))
        .await
        .expect_err("receipt lacks status");

    assert!(matches!(err, AppError::Transport(message) if message.contains("malformed")));
}

#[tokio::test]
async fn session_reports_upload_error_for_receipt_without_status() {
    let services = services(
        spawn_remote(receipt_without_status()).await,
        Duration::from_secs(5),
    );
    let surface = Arc::new(FatalErrors::default());
    let session = TriageSession::with_services(Arc::new(services), surface.clone());

    let err = session
        .submit_upload(Some(AudioUpload::new("call.m4a", vec![1_u8; 4])))
        .await
        .expect_err("upload rejected");

    assert!(matches!(&err, AppError::Upload(message) if message.contains("malformed")));
    let snapshot = session.snapshot().await;
    assert!(!snapshot.upload_completed);
    assert_eq!(snapshot.lifecycle, SessionState::AwaitingUpload);
    let messages = surface.messages.lock().expect("surface lock").clone();
    assert_eq!(messages, [format!("upload: {err}")]);
}

#[tokio::test]
async fn step_error_payload_survives_failure_status() {
    let router = Router::new().route(
        "/run-step/",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "diarization crashed" })),
            )
        }),
    );
    let services = services(spawn_remote(router).await, Duration::from_secs(5));

    let response = services
        .request_step(Stage::Transcription)
        .await
        .expect("error payload is a response");
    assert_eq!(response.error.as_deref(), Some("diarization crashed"));
}

#[tokio::test]
async fn step_failure_status_without_payload_is_a_transport_error() {
    let router = Router::new().route(
        "/run-step/",
        post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
    );
    let services = services(spawn_remote(router).await, Duration::from_secs(5));

    let err = services
        .request_step(Stage::Score)
        .await
        .expect_err("no payload");
    assert!(matches!(err, AppError::Transport(message) if message.contains("502")));
}

#[tokio::test]
async fn malformed_score_body_is_a_transport_error() {
    let router = Router::new().route("/get-score/", get(|| async { "thirty-five" }));
    let services = services(spawn_remote(router).await, Duration::from_secs(5));

    let err = services.fetch_score().await.expect_err("malformed body");
    assert!(matches!(err, AppError::Transport(message) if message.contains("malformed")));
}

#[tokio::test]
async fn slow_remote_times_out() {
    let router = Router::new().route(
        "/get-score/",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "score": 10 }))
        }),
    );
    let services = services(spawn_remote(router).await, Duration::from_millis(200));

    let err = services.fetch_score().await.expect_err("request times out");
    assert!(matches!(err, AppError::Transport(message) if message.contains("timed out")));
}

#[tokio::test]
async fn unreachable_remote_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let address = listener.local_addr().expect("local address");
    drop(listener);
    let services = services(format!("http://{address}"), Duration::from_secs(2));

    let err = services
        .request_step(Stage::Transcription)
        .await
        .expect_err("nothing listening");
    assert!(matches!(err, AppError::Transport(_)));
}
