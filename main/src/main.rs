mod console;

use std::{path::PathBuf, sync::Arc};

use common::{error::AppError, utils::config::get_config};
use console::{ConsolePrompt, ConsoleSurface};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use triage_pipeline::{AudioUpload, TriageSession};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    // Get config
    let config = get_config()?;

    let file = match std::env::args_os().nth(1) {
        Some(path) => Some(AudioUpload::from_path(PathBuf::from(path)).await?),
        None => None,
    };

    let session = TriageSession::new(&config, Arc::new(ConsoleSurface))?;
    info!(
        session_id = %session.session_id(),
        api_base_url = %config.api_base_url,
        "triage session started"
    );

    let mut prompt = ConsolePrompt::new();
    run_session(&session, file, &mut prompt).await?;

    Ok(())
}

async fn run_session(
    session: &TriageSession,
    file: Option<AudioUpload>,
    prompt: &mut ConsolePrompt,
) -> Result<(), AppError> {
    loop {
        let err = match session.submit_upload(file.clone()).await {
            Ok(_) => break,
            Err(err) => err,
        };
        if !err.is_retryable() || !prompt.confirm("Retry the upload?").await? {
            return Err(err);
        }
    }

    while let Some(stage) = session.snapshot().await.ready_stage() {
        let result = session.run_stage(stage).await?;
        if result.is_error()
            && !prompt
                .confirm(&format!("Retry {}?", stage.display_label()))
                .await?
        {
            return result.into_output().map(|_| ());
        }
    }

    loop {
        let err = match session.reveal_action().await {
            Ok(_) => return Ok(()),
            Err(err) => err,
        };
        if !err.is_retryable() || !prompt.confirm("Retry fetching the score?").await? {
            return Err(err);
        }
    }
}
