use common::error::AppError;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use triage_pipeline::{Action, DisplaySurface, Stage, Tier};

pub fn tier_color(tier: Tier) -> &'static str {
    match tier {
        Tier::High => "#e53935",
        Tier::Medium => "#fb8c00",
        Tier::Low => "#43a047",
    }
}

/// Renders session instructions on stdout.
pub struct ConsoleSurface;

impl DisplaySurface for ConsoleSurface {
    fn show_upload_result(&self, status: &str) {
        println!("Upload: {status}");
    }

    fn show_stage_pending(&self, stage: Stage) {
        println!("{} in progress...", stage.display_label());
    }

    fn show_stage_output(&self, stage: Stage, text: &str, is_error: bool) {
        if is_error {
            println!("[{}] Error: {text}", stage.display_label());
        } else {
            println!("[{}]\n{text}", stage.display_label());
        }
    }

    fn enable_next_control(&self, stage: Stage) {
        println!("Ready: {}", stage.display_label());
    }

    fn enable_reveal_control(&self) {
        println!("Ready: reveal action");
    }

    fn reveal_action(&self, action: &Action) {
        println!(
            "Action: {} (tier {}, {})",
            action.label,
            action.tier.as_str(),
            tier_color(action.tier)
        );
    }

    fn show_fatal_error(&self, context: &str, message: &str) {
        eprintln!("{context} failed: {message}");
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Asks the operator whether to re-trigger a failed control.
pub struct ConsolePrompt {
    lines: Lines<BufReader<Stdin>>,
}

impl ConsolePrompt {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    pub async fn confirm(&mut self, question: &str) -> Result<bool, AppError> {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(format!("{question} [y/N] ").as_bytes())
            .await?;
        stdout.flush().await?;

        let answer = self.lines.next_line().await?.unwrap_or_default();
        Ok(is_affirmative(&answer))
    }
}

impl Default for ConsolePrompt {
    fn default() -> Self {
        Self::new()
    }
}
