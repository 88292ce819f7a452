use std::fmt;

use common::error::AppError;
use state_machines::{core::GuardError, state_machine};

use crate::types::{Stage, StageResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingUpload,
    Uploading,
    StageReady(Stage),
    StageRunning(Stage),
    AllStagesComplete,
    FetchingScore,
    ActionRevealed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::AwaitingUpload => "AwaitingUpload",
            SessionState::Uploading => "Uploading",
            SessionState::StageReady(_) => "StageReady",
            SessionState::StageRunning(_) => "StageRunning",
            SessionState::AllStagesComplete => "AllStagesComplete",
            SessionState::FetchingScore => "FetchingScore",
            SessionState::ActionRevealed => "ActionRevealed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::ActionRevealed)
    }

    /// A remote call is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SessionState::Uploading | SessionState::StageRunning(_) | SessionState::FetchingScore
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::StageReady(stage) | SessionState::StageRunning(stage) => {
                write!(f, "{}({stage})", self.as_str())
            }
            _ => f.write_str(self.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTransition {
    BeginUpload,
    UploadSucceeded,
    UploadFailed,
    StartStage,
    StageSucceeded,
    StageFailed,
    BeginReveal,
    RevealSucceeded,
    RevealFailed,
}

impl SessionTransition {
    fn as_str(&self) -> &'static str {
        match self {
            SessionTransition::BeginUpload => "begin_upload",
            SessionTransition::UploadSucceeded => "upload_succeeded",
            SessionTransition::UploadFailed => "upload_failed",
            SessionTransition::StartStage => "start_stage",
            SessionTransition::StageSucceeded => "stage_succeeded",
            SessionTransition::StageFailed => "stage_failed",
            SessionTransition::BeginReveal => "begin_reveal",
            SessionTransition::RevealSucceeded => "reveal_succeeded",
            SessionTransition::RevealFailed => "reveal_failed",
        }
    }
}

mod lifecycle {
    use super::{state_machine, GuardError};

    state_machine! {
        name: TriageLifecycleMachine,
        initial: AwaitingUpload,
        states: [
            AwaitingUpload,
            Uploading,
            TranscriptionReady,
            TranscriptionRunning,
            ComprehensionReady,
            ComprehensionRunning,
            ScoreReady,
            ScoreRunning,
            AllStagesComplete,
            FetchingScore,
            ActionRevealed
        ],
        events {
            begin_upload { transition: { from: AwaitingUpload, to: Uploading } }
            upload_succeeded { transition: { from: Uploading, to: TranscriptionReady } }
            upload_failed { transition: { from: Uploading, to: AwaitingUpload } }
            run_transcription { transition: { from: TranscriptionReady, to: TranscriptionRunning } }
            transcription_succeeded { transition: { from: TranscriptionRunning, to: ComprehensionReady } }
            transcription_failed { transition: { from: TranscriptionRunning, to: TranscriptionReady } }
            run_comprehension { transition: { from: ComprehensionReady, to: ComprehensionRunning } }
            comprehension_succeeded { transition: { from: ComprehensionRunning, to: ScoreReady } }
            comprehension_failed { transition: { from: ComprehensionRunning, to: ComprehensionReady } }
            run_score { transition: { from: ScoreReady, to: ScoreRunning } }
            score_succeeded { transition: { from: ScoreRunning, to: AllStagesComplete } }
            score_failed { transition: { from: ScoreRunning, to: ScoreReady } }
            begin_reveal { transition: { from: AllStagesComplete, to: FetchingScore } }
            reveal_succeeded { transition: { from: FetchingScore, to: ActionRevealed } }
            reveal_failed { transition: { from: FetchingScore, to: AllStagesComplete } }
        }
    }

    pub(super) type Machine<S> = TriageLifecycleMachine<(), S>;

    pub(super) fn guard<M, S>(result: Result<M, (S, GuardError)>) -> Result<M, GuardError> {
        result.map_err(|(_, guard)| guard)
    }

    pub(super) fn awaiting_upload() -> Machine<AwaitingUpload> {
        TriageLifecycleMachine::new(())
    }

    pub(super) fn uploading() -> Result<Machine<Uploading>, GuardError> {
        guard(awaiting_upload().begin_upload())
    }

    pub(super) fn transcription_ready() -> Result<Machine<TranscriptionReady>, GuardError> {
        guard(uploading()?.upload_succeeded())
    }

    pub(super) fn transcription_running() -> Result<Machine<TranscriptionRunning>, GuardError> {
        guard(transcription_ready()?.run_transcription())
    }

    pub(super) fn comprehension_ready() -> Result<Machine<ComprehensionReady>, GuardError> {
        guard(transcription_running()?.transcription_succeeded())
    }

    pub(super) fn comprehension_running() -> Result<Machine<ComprehensionRunning>, GuardError> {
        guard(comprehension_ready()?.run_comprehension())
    }

    pub(super) fn score_ready() -> Result<Machine<ScoreReady>, GuardError> {
        guard(comprehension_running()?.comprehension_succeeded())
    }

    pub(super) fn score_running() -> Result<Machine<ScoreRunning>, GuardError> {
        guard(score_ready()?.run_score())
    }

    pub(super) fn all_stages_complete() -> Result<Machine<AllStagesComplete>, GuardError> {
        guard(score_running()?.score_succeeded())
    }

    pub(super) fn fetching_score() -> Result<Machine<FetchingScore>, GuardError> {
        guard(all_stages_complete()?.begin_reveal())
    }
}

fn invalid_transition(state: &SessionState, event: SessionTransition) -> AppError {
    AppError::InvalidTransition(format!(
        "Invalid triage session transition: {state} -> {}",
        event.as_str()
    ))
}

fn compute_next_state(
    state: &SessionState,
    event: SessionTransition,
) -> Result<SessionState, AppError> {
    use lifecycle::*;
    use SessionState as S;
    use SessionTransition as T;

    let next = match (state, event) {
        (S::AwaitingUpload, T::BeginUpload) => {
            guard(awaiting_upload().begin_upload()).map(|_| S::Uploading)
        }
        (S::Uploading, T::UploadSucceeded) => uploading()
            .and_then(|m| guard(m.upload_succeeded()))
            .map(|_| S::StageReady(Stage::Transcription)),
        (S::Uploading, T::UploadFailed) => uploading()
            .and_then(|m| guard(m.upload_failed()))
            .map(|_| S::AwaitingUpload),
        (S::StageReady(Stage::Transcription), T::StartStage) => transcription_ready()
            .and_then(|m| guard(m.run_transcription()))
            .map(|_| S::StageRunning(Stage::Transcription)),
        (S::StageRunning(Stage::Transcription), T::StageSucceeded) => transcription_running()
            .and_then(|m| guard(m.transcription_succeeded()))
            .map(|_| S::StageReady(Stage::Comprehension)),
        (S::StageRunning(Stage::Transcription), T::StageFailed) => transcription_running()
            .and_then(|m| guard(m.transcription_failed()))
            .map(|_| S::StageReady(Stage::Transcription)),
        (S::StageReady(Stage::Comprehension), T::StartStage) => comprehension_ready()
            .and_then(|m| guard(m.run_comprehension()))
            .map(|_| S::StageRunning(Stage::Comprehension)),
        (S::StageRunning(Stage::Comprehension), T::StageSucceeded) => comprehension_running()
            .and_then(|m| guard(m.comprehension_succeeded()))
            .map(|_| S::StageReady(Stage::Score)),
        (S::StageRunning(Stage::Comprehension), T::StageFailed) => comprehension_running()
            .and_then(|m| guard(m.comprehension_failed()))
            .map(|_| S::StageReady(Stage::Comprehension)),
        (S::StageReady(Stage::Score), T::StartStage) => score_ready()
            .and_then(|m| guard(m.run_score()))
            .map(|_| S::StageRunning(Stage::Score)),
        (S::StageRunning(Stage::Score), T::StageSucceeded) => score_running()
            .and_then(|m| guard(m.score_succeeded()))
            .map(|_| S::AllStagesComplete),
        (S::StageRunning(Stage::Score), T::StageFailed) => score_running()
            .and_then(|m| guard(m.score_failed()))
            .map(|_| S::StageReady(Stage::Score)),
        (S::AllStagesComplete, T::BeginReveal) => all_stages_complete()
            .and_then(|m| guard(m.begin_reveal()))
            .map(|_| S::FetchingScore),
        (S::FetchingScore, T::RevealSucceeded) => fetching_score()
            .and_then(|m| guard(m.reveal_succeeded()))
            .map(|_| S::ActionRevealed),
        (S::FetchingScore, T::RevealFailed) => fetching_score()
            .and_then(|m| guard(m.reveal_failed()))
            .map(|_| S::AllStagesComplete),
        _ => return Err(invalid_transition(state, event)),
    };

    next.map_err(|_| invalid_transition(state, event))
}

/// Mutable session record owned by the controller.
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub lifecycle: SessionState,
    /// Index of the stage that is ready or running; never decreases.
    pub current_stage_index: usize,
    pub last_result: Option<StageResult>,
    pub upload_completed: bool,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            lifecycle: SessionState::AwaitingUpload,
            current_stage_index: 0,
            last_result: None,
            upload_completed: false,
        }
    }
}

impl PipelineState {
    pub(crate) fn apply(&mut self, event: SessionTransition) -> Result<SessionState, AppError> {
        let next = compute_next_state(&self.lifecycle, event)?;

        match next {
            SessionState::StageReady(stage) | SessionState::StageRunning(stage) => {
                self.current_stage_index = self.current_stage_index.max(stage.index());
            }
            SessionState::AllStagesComplete
            | SessionState::FetchingScore
            | SessionState::ActionRevealed => {
                self.current_stage_index = Stage::ALL.len();
            }
            SessionState::AwaitingUpload | SessionState::Uploading => {}
        }
        if event == SessionTransition::UploadSucceeded {
            self.upload_completed = true;
        }

        self.lifecycle = next;
        Ok(next)
    }

    /// The stage whose control is currently unlocked, if any.
    pub fn ready_stage(&self) -> Option<Stage> {
        match self.lifecycle {
            SessionState::StageReady(stage) => Some(stage),
            _ => None,
        }
    }
}
