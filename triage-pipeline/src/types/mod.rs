pub mod audio_upload;
pub mod remote;
pub mod stage_result;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use audio_upload::AudioUpload;
pub use remote::{ScoreResponse, StepResponse, UploadReceipt};
pub use stage_result::{StageOutcome, StageResult};

/// One step of the fixed processing sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Transcription,
    Comprehension,
    Score,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Transcription, Stage::Comprehension, Stage::Score];

    pub fn first() -> Self {
        Stage::Transcription
    }

    /// Value sent as the `step` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Transcription => "transcription",
            Stage::Comprehension => "comprehension",
            Stage::Score => "score",
        }
    }

    pub fn display_label(&self) -> &'static str {
        match self {
            Stage::Transcription => "Transcription & diarization",
            Stage::Comprehension => "Comprehension",
            Stage::Score => "Final score computation",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Stage::Transcription => 0,
            Stage::Comprehension => 1,
            Stage::Score => 2,
        }
    }

    pub fn next(self) -> Option<Self> {
        match self {
            Stage::Transcription => Some(Stage::Comprehension),
            Stage::Comprehension => Some(Stage::Score),
            Stage::Score => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
