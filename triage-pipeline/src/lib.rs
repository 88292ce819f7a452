#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

pub mod display;
pub mod pipeline;
pub mod triage;
pub mod types;

pub use display::DisplaySurface;
pub use pipeline::{
    HttpPipelineServices, PipelineConfig, PipelineServices, PipelineState, SessionState,
    TriageSession,
};
pub use triage::{classify, Action, Tier};
pub use types::{AudioUpload, Stage, StageOutcome, StageResult, UploadReceipt};
