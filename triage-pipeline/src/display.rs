use crate::{triage::Action, types::Stage};

/// Presentation layer driven by [`crate::TriageSession`].
///
/// The session only ever pushes instructions; implementations never
/// report state back.
pub trait DisplaySurface: Send + Sync {
    fn show_upload_result(&self, status: &str);

    /// A stage call was issued and is awaiting its result.
    fn show_stage_pending(&self, _stage: Stage) {}

    fn show_stage_output(&self, stage: Stage, text: &str, is_error: bool);

    fn enable_next_control(&self, stage: Stage);

    fn enable_reveal_control(&self);

    fn reveal_action(&self, action: &Action);

    fn show_fatal_error(&self, context: &str, message: &str);
}
