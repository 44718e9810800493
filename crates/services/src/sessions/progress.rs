use serde::Serialize;
use stitch_core::ProgressReport;
use stitch_core::model::TrackingStatus;

/// Result of one navigation request, shaped for the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    /// Whether the cursor changed.
    pub moved: bool,
    pub is_complete: bool,
    pub status: TrackingStatus,
    /// Present unless progress reporting was switched off for step calls.
    pub progress: Option<ProgressReport>,
}
