mod progress;
mod service;
mod workflow;

// Public API of the tracking session subsystem.
pub use crate::error::TrackingServiceError;
pub use progress::StepOutcome;
pub use service::TrackerSession;
pub use workflow::TrackingLoopService;
