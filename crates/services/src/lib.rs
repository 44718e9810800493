#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod sessions;

pub use stitch_core::Clock;

pub use app_services::{AppServices, ServiceConfig};
pub use error::TrackingServiceError;
pub use sessions::{StepOutcome, TrackerSession, TrackingLoopService};
