#![forbid(unsafe_code)]

pub mod model;
pub mod navigator;
pub mod progress;
pub mod time;

pub use navigator::NavigationError;
pub use progress::{GroupProgress, GroupStatus, ProgressReport, UnitRef, compute_progress};
pub use time::Clock;
