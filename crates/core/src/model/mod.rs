mod ids;
mod pattern;
mod position;
mod tracking;

pub use ids::{ParseIdError, PatternId, StitchId, TrackingId};
pub use pattern::{Entry, Group, Pattern, PatternError, Stitch};
pub use position::Position;
pub use tracking::{TrackingError, TrackingSession, TrackingStatus};
