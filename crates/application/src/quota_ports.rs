mod activity_log;
mod clock;
mod event_counter;

pub use activity_log::ActivityLog;
pub use clock::{Clock, FixedClock, SystemClock};
pub use event_counter::{EventCountQuery, EventCounter};
