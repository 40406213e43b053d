pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod time_range;

pub use error::SchedulingError;
pub use models::*;
pub use services::*;
pub use time_range::TimeRange;
pub use router::scheduling_routes;
