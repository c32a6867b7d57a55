pub mod handlers;
pub mod interval;
pub mod models;
pub mod router;
pub mod services;

pub use interval::Interval;
pub use models::*;
pub use services::availability::ScheduleService;
