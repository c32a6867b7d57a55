pub mod handlers;
pub mod models;
pub mod repository;
pub mod router;
pub mod services;

pub use models::*;
pub use repository::{
    BookingRepository, SessionRepository, SupabaseBookingRepository, SupabaseSessionRepository,
};
pub use services::booking::BookingService;
pub use services::notification::{NotificationPort, PushGatewayNotifier};
pub use services::session::SessionService;
