pub mod booking;
pub mod conflict;
pub mod lifecycle;
pub mod policy;
pub mod query;
pub mod status;

pub use booking::BookingService;
pub use lifecycle::AppointmentLifecycleService;
pub use query::AppointmentQueryService;
pub use status::StatusService;
