pub mod appointment;
pub mod auth;
pub mod directory;
pub mod error;
pub mod schedule;
pub mod time;

pub use appointment::{Appointment, AppointmentStatus, StatusNote};
pub use auth::{Role, User};
pub use directory::{Doctor, Patient};
pub use error::AppError;
pub use schedule::{ScheduleEntry, ScheduleRule};
