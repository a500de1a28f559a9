pub mod clock;
pub mod extractor;
pub mod jwt;
pub mod locks;
pub mod state;
pub mod test_utils;

pub use clock::{Clock, FixedClock, SystemClock};
pub use locks::KeyedLocks;
pub use state::AppState;
