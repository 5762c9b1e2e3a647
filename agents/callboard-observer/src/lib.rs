pub mod conn;
pub mod reducer;

pub use conn::{ConnectionState, MAX_RECONNECT_ATTEMPTS, ObserverClient, reconnect_delay};
pub use reducer::DashboardState;
