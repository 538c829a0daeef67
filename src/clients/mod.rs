pub mod host_bridge;
pub mod tracking_client;

pub use host_bridge::{HostBridge, LocalHostBridge, RunStatus};
pub use tracking_client::TrackingClient;
