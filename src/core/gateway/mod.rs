// Gateway module - Discovery and session management
pub mod discovery;
pub mod manager;
pub mod queue;
pub mod state;

pub use discovery::{discover_gateway, probe_gateway};
pub use manager::{GatewayManager, MonitorTiming};
pub use queue::CommandQueue;
pub use state::{GatewayState, SessionSnapshot, SessionStatus};
