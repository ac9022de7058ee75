pub mod engine;
pub mod membership;
pub mod metrics;
pub mod payload;

pub use engine::{Hub, HubHandle, HubState};
pub use membership::Membership;
pub use metrics::{HubMetrics, HubStats};
pub use payload::Payload;
