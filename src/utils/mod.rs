//! The `utils` module collects pieces shared across `connhub`: the error
//! types producers see and the logging setup used by the binary and tests.

pub mod error;
pub mod logging;

pub use error::{HubError, TransportError};

#[cfg(test)]
mod tests {
    use super::logging;
    use super::HubError;

    #[test]
    fn logging_init_accepts_levels() {
        // Should not panic
        logging::init("info");
        logging::init("debug");
        logging::init("warning");
        logging::init("nonsense");
    }

    #[test]
    fn hub_error_messages() {
        assert_eq!(HubError::Stopped.to_string(), "hub is stopped");
        assert_eq!(
            HubError::BroadcastQueueFull.to_string(),
            "broadcast queue is full"
        );
    }
}
