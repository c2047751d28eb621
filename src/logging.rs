//! Structured logging for console actions.
//!
//! Every request the console issues is reported as a [`ConsoleEvent`] so an
//! operator can reconstruct who generated, verified or deactivated which key.
//!
//! # Usage
//!
//! ```rust
//! use keyconsole::logging::{log_console_event, ConsoleEvent};
//!
//! log_console_event(ConsoleEvent::KeyDeactivated, "ABCD-EF01-2345-6789", None);
//! ```

use tracing::{info, info_span, warn};

/// Console action event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleEvent {
    /// A key was generated
    KeyGenerated,
    /// A key was checked against a system id
    KeyVerified,
    /// The full key list was fetched
    KeysListed,
    /// A key was deactivated
    KeyDeactivated,
    /// The user declined a deactivation
    DeactivationDeclined,
    /// Customer statistics were fetched
    StatsFetched,
    /// A request to the key service failed
    RequestFailed,
    /// A submission was refused on the client side
    SubmissionRejected,
}

impl std::fmt::Display for ConsoleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConsoleEvent::KeyGenerated => "key_generated",
            ConsoleEvent::KeyVerified => "key_verified",
            ConsoleEvent::KeysListed => "keys_listed",
            ConsoleEvent::KeyDeactivated => "key_deactivated",
            ConsoleEvent::DeactivationDeclined => "deactivation_declined",
            ConsoleEvent::StatsFetched => "stats_fetched",
            ConsoleEvent::RequestFailed => "request_failed",
            ConsoleEvent::SubmissionRejected => "submission_rejected",
        };
        write!(f, "{}", s)
    }
}

impl ConsoleEvent {
    fn is_failure(&self) -> bool {
        matches!(
            self,
            ConsoleEvent::RequestFailed | ConsoleEvent::SubmissionRejected
        )
    }
}

/// Log a console event.
///
/// * `event` - The type of event
/// * `subject` - Activation key, system id, or customer email the event concerns
/// * `details` - Optional additional details
pub fn log_console_event(event: ConsoleEvent, subject: &str, details: Option<&str>) {
    let span = info_span!("console_event", event = %event, subject = %subject);
    let _enter = span.enter();

    if event.is_failure() {
        match details {
            Some(d) => warn!(reason = %d, "Console event occurred"),
            None => warn!("Console event occurred"),
        }
    } else {
        match details {
            Some(d) => info!(details = %d, "Console event occurred"),
            None => info!("Console event occurred"),
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `level` when set. Calling this twice is harmless.
#[cfg(feature = "cli")]
pub fn init_logging(enabled: bool, level: &str) {
    use tracing_subscriber::EnvFilter;

    if !enabled {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("keyconsole={level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
