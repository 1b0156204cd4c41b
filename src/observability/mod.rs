//! Observability: structured logging, typed events and counters
//!
//! ```ignore
//! use axiomtree::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::VoteCast, &[("entity", "nodes/n1")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a typed event with no fields
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a typed event; refusals and corruption are logged at WARN
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_warning() {
        Severity::Warn
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_does_not_panic() {
        log_event(Event::ConfigLoaded);
        log_event_with_fields(Event::DeletionRefused, &[("axiom", "axAssoc")]);
    }
}
