use async_trait::async_trait;

use crate::events::{AuthEvent, Listener};

/// Writes each event to the `log` facade.
///
/// Failed logins are raised to `Warn` when the listener runs at a lower
/// severity, so they stay visible with the default filter.
///
/// ```rust,ignore
/// use rdx_dash::register_event_listeners;
/// use rdx_dash::events::listeners::LoggingListener;
///
/// register_event_listeners(|registry| {
///     registry.listen(LoggingListener::new());
/// });
/// ```
pub struct LoggingListener {
    level: log::Level,
}

impl LoggingListener {
    pub fn new() -> Self {
        Self {
            level: log::Level::Info,
        }
    }

    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }

    fn level_for(&self, event: &AuthEvent) -> log::Level {
        match event {
            AuthEvent::LoginFailed { .. } => self.level.min(log::Level::Warn),
            _ => self.level,
        }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Listener for LoggingListener {
    async fn handle(&self, event: &AuthEvent) {
        log::log!(
            target: "rdx_dash::events",
            self.level_for(event),
            "event={} at={} {:?}",
            event.name(),
            event.timestamp().to_rfc3339(),
            event
        );
    }
}
