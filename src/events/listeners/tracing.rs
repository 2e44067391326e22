use async_trait::async_trait;

use crate::events::{AuthEvent, Listener};

/// Emits each event through `tracing`, with failed logins at `WARN`.
///
/// ```rust,ignore
/// use rdx_dash::register_event_listeners;
/// use rdx_dash::events::listeners::TracingListener;
///
/// register_event_listeners(|registry| {
///     registry.listen(TracingListener);
/// });
/// ```
pub struct TracingListener;

#[async_trait]
impl Listener for TracingListener {
    async fn handle(&self, event: &AuthEvent) {
        let at = event.timestamp().to_rfc3339();
        if let AuthEvent::LoginFailed { reason, .. } = event {
            tracing::warn!(
                target: "rdx_dash::events",
                event_name = event.name(),
                %reason,
                %at,
                "login failed"
            );
        } else {
            tracing::info!(
                target: "rdx_dash::events",
                event_name = event.name(),
                %at,
                ?event,
                "dashboard event"
            );
        }
    }
}
