use std::sync::OnceLock;

use super::{AuthEvent, Listener};

static REGISTRY: OnceLock<EventRegistry> = OnceLock::new();

struct Subscription {
    // matched against `AuthEvent::name`; empty matches everything
    prefix: &'static str,
    listener: Box<dyn Listener>,
}

/// Listeners installed by [`register_event_listeners`].
#[derive(Default)]
pub struct EventRegistry {
    subscriptions: Vec<Subscription>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receives every event, after the listeners registered before it.
    pub fn listen(&mut self, listener: impl Listener) -> &mut Self {
        self.listen_for("", listener)
    }

    /// Receives only events whose name starts with `prefix`, e.g.
    /// `"auth.login"` or `"admin."`.
    pub fn listen_for(&mut self, prefix: &'static str, listener: impl Listener) -> &mut Self {
        self.subscriptions.push(Subscription {
            prefix,
            listener: Box::new(listener),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub async fn dispatch(&self, event: &AuthEvent) {
        let name = event.name();
        for subscription in &self.subscriptions {
            if name.starts_with(subscription.prefix) {
                subscription.listener.handle(event).await;
            }
        }
    }
}

/// Installs the process-wide listeners. Only the first call takes effect.
///
/// ```rust,ignore
/// register_event_listeners(|registry| {
///     registry
///         .listen(LoggingListener::new())
///         .listen_for("auth.login.failed", LockoutCounter::default());
/// });
/// ```
pub fn register_event_listeners<F>(f: F)
where
    F: FnOnce(&mut EventRegistry),
{
    let mut registry = EventRegistry::new();
    f(&mut registry);
    let count = registry.len();
    if REGISTRY.set(registry).is_err() {
        log::warn!(target: "rdx_dash", "msg=\"event listeners already registered, ignoring\"");
    } else {
        log::debug!(target: "rdx_dash", "msg=\"event listeners registered\" count={count}");
    }
}

/// Sends `event` to the process-wide listeners.
pub async fn dispatch(event: AuthEvent) {
    if let Some(registry) = REGISTRY.get() {
        registry.dispatch(&event).await;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;

    #[derive(Clone, Default)]
    struct Recorder {
        tag: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Listener for Recorder {
        async fn handle(&self, event: &AuthEvent) {
            self.seen
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.tag, event.name()));
        }
    }

    fn failed_login() -> AuthEvent {
        AuthEvent::LoginFailed {
            email: "ana@x.com".to_owned(),
            reason: "invalid credentials".to_owned(),
            at: Utc::now(),
        }
    }

    fn logout() -> AuthEvent {
        AuthEvent::LogoutSuccess {
            user_id: 7,
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_prefix_filters_and_order() {
        let seen = Arc::new(Mutex::new(vec![]));
        let mut registry = EventRegistry::new();
        registry
            .listen(Recorder {
                tag: "all",
                seen: seen.clone(),
            })
            .listen_for(
                "auth.login",
                Recorder {
                    tag: "login",
                    seen: seen.clone(),
                },
            );
        assert_eq!(registry.len(), 2);

        registry.dispatch(&failed_login()).await;
        registry.dispatch(&logout()).await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "all:auth.login.failed",
                "login:auth.login.failed",
                "all:auth.logout.success",
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let registry = EventRegistry::new();
        assert!(registry.is_empty());
        registry.dispatch(&logout()).await;
    }
}
