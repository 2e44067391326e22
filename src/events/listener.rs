use async_trait::async_trait;

use super::AuthEvent;

/// Receives every dispatched [`AuthEvent`].
///
/// # Example
///
/// ```rust,ignore
/// use rdx_dash::events::{AuthEvent, Listener};
/// use async_trait::async_trait;
///
/// struct RevocationAlert {
///     webhook_url: String,
/// }
///
/// #[async_trait]
/// impl Listener for RevocationAlert {
///     async fn handle(&self, event: &AuthEvent) {
///         if let AuthEvent::ContractStatusChanged { email, status, .. } = event {
///             // notify the account owner
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    /// Called for every event; match on the variant to filter.
    async fn handle(&self, event: &AuthEvent);
}
