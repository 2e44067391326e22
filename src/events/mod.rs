//! Events fired by the dashboard actions.
//!
//! With no listener registered, dispatch is a no-op.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use rdx_dash::register_event_listeners;
//! use rdx_dash::events::listeners::LoggingListener;
//!
//! fn main() {
//!     // register listeners at startup
//!     register_event_listeners(|registry| {
//!         registry.listen(LoggingListener::new());
//!     });
//!
//!     // events will now be logged
//! }
//! ```
//!
//! # Custom Listeners
//!
//! Implement the [`Listener`] trait to create custom event handlers:
//!
//! ```rust,ignore
//! use rdx_dash::events::{AuthEvent, Listener};
//! use async_trait::async_trait;
//!
//! struct FailedLoginCounter;
//!
//! #[async_trait]
//! impl Listener for FailedLoginCounter {
//!     async fn handle(&self, event: &AuthEvent) {
//!         if let AuthEvent::LoginFailed { email, .. } = event {
//!             // count failures per email
//!         }
//!     }
//! }
//! ```

mod event;
mod listener;
mod registry;

pub mod listeners;

pub use event::AuthEvent;
pub use listener::Listener;
pub use registry::{EventRegistry, dispatch, register_event_listeners};
