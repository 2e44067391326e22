//! Storage abstractions.
//!
//! | Trait | Description |
//! |-------|-------------|
//! | [`UserRepository`] | Credentials, roles, contract status, reset tokens |
//! | [`PresetRepository`] | Saved collector configurations per user |
//!
//! Enable the `mocks` feature for in-memory implementations useful for testing:
//!
//! - [`MockUserRepository`]
//! - [`MockPresetRepository`]

mod preset;
mod user;

#[cfg(any(test, feature = "mocks"))]
mod preset_mock;
#[cfg(any(test, feature = "mocks"))]
mod user_mock;

pub use preset::{Preset, PresetRepository};
pub use user::{NewUser, User, UserRepository, UserSummary};

#[cfg(any(test, feature = "mocks"))]
pub use preset_mock::MockPresetRepository;
#[cfg(any(test, feature = "mocks"))]
pub use user_mock::MockUserRepository;
