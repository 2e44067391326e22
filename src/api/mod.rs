//! HTTP surface: JSON request/response types and the actix-web page layer.

mod types;

pub use types::*;

pub mod actix;
