mod carrier;
mod handlers;
mod middleware;
mod routes;
#[cfg(any(test, feature = "mocks"))]
pub mod test_utils;

pub use carrier::{CookieCarrier, request_carrier};
pub use middleware::{AdminAuthenticated, Authenticated, GateError, error_status};
pub use routes::{admin_routes, auth_routes, dashboard_app, dashboard_routes};
