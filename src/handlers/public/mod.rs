// handlers/public/mod.rs - endpoints reachable without a bearer token

pub mod auth;
pub mod users; // POST /api/users

pub use auth::*;
pub use users::register;
