// handlers/protected/mod.rs - endpoints behind jwt_auth_middleware
//
// Every handler here receives the caller as `Extension<AuthUser>` and scopes
// all store access to `auth_user.id`.

pub mod auth;
pub mod labels; // /api/folders, /api/tags
pub mod notes; // /api/notes
pub mod validate;

pub use auth::*;
