// handlers/protected/auth/mod.rs - token maintenance for signed-in users

pub mod refresh; // POST /api/refresh

pub use refresh::refresh;
