// handlers/public/auth/mod.rs - token acquisition

pub mod login; // POST /api/login

pub use login::login;
