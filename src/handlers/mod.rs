// handlers/mod.rs - request handlers split by access tier
//
// public    - no token (registration, login)
// protected - bearer token required; everything scoped to the caller

pub mod input;
pub mod protected;
pub mod public;
