//! Session exchange module
//!
//! Provides:
//! - One-shot authentication turning a bearer token into an account session
//! - Response models with opaque passthrough of server-supplied fields

mod client;
mod types;

pub use client::SessionClient;
pub use types::*;
