//! Keep-alive ping module
//!
//! Provides:
//! - The liveness record sent on every tick
//! - Response classification (server accept/reject codes)
//! - The sender used by each worker's ping loop

mod sender;
mod types;

pub use sender::PingSender;
pub use types::*;
