//! Background Tasks Module
//!
//! Contains background tasks that run alongside request processing.
//!
//! # Tasks
//! - Sweep: removes expired local entries at the configured interval
//! - Reconnect: restores the remote connection with capped backoff

mod cleanup;
mod reconnect;

pub use cleanup::spawn_cleanup_task;
pub use reconnect::{reconnect_round, spawn_reconnect_task};
