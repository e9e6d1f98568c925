//! gavel-ai: Agent adapter boundary
//!
//! This crate defines the message model shared by the supervisor and its
//! agents, the adapter trait the supervisor calls, and an HTTP adapter for
//! agents running as remote services.

pub mod adapter;
pub mod error;
pub mod providers;
pub mod types;

pub use adapter::{AgentAdapter, AgentRequest, BoxedAdapter, Metadata};
pub use error::{Error, Result};
pub use types::*;
