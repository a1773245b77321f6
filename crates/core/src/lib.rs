//! Domain types and pure logic for the vidconv client.
//!
//! Nothing in this crate performs I/O. The gateway crate builds the
//! HTTP transport, poller and orchestrator on top of these types.

pub mod credentials;
pub mod error;
pub mod media;
pub mod status;
pub mod types;
pub mod workflow_state;
