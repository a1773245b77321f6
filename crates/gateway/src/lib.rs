//! Client side of the video → MP3 conversion gateway.
//!
//! [`api::GatewayApi`] wraps the four HTTP endpoints, [`poller::JobPoller`]
//! waits for a conversion to finish with a bounded number of status checks,
//! and [`workflow::Workflow`] ties login, upload, polling and download
//! together behind a small state machine.

pub mod api;
pub mod config;
pub mod gateway;
pub mod poller;
pub mod upload;
pub mod workflow;
