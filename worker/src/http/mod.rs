//! HTTP clients for external collaborators

pub mod artifacts;
pub mod client;
pub mod pipeline;
