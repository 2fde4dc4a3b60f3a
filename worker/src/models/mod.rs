//! Data models

pub mod job;
pub mod spec;
