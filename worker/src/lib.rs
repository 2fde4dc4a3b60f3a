//! Stevedore Worker Library
//!
//! Core modules for the stevedore pipeline deployment worker.

pub mod app;
pub mod deployers;
pub mod engine;
pub mod errors;
pub mod http;
pub mod jobs;
pub mod logs;
pub mod models;
pub mod stage;
pub mod storage;
pub mod utils;
pub mod workers;
