//! Job execution

pub mod reporter;
pub mod reservation;
pub mod runner;
