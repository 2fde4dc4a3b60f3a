//! Dependency-ordered deployment engine

pub mod context;
pub mod deploy;
pub mod fsm;
pub mod order;
pub mod registry;
