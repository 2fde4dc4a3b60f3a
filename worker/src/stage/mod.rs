//! Artifact staging

pub mod archive;
pub mod stager;
