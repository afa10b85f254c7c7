//! CLI commands

pub mod operation;
pub mod repo;
pub mod serve;
