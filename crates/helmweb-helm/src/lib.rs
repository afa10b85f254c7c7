//! helmweb Helm - running deployment operations against the helm binary
//!
//! This crate provides:
//! - `ProcessExecutor`: spawns helm with a deadline
//! - `HelmClient`: setup, main invocation and interpretation per request
//! - `RepositoryRegistry`: repositories this process registered with helm
//! - Collaborator traits for port allocation and ingress rules
//! - `MockRunner` for testing without helm

pub mod client;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod mock;
pub mod registry;
pub mod repository;
pub mod runner;
pub mod value_file;

pub use client::HelmClient;
pub use collaborators::{
    AllocatedPort, CollaboratorError, IngressBinding, IngressRule, IngressRuleManager,
    PortAllocator,
};
pub use config::HelmConfig;
pub use error::{ConfigError, HelmError, Result};
pub use mock::{Invocation, MockRunner};
pub use registry::RepositoryRegistry;
pub use repository::{Repository, RepositoryConfig};
pub use runner::{ExecutionResult, ExitState, HelmRunner, ProcessExecutor};
pub use value_file::TemporaryValueFile;
