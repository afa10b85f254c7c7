//! External collaborators
//!
//! Load-balancer port allocation and ingress rule management live in other
//! services. The server only forwards to them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a collaborator
#[derive(Debug, Error)]
#[error("{service}: {message}")]
pub struct CollaboratorError {
    pub service: &'static str,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(service: &'static str, message: impl Into<String>) -> Self {
        Self {
            service,
            message: message.into(),
        }
    }
}

/// A port reserved on a load balancer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocatedPort {
    pub port: u16,
}

/// Allocates load-balancer ports
#[async_trait]
pub trait PortAllocator: Send + Sync {
    async fn get_port(&self, load_balancer_ip: &str) -> Result<AllocatedPort, CollaboratorError>;
}

/// Routing of one load-balancer port to a release's service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressRule {
    pub service_name: String,
    pub service_port: u16,
    pub load_balancer_port: u16,
    pub load_balancer_ip: String,
    pub release: String,
}

/// Where a release became reachable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressBinding {
    pub ip: String,
    pub port: u16,
    pub release_name: String,
}

/// Configures ingress rules
#[async_trait]
pub trait IngressRuleManager: Send + Sync {
    async fn set_rule(&self, rule: &IngressRule) -> Result<IngressBinding, CollaboratorError>;
}
