//! helmweb Core - request, command and result types for driving helm
//!
//! This crate holds the decision logic of helmweb and performs no I/O:
//! - `DeployOptions`: the loosely-typed payload callers send
//! - `HelmRequest`: one validated request per operation
//! - `CommandBuilder`: turns a request into a `CommandPlan`
//! - `output`: extracts services and pushed charts from helm output
//! - `classify`: sorts helm diagnostics into conflicts and failures

pub mod classify;
pub mod command;
pub mod error;
pub mod options;
pub mod output;
pub mod request;

pub use classify::{classify, classify_output};
pub use command::{CommandBuilder, CommandPlan, HelmCommand, SetupStep};
pub use error::{DeployError, ErrorCategory, Result};
pub use options::{DeployOptions, is_truthy};
pub use output::{
    DeploymentOutcome, InstallOutcome, PushedChart, ToolOutput, parse_install, parse_push,
};
pub use request::{
    ChartSettings, DEFAULT_REPO_ALIAS, DeleteRequest, HelmRequest, InspectRequest,
    InspectSection, InstallRequest, OperationKind, PrivateRepo, PushRequest, RollbackRequest,
    SearchRequest, UpgradeRequest, repo_alias_of,
};
