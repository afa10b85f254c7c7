//! In-memory runner for testing
//!
//! Records every command it is asked to run and replays scripted results,
//! so orchestration can be tested without a helm binary.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use helmweb_core::HelmCommand;

use crate::error::{HelmError, Result};
use crate::runner::{ExecutionResult, HelmRunner};

type Scripted = std::result::Result<ExecutionResult, HelmError>;

/// Scripted helm runner
#[derive(Clone, Default)]
pub struct MockRunner {
    /// Rules matched by argument prefix, first match wins
    rules: Arc<RwLock<Vec<(Vec<String>, Scripted)>>>,
    invocations: Arc<RwLock<Vec<Invocation>>>,
}

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: HelmCommand,
    /// Content of the file passed with `-f`, read while the command ran
    pub value_file: Option<String>,
}

impl MockRunner {
    /// Create a runner that answers every command with empty success
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands starting with `prefix` with `result`
    pub fn respond<I, S>(&self, prefix: I, result: ExecutionResult) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_rule(prefix, Ok(result))
    }

    /// Fail commands starting with `prefix` before they produce any output
    pub fn fail<I, S>(&self, prefix: I, error: HelmError) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_rule(prefix, Err(error))
    }

    fn push_rule<I, S>(&self, prefix: I, scripted: Scripted) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefix = prefix.into_iter().map(Into::into).collect();
        self.rules.write().unwrap().push((prefix, scripted));
        self
    }

    /// All recorded calls, in order
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.read().unwrap().clone()
    }

    /// Recorded commands rendered as command lines
    pub fn command_lines(&self) -> Vec<String> {
        self.invocations
            .read()
            .unwrap()
            .iter()
            .map(|invocation| invocation.command.to_string())
            .collect()
    }

    /// Number of recorded commands starting with `prefix`
    pub fn count(&self, prefix: &[&str]) -> usize {
        self.invocations
            .read()
            .unwrap()
            .iter()
            .filter(|invocation| starts_with(&invocation.command, prefix))
            .count()
    }
}

fn starts_with<S: AsRef<str>>(command: &HelmCommand, prefix: &[S]) -> bool {
    let args = command.args();
    args.len() >= prefix.len()
        && args
            .iter()
            .zip(prefix)
            .all(|(arg, expected)| arg == expected.as_ref())
}

#[async_trait]
impl HelmRunner for MockRunner {
    async fn run(&self, command: &HelmCommand) -> Result<ExecutionResult> {
        let value_file = command
            .args()
            .iter()
            .position(|arg| arg == "-f")
            .and_then(|i| command.args().get(i + 1))
            .and_then(|path| std::fs::read_to_string(path).ok());

        self.invocations.write().unwrap().push(Invocation {
            command: command.clone(),
            value_file,
        });

        let rules = self.rules.read().unwrap();
        rules
            .iter()
            .find(|(prefix, _)| starts_with(command, prefix.as_slice()))
            .map(|(_, scripted)| scripted.clone())
            .unwrap_or_else(|| Ok(ExecutionResult::success("")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helmweb_core::DeployError;

    #[tokio::test]
    async fn test_records_and_replays() {
        let runner = MockRunner::new();
        runner
            .respond(["repo", "list"], ExecutionResult::success("pase\thttp://localhost:8879"))
            .fail(
                ["push"],
                DeployError::ProcessStart {
                    program: "helm".to_string(),
                    message: "not found".to_string(),
                },
            );

        let listed = runner.run(&HelmCommand::repo_list()).await.unwrap();
        assert!(listed.stdout.contains("pase"));

        let unscripted = runner.run(&HelmCommand::new(["list"])).await.unwrap();
        assert!(unscripted.succeeded());

        assert!(runner.run(&HelmCommand::new(["push", "a.tgz"])).await.is_err());
        assert_eq!(runner.command_lines(), vec!["repo list", "list", "push a.tgz"]);
        assert_eq!(runner.count(&["repo"]), 1);
    }

    #[tokio::test]
    async fn test_first_matching_rule_wins() {
        let runner = MockRunner::new();
        runner
            .respond(["repo", "add"], ExecutionResult::failure(1, "boom"))
            .respond(["repo"], ExecutionResult::success("ok"));

        let add = runner
            .run(&HelmCommand::repo_add("a", "http://a"))
            .await
            .unwrap();
        assert!(!add.succeeded());
        assert!(runner.run(&HelmCommand::repo_update()).await.unwrap().succeeded());
    }
}
