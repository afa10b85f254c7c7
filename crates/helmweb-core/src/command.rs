//! Command plans
//!
//! Turns a validated [`HelmRequest`] into the argv of the main helm
//! invocation plus whatever must happen around it: repositories to
//! register, index refreshes, a temporary values file to write, and
//! best-effort refreshes that are fired but never awaited.

use chrono::Utc;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::request::{ChartSettings, HelmRequest, InstallRequest, UpgradeRequest};

/// Arguments of one helm invocation, binary excluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelmCommand {
    args: Vec<String>,
}

impl HelmCommand {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn repo_add(alias: &str, url: &str) -> Self {
        Self::new(["repo", "add", alias, url])
    }

    pub fn repo_update() -> Self {
        Self::new(["repo", "update"])
    }

    pub fn repo_list() -> Self {
        Self::new(["repo", "list"])
    }

    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    /// Append `flag value`
    pub fn flag(&mut self, flag: &str, value: impl Into<String>) -> &mut Self {
        self.args.push(flag.to_string());
        self.args.push(value.into());
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for HelmCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args.join(" "))
    }
}

/// A precondition that must succeed before the main command runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupStep {
    /// Make `alias` resolvable to `url`
    RegisterRepo { alias: String, url: String },
    /// Fetch the index of every known repository
    RefreshIndex,
    /// Materialize inline values at `path`; the main command reads it
    WriteValueFile { path: PathBuf, content: String },
}

/// Everything one request needs executed, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPlan {
    /// Run in order, each must succeed
    pub setup: Vec<SetupStep>,
    /// Fired before `main` and not awaited; failures are only logged
    pub fire_and_forget: Vec<HelmCommand>,
    pub main: HelmCommand,
    /// Fired after `main` succeeded and not awaited
    pub follow_up: Vec<HelmCommand>,
}

impl CommandPlan {
    fn new(main: HelmCommand) -> Self {
        Self {
            setup: Vec::new(),
            fire_and_forget: Vec::new(),
            main,
            follow_up: Vec::new(),
        }
    }

    fn with_setup(mut self, step: SetupStep) -> Self {
        self.setup.push(step);
        self
    }

    /// Path of the temporary values file this plan writes, if any
    pub fn value_file(&self) -> Option<&Path> {
        self.setup.iter().find_map(|step| match step {
            SetupStep::WriteValueFile { path, .. } => Some(path.as_path()),
            _ => None,
        })
    }
}

/// Builds command plans; temporary values files land in `upload_dir`
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    upload_dir: PathBuf,
}

impl CommandBuilder {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn build(&self, request: &HelmRequest) -> CommandPlan {
        match request {
            HelmRequest::Install(install) => self.install(install),
            HelmRequest::Upgrade(upgrade) => self.upgrade(upgrade),
            HelmRequest::Delete(delete) => {
                let mut cmd = HelmCommand::new(["delete", delete.release_name.as_str()]);
                if delete.purge {
                    cmd.arg("--purge");
                }
                CommandPlan::new(cmd)
            }
            HelmRequest::Rollback(rollback) => CommandPlan::new(HelmCommand::new([
                "rollback",
                rollback.release_name.as_str(),
                rollback.revision.as_str(),
            ])),
            HelmRequest::History { release_name } => {
                CommandPlan::new(scoped("history", release_name.as_deref()))
            }
            HelmRequest::List { release_name } => {
                CommandPlan::new(scoped("list", release_name.as_deref()))
            }
            HelmRequest::RepoList => CommandPlan::new(HelmCommand::repo_list()),
            HelmRequest::RepoUpdate => CommandPlan::new(HelmCommand::repo_update()),
            HelmRequest::Search(search) => {
                let mut cmd = HelmCommand::new(["search"]);
                if let Some(repo) = &search.repo_name {
                    cmd.arg(repo);
                }
                if let Some(filter) = &search.filter {
                    cmd.arg(filter);
                }
                let mut plan = CommandPlan::new(cmd);
                plan.fire_and_forget.push(HelmCommand::repo_update());
                plan
            }
            HelmRequest::Inspect(inspect) => {
                let mut cmd = HelmCommand::new(["inspect"]);
                if let Some(section) = inspect.section {
                    cmd.arg(section.as_str());
                }
                cmd.arg(&inspect.chart_name);
                if let Some(version) = &inspect.version {
                    cmd.flag("--version", version);
                }
                CommandPlan::new(cmd).with_setup(SetupStep::RefreshIndex)
            }
            HelmRequest::Push(push) => {
                let mut plan = CommandPlan::new(HelmCommand::new([
                    "push".to_string(),
                    push.chart_file.display().to_string(),
                    push.repo_alias.clone(),
                ]));
                plan.follow_up.push(HelmCommand::repo_update());
                plan
            }
        }
    }

    fn install(&self, install: &InstallRequest) -> CommandPlan {
        // The json plugin prints the release as JSON; a dry run prints manifests instead
        let mut cmd = if install.dry_run {
            HelmCommand::new(["install", install.chart_name.as_str()])
        } else {
            HelmCommand::new(["json", "install", install.chart_name.as_str()])
        };
        if let Some(release) = &install.release_name {
            cmd.flag("--name", release);
        }
        if let Some(namespace) = &install.namespace {
            cmd.flag("--namespace", namespace);
        }
        if install.dry_run {
            cmd.arg("--dry-run").arg("--debug");
        }
        self.chart_plan(cmd, &install.settings, Vec::new())
    }

    fn upgrade(&self, upgrade: &UpgradeRequest) -> CommandPlan {
        let mut cmd = HelmCommand::new([
            "upgrade",
            upgrade.release_name.as_str(),
            upgrade.chart_name.as_str(),
        ]);
        cmd.flag("--namespace", &upgrade.namespace);
        self.chart_plan(cmd, &upgrade.settings, vec![SetupStep::RefreshIndex])
    }

    /// Flags shared by install and upgrade, in their documented order
    fn chart_plan(
        &self,
        mut cmd: HelmCommand,
        settings: &ChartSettings,
        mut setup: Vec<SetupStep>,
    ) -> CommandPlan {
        if let Some(repo) = &settings.private_repo {
            setup.push(SetupStep::RegisterRepo {
                alias: repo.alias.clone(),
                url: repo.url.clone(),
            });
            if !setup.contains(&SetupStep::RefreshIndex) {
                setup.push(SetupStep::RefreshIndex);
            }
        }

        if settings.reuse_values {
            cmd.arg("--reuse-values");
        }
        if let Some(version) = &settings.version {
            cmd.flag("--version", version);
        }
        if let Some(values) = &settings.set_values {
            cmd.flag("--set", values);
        }
        if settings.replace {
            cmd.arg("--replace");
        }
        if let Some(content) = &settings.value_file {
            let path = self.value_file_path();
            cmd.flag("-f", path.display().to_string());
            setup.push(SetupStep::WriteValueFile {
                path,
                content: content.clone(),
            });
        }

        CommandPlan {
            setup,
            fire_and_forget: Vec::new(),
            main: cmd,
            follow_up: Vec::new(),
        }
    }

    /// Millisecond timestamp plus a random suffix, unique across concurrent requests
    fn value_file_path(&self) -> PathBuf {
        let name = format!(
            "{}-{:08x}.yaml",
            Utc::now().timestamp_millis(),
            rand::random::<u32>()
        );
        self.upload_dir.join(name)
    }
}

fn scoped(verb: &str, release_name: Option<&str>) -> HelmCommand {
    let mut cmd = HelmCommand::new([verb]);
    if let Some(release) = release_name {
        cmd.arg(release);
    }
    cmd
}
