//! helmweb - HTTP service and CLI driving helm deployments

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use helmweb_helm::HelmConfig;
use helmweb_helm::config::{
    DEFAULT_BINARY, DEFAULT_PASE_REPO, DEFAULT_TIMEOUT_SECS, DEFAULT_UPLOAD_HOME,
};

mod commands;
mod display;
mod error;
mod exit_codes;
mod logging;
mod server;

use error::Result;

#[derive(Parser)]
#[command(name = "helmweb")]
#[command(author = "helmweb Contributors")]
#[command(version)]
#[command(about = "HTTP service and CLI driving helm deployments", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    helm: HelmArgs,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

/// Settings shared by every command
#[derive(Args, Debug)]
struct HelmArgs {
    /// Helm binary to run
    #[arg(long, env = "HELM_BINARY", default_value = DEFAULT_BINARY, global = true)]
    helm_binary: PathBuf,

    /// URL of the chart repository registered as `pase`
    #[arg(long, env = "HELM_PASE_REPO", default_value = DEFAULT_PASE_REPO, global = true)]
    pase_repo: String,

    /// Directory for uploaded charts and temporary values files
    #[arg(long, env = "HELM_UPLOAD_HOME", default_value = DEFAULT_UPLOAD_HOME, global = true)]
    upload_home: PathBuf,

    /// Seconds a helm invocation may run before it is killed
    #[arg(
        long,
        env = "HELMWEB_TIMEOUT",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..),
        global = true
    )]
    timeout: u64,

    /// YAML file listing extra repositories to register at startup
    #[arg(long, env = "HELMWEB_REPOSITORIES", global = true)]
    repositories: Option<PathBuf>,
}

impl HelmArgs {
    fn into_config(self) -> Result<HelmConfig> {
        let config = HelmConfig {
            binary: self.helm_binary,
            upload_dir: self.upload_home,
            pase_repo: self.pase_repo,
            timeout: Duration::from_secs(self.timeout),
            repositories: Vec::new(),
        };
        match &self.repositories {
            Some(path) => Ok(config.with_repositories_file(path)?),
            None => Ok(config),
        }
    }
}

/// Options shared by install, simulate-install and upgrade
#[derive(Args, Debug, Default)]
pub struct ChartArgs {
    /// Chart reference, e.g. stable/nginx
    pub chart: Option<String>,

    /// Release name
    #[arg(short, long)]
    pub release: Option<String>,

    /// Target namespace
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Chart version to pin
    #[arg(id = "chart_version", long = "chart-version")]
    pub version: Option<String>,

    /// Value overrides (key=value,key2=value2)
    #[arg(long = "set")]
    pub set: Option<String>,

    /// Values file whose content is passed to helm
    #[arg(short = 'f', long = "values")]
    pub values_file: Option<PathBuf>,

    /// Reuse the values of the previous release
    #[arg(long)]
    pub reuse_values: bool,

    /// Replace a release whose name is still in use (handle mode `online`)
    #[arg(long)]
    pub online: bool,

    /// Register the chart's repository at this URL first
    #[arg(long)]
    pub private_repo: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = 4000)]
        port: u16,
    },

    /// Install a chart
    Install {
        #[command(flatten)]
        chart: ChartArgs,
    },

    /// Render an install without applying it
    SimulateInstall {
        #[command(flatten)]
        chart: ChartArgs,
    },

    /// Upgrade a release
    Upgrade {
        #[command(flatten)]
        chart: ChartArgs,
    },

    /// Delete a release and purge its history
    Delete {
        /// Release name
        release: Option<String>,
    },

    /// Delete a release, keeping its history
    Offline {
        /// Release name
        release: Option<String>,
    },

    /// Roll a release back to a revision
    Rollback {
        /// Release name
        release: Option<String>,

        /// Revision to roll back to
        revision: Option<String>,
    },

    /// Show the revisions of a release
    History {
        /// Release name
        release: Option<String>,
    },

    /// List releases
    List {
        /// Only show this release
        release: Option<String>,
    },

    /// Search charts
    Search {
        /// Repository to search
        repo: Option<String>,

        /// Filter
        filter: Option<String>,
    },

    /// Show chart information
    Inspect {
        /// Chart reference
        chart: Option<String>,

        /// Section to show: chart, values, readme or all
        #[arg(long)]
        section: Option<String>,

        /// Chart version
        #[arg(id = "chart_version", long = "chart-version")]
        version: Option<String>,
    },

    /// Push a packaged chart to a repository
    Push {
        /// Chart archive
        chart_file: Option<PathBuf>,

        /// Repository alias
        #[arg(long)]
        repo: Option<String>,
    },

    /// Repository management
    #[command(subcommand)]
    Repo(RepoCommands),
}

#[derive(Subcommand)]
enum RepoCommands {
    /// List repositories known to helm
    List,

    /// Refresh repository indexes
    Update,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    logging::init(cli.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e.exit_code();
            eprintln!("{:?}", miette::Report::new(e));
            ExitCode::from(code as u8)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.helm.into_config()?;
    let json = cli.json;

    match cli.command {
        Commands::Serve { port } => commands::serve::run(config, port).await,

        Commands::Install { chart } => {
            commands::operation::install(&config, chart, false, json).await
        }

        Commands::SimulateInstall { chart } => {
            commands::operation::install(&config, chart, true, json).await
        }

        Commands::Upgrade { chart } => commands::operation::upgrade(&config, chart, json).await,

        Commands::Delete { release } => {
            commands::operation::delete(&config, release, true, json).await
        }

        Commands::Offline { release } => {
            commands::operation::delete(&config, release, false, json).await
        }

        Commands::Rollback { release, revision } => {
            commands::operation::rollback(&config, release, revision, json).await
        }

        Commands::History { release } => {
            commands::operation::history(&config, release, json).await
        }

        Commands::List { release } => commands::operation::list(&config, release, json).await,

        Commands::Search { repo, filter } => {
            commands::operation::search(&config, repo, filter, json).await
        }

        Commands::Inspect {
            chart,
            section,
            version,
        } => commands::operation::inspect(&config, chart, section, version, json).await,

        Commands::Push { chart_file, repo } => {
            commands::operation::push(&config, chart_file, repo, json).await
        }

        Commands::Repo(RepoCommands::List) => commands::repo::list(&config, json).await,

        Commands::Repo(RepoCommands::Update) => commands::repo::update(&config, json).await,
    }
}
