//! Display formatting for CLI output

use console::style;

use helmweb_core::{DeploymentOutcome, OperationKind, ToolOutput};

use crate::error::{CliError, Result};

/// Print the result of an operation, as JSON or for a terminal
pub fn outcome(kind: OperationKind, outcome: &DeploymentOutcome, json: bool) -> Result<()> {
    if json {
        let rendered = serde_json::to_string_pretty(outcome).map_err(|e| CliError::Io {
            message: e.to_string(),
        })?;
        println!("{rendered}");
        return Ok(());
    }

    match outcome {
        DeploymentOutcome::Installed(installed) => {
            println!(
                "{} Installed release {} (service {})",
                style("✓").green().bold(),
                style(&installed.release_name).cyan(),
                style(&installed.service_name).yellow()
            );
        }
        DeploymentOutcome::Pushed(pushed) => {
            println!(
                "{} Pushed {} version {}",
                style("✓").green().bold(),
                style(&pushed.chartname).cyan(),
                style(&pushed.version).yellow()
            );
        }
        DeploymentOutcome::Output(output) => tool_output(kind, output),
    }
    Ok(())
}

fn tool_output(kind: OperationKind, output: &ToolOutput) {
    if !output.stdout.trim().is_empty() {
        print!("{}", with_newline(&output.stdout));
    } else {
        println!("{} {} finished", style("✓").green().bold(), style(kind).cyan());
    }
    // Helm prints warnings on stderr even when it succeeds
    if !output.stderr.trim().is_empty() {
        eprint!("{}", style(with_newline(&output.stderr)).dim());
    }
}

fn with_newline(text: &str) -> String {
    if text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    }
}
