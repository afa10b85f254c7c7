//! Interpreting helm output
//!
//! Helm reports results as text. The two operations whose callers need
//! structure are install (which service came up, under which release) and
//! push (which chart and version landed in the repository).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DeployError, Result};

/// Captured output of one helm invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}

/// Result of a successful install
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallOutcome {
    pub service_name: String,
    pub release_name: String,
}

/// Coordinate of a chart after a successful push
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushedChart {
    /// `<repoAlias>/<chartName>`
    pub chartname: String,
    pub version: String,
}

/// Structured result of any operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DeploymentOutcome {
    Installed(InstallOutcome),
    Pushed(PushedChart),
    Output(ToolOutput),
}

/// Find the service an install created.
///
/// `stdout` is expected to be the JSON document printed by the json plugin:
/// `{"releaseName": "...", "resources": [{"name": "v1/Service", "resources": ["svc-id"]}]}`.
/// The first resource group whose kind contains `/service` (any case) wins.
/// The release name comes from the document, or `requested_release` when
/// the document lacks one.
pub fn parse_install(stdout: &str, requested_release: Option<&str>) -> Result<InstallOutcome> {
    let unknown = || DeployError::unknown_response("install", stdout);

    // Anything that is not JSON is opaque text, which never names a service
    let document: Value = serde_json::from_str(stdout).map_err(|_| unknown())?;

    let service_name = first_service(&document).ok_or_else(unknown)?;
    let release_name = document
        .get("releaseName")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .or(requested_release)
        .ok_or_else(unknown)?;

    Ok(InstallOutcome {
        service_name: service_name.to_string(),
        release_name: release_name.to_string(),
    })
}

fn first_service(document: &Value) -> Option<&str> {
    document
        .get("resources")?
        .as_array()?
        .iter()
        .find(|group| {
            group
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|kind| kind.to_lowercase().contains("/service"))
        })?
        .get("resources")?
        .as_array()?
        .first()?
        .as_str()
}

static PUSH_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)(?:^|[\s/])(?P<name>[^\s/]+)-(?P<version>v?\d+(?:\.\d+)*(?:[-+][0-9A-Za-z.+-]+?)?)(?:\.tgz)? to (?P<dest>\S+)",
    )
    .expect("push pattern is valid")
});

/// Extract the pushed chart from `<name>-<version>[.tgz] to <destination>`.
///
/// The version is the part after the last hyphen that starts a
/// dotted-number version, optionally prefixed with `v`, so chart names may
/// contain hyphens and digits (`redis-6-1.0.0`) and versions may carry
/// pre-release tags (`app-1.0.0-rc.1`). The coordinate is reported under
/// `repo_alias`.
pub fn parse_push(stdout: &str, repo_alias: &str) -> Result<PushedChart> {
    let captures = PUSH_LINE
        .captures(stdout)
        .ok_or_else(|| DeployError::unknown_response("push", stdout))?;

    Ok(PushedChart {
        chartname: format!("{}/{}", repo_alias, &captures["name"]),
        version: captures["version"].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_install_finds_service() {
        let stdout = json!({
            "releaseName": "nginx-1",
            "resources": [
                { "name": "v1/ConfigMap", "resources": ["nginx-config"] },
                { "name": "v1/Service", "resources": ["nginx-abcde", "nginx-headless"] },
                { "name": "v1beta1/Service", "resources": ["other"] }
            ]
        })
        .to_string();

        let outcome = parse_install(&stdout, None).unwrap();
        assert_eq!(
            outcome,
            InstallOutcome {
                service_name: "nginx-abcde".to_string(),
                release_name: "nginx-1".to_string(),
            }
        );
    }

    #[test]
    fn test_install_kind_match_ignores_case() {
        let stdout = json!({
            "releaseName": "web",
            "resources": [{ "name": "V1/SERVICE", "resources": ["web-svc"] }]
        })
        .to_string();
        assert_eq!(parse_install(&stdout, None).unwrap().service_name, "web-svc");
    }

    #[test]
    fn test_install_without_service_is_unknown() {
        let stdout = json!({
            "releaseName": "web",
            "resources": [{ "name": "apps/v1/Deployment", "resources": ["web"] }]
        })
        .to_string();
        let err = parse_install(&stdout, None).unwrap_err();
        assert!(matches!(err, DeployError::UnknownResponse { .. }));
        assert!(err.to_string().contains("apps/v1/Deployment"));
    }

    #[test]
    fn test_install_service_without_members_is_unknown() {
        let stdout = json!({
            "releaseName": "web",
            "resources": [{ "name": "v1/Service", "resources": [] }]
        })
        .to_string();
        assert!(parse_install(&stdout, None).is_err());
    }

    #[test]
    fn test_install_plain_text_is_unknown() {
        let err = parse_install("NAME: web\nSTATUS: DEPLOYED\n", Some("web")).unwrap_err();
        assert!(matches!(err, DeployError::UnknownResponse { .. }));
    }

    #[test]
    fn test_install_release_name_falls_back_to_request() {
        let stdout = json!({
            "resources": [{ "name": "v1/Service", "resources": ["web-svc"] }]
        })
        .to_string();
        assert_eq!(
            parse_install(&stdout, Some("web")).unwrap().release_name,
            "web"
        );
        assert!(parse_install(&stdout, None).is_err());
    }

    #[test]
    fn test_push_plain_phrase() {
        let pushed = parse_push("mychart-1.2.0 to pase\n", "pase").unwrap();
        assert_eq!(
            pushed,
            PushedChart {
                chartname: "pase/mychart".to_string(),
                version: "1.2.0".to_string(),
            }
        );
    }

    #[test]
    fn test_push_plugin_output() {
        let stdout = "Pushing mychart-1.2.0.tgz to pase...\nDone.\n";
        let pushed = parse_push(stdout, "pase").unwrap();
        assert_eq!(pushed.chartname, "pase/mychart");
        assert_eq!(pushed.version, "1.2.0");
    }

    #[test]
    fn test_push_hyphenated_names_and_prereleases() {
        let cases = [
            ("redis-6-1.0.0 to pase", "redis-6", "1.0.0"),
            ("app-1.0.0-rc.1 to pase", "app", "1.0.0-rc.1"),
            ("my-web-app-0.10.2.tgz to pase", "my-web-app", "0.10.2"),
            ("Pushing /tmp/upload/app-1.0.0-rc.1.tgz to pase...", "app", "1.0.0-rc.1"),
            ("mychart-v1.2.0 to pase\n", "mychart", "v1.2.0"),
            ("Pushing mychart-v1.2.0.tgz to pase...", "mychart", "v1.2.0"),
            ("redis-6-v2.0.0-rc.1 to pase", "redis-6", "v2.0.0-rc.1"),
        ];
        for (stdout, name, version) in cases {
            let pushed = parse_push(stdout, "charts").unwrap();
            assert_eq!(pushed.chartname, format!("charts/{name}"), "{stdout}");
            assert_eq!(pushed.version, version, "{stdout}");
        }
    }

    #[test]
    fn test_push_name_and_version_rejoin_to_prefix() {
        for prefix in [
            "mychart-1.2.0",
            "redis-6-1.0.0",
            "app-2.0.0-beta.3",
            "mychart-v1.2.0",
        ] {
            let pushed = parse_push(&format!("{prefix} to pase"), "pase").unwrap();
            let name = pushed.chartname.trim_start_matches("pase/");
            assert_eq!(format!("{}-{}", name, pushed.version), prefix);
        }
    }

    #[test]
    fn test_push_malformed_is_unknown() {
        for stdout in ["", "mychart-1.2.0 pushed", "to pase", "mychart to pase", "\n\n"] {
            let err = parse_push(stdout, "pase").unwrap_err();
            assert!(
                matches!(err, DeployError::UnknownResponse { .. }),
                "{stdout:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let outcome = DeploymentOutcome::Pushed(PushedChart {
            chartname: "pase/app".to_string(),
            version: "1.0.0".to_string(),
        });
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({ "chartname": "pase/app", "version": "1.0.0" })
        );

        let installed = DeploymentOutcome::Installed(InstallOutcome {
            service_name: "svc".to_string(),
            release_name: "web".to_string(),
        });
        assert_eq!(
            serde_json::to_value(&installed).unwrap(),
            json!({ "serviceName": "svc", "releaseName": "web" })
        );
    }
}
