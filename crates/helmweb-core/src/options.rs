//! Loosely-typed request payload
//!
//! `DeployOptions` is what callers send: every field optional, scalars may
//! arrive as strings or numbers, flags as booleans or `"true"`/`"1"`/`"on"`.
//! It is turned into a typed [`HelmRequest`](crate::HelmRequest) before
//! anything runs.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

static TRUTHY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(true|1|on)\s*$").expect("truthy pattern is valid")
});

/// Option bag shared by every operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeployOptions {
    /// Chart reference, e.g. `stable/nginx`
    #[serde(deserialize_with = "loose_string")]
    pub chart_name: Option<String>,

    #[serde(deserialize_with = "loose_string")]
    pub release_name: Option<String>,

    #[serde(deserialize_with = "loose_string")]
    pub namespace: Option<String>,

    /// Chart version pin
    #[serde(deserialize_with = "loose_string")]
    pub version: Option<String>,

    /// Inline overrides, `key1=val1,key2=val2`. For search this is the
    /// free-text filter.
    #[serde(deserialize_with = "loose_string")]
    pub values: Option<String>,

    /// Raw values file content
    #[serde(deserialize_with = "loose_string")]
    pub value_file: Option<String>,

    #[serde(deserialize_with = "loose_bool")]
    pub dry_run: bool,

    /// URL of a private chart repository; its alias is the chart's first path segment
    #[serde(deserialize_with = "loose_string")]
    pub private_charts_repo: Option<String>,

    #[serde(deserialize_with = "loose_bool")]
    pub reuse_value: bool,

    /// `online` makes install/upgrade replace a deleted release of the same name
    #[serde(deserialize_with = "loose_string")]
    pub handle: Option<String>,

    #[serde(deserialize_with = "loose_string")]
    pub release_revision: Option<String>,

    /// Inspect section: chart, values, readme or all
    #[serde(deserialize_with = "loose_string")]
    pub command: Option<String>,

    /// Search scope or push target alias
    #[serde(deserialize_with = "loose_string")]
    pub repo_name: Option<String>,

    /// Path of a packaged chart to push
    #[serde(deserialize_with = "loose_string")]
    pub chart_file: Option<String>,
}

impl DeployOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chart(mut self, chart_name: impl Into<String>) -> Self {
        self.chart_name = Some(chart_name.into());
        self
    }

    pub fn release(mut self, release_name: impl Into<String>) -> Self {
        self.release_name = Some(release_name.into());
        self
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

/// Interpret a flag the way callers historically sent it
pub fn is_truthy(raw: &str) -> bool {
    TRUTHY.is_match(raw)
}

/// Blank strings count as absent
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn loose_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        Some(Value::String(s)) => is_truthy(&s),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_camel_case_payload() {
        let options: DeployOptions = serde_json::from_value(json!({
            "chartName": "stable/nginx",
            "releaseName": "web",
            "namespace": "apps",
            "privateChartsRepo": "https://charts.example.com"
        }))
        .unwrap();

        assert_eq!(options.chart_name.as_deref(), Some("stable/nginx"));
        assert_eq!(options.release_name.as_deref(), Some("web"));
        assert_eq!(options.namespace.as_deref(), Some("apps"));
        assert_eq!(
            options.private_charts_repo.as_deref(),
            Some("https://charts.example.com")
        );
        assert!(!options.dry_run);
    }

    #[test]
    fn test_numbers_become_strings() {
        let options: DeployOptions = serde_json::from_value(json!({
            "releaseName": "web",
            "releaseRevision": 3
        }))
        .unwrap();
        assert_eq!(options.release_revision.as_deref(), Some("3"));
    }

    #[test]
    fn test_empty_and_null_are_absent() {
        let options: DeployOptions = serde_json::from_value(json!({
            "chartName": "",
            "namespace": null,
            "version": "   "
        }))
        .unwrap();
        assert_eq!(options, DeployOptions::default());
    }

    #[test]
    fn test_flag_spellings() {
        for raw in ["true", "TRUE", " on ", "1"] {
            let options: DeployOptions =
                serde_json::from_value(json!({ "reuseValue": raw })).unwrap();
            assert!(options.reuse_value, "{raw:?} should be truthy");
        }
        for raw in [json!("false"), json!("yes"), json!(0), json!(null)] {
            let options: DeployOptions =
                serde_json::from_value(json!({ "reuseValue": raw })).unwrap();
            assert!(!options.reuse_value);
        }
        let options: DeployOptions = serde_json::from_value(json!({ "dryRun": true })).unwrap();
        assert!(options.dry_run);
    }

    #[test]
    fn test_builder_helpers() {
        let options = DeployOptions::new()
            .chart("stable/nginx")
            .release("web")
            .in_namespace("apps");
        assert_eq!(non_blank(&options.chart_name), Some("stable/nginx"));
        assert_eq!(non_blank(&None), None);
        assert_eq!(non_blank(&Some(" ".to_string())), None);
    }
}
