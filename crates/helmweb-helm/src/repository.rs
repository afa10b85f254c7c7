//! Repository definitions
//!
//! Repositories registered at startup come from the configured `pase`
//! upload area plus an optional YAML file:
//!
//! ```yaml
//! repositories:
//!   - name: bitnami
//!     url: https://charts.bitnami.com/bitnami
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Contents of a repositories file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryConfig {
    #[serde(default)]
    pub repositories: Vec<Repository>,
}

impl RepositoryConfig {
    /// Load and validate a repositories file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content).map_err(|e| match e {
            ParseError::Yaml(source) => ConfigError::Yaml {
                path: path.display().to_string(),
                source,
            },
            ParseError::Invalid(e) => e,
        })
    }

    fn parse(content: &str) -> Result<Self, ParseError> {
        let raw: Self = serde_yaml::from_str(content).map_err(ParseError::Yaml)?;

        // Re-add through `add` so every entry is validated and names stay unique
        let mut config = Self::default();
        for repo in raw.repositories {
            let repo = Repository::new(repo.name, repo.url).map_err(ParseError::Invalid)?;
            config.add(repo).map_err(ParseError::Invalid)?;
        }
        Ok(config)
    }

    pub fn get(&self, name: &str) -> Option<&Repository> {
        self.repositories.iter().find(|r| r.name == name)
    }

    pub fn add(&mut self, repo: Repository) -> Result<(), ConfigError> {
        if self.get(&repo.name).is_some() {
            return Err(ConfigError::RepositoryAlreadyExists {
                name: repo.name.clone(),
            });
        }
        self.repositories.push(repo);
        Ok(())
    }

}

enum ParseError {
    Yaml(serde_yaml::Error),
    Invalid(ConfigError),
}

/// A chart repository known to helm under `name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub url: String,
}

impl Repository {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        let url = url.into();

        if name.is_empty() || name.contains(char::is_whitespace) || name.contains('/') {
            return Err(ConfigError::InvalidRepositoryName {
                name,
                reason: "must be non-empty without whitespace or '/'".to_string(),
            });
        }
        validate_url(&url)?;

        Ok(Self { name, url })
    }
}

/// Accept only locations `helm repo add` can register
fn validate_url(url: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidRepositoryUrl {
        url: url.to_string(),
        reason,
    };

    if url.starts_with("file://") || url.starts_with('/') {
        Ok(())
    } else if url.starts_with("http://") || url.starts_with("https://") {
        url::Url::parse(url)
            .map(|_| ())
            .map_err(|e| invalid(e.to_string()))
    } else {
        Err(invalid(
            "URL must start with http://, https://, file://, or /".to_string(),
        ))
    }
}
