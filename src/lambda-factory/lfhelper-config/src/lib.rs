//! Configuration for lambda-factory.
//!
//! Parses `lambda-factory.toml` into typed settings. Every field is
//! optional; anything left out falls back to the values the tool has
//! always shipped with, so an absent file behaves exactly like the
//! historical hard-coded setup.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "lambda-factory.toml";

pub const DEFAULT_RUNTIME: &str = "nodejs22.x";
pub const DEFAULT_ROLE: &str = "arn:aws:iam::115462458880:role/General-Lambda-Function";
pub const DEFAULT_HANDLER: &str = "index.handler";
pub const DEFAULT_TIMEOUT_SECS: u32 = 10;

/// Upper bound AWS Lambda accepts for a function timeout.
pub const MAX_TIMEOUT_SECS: u32 = 900;

// ============================================================================
// Error type
// ============================================================================

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("function.timeout must be between 1 and 900 seconds, got {0}")]
    InvalidTimeout(u32),

    #[error("install.command must name a program to run")]
    EmptyCommand,
}

// ============================================================================
// Settings types
// ============================================================================

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub function: FunctionSettings,
    pub layout: Layout,
    pub install: InstallSettings,
    pub workflow: WorkflowSettings,
}

/// Fixed values sent with every create-function request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FunctionSettings {
    pub runtime: String,
    pub role: String,
    pub handler: String,
    /// Seconds.
    pub timeout: u32,
    /// Overrides the region from the AWS default provider chain.
    pub region: Option<String>,
}

impl Default for FunctionSettings {
    fn default() -> Self {
        Self {
            runtime: DEFAULT_RUNTIME.to_string(),
            role: DEFAULT_ROLE.to_string(),
            handler: DEFAULT_HANDLER.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            region: None,
        }
    }
}

/// Where templates live and where scaffolded functions go.
///
/// All paths are relative to the directory the tool runs in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Layout {
    pub template_root: PathBuf,
    pub functions_dir: PathBuf,
    pub events_dir: PathBuf,
    pub test_dir: PathBuf,
    /// Dependency manifests copied next to the function code before
    /// install and removed again afterwards.
    pub manifests: Vec<String>,
    /// Directory the installer vendors dependencies into.
    pub dependency_cache: String,
    pub archive: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            template_root: PathBuf::from("CD/template"),
            functions_dir: PathBuf::from("functions"),
            events_dir: PathBuf::from("events"),
            test_dir: PathBuf::from("test"),
            manifests: vec!["package.json".to_string(), "package-lock.json".to_string()],
            dependency_cache: "node_modules".to_string(),
            archive: PathBuf::from("function.zip"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallSettings {
    /// Program followed by its arguments.
    pub command: Vec<String>,
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self {
            command: vec!["npm".to_string(), "ci".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkflowSettings {
    /// Undo local and remote side effects when a run fails part way.
    pub rollback_on_failure: bool,
}

// ============================================================================
// Resolved paths
// ============================================================================

/// A template tree and the name-scoped directory it is copied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scaffold {
    pub template: PathBuf,
    pub destination: PathBuf,
}

/// Every path the workflow touches for one function, resolved against a
/// working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionPaths {
    pub function_dir: PathBuf,
    pub events_dir: PathBuf,
    pub test_dir: PathBuf,
    pub metadata: PathBuf,
    pub dependency_cache: PathBuf,
    pub archive: PathBuf,
    /// (source in the working directory, copy inside the function dir)
    pub manifests: Vec<(PathBuf, PathBuf)>,
}

impl FunctionPaths {
    /// Template trees in copy order: function code, events, tests.
    pub fn scaffolds(&self, layout: &Layout, root: &Path) -> [Scaffold; 3] {
        let templates = root.join(&layout.template_root);
        [
            Scaffold {
                template: templates.join("function"),
                destination: self.function_dir.clone(),
            },
            Scaffold {
                template: templates.join("events"),
                destination: self.events_dir.clone(),
            },
            Scaffold {
                template: templates.join("test"),
                destination: self.test_dir.clone(),
            },
        ]
    }

    /// Manifest copies that live inside the function directory.
    pub fn manifest_copies(&self) -> impl Iterator<Item = &Path> {
        self.manifests.iter().map(|(_, copy)| copy.as_path())
    }
}

impl Layout {
    pub fn paths_for(&self, root: &Path, name: &str) -> FunctionPaths {
        let function_dir = root.join(&self.functions_dir).join(name);
        FunctionPaths {
            events_dir: root.join(&self.events_dir).join(name),
            test_dir: root.join(&self.test_dir).join(name),
            metadata: function_dir.join("metadata.json"),
            dependency_cache: function_dir.join(&self.dependency_cache),
            archive: root.join(&self.archive),
            manifests: self
                .manifests
                .iter()
                .map(|m| (root.join(m), function_dir.join(m)))
                .collect(),
            function_dir,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl Config {
    /// Parse and validate configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file that must exist.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Resolve configuration for a run in `dir`.
    ///
    /// An explicit path must exist. Otherwise `lambda-factory.toml` in
    /// `dir` is used when present, and defaults when it is not.
    pub fn discover(dir: &Path, explicit: Option<&Path>) -> Result<Self, Error> {
        if let Some(path) = explicit {
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                dir.join(path)
            };
            return Self::load(&path);
        }

        let implicit = dir.join(DEFAULT_CONFIG_FILE);
        if implicit.is_file() {
            Self::load(&implicit)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        let timeout = self.function.timeout;
        if timeout == 0 || timeout > MAX_TIMEOUT_SECS {
            return Err(Error::InvalidTimeout(timeout));
        }
        if self.install.command.first().is_none_or(|p| p.trim().is_empty()) {
            return Err(Error::EmptyCommand);
        }
        if self.function.runtime.trim().is_empty() {
            return Err(Error::MissingField("function.runtime"));
        }
        if self.function.role.trim().is_empty() {
            return Err(Error::MissingField("function.role"));
        }
        if self.function.handler.trim().is_empty() {
            return Err(Error::MissingField("function.handler"));
        }
        Ok(())
    }
}
