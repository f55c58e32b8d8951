//! Helper configuration file parsing.
//!
//! The config is a plain key=value section file. Recognized sections:
//!
//! - `[aur_packages]`: names to force from the user repository even when a
//!   repo package of that name exists.
//! - `[repo_packages]`: `name=repo` entries pinning a package to a
//!   specific repository.
//! - `[devel_packages]`: extra names to classify as devel packages.
//! - `[no_notification_unknown_packages]`: foreign packages the caller
//!   should not warn about.
//! - `[miscellaneous]`: free-form flags, with or without a value.
//!
//! Unrecognized sections are ignored so configs can carry caller-specific
//! settings.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{AurPlanError, Result};

/// Parsed helper configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HelperConfig {
    /// Names to install from the user repository.
    pub aur_packages: HashSet<String>,
    /// Per-package repository overrides.
    pub repo_packages: HashMap<String, String>,
    /// Extra names classified as devel packages.
    pub devel_packages: HashSet<String>,
    /// Foreign packages exempt from unknown-package notifications.
    pub no_notification_unknown_packages: HashSet<String>,
    /// Free-form flags.
    pub miscellaneous: HashMap<String, Option<String>>,
}

impl HelperConfig {
    /// What: Parse a configuration from its textual form.
    ///
    /// Inputs:
    /// - `text`: The file contents.
    ///
    /// Output:
    /// - Returns the parsed config; `InvalidInput` when a name is listed
    ///   for both the AUR and a repository.
    ///
    /// Details:
    /// - Lines are `key` or `key=value`; `#` and `;` start full-line
    ///   comments; section and key names are trimmed.
    pub fn parse(text: &str) -> Result<Self> {
        let mut config = Self::default();
        let mut section = String::new();

        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
                section = name.trim().to_lowercase();
                continue;
            }

            let (key, value) = match line.split_once('=') {
                Some((key, value)) => (key.trim().to_string(), Some(value.trim().to_string())),
                None => (line.to_string(), None),
            };
            if key.is_empty() {
                continue;
            }

            match section.as_str() {
                "aur_packages" => {
                    config.aur_packages.insert(key);
                }
                "repo_packages" => {
                    if let Some(repo) = value.filter(|value| !value.is_empty()) {
                        config.repo_packages.insert(key, repo);
                    }
                }
                "devel_packages" => {
                    config.devel_packages.insert(key);
                }
                "no_notification_unknown_packages" => {
                    config.no_notification_unknown_packages.insert(key);
                }
                "miscellaneous" => {
                    config.miscellaneous.insert(key, value);
                }
                other => {
                    tracing::debug!(section = other, key, "ignoring unknown config entry");
                }
            }
        }

        for name in &config.aur_packages {
            if config.repo_packages.contains_key(name) {
                return Err(AurPlanError::InvalidInput(format!(
                    "Package {name} listed for aur and repo"
                )));
            }
        }

        Ok(config)
    }

    /// What: Load the configuration from a file.
    ///
    /// Inputs:
    /// - `path`: File to read.
    ///
    /// Output:
    /// - Returns the parsed config; a missing file yields the defaults,
    ///   any other read failure is `Parse`.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(error) => Err(AurPlanError::Parse(format!(
                "reading {} failed: {error}",
                path.display()
            ))),
        }
    }

    /// Whether a miscellaneous flag is present (with or without a value).
    #[must_use]
    pub fn misc_flag(&self, key: &str) -> bool {
        self.miscellaneous.contains_key(key)
    }

    /// The value of a miscellaneous entry, when one was given.
    #[must_use]
    pub fn misc_value(&self, key: &str) -> Option<&str> {
        self.miscellaneous.get(key)?.as_deref()
    }
}
