//! Subprocess queries against the native package manager.

use std::collections::HashMap;
use std::process::{Command, Stdio};

use crate::error::{AurPlanError, Result};
use crate::native::parse::{
    LOCAL_FORMAT, SYNC_FORMAT, parse_local_output, parse_sync_output,
};
use crate::types::Package;

/// Run a command with a locale-stable environment and collect stdout lines.
fn run_lines(command: &str, args: &[&str]) -> Result<Vec<String>> {
    tracing::debug!(command, ?args, "running native query");
    let output = Command::new(command)
        .args(args)
        .env("LC_ALL", "C")
        .env("LANG", "C")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|error| {
            tracing::error!(command, %error, "failed to execute");
            AurPlanError::Parse(format!("{command} failed: {error}"))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::error!(
            command,
            status = ?output.status.code(),
            %stderr,
            "query failed"
        );
        return Err(AurPlanError::Parse(format!(
            "{command} failed with status {:?}: {stderr}",
            output.status.code()
        )));
    }

    let text = String::from_utf8_lossy(&output.stdout);
    Ok(text.lines().map(str::to_string).collect())
}

/// What: List the configured sync repositories in configuration order.
///
/// Output:
/// - Returns the repository names; order decides precedence when a package
///   appears in several repositories.
pub fn known_repos() -> Result<Vec<String>> {
    let lines = run_lines("pacman-conf", &["--repo-list"])?;
    Ok(lines
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

/// What: Query all sync-database packages.
///
/// Inputs:
/// - `repo_overrides`: Per-package repository overrides from the helper
///   config.
///
/// Output:
/// - Returns one record per package name, deduplicated by repository
///   precedence.
pub fn sync_packages(repo_overrides: &HashMap<String, String>) -> Result<Vec<Package>> {
    let repos = known_repos()?;
    let lines = run_lines("expac", &["-S", SYNC_FORMAT])?;
    parse_sync_output(&lines, &repos, repo_overrides)
}

/// What: Query the installed-package snapshot.
///
/// Output:
/// - Returns the local-database records, still classified `Foreign`;
///   [`crate::native::classify_installed`] assigns the real kinds once the
///   repo and AUR name sets are known.
pub fn installed_packages() -> Result<Vec<Package>> {
    let lines = run_lines("expac", &["-Q", LOCAL_FORMAT])?;
    parse_local_output(&lines)
}

/// What: List all known package groups.
///
/// Output:
/// - Returns the group names; degrades to an empty list when the query
///   fails, since group expansion is advisory.
#[must_use]
pub fn known_groups() -> Vec<String> {
    match run_lines("pacman", &["-Sg"]) {
        Ok(lines) => {
            let mut groups: Vec<String> = lines
                .into_iter()
                .filter_map(|line| {
                    line.split_whitespace().next().map(str::to_string)
                })
                .collect();
            groups.sort();
            groups.dedup();
            groups
        }
        Err(error) => {
            tracing::warn!(%error, "group query failed, assuming no groups");
            Vec::new()
        }
    }
}
