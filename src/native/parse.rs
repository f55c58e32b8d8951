//! Parsing of formatter-style native package manager output.
//!
//! The native collaborator queries package metadata through a formatter
//! (`expac`) that joins the requested fields with a fixed delimiter. One
//! output line describes one package.

use std::collections::{HashMap, HashSet};

use crate::error::{AurPlanError, Result};
use crate::types::{InstallReason, Package, PackageKind, is_devel};

/// The delimiter joining formatter fields.
pub const FIELD_DELIMITER: &str = "?!";

/// The formatter string for sync-database queries (last field: repository).
pub const SYNC_FORMAT: &str = "%n?!%v?!%D?!%H?!%o?!%P?!%R?!%e?!%G?!%r";

/// The formatter string for local-database queries (last field: install
/// reason).
pub const LOCAL_FORMAT: &str = "%n?!%v?!%D?!%H?!%o?!%P?!%R?!%e?!%G?!%w";

/// Which database a query line came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuerySource {
    /// Sync databases; the trailing field is the repository name.
    Sync,
    /// Local database; the trailing field is the install reason.
    Local,
}

/// What: Parse one formatter output line into a package record.
///
/// Inputs:
/// - `line`: One line of formatter output.
/// - `source`: Whether the line came from the sync or the local database.
///
/// Output:
/// - Returns the parsed record; `Parse` when the field count is off.
///
/// Details:
/// - List fields are whitespace-separated; `(null)` pkgbase falls back to
///   the package name; self-conflicts are stripped at construction.
/// - Local records start out as `Foreign`; [`classify_installed`] assigns
///   the real kind once the repo and AUR name sets are known.
pub fn parse_query_line(line: &str, source: QuerySource) -> Result<Package> {
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    if fields.len() != 10 {
        return Err(AurPlanError::Parse(format!(
            "expected 10 query fields, got {} in line: {line}",
            fields.len()
        )));
    }

    let split_list = |field: &str| -> Vec<String> {
        field.split_whitespace().map(str::to_string).collect()
    };

    let name = fields[0].trim();
    if name.is_empty() {
        return Err(AurPlanError::Parse(format!(
            "empty package name in line: {line}"
        )));
    }

    let kind = match source {
        QuerySource::Sync => PackageKind::Repo,
        QuerySource::Local => PackageKind::Foreign,
    };

    let pkgbase = match fields[7].trim() {
        "" | "(null)" => name.to_string(),
        other => other.to_string(),
    };

    let mut package = Package::new(name, fields[1].trim(), kind)
        .with_pkgbase(pkgbase)
        .with_depends(split_list(fields[2]))
        .with_conflicts(split_list(fields[3]))
        .with_provides(split_list(fields[5]))
        .with_replaces(split_list(fields[6]))
        .with_groups(split_list(fields[8]));

    match source {
        QuerySource::Sync => {
            package = package.with_repo(fields[9].trim());
        }
        QuerySource::Local => {
            package = match fields[9].trim().to_lowercase().as_str() {
                "explicit" => package.with_install_reason(InstallReason::Explicit),
                "dependency" => package.with_install_reason(InstallReason::Dependency),
                other => {
                    tracing::debug!(reason = other, package = name, "unknown install reason");
                    package
                }
            };
        }
    }

    Ok(package)
}

/// What: Parse sync-database output, deduplicating by repository
/// precedence.
///
/// Inputs:
/// - `lines`: Formatter output lines.
/// - `known_repos`: Repository names in configuration order (earlier wins).
/// - `repo_overrides`: Per-package repository overrides from the helper
///   config.
///
/// Output:
/// - Returns one record per package name; `InvalidInput` when an override
///   names an unknown package or a repository the package is not in.
///
/// Details:
/// - A package appearing in several repositories keeps the record from the
///   earliest-configured one, unless an override pins another repository.
pub fn parse_sync_output(
    lines: &[String],
    known_repos: &[String],
    repo_overrides: &HashMap<String, String>,
) -> Result<Vec<Package>> {
    let repo_rank = |repo: &Option<String>| -> usize {
        repo.as_deref()
            .and_then(|name| known_repos.iter().position(|known| known == name))
            .unwrap_or(usize::MAX)
    };

    let mut by_name: HashMap<String, Package> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let package = parse_query_line(line, QuerySource::Sync)?;

        let Some(existing) = by_name.get(&package.name) else {
            order.push(package.name.clone());
            by_name.insert(package.name.clone(), package);
            continue;
        };

        let keep_new = if let Some(wanted_repo) = repo_overrides.get(&package.name) {
            if package.repo.as_deref() == Some(wanted_repo) {
                true
            } else if existing.repo.as_deref() == Some(wanted_repo) {
                false
            } else {
                repo_rank(&package.repo) < repo_rank(&existing.repo)
            }
        } else {
            repo_rank(&package.repo) < repo_rank(&existing.repo)
        };

        if keep_new {
            by_name.insert(package.name.clone(), package);
        }
    }

    for (name, wanted_repo) in repo_overrides {
        let Some(package) = by_name.get(name) else {
            return Err(AurPlanError::InvalidInput(format!(
                "Package {name} not known in any repo"
            )));
        };
        if package.repo.as_deref() != Some(wanted_repo.as_str()) {
            return Err(AurPlanError::InvalidInput(format!(
                "Package {name} not found in repo {wanted_repo}"
            )));
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|name| by_name.remove(&name))
        .collect())
}

/// What: Parse local-database output into installed-snapshot records.
///
/// Inputs:
/// - `lines`: Formatter output lines.
///
/// Output:
/// - Returns the records, all still classified `Foreign`.
pub fn parse_local_output(lines: &[String]) -> Result<Vec<Package>> {
    lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| parse_query_line(line, QuerySource::Local))
        .collect()
}

/// What: Assign the real kind to installed-snapshot records.
///
/// Inputs:
/// - `packages`: Records parsed from the local database.
/// - `repo_names`: Names known to the sync databases.
/// - `aur_names`: Names known to the user repository.
/// - `devel_extra`: Extra names configured as devel packages.
///
/// Output:
/// - Returns the records with `Repo`, `Aur`, `Devel` or `Foreign` kinds.
///
/// Details:
/// - Sync-database membership wins over AUR membership; packages known to
///   neither stay `Foreign`.
#[must_use]
pub fn classify_installed(
    packages: Vec<Package>,
    repo_names: &HashSet<String>,
    aur_names: &HashSet<String>,
    devel_extra: &HashSet<String>,
) -> Vec<Package> {
    packages
        .into_iter()
        .map(|mut package| {
            package.kind = if repo_names.contains(&package.name) {
                PackageKind::Repo
            } else if aur_names.contains(&package.name) {
                if is_devel(&package.name, devel_extra) {
                    PackageKind::Devel
                } else {
                    PackageKind::Aur
                }
            } else {
                PackageKind::Foreign
            };
            package
        })
        .collect()
}
