//! Package record types for planning operations.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::types::dependency::{DepFilter, strip_versioning};

/// Shared handle to an immutable package record.
///
/// Packages appear in several systems at once (installed, upstream,
/// hypothetical) and in solver bookkeeping; all of them hold clones of the
/// same allocation.
pub type PkgRef = Arc<Package>;

/// Name endings that mark a package as a development (VCS) package.
const DEVEL_SUFFIXES: &[&str] = &["bzr", "git", "hg", "svn", "daily", "nightly"];

/// What: Check whether a package name denotes a development package.
///
/// Inputs:
/// - `name`: Package name to check.
/// - `extra`: Additional names configured as devel packages.
///
/// Output:
/// - Returns `true` for VCS-suffixed names (`-git`, `-svn`, ...) and for
///   names listed in `extra`.
///
/// # Example
///
/// ```
/// use aurplan::types::is_devel;
/// use std::collections::HashSet;
///
/// let extra = HashSet::new();
/// assert!(is_devel("yay-git", &extra));
/// assert!(!is_devel("yay", &extra));
/// ```
#[must_use]
pub fn is_devel(name: &str, extra: &HashSet<String>) -> bool {
    if extra.contains(name) {
        return true;
    }
    DEVEL_SUFFIXES
        .iter()
        .any(|suffix| name.ends_with(&format!("-{suffix}")))
}

/// Where a package record comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PackageKind {
    /// Provided by the distribution's binary repositories.
    Repo,
    /// Provided by the user source repository.
    Aur,
    /// AUR package whose pkgver is computed from a live VCS checkout.
    Devel,
    /// Installed locally but known to neither source.
    Foreign,
}

impl PackageKind {
    /// Whether this kind is served by the user source repository.
    #[must_use]
    pub const fn is_aur(self) -> bool {
        matches!(self, Self::Aur | Self::Devel)
    }
}

/// Why a package is present on the installed system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallReason {
    /// Explicitly requested by the user.
    Explicit,
    /// Pulled in as a dependency.
    Dependency,
}

/// Immutable description of one package.
///
/// Identity is `(name, version)`: two records with the same name but
/// different versions are different packages, which is how upgrades show up
/// in system diffs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Package {
    /// Package name (unique key within a system).
    pub name: String,
    /// Version string, compared by [`crate::version::compare`].
    pub version: String,
    /// Where the record comes from.
    pub kind: PackageKind,
    /// Shared build recipe name; equal to `name` when the source does not
    /// report one.
    pub pkgbase: String,
    /// Repository name (populated for repo packages).
    pub repo: Option<String>,
    /// Install reason (populated only for installed-snapshot records).
    pub install_reason: Option<InstallReason>,
    /// Runtime dependencies (dep-strings).
    pub depends: Vec<String>,
    /// Build dependencies (dep-strings).
    pub makedepends: Vec<String>,
    /// Test dependencies (dep-strings).
    pub checkdepends: Vec<String>,
    /// Virtual provisions, optionally versioned (`name[=ver]`).
    pub provides: Vec<String>,
    /// Conflicting packages (conflict-strings).
    pub conflicts: Vec<String>,
    /// Packages this one replaces.
    pub replaces: Vec<String>,
    /// Group memberships.
    pub groups: Vec<String>,
}

impl Package {
    /// What: Create a minimal package record.
    ///
    /// Inputs:
    /// - `name`: Package name.
    /// - `version`: Version string.
    /// - `kind`: Record origin.
    ///
    /// Output:
    /// - Returns a `Package` with empty relation lists and `pkgbase` equal
    ///   to the name.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>, kind: PackageKind) -> Self {
        let name = name.into();
        Self {
            pkgbase: name.clone(),
            name,
            version: version.into(),
            kind,
            repo: None,
            install_reason: None,
            depends: Vec::new(),
            makedepends: Vec::new(),
            checkdepends: Vec::new(),
            provides: Vec::new(),
            conflicts: Vec::new(),
            replaces: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Set the runtime dependency list.
    #[must_use]
    pub fn with_depends(mut self, depends: Vec<String>) -> Self {
        self.depends = depends;
        self
    }

    /// Set the build dependency list.
    #[must_use]
    pub fn with_makedepends(mut self, makedepends: Vec<String>) -> Self {
        self.makedepends = makedepends;
        self
    }

    /// Set the test dependency list.
    #[must_use]
    pub fn with_checkdepends(mut self, checkdepends: Vec<String>) -> Self {
        self.checkdepends = checkdepends;
        self
    }

    /// Set the provide list.
    #[must_use]
    pub fn with_provides(mut self, provides: Vec<String>) -> Self {
        self.provides = provides;
        self
    }

    /// Set the conflict list. A package never conflicts with its own name;
    /// such entries are removed here.
    #[must_use]
    pub fn with_conflicts(mut self, conflicts: Vec<String>) -> Self {
        self.conflicts = conflicts;
        self.strip_self_conflicts();
        self
    }

    /// Set the replaces list.
    #[must_use]
    pub fn with_replaces(mut self, replaces: Vec<String>) -> Self {
        self.replaces = replaces;
        self
    }

    /// Set the group list.
    #[must_use]
    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    /// Set the repository name.
    #[must_use]
    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = Some(repo.into());
        self
    }

    /// Set the pkgbase.
    #[must_use]
    pub fn with_pkgbase(mut self, pkgbase: impl Into<String>) -> Self {
        self.pkgbase = pkgbase.into();
        self
    }

    /// Set the install reason.
    #[must_use]
    pub const fn with_install_reason(mut self, reason: InstallReason) -> Self {
        self.install_reason = Some(reason);
        self
    }

    /// Update the version in place.
    ///
    /// The one mutation the planning lifecycle allows: devel packages get
    /// their "current source" version from the build-recipe collaborator
    /// before planning starts.
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    /// Remove entries whose bare name equals this package's own name.
    fn strip_self_conflicts(&mut self) {
        let name = self.name.clone();
        self.conflicts
            .retain(|conflict| strip_versioning(conflict) != name);
    }

    /// What: Build a package record from an AUR RPC record.
    ///
    /// Inputs:
    /// - `record`: Record as returned by the AUR info endpoint.
    /// - `devel_names`: Extra names configured as devel packages.
    ///
    /// Output:
    /// - Returns an `Aur` or `Devel` package; the devel classification uses
    ///   the name heuristic plus the configured set.
    #[must_use]
    pub fn from_aur_record(record: &AurRecord, devel_names: &HashSet<String>) -> Self {
        let kind = if is_devel(&record.name, devel_names) {
            PackageKind::Devel
        } else {
            PackageKind::Aur
        };

        let pkgbase = if record.package_base.is_empty() {
            record.name.clone()
        } else {
            record.package_base.clone()
        };

        Self::new(record.name.clone(), record.version.clone(), kind)
            .with_pkgbase(pkgbase)
            .with_depends(record.depends.clone())
            .with_makedepends(record.make_depends.clone())
            .with_checkdepends(record.check_depends.clone())
            .with_provides(record.provides.clone())
            .with_conflicts(record.conflicts.clone())
            .with_replaces(record.replaces.clone())
            .with_groups(record.groups.clone())
    }

    /// What: Collect the dependency strings relevant for this package.
    ///
    /// Inputs:
    /// - `filter`: Which dependency kinds to include.
    ///
    /// Output:
    /// - Returns the deduplicated dep-strings, first occurrence wins.
    ///
    /// Details:
    /// - Runtime depends unless `only_make_check`; make and check depends
    ///   unless `only_depends`. Repo and foreign records carry empty
    ///   make/check lists, so they contribute runtime depends only.
    #[must_use]
    pub fn relevant_deps(&self, filter: DepFilter) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut deps = Vec::new();

        let mut extend = |source: &[String]| {
            for dep in source {
                if seen.insert(dep.clone()) {
                    deps.push(dep.clone());
                }
            }
        };

        if !filter.only_make_check {
            extend(&self.depends);
        }
        if !filter.only_depends {
            extend(&self.makedepends);
            extend(&self.checkdepends);
        }

        deps
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.version == other.version
    }
}

impl Eq for Package {}

impl std::hash::Hash for Package {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.version.hash(state);
    }
}

impl Ord for Package {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.version.cmp(&other.version))
    }
}

impl PartialOrd for Package {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.name, self.version)
    }
}

/// One record of the AUR RPC v5 info/search endpoints.
///
/// Field names follow the wire format; absent arrays deserialize as empty.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AurRecord {
    /// Package name.
    #[serde(rename = "Name")]
    pub name: String,
    /// Version string as reported by the AUR.
    #[serde(rename = "Version")]
    pub version: String,
    /// Shared build recipe name.
    #[serde(rename = "PackageBase")]
    pub package_base: String,
    /// One-line description.
    #[serde(rename = "Description")]
    pub description: String,
    /// Runtime dependencies.
    #[serde(rename = "Depends")]
    pub depends: Vec<String>,
    /// Build dependencies.
    #[serde(rename = "MakeDepends")]
    pub make_depends: Vec<String>,
    /// Test dependencies.
    #[serde(rename = "CheckDepends")]
    pub check_depends: Vec<String>,
    /// Conflicting packages.
    #[serde(rename = "Conflicts")]
    pub conflicts: Vec<String>,
    /// Virtual provisions.
    #[serde(rename = "Provides")]
    pub provides: Vec<String>,
    /// Packages this one replaces.
    #[serde(rename = "Replaces")]
    pub replaces: Vec<String>,
    /// Group memberships.
    #[serde(rename = "Groups")]
    pub groups: Vec<String>,
    /// Number of votes on the AUR.
    #[serde(rename = "NumVotes")]
    pub num_votes: Option<u64>,
    /// AUR popularity score.
    #[serde(rename = "Popularity")]
    pub popularity: Option<f64>,
    /// Timestamp when the package was flagged out of date.
    #[serde(rename = "OutOfDate")]
    pub out_of_date: Option<i64>,
}
