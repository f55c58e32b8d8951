//! Dependency-string parsing and version-policy types.

use serde::{Deserialize, Serialize};

/// Parsed dependency specification (name, comparison operator, version).
///
/// Result of parsing a dependency string like `"python>=3.12"` or `"glibc"`.
/// Both `op` and `ver` are empty when the string carries no constraint.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DepSpec {
    /// Package or provide name.
    pub name: String,
    /// Comparison operator (`<`, `<=`, `=`, `==`, `>=`, `>`) or empty.
    pub op: String,
    /// Version the operator compares against (empty when `op` is empty).
    pub ver: String,
}

impl DepSpec {
    /// What: Split a dependency string into name, operator and version.
    ///
    /// Inputs:
    /// - `spec`: Dependency string (e.g. `"python>=3.12"`, `"glibc"`).
    ///
    /// Output:
    /// - Returns a `DepSpec` with `name`, `op` and `ver` fields.
    ///
    /// Details:
    /// - The name is everything before the first operator character; the
    ///   operator spans from the first to the last operator character, so
    ///   `>=` and `==` come out as one token.
    /// - `op` and `ver` are empty when no operator is present.
    ///
    /// # Example
    ///
    /// ```
    /// use aurplan::types::DepSpec;
    ///
    /// let spec = DepSpec::parse("python>=3.12");
    /// assert_eq!(spec.name, "python");
    /// assert_eq!(spec.op, ">=");
    /// assert_eq!(spec.ver, "3.12");
    ///
    /// let spec = DepSpec::parse("glibc");
    /// assert_eq!(spec.name, "glibc");
    /// assert!(spec.op.is_empty());
    /// ```
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        let mut start = spec.len();
        let mut end = 0;
        let mut found = false;

        for ch in ['>', '<', '='] {
            if let Some(index) = spec.find(ch) {
                found = true;
                start = start.min(index);
                end = end.max(index);
            }
        }

        if !found {
            return Self {
                name: spec.trim().to_string(),
                op: String::new(),
                ver: String::new(),
            };
        }

        Self {
            name: spec[..start].trim().to_string(),
            op: spec[start..=end].to_string(),
            ver: spec[end + 1..].trim().to_string(),
        }
    }

    /// Whether this spec carries a version constraint.
    #[must_use]
    pub const fn has_constraint(&self) -> bool {
        !self.op.is_empty()
    }
}

impl std::fmt::Display for DepSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.name, self.op, self.ver)
    }
}

/// What: Strip the version constraint from a dependency string.
///
/// Inputs:
/// - `dep`: Dependency string (e.g. `"gunnar>=1.3.3.7"`).
///
/// Output:
/// - Returns the bare name (e.g. `"gunnar"`).
///
/// # Example
///
/// ```
/// use aurplan::types::strip_versioning;
///
/// assert_eq!(strip_versioning("gunnar>=1.3.3.7"), "gunnar");
/// assert_eq!(strip_versioning("glibc"), "glibc");
/// ```
#[must_use]
pub fn strip_versioning(dep: &str) -> &str {
    let end = dep
        .find(['>', '<', '='])
        .unwrap_or(dep.len());
    dep[..end].trim()
}

/// Policy for version handling during provider lookup.
///
/// `optimistic_versioning` treats bare provides as satisfying versioned
/// dependencies when the exact provide version is unknown.
/// `ignore_versioning` disables version checking entirely and dominates when
/// both flags are set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionPolicy {
    /// Assume bare provides fulfill versioned dependencies.
    pub optimistic_versioning: bool,
    /// Treat every dependency as unversioned.
    pub ignore_versioning: bool,
}

impl VersionPolicy {
    /// The operator to apply under this policy: empty when versioning is
    /// ignored, the given operator otherwise.
    #[must_use]
    pub fn effective_op<'a>(&self, op: &'a str) -> &'a str {
        if self.ignore_versioning { "" } else { op }
    }
}

/// Which dependency kinds to consider when walking a package's edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DepFilter {
    /// Only runtime `depends`.
    pub only_depends: bool,
    /// Only `makedepends` and `checkdepends`.
    pub only_make_check: bool,
}

impl DepFilter {
    /// All dependency kinds the package kind brings along.
    pub const ALL: Self = Self {
        only_depends: false,
        only_make_check: false,
    };

    /// Runtime dependencies only.
    pub const RUNTIME: Self = Self {
        only_depends: true,
        only_make_check: false,
    };
}
