//! Per-branch bookkeeping for the dependency search.

use std::collections::{HashMap, HashSet};

use crate::types::PkgRef;

/// One branch of the dependency search.
///
/// Cloning a solution before branching is cheap where it matters: package
/// records are shared (`Arc`), only the name sets and bookkeeping maps are
/// copied.
#[derive(Clone, Debug)]
pub struct Solution {
    /// The packages of this solution, topologically sorted (dependencies
    /// precede dependents).
    pub plan: Vec<PkgRef>,
    /// Whether this branch is still viable. Cleared on cycles outside the
    /// repo subgraph, unprovided dependencies and fatal conflicts.
    pub valid: bool,
    /// Current recursion path, for cycle detection.
    pub(crate) visited_stack: Vec<PkgRef>,
    /// Dependency strings already resolved in this branch.
    pub(crate) visited_names: HashSet<String>,
    /// Dependencies that must remain satisfied after every commit.
    pub(crate) not_to_delete_deps: HashSet<String>,
    /// How each package was reached, for diagnostics.
    pub(crate) way_to: HashMap<String, Vec<PkgRef>>,
    /// Which dependency strings each chosen package resolves.
    pub(crate) deps_provided_by: HashMap<String, HashSet<String>>,
    /// Packages that must not be cascade-removed by the hypothetical apply.
    pub(crate) must_keep_installed: HashMap<String, bool>,
    /// Packages already committed to this branch.
    pub(crate) installed_in_solution: HashSet<PkgRef>,
}

impl Solution {
    /// A fresh, valid, empty solution.
    #[must_use]
    pub fn new() -> Self {
        Self {
            plan: Vec::new(),
            valid: true,
            visited_stack: Vec::new(),
            visited_names: HashSet::new(),
            not_to_delete_deps: HashSet::new(),
            way_to: HashMap::new(),
            deps_provided_by: HashMap::new(),
            must_keep_installed: HashMap::new(),
            installed_in_solution: HashSet::new(),
        }
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::new()
    }
}
