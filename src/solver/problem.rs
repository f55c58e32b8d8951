//! Diagnostics collected while searching for solutions.

use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

use crate::types::PkgRef;

/// A problem encountered on a search branch.
///
/// Problems are non-fatal per branch: they only reach the caller when no
/// valid solution exists at all. Equality is what deduplicates them across
/// branches: cycles and conflicts compare by their package set, unprovided
/// dependencies by `(dep, requester)`.
#[derive(Clone, Debug)]
pub enum Problem {
    /// A dependency cycle outside the repo-only subgraph.
    Cycle {
        /// The cycle, in recursion order; first and last entry coincide.
        packages: Vec<PkgRef>,
        /// Packages whose names widen the deep-check set when this problem
        /// survives.
        relevant: BTreeSet<PkgRef>,
    },
    /// A candidate plan would remove something it must keep.
    Conflict {
        /// All participants of the conflict.
        packages: BTreeSet<PkgRef>,
        /// The dependency path to each participant.
        paths: Vec<Vec<PkgRef>>,
        /// Extra context (which must-keep rule failed).
        note: String,
        /// Packages whose names widen the deep-check set.
        relevant: BTreeSet<PkgRef>,
    },
    /// A dependency with no provider in the upstream universe.
    NotProvided {
        /// The unprovided dependency string.
        dep: String,
        /// The package that needs it.
        requester: PkgRef,
        /// Packages whose names widen the deep-check set.
        relevant: BTreeSet<PkgRef>,
    },
}

impl Problem {
    /// Build a cycle problem from a recursion-stack slice.
    #[must_use]
    pub fn cycle(packages: Vec<PkgRef>, way_to: &HashMap<String, Vec<PkgRef>>) -> Self {
        let mut relevant: BTreeSet<PkgRef> = packages.iter().cloned().collect();
        for pkg in &packages {
            if let Some(way) = way_to.get(&pkg.name) {
                relevant.extend(way.iter().cloned());
            }
        }
        Self::Cycle { packages, relevant }
    }

    /// Build a conflict problem from its participants and their paths.
    #[must_use]
    pub fn conflict(packages: BTreeSet<PkgRef>, paths: Vec<Vec<PkgRef>>, note: String) -> Self {
        let relevant: BTreeSet<PkgRef> = paths.iter().flatten().cloned().collect();
        Self::Conflict {
            packages,
            paths,
            note,
            relevant,
        }
    }

    /// Build an unprovided-dependency problem.
    #[must_use]
    pub fn not_provided(dep: String, requester: PkgRef, own_way: &[PkgRef]) -> Self {
        let mut relevant: BTreeSet<PkgRef> = own_way.iter().cloned().collect();
        relevant.insert(requester.clone());
        Self::NotProvided {
            dep,
            requester,
            relevant,
        }
    }

    /// The packages whose names feed the deep-check escalation.
    #[must_use]
    pub const fn relevant_packages(&self) -> &BTreeSet<PkgRef> {
        match self {
            Self::Cycle { relevant, .. }
            | Self::Conflict { relevant, .. }
            | Self::NotProvided { relevant, .. } => relevant,
        }
    }

    /// Identity key: cycles and conflicts by package set, unprovided deps by
    /// `(dep, requester)`.
    fn identity(&self) -> ProblemIdentity<'_> {
        match self {
            Self::Cycle { packages, .. } => {
                ProblemIdentity::Cycle(packages.iter().map(package_key).collect())
            }
            Self::Conflict { packages, .. } => {
                ProblemIdentity::Conflict(packages.iter().map(package_key).collect())
            }
            Self::NotProvided { dep, requester, .. } => {
                ProblemIdentity::NotProvided(dep, package_key(requester))
            }
        }
    }
}

fn package_key(pkg: &PkgRef) -> (&str, &str) {
    (pkg.name.as_str(), pkg.version.as_str())
}

#[derive(PartialEq, Eq, Hash)]
enum ProblemIdentity<'a> {
    Cycle(BTreeSet<(&'a str, &'a str)>),
    Conflict(BTreeSet<(&'a str, &'a str)>),
    NotProvided(&'a str, (&'a str, &'a str)),
}

impl PartialEq for Problem {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Problem {}

impl Hash for Problem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cycle { packages, .. } => {
                let chain: Vec<String> = packages.iter().map(ToString::to_string).collect();
                write!(f, "Dependency cycle: {}", chain.join(" -> "))
            }
            Self::Conflict {
                packages,
                paths,
                note,
                ..
            } => {
                let names: Vec<String> = packages.iter().map(ToString::to_string).collect();
                write!(f, "Conflicts between: {}", names.join(", "))?;
                if !note.is_empty() {
                    write!(f, "\n{note}")?;
                }
                for path in paths {
                    let Some(target) = path.last() else { continue };
                    let chain: Vec<String> = path.iter().map(ToString::to_string).collect();
                    write!(f, "\nWay to package {target}: {}", chain.join(" -> "))?;
                }
                Ok(())
            }
            Self::NotProvided { dep, requester, .. } => {
                write!(f, "Not provided: {dep} but needed by {requester}")
            }
        }
    }
}
