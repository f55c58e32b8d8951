//! Transaction chunking and plan validation.
//!
//! The solver produces raw plans; this module groups them into repo /
//! non-repo installation chunks, filters them against the packages that must
//! end up installed, and deduplicates plans that lead to the same resulting
//! system.

use std::collections::HashSet;

use crate::system::{System, SystemDiff};
use crate::types::{PackageKind, PkgRef};

/// What: Group an ordered plan into installation chunks.
///
/// Inputs:
/// - `packages`: The plan, topologically sorted.
///
/// Output:
/// - Returns maximal runs of consecutive packages that are either all repo
///   or all non-repo; order inside and across chunks is preserved.
///
/// Details:
/// - The layer above batches each repo chunk into one native-manager call
///   and walks non-repo chunks package by package (or grouped by shared
///   pkgbase for split packages).
///
/// # Example
///
/// ```
/// use aurplan::plan::install_chunks;
/// use aurplan::types::{Package, PackageKind};
/// use std::sync::Arc;
///
/// let plan = vec![
///     Arc::new(Package::new("lib", "1", PackageKind::Repo)),
///     Arc::new(Package::new("tool", "1", PackageKind::Repo)),
///     Arc::new(Package::new("helper", "1", PackageKind::Aur)),
/// ];
/// let chunks = install_chunks(&plan);
/// assert_eq!(chunks.len(), 2);
/// assert_eq!(chunks[0].len(), 2);
/// assert_eq!(chunks[1].len(), 1);
/// ```
#[must_use]
pub fn install_chunks(packages: &[PkgRef]) -> Vec<Vec<PkgRef>> {
    let mut chunks: Vec<Vec<PkgRef>> = Vec::new();

    for pkg in packages {
        let is_repo = pkg.kind == PackageKind::Repo;
        match chunks.last_mut() {
            Some(current)
                if current
                    .first()
                    .is_some_and(|head| (head.kind == PackageKind::Repo) == is_repo) =>
            {
                current.push(pkg.clone());
            }
            _ => chunks.push(vec![pkg.clone()]),
        }
    }

    chunks
}

/// A validated installation plan with its simulated outcome.
#[derive(Clone, Debug)]
pub struct PlanCandidate {
    /// The plan, topologically sorted.
    pub plan: Vec<PkgRef>,
    /// The plan grouped into repo / non-repo chunks.
    pub chunks: Vec<Vec<PkgRef>>,
    /// The simulated system after applying the plan.
    pub resulting_system: System,
    /// Difference of the resulting system against the installed system.
    pub diff: SystemDiff,
}

/// What: Filter raw plans and deduplicate by resulting system.
///
/// Inputs:
/// - `installed`: The installed-system snapshot.
/// - `plans`: Raw solver plans.
/// - `required`: Names that must be present after the plan applies.
///
/// Output:
/// - Returns one [`PlanCandidate`] per distinct resulting system; plans
///   whose hypothetical apply loses a required name are dropped.
///
/// Details:
/// - Two plans are equivalent when their (installed-relative,
///   removed-relative) diff sets coincide; only one representative is kept.
#[must_use]
pub fn validate_solutions(
    installed: &System,
    plans: Vec<Vec<PkgRef>>,
    required: &[PkgRef],
) -> Vec<PlanCandidate> {
    let mut survivors: Vec<(System, Vec<PkgRef>)> = Vec::new();
    for plan in plans {
        let resulting = installed.hypothetical_append(&plan);
        let covered = required
            .iter()
            .all(|pkg| resulting.contains_name(&pkg.name));
        if covered {
            survivors.push((resulting, plan));
        } else {
            tracing::debug!(plan_len = plan.len(), "plan drops a required package");
        }
    }

    if survivors.is_empty() {
        return Vec::new();
    }

    let systems: Vec<System> = survivors.iter().map(|(system, _)| system.clone()).collect();
    let (_, remainders) = installed.differences(&systems);

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for (index, (system, plan)) in survivors.into_iter().enumerate() {
        if !seen.insert(remainders[index].fingerprint()) {
            continue;
        }
        let (diff, _) = installed.differences(std::slice::from_ref(&system));
        candidates.push(PlanCandidate {
            chunks: install_chunks(&plan),
            plan,
            resulting_system: system,
            diff,
        });
    }

    candidates
}
