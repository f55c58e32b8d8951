//! The planning facade tying sanitizing, solving, validation and chunking
//! together.
//!
//! A [`Planner`] owns the two package universes of one planning run (the
//! installed snapshot and the upstream repositories plus queried AUR
//! records) and turns user intent (targets, hold set, ignore set, flags)
//! into a [`PlannerResult`]. It is a pure computation: all side-effecting
//! work (fetching, building, installing) belongs to the collaborators around
//! it.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use crate::error::{AurPlanError, Result};
use crate::plan::{PlanCandidate, validate_solutions};
use crate::solver::{Problem, dep_solve};
use crate::system::System;
use crate::types::{PackageKind, PkgRef, VersionPolicy, strip_versioning};
use crate::version::compare;

/// Switches steering one planning run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct PlannerFlags {
    /// Skip targets whose installed version already equals the candidate.
    pub needed: bool,
    /// Upgrade every installed package with a newer upstream version.
    pub sysupgrade: bool,
    /// With `sysupgrade`: any version difference counts, downgrades too.
    pub sysupgrade_force: bool,
    /// Solve against an empty installed system, re-deriving everything.
    pub deep_search: bool,
    /// Devel package versions have been refreshed from live checkouts
    /// before planning; accepted for interface completeness.
    pub devel: bool,
    /// Treat the targets as not installed so they are rebuilt in order.
    pub rebuild: bool,
    /// Let bare provides satisfy versioned dependencies.
    pub optimistic_versioning: bool,
    /// Disable version checking entirely.
    pub ignore_versioning: bool,
    /// With `sysupgrade`: also perform replacements announced upstream.
    pub do_everything: bool,
}

impl PlannerFlags {
    const fn policy(self) -> VersionPolicy {
        VersionPolicy {
            optimistic_versioning: self.optimistic_versioning,
            ignore_versioning: self.ignore_versioning,
        }
    }
}

/// Outcome of one planning run.
#[derive(Clone, Debug)]
pub enum PlannerResult {
    /// Exactly one valid plan: ready to hand to fetch/build/install.
    Chosen(PlanCandidate),
    /// Several distinct valid plans; the caller picks one (each candidate
    /// carries its diff against the installed system for display).
    NeedChoice(Vec<PlanCandidate>),
    /// No valid plan; the problems explain why.
    Failed(Vec<Problem>),
}

/// The dependency planner for one pair of package universes.
#[derive(Clone, Debug)]
pub struct Planner {
    installed: System,
    upstream: System,
}

impl Planner {
    /// Create a planner over an installed snapshot and an upstream
    /// universe (native repositories plus queried AUR records).
    #[must_use]
    pub const fn new(installed: System, upstream: System) -> Self {
        Self { installed, upstream }
    }

    /// The installed-system snapshot.
    #[must_use]
    pub const fn installed(&self) -> &System {
        &self.installed
    }

    /// The upstream package universe.
    #[must_use]
    pub const fn upstream(&self) -> &System {
        &self.upstream
    }

    /// What: Produce installation plans for the requested targets.
    ///
    /// Inputs:
    /// - `targets`: User tokens (may carry version constraints).
    /// - `hold_set`: Names that must remain installed afterwards.
    /// - `ignore_set`: Names excluded from upgrading.
    /// - `flags`: Planning switches.
    ///
    /// Output:
    /// - Returns `Chosen` for a single valid plan, `NeedChoice` when several
    ///   distinct plans survive, `Failed` with the recorded problems when
    ///   none does.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when a target has no provider.
    /// - `AmbiguousProvider` when a target has several providers and no
    ///   exact name match.
    /// - `HeldPackageMissing` when a held name is unknown upstream.
    pub fn plan(
        &self,
        targets: &[String],
        hold_set: &[String],
        ignore_set: &[String],
        flags: PlannerFlags,
    ) -> Result<PlannerResult> {
        let policy = flags.policy();
        let mut upstream = self.upstream.clone();
        upstream.set_policy(policy);
        let mut installed = self.installed.clone();
        installed.set_policy(policy);

        // user input resolution; held names count as wanted-installed
        let mut target_names = upstream.sanitize_user_input(targets)?;
        let hold_names = installed.sanitize_user_input(hold_set)?;
        for name in &hold_names {
            if !upstream.contains_name(name) {
                return Err(AurPlanError::HeldPackageMissing(name.clone()));
            }
        }
        target_names.extend(hold_names);

        // explicitly requested names are never ignored; an ignored upstream
        // record is pinned to the installed one, or dropped when not
        // installed at all
        let ignored_names: HashSet<String> = ignore_set
            .iter()
            .filter(|name| !target_names.contains(*name))
            .cloned()
            .collect();
        for name in &ignored_names {
            if !upstream.contains_name(name) {
                continue;
            }
            if let Some(installed_pkg) = installed.get(name) {
                tracing::debug!(package = %name, "ignoring installed package");
                upstream.replace_package(installed_pkg.clone());
            } else {
                tracing::debug!(package = %name, "ignoring upstream package");
                upstream.remove_package(name);
            }
        }

        let mut concrete = concrete_targets(&target_names, &installed, &upstream, flags)?;
        if flags.sysupgrade {
            collect_upgrades(&mut concrete, &installed, &upstream, flags);
            if flags.do_everything {
                collect_replacements(&mut concrete, &installed, &upstream, &ignored_names);
            }
        }

        // rebuild pretends the targets are absent; deep search ignores the
        // installed system entirely
        let solve_installed = if flags.deep_search {
            System::with_policy(Vec::new(), policy)?
        } else if flags.rebuild {
            let remaining: Vec<PkgRef> = installed
                .packages()
                .filter(|pkg| !target_names.contains(&pkg.name))
                .cloned()
                .collect();
            System::with_policy(remaining, policy)?
        } else {
            installed.clone()
        };

        tracing::info!(targets = concrete.len(), "calculating solutions");
        let outcome = dep_solve(&concrete, &solve_installed, &upstream);
        if outcome.plans.is_empty() {
            tracing::warn!(
                problems = outcome.problems.len(),
                "no solution for the requested targets"
            );
            return Ok(PlannerResult::Failed(outcome.problems));
        }

        // validation always runs against the real installed system
        let mut candidates = validate_solutions(&installed, outcome.plans, &concrete);
        match candidates.len() {
            0 => Ok(PlannerResult::Failed(outcome.problems)),
            1 => Ok(PlannerResult::Chosen(candidates.remove(0))),
            _ => {
                candidates.sort_by_key(|candidate| {
                    candidate.diff.fingerprint().into_iter().collect::<Vec<_>>()
                });
                Ok(PlannerResult::NeedChoice(candidates))
            }
        }
    }
}

/// Resolve target names to upstream records, honoring `needed`.
fn concrete_targets(
    target_names: &BTreeSet<String>,
    installed: &System,
    upstream: &System,
    flags: PlannerFlags,
) -> Result<Vec<PkgRef>> {
    let mut concrete = Vec::new();
    for name in target_names {
        let Some(pkg) = upstream.get(name) else {
            return Err(AurPlanError::InvalidInput(format!(
                "Package {name} not known upstream"
            )));
        };
        if flags.needed
            && let Some(resident) = installed.get(name)
            && compare(&resident.version, &pkg.version) == Ordering::Equal
        {
            tracing::debug!(package = %name, "already up to date, skipping");
            continue;
        }
        concrete.push(pkg.clone());
    }
    Ok(concrete)
}

/// Pull in every installed package with a newer upstream version.
fn collect_upgrades(
    concrete: &mut Vec<PkgRef>,
    installed: &System,
    upstream: &System,
    flags: PlannerFlags,
) {
    let mut residents: Vec<PkgRef> = installed
        .packages()
        .filter(|pkg| pkg.kind != PackageKind::Foreign)
        .cloned()
        .collect();
    residents.sort();

    for resident in residents {
        let Some(upstream_pkg) = upstream.get(&resident.name) else {
            tracing::warn!(package = %resident.name, "no upstream record, cannot upgrade");
            continue;
        };
        let wanted = if flags.sysupgrade_force {
            compare(&upstream_pkg.version, &resident.version) != Ordering::Equal
        } else {
            compare(&upstream_pkg.version, &resident.version) == Ordering::Greater
        };
        if wanted && !concrete.contains(upstream_pkg) {
            tracing::debug!(
                package = %resident.name,
                from = %resident.version,
                to = %upstream_pkg.version,
                "scheduling upgrade"
            );
            concrete.push(upstream_pkg.clone());
        }
    }
}

/// Schedule upstream repo packages replacing installed ones; the replaced
/// package's own upgrade entry is displaced.
fn collect_replacements(
    concrete: &mut Vec<PkgRef>,
    installed: &System,
    upstream: &System,
    ignored_names: &HashSet<String>,
) {
    let mut repo_packages: Vec<PkgRef> = upstream
        .packages()
        .filter(|pkg| pkg.kind == PackageKind::Repo)
        .cloned()
        .collect();
    repo_packages.sort();

    for replacer in repo_packages {
        for replace in &replacer.replaces {
            let replace_name = strip_versioning(replace);
            let Some(replaced) = installed
                .provided_by(replace)
                .into_iter()
                .find(|pkg| pkg.name == replace_name)
            else {
                continue;
            };
            // a package must not replace itself (it may provide the very
            // name it replaces)
            if replacer.name == replaced.name
                || ignored_names.contains(&replacer.name)
                || ignored_names.contains(&replaced.name)
            {
                continue;
            }

            tracing::debug!(replacer = %replacer.name, replaced = %replaced.name, "scheduling replacement");
            if !concrete.contains(&replacer) {
                concrete.push(replacer.clone());
            }
            if let Some(replaced_upstream) = upstream.get(&replaced.name) {
                concrete.retain(|pkg| pkg != replaced_upstream);
            }
        }
    }
}
