//! The dependency-resolution search.
//!
//! A depth-first walk over the package graph that produces zero or more
//! valid, topologically sorted installation plans. Dependencies with several
//! providers fan the search out (AND of ORs); a filter rule keeps the
//! working set small; conflicts are checked against a simulated
//! post-transaction system. A driver escalates the search when the fast
//! paths find nothing.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::solver::problem::Problem;
use crate::solver::solution::Solution;
use crate::system::System;
use crate::types::{DepFilter, PackageKind, PkgRef, strip_versioning};

/// Result of a full solver run.
#[derive(Clone, Debug, Default)]
pub struct SolveOutcome {
    /// All valid plans found, each topologically sorted.
    pub plans: Vec<Vec<PkgRef>>,
    /// Problems explaining the failure; empty when plans exist. Sorted by
    /// their rendering for deterministic reporting.
    pub problems: Vec<Problem>,
}

/// Reduce a working set: keep all valid solutions, or exactly one invalid
/// representative when none is valid. This is the primary guard against
/// combinatorial blow-up.
fn filter_solutions(mut solutions: Vec<Solution>) -> Vec<Solution> {
    if solutions.iter().any(|solution| solution.valid) {
        solutions.retain(|solution| solution.valid);
    } else {
        solutions.truncate(1);
    }
    solutions
}

/// The dependency solver for one planning run.
///
/// Borrows the installed and upstream systems for the duration of the run;
/// `deep_check` grows across driver rounds and disables the single-provider
/// fast path for the names it contains.
pub struct DepSolver<'a> {
    installed: &'a System,
    upstream: &'a System,
    deep_check: HashSet<String>,
}

impl<'a> DepSolver<'a> {
    /// Create a solver over an installed snapshot and an upstream universe.
    #[must_use]
    pub fn new(installed: &'a System, upstream: &'a System) -> Self {
        Self {
            installed,
            upstream,
            deep_check: HashSet::new(),
        }
    }

    /// What: Solve dependencies for the target packages.
    ///
    /// Inputs:
    /// - `targets`: The packages that must end up planned.
    ///
    /// Output:
    /// - Returns every valid plan found, or the recorded problems when no
    ///   plan exists.
    ///
    /// Details:
    /// - Runs with escalating difficulty: a first round with the
    ///   single-provider fast path; on failure the names of all problem
    ///   participants join `deep_check` and the round repeats; when that
    ///   stops growing and several targets exist, each target is first
    ///   solved alone (`single_first`) before the combined walk.
    pub fn solve(&mut self, targets: &[PkgRef]) -> SolveOutcome {
        let mut single_first = false;
        let mut problems: HashSet<Problem> = HashSet::new();
        let valid_solutions: Vec<Solution>;

        loop {
            let mut solutions = vec![Solution::new()];
            problems.clear();

            if single_first {
                for target in targets {
                    let mut next = Vec::new();
                    for mut solution in solutions {
                        solution.must_keep_installed =
                            HashMap::from([(target.name.clone(), true)]);
                        next.extend(self.solve_for(target, &solution, &mut problems));
                    }
                    solutions = next;
                }
            }

            let keep_all: HashMap<String, bool> = targets
                .iter()
                .map(|target| (target.name.clone(), true))
                .collect();
            for solution in &mut solutions {
                solution.must_keep_installed = keep_all.clone();
            }
            for target in targets {
                let mut next = Vec::new();
                for solution in &solutions {
                    next.extend(self.solve_for(target, solution, &mut problems));
                }
                solutions = next;
            }

            solutions.retain(|solution| solution.valid);
            if !solutions.is_empty() {
                tracing::debug!(count = solutions.len(), "found valid solutions");
                valid_solutions = solutions;
                break;
            }

            let deep_check_before = self.deep_check.len();
            for problem in &problems {
                for pkg in problem.relevant_packages() {
                    self.deep_check.insert(pkg.name.clone());
                }
            }

            if self.deep_check.len() == deep_check_before {
                if single_first || targets.len() <= 1 {
                    valid_solutions = Vec::new();
                    break;
                }
                single_first = true;
            }
            tracing::debug!(
                deep_check = self.deep_check.len(),
                single_first,
                "retrying dependency search"
            );
        }

        let mut problem_list: Vec<Problem> = if valid_solutions.is_empty() {
            problems.into_iter().collect()
        } else {
            Vec::new()
        };
        problem_list.sort_by_key(ToString::to_string);

        SolveOutcome {
            plans: valid_solutions
                .into_iter()
                .map(|solution| solution.plan)
                .collect(),
            problems: problem_list,
        }
    }

    /// Recursive step: resolve `package` on top of `solution`.
    ///
    /// Returns the surviving branches, filtered. Problems are collected in
    /// `problems`; they are dropped again whenever any branch at the current
    /// level stays valid.
    fn solve_for(
        &self,
        package: &PkgRef,
        solution: &Solution,
        problems: &mut HashSet<Problem>,
    ) -> Vec<Solution> {
        // already planned in this branch
        if solution.installed_in_solution.contains(package) {
            return vec![solution.clone()];
        }

        // cycle detection; the native manager resolves repo-only cycles
        if solution.visited_stack.contains(package) {
            if package.kind == PackageKind::Repo {
                return vec![solution.clone()];
            }
            if solution.valid
                && let Some(start) = solution
                    .visited_stack
                    .iter()
                    .position(|entry| entry == package)
            {
                let mut cycle: Vec<PkgRef> = solution.visited_stack[start..].to_vec();
                cycle.push(package.clone());
                problems.insert(Problem::cycle(cycle, &solution.way_to));
            }
            let mut invalid = solution.clone();
            invalid.valid = false;
            return vec![invalid];
        }

        let mut solution = solution.clone();
        // the package was planned earlier and its binary artifact exists, so
        // only runtime deps matter for re-installing it
        let build_available = solution.plan.contains(package);
        let own_way: Vec<PkgRef> = solution
            .way_to
            .get(&package.name)
            .cloned()
            .unwrap_or_default();
        let mut own_not_to_delete: HashSet<String> = HashSet::new();
        solution.visited_stack.push(package.clone());
        let mut current: Vec<Solution> = vec![solution];

        let runtime_deps: HashSet<String> = package
            .relevant_deps(DepFilter::RUNTIME)
            .into_iter()
            .collect();

        // prefilter: deps without any upstream provider invalidate the
        // branch up front and are not walked
        let mut deps = Vec::new();
        for dep in package.relevant_deps(DepFilter::ALL) {
            if !self.installed.provided_by(&dep).is_empty() {
                deps.push(dep);
                continue;
            }
            if build_available && !runtime_deps.contains(&dep) {
                deps.push(dep);
                continue;
            }
            if self.upstream.provided_by(&dep).is_empty() {
                for branch in &mut current {
                    branch.valid = false;
                }
                problems.insert(Problem::not_provided(
                    dep.clone(),
                    package.clone(),
                    &own_way,
                ));
                continue;
            }
            deps.push(dep);
        }

        // AND: every dep has to be fulfilled
        for dep in &deps {
            if !self.installed.provided_by(dep).is_empty() {
                continue;
            }
            if build_available && !runtime_deps.contains(dep) {
                continue;
            }

            let mut providers = self.upstream.provided_by(dep);
            let bare = strip_versioning(dep);
            // fast path: when the dep's bare name is itself a provider,
            // alternatives are not expanded unless deep checking asks for it
            if providers.iter().any(|provider| provider.name == bare)
                && !self.deep_check.contains(dep.as_str())
            {
                providers.retain(|provider| provider.name == bare);
            }

            let (mut finished, undecided): (Vec<Solution>, Vec<Solution>) = current
                .into_iter()
                .partition(|branch| branch.visited_names.contains(dep));

            // a previously chosen provider may already cover this dep
            let mut not_finished = Vec::new();
            for branch in undecided {
                let snapshot = System::from_unique(
                    branch.installed_in_solution.iter().cloned(),
                    self.upstream.policy(),
                );
                if snapshot.provided_by(dep).is_empty() {
                    not_finished.push(branch);
                } else {
                    finished.push(branch);
                }
            }

            for branch in finished.iter_mut().chain(not_finished.iter_mut()) {
                if branch.not_to_delete_deps.insert(dep.clone()) {
                    own_not_to_delete.insert(dep.clone());
                }
            }

            current = finished;
            let had_not_finished = !not_finished.is_empty();
            let problems_before = problems.clone();
            let mut provider_problems_per_branch: Vec<HashSet<Problem>> = Vec::new();

            // OR: at least one provider has to work out
            for mut branch in not_finished {
                branch.visited_names.insert(dep.clone());
                let mut provider_problems: Vec<HashSet<Problem>> = Vec::new();

                for provider in &providers {
                    let way_added = if branch.way_to.contains_key(&provider.name) {
                        false
                    } else {
                        let mut way = own_way.clone();
                        way.push(package.clone());
                        branch.way_to.insert(provider.name.clone(), way);
                        true
                    };
                    branch
                        .deps_provided_by
                        .entry(provider.name.clone())
                        .or_default()
                        .insert(dep.clone());

                    problems.clear();
                    current.extend(self.solve_for(provider, &branch, problems));
                    provider_problems.push(problems.clone());

                    if let Some(provided) = branch.deps_provided_by.get_mut(&provider.name) {
                        provided.remove(dep);
                    }
                    if way_added {
                        branch.way_to.remove(&provider.name);
                    }
                }

                *problems = problems_before.clone();

                // a problem-free provider makes the others' problems moot;
                // otherwise problems shared by every provider are the real
                // cause, and failing that, all of them are reported
                if provider_problems.iter().any(HashSet::is_empty) {
                    provider_problems_per_branch.push(HashSet::new());
                } else if let Some(first) = provider_problems.first() {
                    let mut shared = first.clone();
                    for set in &provider_problems[1..] {
                        shared.retain(|problem| set.contains(problem));
                    }
                    if shared.is_empty() {
                        let mut union = HashSet::new();
                        for set in &provider_problems {
                            union.extend(set.iter().cloned());
                        }
                        provider_problems_per_branch.push(union);
                    } else {
                        provider_problems_per_branch.push(shared);
                    }
                }
            }

            if had_not_finished
                && !provider_problems_per_branch.iter().any(HashSet::is_empty)
            {
                for set in &provider_problems_per_branch {
                    problems.extend(set.iter().cloned());
                }
            }

            current = filter_solutions(current);
        }

        // conflict checking against the simulated post-transaction system
        let mut checked: Vec<Solution> = Vec::new();
        for mut branch in current {
            if !branch.valid {
                checked.push(branch);
                continue;
            }

            let committed: Vec<PkgRef> = branch.installed_in_solution.iter().cloned().collect();
            let snapshot = System::from_unique(committed.iter().cloned(), self.upstream.policy());
            let conflicting = snapshot.conflicting_with(package);
            if conflicting.is_empty() {
                checked.push(branch);
                continue;
            }

            let mut to_append = branch.plan.clone();
            to_append.push(package.clone());
            let hypothetical = self.installed.hypothetical_append(&to_append);

            let mut note = String::new();
            let mut possible = hypothetical.contains_name(&package.name);
            if !possible {
                note = format!("Tried to install {}, but it was not possible.", package.name);
            }

            if possible {
                for dep in &branch.not_to_delete_deps {
                    if hypothetical.provided_by(dep).is_empty() {
                        note = format!(
                            "While trying to install {}, the needed dependency {dep} has been removed.",
                            package.name
                        );
                        possible = false;
                        break;
                    }
                }
            }

            if possible {
                let keep_violated = committed.iter().find(|pkg| {
                    branch
                        .must_keep_installed
                        .get(&pkg.name)
                        .copied()
                        .unwrap_or(false)
                        && !hypothetical.contains_name(&pkg.name)
                });

                if let Some(violated) = keep_violated {
                    note = format!(
                        "The package {} had to remain installed, but has been removed.\n\
                         The package which lead to the removal is {}",
                        violated.name, package.name
                    );
                } else {
                    // the conflict only displaced already-chosen packages;
                    // rewind them so they can be resolved again
                    for pkg in &committed {
                        if hypothetical.contains_name(&pkg.name) {
                            continue;
                        }
                        branch.installed_in_solution.remove(pkg);
                        if let Some(provided) = branch.deps_provided_by.remove(&pkg.name) {
                            for dep in provided {
                                branch.visited_names.remove(&dep);
                            }
                        }
                        branch.way_to.remove(&pkg.name);
                    }
                    checked.push(branch);
                    continue;
                }
            }

            branch.valid = false;
            let mut participants: BTreeSet<PkgRef> = conflicting.into_iter().collect();
            participants.insert(package.clone());
            let mut paths = Vec::new();
            for participant in &participants {
                let mut path = branch
                    .way_to
                    .get(&participant.name)
                    .cloned()
                    .unwrap_or_default();
                path.push(participant.clone());
                paths.push(path);
            }
            problems.insert(Problem::conflict(participants, paths, note));
            checked.push(branch);
        }
        let mut current = checked;

        // a valid branch at this level makes the collected problems moot
        if current.iter().any(|branch| branch.valid) {
            problems.clear();
        }

        // commit: the plan stays topologically sorted because every dep was
        // appended before this point
        for branch in &mut current {
            for dep in &own_not_to_delete {
                branch.not_to_delete_deps.remove(dep);
            }
            branch.installed_in_solution.insert(package.clone());
            branch.plan.push(package.clone());
            if let Some(position) = branch
                .visited_stack
                .iter()
                .position(|entry| entry == package)
            {
                branch.visited_stack.remove(position);
            }
        }

        filter_solutions(current)
    }
}

/// What: Solve dependencies for targets in one call.
///
/// Inputs:
/// - `targets`: The packages that must end up planned.
/// - `installed`: The installed-system snapshot.
/// - `upstream`: The upstream package universe.
///
/// Output:
/// - Returns the [`SolveOutcome`] of a fresh [`DepSolver`] run.
pub fn dep_solve(targets: &[PkgRef], installed: &System, upstream: &System) -> SolveOutcome {
    DepSolver::new(installed, upstream).solve(targets)
}
