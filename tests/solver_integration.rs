//! Integration tests for the dependency solver.
//!
//! These cover the end-to-end resolution scenarios the planning core must
//! get right: plain chains, provider disjunctions, versioned provides,
//! cycles inside and outside the repo subgraph, and conflicting
//! dependencies. Plan contents are asserted as sets wherever the choice
//! among equally good providers is not guaranteed.

use aurplan::solver::{Problem, SolveOutcome, dep_solve};
use aurplan::system::System;
use aurplan::types::{DepFilter, Package, PackageKind, PkgRef, VersionPolicy};
use std::collections::HashSet;
use std::sync::Arc;

fn repo(name: &str, version: &str) -> Package {
    Package::new(name, version, PackageKind::Repo)
}

fn aur(name: &str, version: &str) -> Package {
    Package::new(name, version, PackageKind::Aur)
}

fn system_of(packages: Vec<Package>) -> System {
    System::new(packages.into_iter().map(Arc::new).collect()).expect("system should build")
}

fn empty() -> System {
    system_of(Vec::new())
}

fn target(upstream: &System, name: &str) -> PkgRef {
    upstream
        .get(name)
        .cloned()
        .unwrap_or_else(|| panic!("{name} should be upstream"))
}

fn plan_names(plan: &[PkgRef]) -> Vec<&str> {
    plan.iter().map(|pkg| pkg.name.as_str()).collect()
}

/// Dependencies must precede dependents, except among repo packages that
/// share a cycle.
fn assert_topological(plan: &[PkgRef]) {
    for (i, earlier) in plan.iter().enumerate() {
        let earlier_deps: HashSet<String> = earlier
            .relevant_deps(DepFilter::ALL)
            .iter()
            .map(|dep| aurplan::types::strip_versioning(dep).to_string())
            .collect();
        for later in &plan[i + 1..] {
            let both_repo =
                earlier.kind == PackageKind::Repo && later.kind == PackageKind::Repo;
            assert!(
                !earlier_deps.contains(&later.name) || both_repo,
                "{} depends on {} but precedes it in {:?}",
                earlier.name,
                later.name,
                plan_names(plan)
            );
        }
    }
}

#[test]
fn repo_target_with_repo_deps() {
    let upstream = system_of(vec![
        repo("a", "1.0").with_depends(vec!["b".into()]),
        repo("b", "1.0"),
        repo("c", "1.0"),
    ]);
    let outcome = dep_solve(&[target(&upstream, "a")], &empty(), &upstream);

    assert_eq!(outcome.plans.len(), 1);
    assert_eq!(plan_names(&outcome.plans[0]), vec!["b", "a"]);
    assert!(outcome.problems.is_empty());
    assert_topological(&outcome.plans[0]);
}

#[test]
fn aur_target_with_repo_dep() {
    let upstream = system_of(vec![
        aur("a", "1.0").with_depends(vec!["b".into()]),
        repo("b", "1.0"),
    ]);
    let outcome = dep_solve(&[target(&upstream, "a")], &empty(), &upstream);

    assert_eq!(outcome.plans.len(), 1);
    assert_eq!(plan_names(&outcome.plans[0]), vec!["b", "a"]);

    let chunks = aurplan::plan::install_chunks(&outcome.plans[0]);
    assert_eq!(chunks.len(), 2);
    assert_eq!(plan_names(&chunks[0]), vec!["b"]);
    assert_eq!(plan_names(&chunks[1]), vec!["a"]);
}

#[test]
fn provider_disjunction_with_versioning() {
    let upstream = system_of(vec![
        repo("libfoo-1", "1.0").with_provides(vec!["foo=1".into()]),
        repo("libfoo-2", "2.0").with_provides(vec!["foo=2".into()]),
        aur("p", "1.0").with_depends(vec!["foo>=2".into()]),
    ]);
    let outcome = dep_solve(&[target(&upstream, "p")], &empty(), &upstream);

    assert_eq!(outcome.plans.len(), 1);
    let names: HashSet<&str> = plan_names(&outcome.plans[0]).into_iter().collect();
    assert!(names.contains("libfoo-2"));
    assert!(names.contains("p"));
    assert!(!names.contains("libfoo-1"));
}

#[test]
fn bare_provide_rejects_versioned_dep() {
    let upstream = system_of(vec![
        repo("x", "1.0").with_provides(vec!["alias".into()]),
        aur("y", "1.0").with_depends(vec!["alias>=3".into()]),
    ]);
    let outcome = dep_solve(&[target(&upstream, "y")], &empty(), &upstream);

    assert!(outcome.plans.is_empty());
    assert!(outcome.problems.iter().any(|problem| matches!(
        problem,
        Problem::NotProvided { dep, requester, .. }
            if dep == "alias>=3" && requester.name == "y"
    )));
}

#[test]
fn bare_provide_accepted_when_own_version_satisfies() {
    let upstream = system_of(vec![
        repo("x", "4.0").with_provides(vec!["alias".into()]),
        aur("y", "1.0").with_depends(vec!["alias>=3".into()]),
    ]);
    let outcome = dep_solve(&[target(&upstream, "y")], &empty(), &upstream);

    assert_eq!(outcome.plans.len(), 1);
    assert_eq!(plan_names(&outcome.plans[0]), vec!["x", "y"]);
}

#[test]
fn bare_provide_accepted_under_optimistic_versioning() {
    let policy = VersionPolicy {
        optimistic_versioning: true,
        ignore_versioning: false,
    };
    let mut upstream = system_of(vec![
        repo("x", "1.0").with_provides(vec!["alias".into()]),
        aur("y", "1.0").with_depends(vec!["alias>=3".into()]),
    ]);
    upstream.set_policy(policy);
    let mut installed = empty();
    installed.set_policy(policy);

    let outcome = dep_solve(&[target(&upstream, "y")], &installed, &upstream);
    assert_eq!(outcome.plans.len(), 1);
    assert_eq!(plan_names(&outcome.plans[0]), vec!["x", "y"]);
}

#[test]
fn repo_cycle_is_tolerated() {
    let upstream = system_of(vec![
        repo("a", "1.0").with_depends(vec!["b".into()]),
        repo("b", "1.0").with_depends(vec!["a".into()]),
    ]);
    let outcome = dep_solve(&[target(&upstream, "a")], &empty(), &upstream);

    assert_eq!(outcome.plans.len(), 1);
    let names: HashSet<&str> = plan_names(&outcome.plans[0]).into_iter().collect();
    assert_eq!(names, HashSet::from(["a", "b"]));
    assert!(outcome.problems.is_empty());
}

#[test]
fn aur_cycle_is_rejected() {
    let upstream = system_of(vec![
        aur("a", "1.0").with_depends(vec!["b".into()]),
        aur("b", "1.0").with_depends(vec!["a".into()]),
    ]);
    let outcome = dep_solve(&[target(&upstream, "a")], &empty(), &upstream);

    assert!(outcome.plans.is_empty());
    let cycle = outcome.problems.iter().find_map(|problem| match problem {
        Problem::Cycle { packages, .. } => Some(packages),
        _ => None,
    });
    let cycle = cycle.expect("a cycle problem should be reported");
    let names: HashSet<&str> = cycle.iter().map(|pkg| pkg.name.as_str()).collect();
    assert_eq!(names, HashSet::from(["a", "b"]));
}

#[test]
fn mixed_cycle_is_rejected() {
    // one aur member poisons the cycle even when the rest is repo
    let upstream = system_of(vec![
        aur("a", "1.0").with_depends(vec!["b".into()]),
        repo("b", "1.0").with_depends(vec!["a".into()]),
    ]);
    let outcome = dep_solve(&[target(&upstream, "a")], &empty(), &upstream);
    assert!(outcome.plans.is_empty());
    assert!(outcome
        .problems
        .iter()
        .any(|problem| matches!(problem, Problem::Cycle { .. })));
}

#[test]
fn conflict_that_removes_must_keep_target() {
    let installed = system_of(vec![repo("k", "1.0")]);
    let upstream = system_of(vec![
        repo("k", "1.0"),
        aur("q", "1.0").with_conflicts(vec!["k".into()]),
    ]);
    let targets = [target(&upstream, "q"), target(&upstream, "k")];

    let outcome = dep_solve(&targets, &installed, &upstream);
    assert!(outcome.plans.is_empty());

    let conflict = outcome.problems.iter().find_map(|problem| match problem {
        Problem::Conflict { packages, .. } => Some(packages),
        _ => None,
    });
    let conflict = conflict.expect("a conflict problem should be reported");
    let names: HashSet<&str> = conflict.iter().map(|pkg| pkg.name.as_str()).collect();
    assert!(names.contains("q"));
    assert!(names.contains("k"));
}

#[test]
fn conflicting_deps_of_one_package_fail() {
    let upstream = system_of(vec![
        aur("app", "1.0").with_depends(vec!["b".into(), "c".into()]),
        repo("b", "1.0").with_conflicts(vec!["c".into()]),
        repo("c", "1.0"),
    ]);
    let outcome = dep_solve(&[target(&upstream, "app")], &empty(), &upstream);

    assert!(outcome.plans.is_empty());
    assert!(outcome
        .problems
        .iter()
        .any(|problem| matches!(problem, Problem::Conflict { .. })));
}

#[test]
fn installed_packages_satisfy_deps() {
    let installed = system_of(vec![repo("lib", "1.0")]);
    let upstream = system_of(vec![
        repo("lib", "1.0"),
        aur("app", "1.0").with_depends(vec!["lib".into()]),
    ]);
    let outcome = dep_solve(&[target(&upstream, "app")], &installed, &upstream);

    assert_eq!(outcome.plans.len(), 1);
    assert_eq!(plan_names(&outcome.plans[0]), vec!["app"]);
}

#[test]
fn provider_restriction_prefers_exact_name() {
    // the dep's bare name is itself upstream, so the alternative provider
    // is never expanded and exactly one plan comes back
    let upstream = system_of(vec![
        repo("foo", "1.0"),
        repo("libfoo", "1.0").with_provides(vec!["foo".into()]),
        aur("p", "1.0").with_depends(vec!["foo".into()]),
    ]);
    let outcome = dep_solve(&[target(&upstream, "p")], &empty(), &upstream);

    assert_eq!(outcome.plans.len(), 1);
    let names: HashSet<&str> = plan_names(&outcome.plans[0]).into_iter().collect();
    assert!(names.contains("foo"));
    assert!(!names.contains("libfoo"));
}

#[test]
fn deep_check_retry_expands_alternative_providers() {
    // the exact-name provider is broken; the first round fails, the retry
    // with deep checking picks the alternative
    let upstream = system_of(vec![
        repo("foo", "1.0").with_depends(vec!["ghost".into()]),
        repo("libfoo", "2.0").with_provides(vec!["foo".into()]),
        aur("p", "1.0").with_depends(vec!["foo".into()]),
    ]);
    let outcome = dep_solve(&[target(&upstream, "p")], &empty(), &upstream);

    assert_eq!(outcome.plans.len(), 1);
    let names: HashSet<&str> = plan_names(&outcome.plans[0]).into_iter().collect();
    assert_eq!(names, HashSet::from(["libfoo", "p"]));
}

#[test]
fn diamond_dependencies_resolve_once() {
    let upstream = system_of(vec![
        aur("top", "1.0").with_depends(vec!["left".into(), "right".into()]),
        repo("left", "1.0").with_depends(vec!["base".into()]),
        repo("right", "1.0").with_depends(vec!["base".into()]),
        repo("base", "1.0"),
    ]);
    let outcome = dep_solve(&[target(&upstream, "top")], &empty(), &upstream);

    assert_eq!(outcome.plans.len(), 1);
    let plan = &outcome.plans[0];
    assert_eq!(plan.len(), 4);
    assert_topological(plan);

    // no phantom packages: everything is reachable from the target
    let names: HashSet<&str> = plan_names(plan).into_iter().collect();
    assert_eq!(names, HashSet::from(["top", "left", "right", "base"]));
}

#[test]
fn makedepends_are_resolved_for_aur_packages() {
    let upstream = system_of(vec![
        aur("app", "1.0")
            .with_depends(vec!["runtime".into()])
            .with_makedepends(vec!["build-tool".into()])
            .with_checkdepends(vec!["test-tool".into()]),
        repo("runtime", "1.0"),
        repo("build-tool", "1.0"),
        repo("test-tool", "1.0"),
    ]);
    let outcome = dep_solve(&[target(&upstream, "app")], &empty(), &upstream);

    assert_eq!(outcome.plans.len(), 1);
    let names: HashSet<&str> = plan_names(&outcome.plans[0]).into_iter().collect();
    assert_eq!(
        names,
        HashSet::from(["app", "runtime", "build-tool", "test-tool"])
    );
    assert_topological(&outcome.plans[0]);
}

#[test]
fn multiple_targets_share_dependencies() {
    let upstream = system_of(vec![
        aur("one", "1.0").with_depends(vec!["shared".into()]),
        aur("two", "1.0").with_depends(vec!["shared".into()]),
        repo("shared", "1.0"),
    ]);
    let targets = [target(&upstream, "one"), target(&upstream, "two")];
    let outcome = dep_solve(&targets, &empty(), &upstream);

    assert_eq!(outcome.plans.len(), 1);
    let plan = &outcome.plans[0];
    assert_eq!(plan.len(), 3, "shared dep must be planned once: {plan:?}");
    assert_eq!(plan_names(plan)[0], "shared");
}

#[test]
fn problems_are_cleared_when_any_branch_succeeds() {
    // impl-broken fails, impl-good succeeds; the outcome must be clean
    let upstream = system_of(vec![
        aur("p", "1.0").with_depends(vec!["virtual".into()]),
        repo("impl-broken", "1.0")
            .with_provides(vec!["virtual".into()])
            .with_depends(vec!["ghost".into()]),
        repo("impl-good", "1.0").with_provides(vec!["virtual".into()]),
    ]);
    let outcome = dep_solve(&[target(&upstream, "p")], &empty(), &upstream);

    assert!(!outcome.plans.is_empty());
    assert!(outcome.problems.is_empty());
    for plan in &outcome.plans {
        let names: HashSet<&str> = plan_names(plan).into_iter().collect();
        assert!(names.contains("impl-good"));
        assert!(!names.contains("impl-broken"));
    }
}

#[test]
fn outcome_is_deterministic_for_failures() {
    let upstream = system_of(vec![
        aur("a", "1.0").with_depends(vec!["ghost-one".into(), "ghost-two".into()]),
    ]);

    let render = |outcome: &SolveOutcome| -> Vec<String> {
        outcome.problems.iter().map(ToString::to_string).collect()
    };

    let first = dep_solve(&[target(&upstream, "a")], &empty(), &upstream);
    let second = dep_solve(&[target(&upstream, "a")], &empty(), &upstream);
    assert_eq!(render(&first), render(&second));
    assert_eq!(first.problems.len(), 2);
}
