//! Integration tests for the planner facade.
//!
//! These exercise the full pipeline: input sanitizing, hold and ignore
//! handling, sysupgrade and replacement collection, solving, validation and
//! chunking.

use aurplan::error::AurPlanError;
use aurplan::plan::PlanCandidate;
use aurplan::planner::{Planner, PlannerFlags, PlannerResult};
use aurplan::solver::Problem;
use aurplan::system::System;
use aurplan::types::{Package, PackageKind, PkgRef};
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

fn planner(installed: Vec<Package>, upstream: Vec<Package>) -> Planner {
    Planner::new(system_of(installed), system_of(upstream))
}

fn names(plan: &[PkgRef]) -> HashSet<&str> {
    plan.iter().map(|pkg| pkg.name.as_str()).collect()
}

fn chosen(result: PlannerResult) -> PlanCandidate {
    match result {
        PlannerResult::Chosen(candidate) => candidate,
        other => panic!("expected Chosen, got {other:?}"),
    }
}

#[test]
fn aur_target_is_chunked_after_its_repo_dep() {
    let planner = planner(
        vec![],
        vec![aur("a", "1.0").with_depends(vec!["b".into()]), repo("b", "1.0")],
    );
    let candidate = chosen(
        planner
            .plan(&["a".to_string()], &[], &[], PlannerFlags::default())
            .expect("plan should succeed"),
    );

    assert_eq!(names(&candidate.plan), HashSet::from(["a", "b"]));
    assert_eq!(candidate.chunks.len(), 2);
    assert_eq!(names(&candidate.chunks[0]), HashSet::from(["b"]));
    assert_eq!(names(&candidate.chunks[1]), HashSet::from(["a"]));

    // target coverage in the simulated result
    assert!(candidate.resulting_system.contains_name("a"));
    assert!(candidate.resulting_system.contains_name("b"));
}

#[test]
fn conflict_with_held_package_fails() {
    let planner = planner(
        vec![repo("k", "1.0")],
        vec![
            repo("k", "1.0"),
            aur("q", "1.0").with_conflicts(vec!["k".into()]),
        ],
    );
    let result = planner
        .plan(
            &["q".to_string()],
            &["k".to_string()],
            &[],
            PlannerFlags::default(),
        )
        .expect("planning itself should not error");

    let PlannerResult::Failed(problems) = result else {
        panic!("expected Failed, got {result:?}");
    };
    let conflict = problems.iter().find_map(|problem| match problem {
        Problem::Conflict { packages, .. } => Some(packages),
        _ => None,
    });
    let conflict = conflict.expect("a conflict should be reported");
    let participant_names: HashSet<&str> =
        conflict.iter().map(|pkg| pkg.name.as_str()).collect();
    assert!(participant_names.contains("q"));
    assert!(participant_names.contains("k"));
}

#[test]
fn hold_preservation_in_valid_plans() {
    let planner = planner(
        vec![repo("keep-me", "1.0")],
        vec![
            repo("keep-me", "1.0"),
            aur("app", "1.0").with_depends(vec!["lib".into()]),
            repo("lib", "1.0"),
        ],
    );
    let candidate = chosen(
        planner
            .plan(
                &["app".to_string()],
                &["keep-me".to_string()],
                &[],
                PlannerFlags::default(),
            )
            .expect("plan should succeed"),
    );
    assert!(candidate.resulting_system.contains_name("keep-me"));
    assert!(candidate.resulting_system.contains_name("app"));
}

#[test]
fn replacement_via_sysupgrade() {
    let planner = planner(
        vec![repo("old-pkg", "1.0")],
        vec![repo("new-pkg", "1.0").with_replaces(vec!["old-pkg".into()])],
    );
    let flags = PlannerFlags {
        sysupgrade: true,
        do_everything: true,
        ..PlannerFlags::default()
    };
    let candidate = chosen(planner.plan(&[], &[], &[], flags).expect("plan should succeed"));

    assert!(names(&candidate.plan).contains("new-pkg"));
    assert!(candidate.resulting_system.contains_name("new-pkg"));
    assert!(!candidate.resulting_system.contains_name("old-pkg"));
    assert!(candidate.diff.removed.iter().any(|pkg| pkg.name == "old-pkg"));
}

#[test]
fn replacement_requires_do_everything() {
    let planner = planner(
        vec![repo("old-pkg", "1.0")],
        vec![repo("new-pkg", "1.0").with_replaces(vec!["old-pkg".into()])],
    );
    let flags = PlannerFlags {
        sysupgrade: true,
        ..PlannerFlags::default()
    };
    let candidate = chosen(planner.plan(&[], &[], &[], flags).expect("plan should succeed"));
    assert!(candidate.plan.is_empty());
}

#[test]
fn ambiguous_target_is_refused() {
    let planner = planner(
        vec![],
        vec![
            repo("impl-a", "1.0").with_provides(vec!["virtual".into()]),
            repo("impl-b", "1.0").with_provides(vec!["virtual".into()]),
        ],
    );
    let result = planner.plan(&["virtual".to_string()], &[], &[], PlannerFlags::default());
    match result {
        Err(AurPlanError::AmbiguousProvider { name, providers }) => {
            assert_eq!(name, "virtual");
            let provider_set: HashSet<&str> =
                providers.iter().map(String::as_str).collect();
            assert_eq!(provider_set, HashSet::from(["impl-a", "impl-b"]));
        }
        other => panic!("expected AmbiguousProvider, got {other:?}"),
    }
}

#[test]
fn ambiguous_dependency_offers_choices() {
    // the ambiguity sits one level down: the target's dep has two providers
    let planner = planner(
        vec![],
        vec![
            aur("p", "1.0").with_depends(vec!["virtual".into()]),
            repo("impl-a", "1.0").with_provides(vec!["virtual".into()]),
            repo("impl-b", "1.0").with_provides(vec!["virtual".into()]),
        ],
    );
    let result = planner
        .plan(&["p".to_string()], &[], &[], PlannerFlags::default())
        .expect("plan should succeed");

    let PlannerResult::NeedChoice(candidates) = result else {
        panic!("expected NeedChoice, got {result:?}");
    };
    assert_eq!(candidates.len(), 2);
    let plans: HashSet<String> = candidates
        .iter()
        .map(|candidate| {
            let mut plan_names: Vec<&str> = names(&candidate.plan).into_iter().collect();
            plan_names.sort_unstable();
            plan_names.join(",")
        })
        .collect();
    assert!(plans.contains("impl-a,p"));
    assert!(plans.contains("impl-b,p"));
}

#[test]
fn conflicting_provider_branch_is_avoided() {
    // impl-a would remove the held package; the solver must settle on
    // impl-b without surfacing the dead branch
    let planner = planner(
        vec![repo("k", "1.0")],
        vec![
            repo("k", "1.0"),
            aur("p", "1.0").with_depends(vec!["virtual".into()]),
            repo("impl-a", "1.0")
                .with_provides(vec!["virtual".into()])
                .with_conflicts(vec!["k".into()]),
            repo("impl-b", "1.0").with_provides(vec!["virtual".into()]),
        ],
    );
    let candidate = chosen(
        planner
            .plan(
                &["p".to_string()],
                &["k".to_string()],
                &[],
                PlannerFlags::default(),
            )
            .expect("plan should succeed"),
    );

    let plan_names = names(&candidate.plan);
    assert!(plan_names.contains("impl-b"));
    assert!(!plan_names.contains("impl-a"));
    assert!(candidate.resulting_system.contains_name("k"));
}

#[test]
fn needed_and_sysupgrade_compose() {
    let planner = planner(
        vec![repo("stale", "1.0"), repo("current", "2.0")],
        vec![repo("stale", "1.5"), repo("current", "2.0")],
    );
    let flags = PlannerFlags {
        needed: true,
        sysupgrade: true,
        ..PlannerFlags::default()
    };
    let candidate = chosen(
        planner
            .plan(&["current".to_string()], &[], &[], flags)
            .expect("plan should succeed"),
    );
    assert_eq!(names(&candidate.plan), HashSet::from(["stale"]));
    assert_eq!(candidate.plan[0].version, "1.5");
}

#[test]
fn deep_search_replans_installed_dependencies() {
    let planner = planner(
        vec![repo("lib", "1.0")],
        vec![
            repo("lib", "1.0"),
            aur("app", "1.0").with_depends(vec!["lib".into()]),
        ],
    );

    let candidate = chosen(
        planner
            .plan(&["app".to_string()], &[], &[], PlannerFlags::default())
            .expect("plan should succeed"),
    );
    assert_eq!(names(&candidate.plan), HashSet::from(["app"]));

    let flags = PlannerFlags {
        deep_search: true,
        ..PlannerFlags::default()
    };
    let candidate = chosen(
        planner
            .plan(&["app".to_string()], &[], &[], flags)
            .expect("plan should succeed"),
    );
    assert_eq!(names(&candidate.plan), HashSet::from(["app", "lib"]));
}

#[test]
fn rebuild_reorders_installed_targets() {
    let planner = planner(
        vec![
            repo("dep", "1.0"),
            aur("app", "1.0").with_depends(vec!["dep".into()]),
        ],
        vec![
            repo("dep", "1.0"),
            aur("app", "1.0").with_depends(vec!["dep".into()]),
        ],
    );
    let flags = PlannerFlags {
        rebuild: true,
        ..PlannerFlags::default()
    };
    let candidate = chosen(
        planner
            .plan(&["app".to_string()], &[], &[], flags)
            .expect("plan should succeed"),
    );
    assert_eq!(names(&candidate.plan), HashSet::from(["app"]));
}

#[test]
fn version_constraint_in_target_resolves_to_name() {
    let planner = planner(vec![], vec![repo("tool", "2.0")]);
    let candidate = chosen(
        planner
            .plan(&["tool>=1.5".to_string()], &[], &[], PlannerFlags::default())
            .expect("plan should succeed"),
    );
    assert_eq!(names(&candidate.plan), HashSet::from(["tool"]));

    let result = planner.plan(&["tool>=3.0".to_string()], &[], &[], PlannerFlags::default());
    assert!(matches!(result, Err(AurPlanError::InvalidInput(_))));
}

#[test]
fn failed_plan_reports_unprovided_dep() {
    let planner = planner(
        vec![],
        vec![aur("app", "1.0").with_depends(vec!["ghost".into()])],
    );
    let result = planner
        .plan(&["app".to_string()], &[], &[], PlannerFlags::default())
        .expect("planning itself should not error");
    let PlannerResult::Failed(problems) = result else {
        panic!("expected Failed, got {result:?}");
    };
    assert!(problems.iter().any(|problem| matches!(
        problem,
        Problem::NotProvided { dep, .. } if dep == "ghost"
    )));
}

#[test]
fn upgrade_diff_shows_both_versions() {
    let planner = planner(
        vec![repo("pkg", "1.0")],
        vec![repo("pkg", "2.0")],
    );
    let flags = PlannerFlags {
        sysupgrade: true,
        ..PlannerFlags::default()
    };
    let candidate = chosen(planner.plan(&[], &[], &[], flags).expect("plan should succeed"));

    let installed_versions: HashSet<&str> = candidate
        .diff
        .installed
        .iter()
        .map(|pkg| pkg.version.as_str())
        .collect();
    let removed_versions: HashSet<&str> = candidate
        .diff
        .removed
        .iter()
        .map(|pkg| pkg.version.as_str())
        .collect();
    assert_eq!(installed_versions, HashSet::from(["2.0"]));
    assert_eq!(removed_versions, HashSet::from(["1.0"]));
}
