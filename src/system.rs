//! In-memory index over a set of package records.
//!
//! A [`System`] models one package universe (the installed snapshot, the
//! upstream repositories, or a hypothetical post-transaction state) and
//! answers the questions the solver asks: who provides a dependency, who
//! conflicts with a candidate, and what does the world look like after a
//! plan is applied.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::{AurPlanError, Result};
use crate::plan::install_chunks;
use crate::types::{DepFilter, DepSpec, Package, PkgRef, VersionPolicy, strip_versioning};
use crate::version::satisfies;

#[cfg(feature = "aur")]
use crate::aur::AurSource;
#[cfg(feature = "aur")]
use std::sync::Arc;

/// Difference of one system relative to a reference system.
///
/// `installed` holds records present in the other system but not the
/// reference; `removed` the records only the reference has. Records with a
/// different version are different packages, so upgrades appear as one
/// removal plus one installation.
#[derive(Clone, Debug, Default)]
pub struct SystemDiff {
    /// Packages installed relative to the reference system.
    pub installed: HashSet<PkgRef>,
    /// Packages removed relative to the reference system.
    pub removed: HashSet<PkgRef>,
}

impl SystemDiff {
    /// Stable fingerprint of this diff, used to deduplicate plans that lead
    /// to the same resulting system.
    #[must_use]
    pub fn fingerprint(&self) -> BTreeSet<(String, String, bool)> {
        let mut set = BTreeSet::new();
        for pkg in &self.installed {
            set.insert((pkg.name.clone(), pkg.version.clone(), true));
        }
        for pkg in &self.removed {
            set.insert((pkg.name.clone(), pkg.version.clone(), false));
        }
        set
    }
}

/// An ordered collection of packages with derived lookup indexes.
///
/// `by_name` is injective on names; the provide and conflict indexes are
/// rebuilt on mutation (incrementally on pure appends, fully when a record
/// is displaced).
#[derive(Clone, Debug, Default)]
pub struct System {
    by_name: HashMap<String, PkgRef>,
    provides_index: HashMap<String, Vec<PkgRef>>,
    conflicts_index: HashMap<String, Vec<PkgRef>>,
    policy: VersionPolicy,
}

impl System {
    /// What: Build a system from package records.
    ///
    /// Inputs:
    /// - `packages`: The records to index.
    ///
    /// Output:
    /// - Returns the system, or `InvalidInput` when two records share a
    ///   name.
    pub fn new(packages: Vec<PkgRef>) -> Result<Self> {
        Self::with_policy(packages, VersionPolicy::default())
    }

    /// Like [`System::new`] with an explicit version policy.
    pub fn with_policy(packages: Vec<PkgRef>, policy: VersionPolicy) -> Result<Self> {
        let mut system = Self {
            policy,
            ..Self::default()
        };
        system.append_packages(packages)?;
        Ok(system)
    }

    /// Build a system from packages whose names are known to be unique
    /// (solver-internal snapshots, hypothetical states). A later duplicate
    /// silently displaces an earlier one.
    pub(crate) fn from_unique<I>(packages: I, policy: VersionPolicy) -> Self
    where
        I: IntoIterator<Item = PkgRef>,
    {
        let mut system = Self {
            policy,
            ..Self::default()
        };
        system.append_unchecked(packages);
        system
    }

    /// The version policy steering provider lookups.
    #[must_use]
    pub const fn policy(&self) -> VersionPolicy {
        self.policy
    }

    /// Replace the version policy.
    pub const fn set_policy(&mut self, policy: VersionPolicy) {
        self.policy = policy;
    }

    /// Number of packages in this system.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether this system holds no packages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Look up a package by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PkgRef> {
        self.by_name.get(name)
    }

    /// Whether a package with this exact name is present.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Iterate over all package records.
    pub fn packages(&self) -> impl Iterator<Item = &PkgRef> {
        self.by_name.values()
    }

    /// What: Append packages to this system.
    ///
    /// Inputs:
    /// - `packages`: Records to add.
    ///
    /// Output:
    /// - `Ok(())`, or `InvalidInput` when a name is already known (adding a
    ///   second package with the same name is a programming error).
    ///
    /// Details:
    /// - Index entries for the new records are added incrementally.
    pub fn append_packages(&mut self, packages: Vec<PkgRef>) -> Result<()> {
        for pkg in &packages {
            if self.by_name.contains_key(&pkg.name) {
                tracing::error!(package = %pkg, "package already known");
                return Err(AurPlanError::InvalidInput(format!(
                    "Package {pkg} already known"
                )));
            }
        }
        self.append_unchecked(packages);
        Ok(())
    }

    /// Append without the duplicate check; used where uniqueness is
    /// structurally guaranteed.
    fn append_unchecked<I>(&mut self, packages: I)
    where
        I: IntoIterator<Item = PkgRef>,
    {
        for pkg in packages {
            for provide in &pkg.provides {
                self.provides_index
                    .entry(strip_versioning(provide).to_string())
                    .or_default()
                    .push(pkg.clone());
            }
            for conflict in &pkg.conflicts {
                self.conflicts_index
                    .entry(strip_versioning(conflict).to_string())
                    .or_default()
                    .push(pkg.clone());
            }
            self.by_name.insert(pkg.name.clone(), pkg);
        }
    }

    /// Remove one package by name; a no-op when the name is unknown.
    pub(crate) fn remove_package(&mut self, name: &str) {
        if self.by_name.remove(name).is_some() {
            self.rebuild_indexes();
        }
    }

    /// Insert a record, displacing any same-name record.
    pub(crate) fn replace_package(&mut self, package: PkgRef) {
        self.by_name.insert(package.name.clone(), package);
        self.rebuild_indexes();
    }

    /// Remove packages by name and rebuild both indexes from scratch.
    fn remove_names<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.by_name.remove(name.as_ref());
        }
        self.rebuild_indexes();
    }

    fn rebuild_indexes(&mut self) {
        self.provides_index.clear();
        self.conflicts_index.clear();
        let packages: Vec<PkgRef> = self.by_name.values().cloned().collect();
        for pkg in packages {
            for provide in &pkg.provides {
                self.provides_index
                    .entry(strip_versioning(provide).to_string())
                    .or_default()
                    .push(pkg.clone());
            }
            for conflict in &pkg.conflicts {
                self.conflicts_index
                    .entry(strip_versioning(conflict).to_string())
                    .or_default()
                    .push(pkg.clone());
            }
        }
    }

    /// What: Find all packages satisfying a dependency string.
    ///
    /// Inputs:
    /// - `dep`: Dependency string (`name[op][version]`).
    ///
    /// Output:
    /// - Returns the providing packages: the package carrying the bare name
    ///   (version permitting) plus every package whose `provides` lists the
    ///   name.
    ///
    /// Details:
    /// - A versioned provide (`=`/`==`) is matched against the provide
    ///   version; a bare provide against the provider's own version.
    /// - Under `optimistic_versioning`, bare provides satisfy versioned
    ///   dependencies even when the provide version is unknown.
    /// - Under `ignore_versioning`, every dependency is treated as
    ///   unversioned; this dominates `optimistic_versioning`.
    #[must_use]
    pub fn provided_by(&self, dep: &str) -> Vec<PkgRef> {
        let spec = DepSpec::parse(dep);
        let op = self.policy.effective_op(&spec.op);
        let mut providers: Vec<PkgRef> = Vec::new();

        if let Some(pkg) = self.by_name.get(&spec.name)
            && (op.is_empty() || satisfies(&pkg.version, op, &spec.ver))
        {
            providers.push(pkg.clone());
        }

        if let Some(candidates) = self.provides_index.get(&spec.name) {
            for pkg in candidates {
                if providers.contains(pkg) {
                    continue;
                }
                for provide in &pkg.provides {
                    let pr = DepSpec::parse(provide);
                    if pr.name != spec.name {
                        continue;
                    }
                    let included = if op.is_empty() {
                        true
                    } else if pr.op == "=" || pr.op == "==" {
                        satisfies(&pr.ver, op, &spec.ver)
                    } else if pr.op.is_empty() {
                        // a bare alias is matched against the provider's own
                        // version, or accepted outright when optimistic
                        satisfies(&pkg.version, op, &spec.ver)
                            || self.policy.optimistic_versioning
                    } else {
                        false
                    };
                    if included {
                        providers.push(pkg.clone());
                        break;
                    }
                }
            }
        }

        providers
    }

    /// What: Find all packages of this system conflicting with a candidate.
    ///
    /// Inputs:
    /// - `package`: The candidate (not necessarily part of this system).
    ///
    /// Output:
    /// - Returns the conflicting packages.
    ///
    /// Details:
    /// - A package of the same name always conflicts (displacement).
    /// - The candidate's `conflicts` entries are matched against resident
    ///   packages, and resident `conflicts` entries back at the candidate's
    ///   name are matched against the candidate's version (symmetric check).
    #[must_use]
    pub fn conflicting_with(&self, package: &Package) -> Vec<PkgRef> {
        let mut conflicting: Vec<PkgRef> = Vec::new();

        if let Some(resident) = self.by_name.get(&package.name) {
            conflicting.push(resident.clone());
        }

        for conflict in &package.conflicts {
            let spec = DepSpec::parse(conflict);
            let Some(resident) = self.by_name.get(&spec.name) else {
                continue;
            };
            if conflicting.contains(resident) {
                continue;
            }
            if spec.op.is_empty() || satisfies(&resident.version, &spec.op, &spec.ver) {
                conflicting.push(resident.clone());
            }
        }

        if let Some(candidates) = self.conflicts_index.get(&package.name) {
            for resident in candidates {
                if conflicting.contains(resident) {
                    continue;
                }
                for conflict in &resident.conflicts {
                    let spec = DepSpec::parse(conflict);
                    if spec.name != package.name {
                        continue;
                    }
                    if spec.op.is_empty() || satisfies(&package.version, &spec.op, &spec.ver) {
                        conflicting.push(resident.clone());
                        break;
                    }
                }
            }
        }

        conflicting
    }

    /// What: Fetch AUR records by name until the dependency closure is
    /// reached.
    ///
    /// Inputs:
    /// - `names`: Names to resolve (version constraints are stripped).
    /// - `source`: The AUR metadata collaborator.
    /// - `force_aur`: Names to (re-)fetch from the AUR even when a non-AUR
    ///   record of that name is already present.
    /// - `devel_names`: Extra names classified as devel packages.
    ///
    /// Output:
    /// - `Ok(())` once no relevant dependency of any fetched record is
    ///   unknown; collaborator failures propagate unchanged.
    ///
    /// Details:
    /// - Names the AUR does not know simply stay absent; the solver reports
    ///   them as unprovided later.
    /// - A fetched record displaces an existing record of the same name,
    ///   forcing a full index rebuild at the end.
    #[cfg(feature = "aur")]
    pub async fn append_by_name(
        &mut self,
        names: &[String],
        source: &dyn AurSource,
        force_aur: &HashSet<String>,
        devel_names: &HashSet<String>,
    ) -> Result<()> {
        let requested: HashSet<String> = names
            .iter()
            .map(|name| strip_versioning(name).to_string())
            .collect();

        let mut to_fetch: Vec<String> = requested
            .iter()
            .filter(|name| !self.by_name.contains_key(*name))
            .cloned()
            .collect();
        for name in &requested {
            if to_fetch.contains(name) || !force_aur.contains(name) {
                continue;
            }
            if let Some(existing) = self.by_name.get(name)
                && !existing.kind.is_aur()
            {
                to_fetch.push(name.clone());
            }
        }

        let mut displaced = false;
        while !to_fetch.is_empty() {
            tracing::debug!(count = to_fetch.len(), "fetching AUR records");
            let name_refs: Vec<&str> = to_fetch.iter().map(String::as_str).collect();
            let records = source.info(&name_refs).await?;

            let mut fetched: Vec<PkgRef> = Vec::new();
            let mut dep_names: HashSet<String> = HashSet::new();
            for record in &records {
                let pkg = Arc::new(Package::from_aur_record(record, devel_names));
                for dep in pkg.relevant_deps(DepFilter::ALL) {
                    dep_names.insert(strip_versioning(&dep).to_string());
                }
                if self.by_name.remove(&pkg.name).is_some() {
                    displaced = true;
                }
                fetched.push(pkg);
            }

            self.append_unchecked(fetched);

            to_fetch = dep_names
                .into_iter()
                .filter(|name| !self.by_name.contains_key(name))
                .collect();
        }

        if displaced {
            self.rebuild_indexes();
        }
        Ok(())
    }

    /// Whether every relevant dependency of `package` has a provider in
    /// this system.
    #[must_use]
    pub fn are_all_deps_fulfilled(&self, package: &Package, filter: DepFilter) -> bool {
        package
            .relevant_deps(filter)
            .iter()
            .all(|dep| !self.provided_by(dep).is_empty())
    }

    /// What: Resolve user input tokens to concrete package names.
    ///
    /// Inputs:
    /// - `user_input`: Raw tokens; a token may carry a version constraint
    ///   (`package1>1.0` resolves to `package1` when its version matches).
    ///
    /// Output:
    /// - Returns the resolved names, sorted; `InvalidInput` when a token has
    ///   no provider; `AmbiguousProvider` when several providers match and
    ///   none carries the token's bare name; the caller resolves the choice
    ///   and re-invokes.
    pub fn sanitize_user_input(&self, user_input: &[String]) -> Result<BTreeSet<String>> {
        let mut sanitized = BTreeSet::new();

        for token in user_input {
            let providers = self.provided_by(token);
            if providers.is_empty() {
                tracing::error!(input = %token, "no providers found");
                return Err(AurPlanError::InvalidInput(format!(
                    "No providers for {token} found"
                )));
            }
            if providers.len() == 1 {
                sanitized.insert(providers[0].name.clone());
                continue;
            }

            let bare = strip_versioning(token);
            if providers.iter().any(|pkg| pkg.name == bare) {
                sanitized.insert(bare.to_string());
            } else {
                return Err(AurPlanError::AmbiguousProvider {
                    name: token.clone(),
                    providers: providers.iter().map(|pkg| pkg.name.clone()).collect(),
                });
            }
        }

        Ok(sanitized)
    }

    /// What: Simulate applying an ordered plan to this system.
    ///
    /// Inputs:
    /// - `packages`: The plan, topologically sorted.
    ///
    /// Output:
    /// - Returns the simulated post-transaction system.
    ///
    /// Details:
    /// - The plan is applied chunk-wise (consecutive repo / non-repo runs).
    ///   A chunk whose members conflict among themselves is rejected and not
    ///   applied; the sweep continues so the caller can observe the missing
    ///   package.
    /// - For every chunk member, resident packages conflicting with it and
    ///   the packages it replaces (exact name, version permitting) are
    ///   removed before the chunk lands.
    /// - After a chunk that removed anything (and always after the last),
    ///   packages whose runtime dependencies are no longer satisfied are
    ///   removed until a fixed point is reached.
    #[must_use]
    pub fn hypothetical_append(&self, packages: &[PkgRef]) -> Self {
        let mut new_system = self.clone();
        if packages.is_empty() {
            return new_system;
        }

        let chunks = install_chunks(packages);
        let last_index = chunks.len() - 1;

        for (index, chunk) in chunks.iter().enumerate() {
            // a chunk conflicting with itself cannot be applied at all
            let mut chunk_system = Self::from_unique(std::iter::empty(), self.policy);
            let mut chunk_consistent = true;
            for pkg in chunk {
                if !chunk_system.conflicting_with(pkg).is_empty() {
                    tracing::debug!(package = %pkg, "chunk conflicts internally, skipping");
                    chunk_consistent = false;
                    break;
                }
                chunk_system.append_unchecked([pkg.clone()]);
            }
            if !chunk_consistent {
                continue;
            }

            let mut displaced: BTreeSet<String> = BTreeSet::new();
            for pkg in chunk {
                for conflicting in new_system.conflicting_with(pkg) {
                    displaced.insert(conflicting.name.clone());
                }
                // a package also displaces what it replaces, exact name only
                // (it may provide the very name it replaces)
                for replace in &pkg.replaces {
                    let spec = DepSpec::parse(replace);
                    if spec.name == pkg.name {
                        continue;
                    }
                    if let Some(resident) = new_system.by_name.get(&spec.name)
                        && (spec.op.is_empty()
                            || satisfies(&resident.version, &spec.op, &spec.ver))
                    {
                        displaced.insert(resident.name.clone());
                    }
                }
            }

            let removed_any = !displaced.is_empty();
            if removed_any {
                new_system.remove_names(displaced);
            }
            new_system.append_unchecked(chunk.iter().map(|pkg| (*pkg).clone()));

            if !removed_any && index != last_index {
                continue;
            }

            // cascade: drop packages whose runtime deps are gone
            loop {
                let to_delete: Vec<String> = new_system
                    .by_name
                    .values()
                    .filter(|pkg| !new_system.are_all_deps_fulfilled(pkg, DepFilter::RUNTIME))
                    .map(|pkg| pkg.name.clone())
                    .collect();
                if to_delete.is_empty() {
                    break;
                }
                tracing::debug!(count = to_delete.len(), "cascade-removing packages");
                new_system.remove_names(to_delete);
            }
        }

        new_system
    }

    /// What: Evaluate the differences between this system and others.
    ///
    /// Inputs:
    /// - `others`: The systems to compare against.
    ///
    /// Output:
    /// - Returns the diff common to all other systems plus, per other
    ///   system, the remainder not shared by all. The union of the common
    ///   part and the i-th remainder is the full diff against the i-th
    ///   system.
    #[must_use]
    pub fn differences(&self, others: &[Self]) -> (SystemDiff, Vec<SystemDiff>) {
        if others.is_empty() {
            return (SystemDiff::default(), Vec::new());
        }

        let own: HashSet<PkgRef> = self.by_name.values().cloned().collect();
        let full_diffs: Vec<SystemDiff> = others
            .iter()
            .map(|other| {
                let other_set: HashSet<PkgRef> = other.by_name.values().cloned().collect();
                SystemDiff {
                    installed: other_set.difference(&own).cloned().collect(),
                    removed: own.difference(&other_set).cloned().collect(),
                }
            })
            .collect();

        let mut common = full_diffs[0].clone();
        for diff in &full_diffs[1..] {
            common.installed = common
                .installed
                .intersection(&diff.installed)
                .cloned()
                .collect();
            common.removed = common.removed.intersection(&diff.removed).cloned().collect();
        }

        let remainders = full_diffs
            .into_iter()
            .map(|diff| SystemDiff {
                installed: diff
                    .installed
                    .difference(&common.installed)
                    .cloned()
                    .collect(),
                removed: diff.removed.difference(&common.removed).cloned().collect(),
            })
            .collect();

        (common, remainders)
    }

    /// Human-readable `repo/name` label for display purposes. Not involved
    /// in planning decisions.
    #[must_use]
    pub fn repo_of(&self, package_name: &str) -> String {
        match self.by_name.get(package_name) {
            None => format!("local/{package_name}"),
            Some(pkg) if pkg.kind.is_aur() => format!("aur/{package_name}"),
            Some(pkg) => match &pkg.repo {
                Some(repo) => format!("{repo}/{package_name}"),
                None => format!("local/{package_name}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PackageKind;
    use std::sync::Arc;

    fn repo(name: &str, version: &str) -> Package {
        Package::new(name, version, PackageKind::Repo)
    }

    fn system(packages: Vec<Package>) -> System {
        System::new(packages.into_iter().map(Arc::new).collect())
            .expect("test system should build")
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let result = System::new(vec![
            Arc::new(repo("a", "1.0")),
            Arc::new(repo("a", "2.0")),
        ]);
        assert!(matches!(result, Err(AurPlanError::InvalidInput(_))));
    }

    #[test]
    fn provided_by_own_name_and_version() {
        let sys = system(vec![repo("a", "2.0")]);
        assert_eq!(sys.provided_by("a").len(), 1);
        assert_eq!(sys.provided_by("a>=1.5").len(), 1);
        assert!(sys.provided_by("a>=3.0").is_empty());
    }

    #[test]
    fn provided_by_versioned_provide() {
        let sys = system(vec![
            repo("libfoo-1", "1.0").with_provides(vec!["foo=1".into()]),
            repo("libfoo-2", "2.0").with_provides(vec!["foo=2".into()]),
        ]);

        let providers = sys.provided_by("foo");
        assert_eq!(providers.len(), 2);

        let providers = sys.provided_by("foo>=2");
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name, "libfoo-2");
    }

    #[test]
    fn provided_by_bare_alias_uses_package_version() {
        let sys = system(vec![repo("x", "4.0").with_provides(vec!["alias".into()])]);
        assert_eq!(sys.provided_by("alias>=3").len(), 1);
        assert!(sys.provided_by("alias>=5").is_empty());
    }

    #[test]
    fn optimistic_versioning_accepts_bare_alias() {
        let mut sys = system(vec![repo("x", "1.0").with_provides(vec!["alias".into()])]);
        assert!(sys.provided_by("alias>=3").is_empty());

        sys.set_policy(VersionPolicy {
            optimistic_versioning: true,
            ignore_versioning: false,
        });
        assert_eq!(sys.provided_by("alias>=3").len(), 1);
    }

    #[test]
    fn ignore_versioning_drops_constraints() {
        let mut sys = system(vec![repo("a", "1.0")]);
        assert!(sys.provided_by("a>=2").is_empty());

        sys.set_policy(VersionPolicy {
            optimistic_versioning: false,
            ignore_versioning: true,
        });
        assert_eq!(sys.provided_by("a>=2").len(), 1);
    }

    #[test]
    fn conflicting_with_same_name() {
        let sys = system(vec![repo("a", "1.0")]);
        let candidate = repo("a", "2.0");
        let conflicting = sys.conflicting_with(&candidate);
        assert_eq!(conflicting.len(), 1);
        assert_eq!(conflicting[0].version, "1.0");
    }

    #[test]
    fn conflicting_with_forward_and_versioned() {
        let sys = system(vec![repo("k", "1.0")]);
        let candidate = repo("q", "1.0").with_conflicts(vec!["k<2.0".into()]);
        assert_eq!(sys.conflicting_with(&candidate).len(), 1);

        let candidate = repo("q", "1.0").with_conflicts(vec!["k>=2.0".into()]);
        assert!(sys.conflicting_with(&candidate).is_empty());
    }

    #[test]
    fn conflicting_with_symmetric() {
        let sys = system(vec![repo("old", "1.0").with_conflicts(vec!["new<3".into()])]);
        let candidate = repo("new", "2.0");
        let conflicting = sys.conflicting_with(&candidate);
        assert_eq!(conflicting.len(), 1);
        assert_eq!(conflicting[0].name, "old");

        let candidate = repo("new", "3.0");
        assert!(sys.conflicting_with(&candidate).is_empty());
    }

    #[test]
    fn append_order_does_not_matter() {
        let a = repo("a", "1.0").with_provides(vec!["x".into()]);
        let b = repo("b", "1.0").with_provides(vec!["x".into()]);
        let c = repo("c", "1.0").with_conflicts(vec!["a".into()]);

        let one = system(vec![a.clone(), b.clone(), c.clone()]);
        let two = system(vec![c, b, a]);

        let names = |sys: &System| {
            let mut names: Vec<String> =
                sys.packages().map(|pkg| pkg.name.clone()).collect();
            names.sort();
            names
        };
        assert_eq!(names(&one), names(&two));

        let provider_names = |sys: &System, dep: &str| {
            let mut names: Vec<String> = sys
                .provided_by(dep)
                .iter()
                .map(|pkg| pkg.name.clone())
                .collect();
            names.sort();
            names
        };
        assert_eq!(provider_names(&one, "x"), provider_names(&two, "x"));

        let a_pkg = repo("a", "1.0");
        assert_eq!(
            one.conflicting_with(&a_pkg).len(),
            two.conflicting_with(&a_pkg).len()
        );
    }

    #[test]
    fn hypothetical_append_removes_conflicting() {
        let installed = system(vec![repo("old", "1.0"), repo("keep", "1.0")]);
        let new_pkg = Arc::new(repo("new", "1.0").with_conflicts(vec!["old".into()]));

        let result = installed.hypothetical_append(&[new_pkg]);
        assert!(result.contains_name("new"));
        assert!(result.contains_name("keep"));
        assert!(!result.contains_name("old"));
    }

    #[test]
    fn hypothetical_append_cascades_unfulfilled_deps() {
        let installed = system(vec![
            repo("lib", "1.0"),
            repo("app", "1.0").with_depends(vec!["lib".into()]),
        ]);
        let replacement = Arc::new(repo("newlib", "1.0").with_conflicts(vec!["lib".into()]));

        let result = installed.hypothetical_append(&[replacement]);
        assert!(result.contains_name("newlib"));
        assert!(!result.contains_name("lib"));
        // app depended on lib, which is gone
        assert!(!result.contains_name("app"));
    }

    #[test]
    fn hypothetical_append_removes_replaced() {
        let installed = system(vec![repo("old-pkg", "1.0")]);
        let replacement = Arc::new(repo("new-pkg", "1.0").with_replaces(vec!["old-pkg".into()]));

        let result = installed.hypothetical_append(&[replacement]);
        assert!(result.contains_name("new-pkg"));
        assert!(!result.contains_name("old-pkg"));
    }

    #[test]
    fn hypothetical_append_upgrade_displaces_same_name() {
        let installed = system(vec![repo("a", "1.0")]);
        let upgraded = Arc::new(repo("a", "2.0"));

        let result = installed.hypothetical_append(&[upgraded]);
        assert_eq!(result.len(), 1);
        assert_eq!(
            result.get("a").map(|pkg| pkg.version.clone()),
            Some("2.0".to_string())
        );
    }

    #[test]
    fn sanitize_resolves_versions_and_providers() {
        let sys = system(vec![
            repo("package1", "2.0"),
            repo("provider", "1.0").with_provides(vec!["virtual".into()]),
        ]);

        let names = sys
            .sanitize_user_input(&["package1>1.0".to_string(), "virtual".to_string()])
            .expect("input should sanitize");
        assert!(names.contains("package1"));
        assert!(names.contains("provider"));
    }

    #[test]
    fn sanitize_prefers_exact_name_among_providers() {
        let sys = system(vec![
            repo("foo", "1.0"),
            repo("libfoo", "1.0").with_provides(vec!["foo".into()]),
        ]);
        let names = sys
            .sanitize_user_input(&["foo".to_string()])
            .expect("exact name should win");
        assert_eq!(names.len(), 1);
        assert!(names.contains("foo"));
    }

    #[test]
    fn sanitize_reports_ambiguity() {
        let sys = system(vec![
            repo("impl-a", "1.0").with_provides(vec!["virtual".into()]),
            repo("impl-b", "1.0").with_provides(vec!["virtual".into()]),
        ]);
        let result = sys.sanitize_user_input(&["virtual".to_string()]);
        match result {
            Err(AurPlanError::AmbiguousProvider { name, providers }) => {
                assert_eq!(name, "virtual");
                assert_eq!(providers.len(), 2);
            }
            other => panic!("expected AmbiguousProvider, got {other:?}"),
        }
    }

    #[test]
    fn sanitize_unknown_name_fails() {
        let sys = system(vec![repo("a", "1.0")]);
        assert!(sys.sanitize_user_input(&["missing".to_string()]).is_err());
    }

    #[test]
    fn differences_partitions_common_and_remainder() {
        let base = system(vec![repo("a", "1.0"), repo("b", "1.0")]);
        let one = system(vec![repo("a", "1.0"), repo("b", "2.0"), repo("c", "1.0")]);
        let two = system(vec![repo("a", "1.0"), repo("b", "2.0"), repo("d", "1.0")]);

        let (common, remainders) = base.differences(&[one, two]);

        let common_installed: BTreeSet<String> = common
            .installed
            .iter()
            .map(|pkg| pkg.name.clone())
            .collect();
        assert_eq!(common_installed, BTreeSet::from(["b".to_string()]));
        let common_removed: BTreeSet<String> =
            common.removed.iter().map(|pkg| pkg.name.clone()).collect();
        assert_eq!(common_removed, BTreeSet::from(["b".to_string()]));

        assert_eq!(remainders.len(), 2);
        assert!(remainders[0].installed.iter().any(|pkg| pkg.name == "c"));
        assert!(remainders[1].installed.iter().any(|pkg| pkg.name == "d"));
    }

    #[test]
    fn repo_labels() {
        let sys = system(vec![
            repo("pacman", "6.0").with_repo("core"),
            Package::new("helper", "1.0", PackageKind::Aur),
        ]);
        assert_eq!(sys.repo_of("pacman"), "core/pacman");
        assert_eq!(sys.repo_of("helper"), "aur/helper");
        assert_eq!(sys.repo_of("unknown"), "local/unknown");
    }
}
