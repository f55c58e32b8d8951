//! Dependency resolution: the core search and its diagnostics.
//!
//! The solver walks the dependency graph of the requested targets over an
//! upstream package universe, fanning out where a dependency has several
//! providers and pruning aggressively. It yields topologically sorted
//! installation plans, or, when every branch dies, the set of problems
//! that killed them.
//!
//! # Overview
//!
//! - [`Solution`]: one search branch with its bookkeeping.
//! - [`Problem`]: what went wrong on a branch (cycle outside the repo
//!   subgraph, unprovided dependency, fatal conflict).
//! - [`DepSolver`] / [`dep_solve`]: the search itself plus the escalating
//!   driver (deep provider checking, then single-target-first walks).
//!
//! # Example
//!
//! ```
//! use aurplan::solver::dep_solve;
//! use aurplan::system::System;
//! use aurplan::types::{Package, PackageKind};
//! use std::sync::Arc;
//!
//! let upstream = System::new(vec![
//!     Arc::new(Package::new("app", "1.0", PackageKind::Aur).with_depends(vec!["lib".into()])),
//!     Arc::new(Package::new("lib", "1.0", PackageKind::Repo)),
//! ])?;
//! let installed = System::new(Vec::new())?;
//! let target = upstream.get("app").cloned().expect("app is upstream");
//!
//! let outcome = dep_solve(&[target], &installed, &upstream);
//! assert_eq!(outcome.plans.len(), 1);
//! # Ok::<(), aurplan::error::AurPlanError>(())
//! ```

mod problem;
mod search;
mod solution;

pub use problem::Problem;
pub use search::{DepSolver, SolveOutcome, dep_solve};
pub use solution::Solution;
