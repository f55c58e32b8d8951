//! Dependency resolution and transaction planning engine for AUR helpers.
//!
//! This crate is the planning core of a user-space package helper for an
//! Arch-Linux-style distribution: given a set of requested targets, an
//! installed-system snapshot and an upstream package universe (native
//! repositories plus the user repository), it produces valid, conflict-free,
//! topologically ordered installation plans. It is a pure planner: all
//! side-effecting work (fetching build recipes, building, installing) is
//! delegated to the collaborators around it.
//!
//! # Features
//!
//! - `aur`: AUR RPC v5 client ([`aur::AurClient`]) and the [`aur::AurSource`]
//!   trait consumed by [`system::System::append_by_name`]
//! - `native`: native package manager queries via `expac`/`pacman`
//!
//! # Overview
//!
//! - [`types`]: the package record model and dependency-string parsing
//! - [`version`]: the native version ordering and constraint checks
//! - [`system`]: indexed package universes with provider/conflict lookup
//!   and hypothetical transaction simulation
//! - [`solver`]: the dependency search producing topologically sorted plans
//! - [`plan`]: transaction chunking and plan validation
//! - [`planner`]: the facade turning user intent into a [`planner::PlannerResult`]
//! - [`config`]: the helper's key=value section configuration file
//!
//! # Example
//!
//! ```
//! use aurplan::planner::{Planner, PlannerFlags, PlannerResult};
//! use aurplan::system::System;
//! use aurplan::types::{Package, PackageKind};
//! use std::sync::Arc;
//!
//! # fn example() -> aurplan::error::Result<()> {
//! let installed = System::new(Vec::new())?;
//! let upstream = System::new(vec![
//!     Arc::new(Package::new("helper", "1.0-1", PackageKind::Aur)
//!         .with_depends(vec!["git".into()])),
//!     Arc::new(Package::new("git", "2.43.0-1", PackageKind::Repo)),
//! ])?;
//!
//! let planner = Planner::new(installed, upstream);
//! match planner.plan(&["helper".into()], &[], &[], PlannerFlags::default())? {
//!     PlannerResult::Chosen(candidate) => {
//!         assert_eq!(candidate.plan.len(), 2);
//!         assert_eq!(candidate.chunks.len(), 2);
//!     }
//!     other => panic!("unexpected result: {other:?}"),
//! }
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod config;
pub mod error;
pub mod plan;
pub mod planner;
pub mod solver;
pub mod system;
pub mod types;
pub mod version;

#[cfg(feature = "aur")]
pub mod aur;

pub mod native;

/// Prelude module for convenient imports.
///
/// Re-exports the types most callers need, allowing a single
/// `use aurplan::prelude::*;`.
pub mod prelude;

// Re-export commonly used types
pub use error::{AurPlanError as Error, Result};
pub use plan::{PlanCandidate, install_chunks};
pub use planner::{Planner, PlannerFlags, PlannerResult};
pub use solver::{Problem, SolveOutcome, dep_solve};
pub use system::{System, SystemDiff};
pub use types::{
    AurRecord, DepFilter, DepSpec, InstallReason, Package, PackageKind, PkgRef, VersionPolicy,
};

#[cfg(feature = "aur")]
pub use aur::{AurClient, AurClientBuilder, AurSource, MockAurSource};

pub use config::HelperConfig;
