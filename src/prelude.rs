//! Convenient imports for common aurplan usage.
//!
//! # Example
//!
//! ```no_run
//! use aurplan::prelude::*;
//!
//! # fn example() -> Result<()> {
//! let planner = Planner::new(System::new(Vec::new())?, System::new(Vec::new())?);
//! let result = planner.plan(&[], &[], &[], PlannerFlags::default())?;
//! # let _ = result;
//! # Ok(())
//! # }
//! ```

pub use crate::config::HelperConfig;
pub use crate::error::{AurPlanError, Result};
pub use crate::plan::{PlanCandidate, install_chunks};
pub use crate::planner::{Planner, PlannerFlags, PlannerResult};
pub use crate::solver::{DepSolver, Problem, SolveOutcome, Solution, dep_solve};
pub use crate::system::{System, SystemDiff};
pub use crate::types::{
    AurRecord, DepFilter, DepSpec, InstallReason, Package, PackageKind, PkgRef, VersionPolicy,
    is_devel, strip_versioning,
};
pub use crate::version::{compare, satisfies};

#[cfg(feature = "aur")]
pub use crate::aur::{AurClient, AurClientBuilder, AurSource, MockAurSource};
