//! Data types shared across the planning core.
//!
//! This module contains the package record model and the dependency-string
//! types every other component builds on.

pub mod dependency;
pub mod package;

pub use dependency::{DepFilter, DepSpec, VersionPolicy, strip_versioning};
pub use package::{AurRecord, InstallReason, Package, PackageKind, PkgRef, is_devel};
