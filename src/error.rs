//! Unified error type for aurplan.

use thiserror::Error;

/// Unified error type for all aurplan operations.
///
/// This error type covers the failure modes of the planning core and its
/// collaborator interfaces. Solver diagnostics (unprovided dependencies,
/// cycles, conflicts) are not errors: they are collected as
/// [`crate::solver::Problem`] values and surfaced through
/// [`crate::planner::PlannerResult::Failed`].
#[derive(Error, Debug)]
pub enum AurPlanError {
    /// Network or HTTP request error while talking to the AUR RPC.
    #[cfg(feature = "aur")]
    #[error("Connection problem: {0}")]
    ConnectionProblem(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Custom parsing error with message.
    #[error("Parse error: {0}")]
    Parse(String),

    /// User input names a dependency with several providers and no exact
    /// name match. The core refuses to guess; the caller resolves the
    /// ambiguity and re-invokes.
    #[error("Multiple providers for {name}: {providers:?}")]
    AmbiguousProvider {
        /// The user input that matched several providers.
        name: String,
        /// Names of all matching providers, in upstream order.
        providers: Vec<String>,
    },

    /// A name in the hold set is unknown to the upstream universe, so it
    /// cannot be guaranteed to remain installed.
    #[error("Held package {0} is neither a repo nor an AUR package")]
    HeldPackageMissing(String),

    /// Invalid input parameter or internal inconsistency.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for aurplan operations.
pub type Result<T> = std::result::Result<T, AurPlanError>;
