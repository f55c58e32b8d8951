//! Trait for AUR metadata queries, enabling testability via mock
//! implementations.

use crate::error::Result;
use crate::types::AurRecord;
use async_trait::async_trait;

/// What: Interface to the user-repository metadata service.
///
/// Inputs: None (trait definition)
///
/// Output: Trait defining the metadata operations the planner consumes
///
/// Details:
/// - [`crate::aur::AurClient`] implements this trait against the real RPC.
/// - [`crate::aur::MockAurSource`] implements it from canned records for
///   tests and offline use.
/// - [`crate::system::System::append_by_name`] drives `info` repeatedly
///   until the dependency closure of the requested names is fetched.
#[async_trait]
pub trait AurSource: Send + Sync {
    /// What: Fetch full records for one or more package names.
    ///
    /// Inputs:
    /// - `names`: Package names to fetch.
    ///
    /// Output:
    /// - `Result<Vec<AurRecord>>` with one record per known name; unknown
    ///   names are simply absent (not an error).
    async fn info(&self, names: &[&str]) -> Result<Vec<AurRecord>>;

    /// What: Search for packages by keyword.
    ///
    /// Inputs:
    /// - `query`: Search query string.
    ///
    /// Output:
    /// - `Result<Vec<AurRecord>>` with all matches; empty when nothing
    ///   matches (not an error).
    async fn search(&self, query: &str) -> Result<Vec<AurRecord>>;

    /// What: Search for packages matching on the name field only.
    ///
    /// Inputs:
    /// - `query`: Search query string.
    ///
    /// Output:
    /// - `Result<Vec<AurRecord>>` with all name matches; empty when nothing
    ///   matches (not an error).
    async fn search_by_name(&self, query: &str) -> Result<Vec<AurRecord>>;
}
