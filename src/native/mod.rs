//! Native package manager collaborator.
//!
//! The planner reads two snapshots from the native manager: the sync
//! databases (repo packages) and the local database (installed packages).
//! Both arrive through a formatter-style query whose fields are joined by a
//! fixed delimiter; the parsing half of this module is pure, the query half
//! shells out.

mod parse;
#[cfg(feature = "native")]
mod query;

pub use parse::{
    FIELD_DELIMITER, LOCAL_FORMAT, QuerySource, SYNC_FORMAT, classify_installed,
    parse_local_output, parse_query_line, parse_sync_output,
};
#[cfg(feature = "native")]
pub use query::{installed_packages, known_groups, known_repos, sync_packages};
