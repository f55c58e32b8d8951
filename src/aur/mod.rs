//! AUR metadata collaborator.
//!
//! The planner never talks to the network itself; it consumes an
//! [`AurSource`] to learn about user-repository packages. This module
//! provides the real RPC v5 client and a mock for tests.
//!
//! # Example
//!
//! ```no_run
//! use aurplan::aur::{AurClient, AurSource};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = AurClient::new()?;
//! let records = client.info(&["yay", "paru"]).await?;
//! for record in records {
//!     println!("{}: {}", record.name, record.version);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod mock;
mod source;

pub use client::{AurClient, AurClientBuilder};
pub use mock::MockAurSource;
pub use source::AurSource;
