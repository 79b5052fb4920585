//! Recent commit activity across every repository of a code-hosting account.
//!
//! The library lists the repositories an owner can see, collects a bounded
//! number of recent commits for each of them and assembles the result into
//! [`RepositoryActivity`] records. Upstream rate limits are honoured by
//! waiting until the advertised reset time; inaccessible repositories are
//! skipped without failing the whole request.
//!
//! Connectors implement [`ActivityConnector`] and are looked up by provider
//! name through [`ConnectorRegistry`]. The [`server`] module exposes the
//! registry over HTTP and the `repo-activity` binary drives it from the
//! command line.

pub mod config;
pub mod connector;
mod error;
pub mod github;
mod model;
pub mod page;
pub mod rate_limit;
pub mod retry;
pub mod server;

pub use config::{FetchLimits, GitHubSettings, Overrides, ServerSettings, Settings};
pub use connector::{ActivityConnector, ConnectorRegistry};
pub use error::{Error, io_error};
pub use model::{Commit, RepositoryActivity};
