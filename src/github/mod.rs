// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! GitHub implementation of the activity connector.

mod connector;
mod transport;
mod types;

pub use connector::{GitHubConnector, PROVIDER, RATE_LIMIT_RESET_HEADER, validate_owner};
pub use transport::{GITHUB_MEDIA_TYPE, OctocrabTransport};
pub use types::{GitAuthor, GitCommit, GitHubCommit, GitHubRepository};
