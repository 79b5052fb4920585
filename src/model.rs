// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Provider-neutral activity records returned to callers.
//!
//! Connectors map their provider-specific payloads into these shapes. Both
//! types serialize with camelCase keys so the HTTP and CLI outputs share one
//! JSON contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized projection of a single commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
#[serde(rename_all = "camelCase")]
pub struct Commit
{
    /// Commit identifier, unique within one repository's commit list.
    pub sha:          String,
    /// Full commit message.
    pub message:      String,
    /// Author name recorded in the commit.
    pub author_name:  String,
    /// Author email recorded in the commit.
    pub author_email: String,
    /// Authoring instant.
    pub timestamp:    DateTime<Utc,>,
}

/// Recent activity of one repository.
///
/// `recent_commits` keeps the upstream order, most recent first, and never
/// holds more entries than the connector's commit bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryActivity
{
    /// Repository name as listed by the provider.
    pub repository_name: String,
    /// Window of the most recent commits.
    pub recent_commits:  Vec<Commit,>,
}

impl RepositoryActivity
{
    /// Builds an activity record from a repository name and its commits.
    pub fn new(repository_name: impl Into<String,>, recent_commits: Vec<Commit,>,) -> Self
    {
        Self {
            repository_name: repository_name.into(), recent_commits,
        }
    }
}

impl std::fmt::Display for RepositoryActivity
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_,>,) -> std::fmt::Result
    {
        write!(f, "{} ({} recent commits)", self.repository_name, self.recent_commits.len())
    }
}
