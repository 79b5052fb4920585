// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// GitHub REST payloads consumed by the activity connector.
///
/// Only the fields the connector reads are declared; serde ignores the rest.
/// See <https://docs.github.com/en/rest/commits/commits#list-commits>.
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::Commit;

/// Entry of `GET /users/{owner}/repos`.
#[derive(Debug, Clone, Deserialize,)]
pub struct GitHubRepository
{
    /// Repository name without the owner prefix.
    pub name: String,
}

/// Entry of `GET /repos/{owner}/{repo}/commits`.
#[derive(Debug, Clone, Deserialize,)]
pub struct GitHubCommit
{
    pub sha:    String,
    pub commit: GitCommit,
}

/// Git-level data nested under `commit`.
#[derive(Debug, Clone, Deserialize,)]
pub struct GitCommit
{
    pub message: String,
    pub author:  GitAuthor,
}

/// Author signature of a git commit.
#[derive(Debug, Clone, Deserialize,)]
pub struct GitAuthor
{
    pub name:  String,
    pub email: String,
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc,>,
}

impl From<GitHubCommit,> for Commit
{
    fn from(dto: GitHubCommit,) -> Self
    {
        let GitHubCommit {
            sha,
            commit: GitCommit {
                message,
                author,
            },
        } = dto;

        Self {
            sha,
            message,
            author_name: author.name,
            author_email: author.email,
            timestamp: author.timestamp,
        }
    }
}
