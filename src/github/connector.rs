// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// GitHub activity connector.
///
/// Lists every repository of an owner page by page, then collects a bounded
/// window of recent commits for each repository, one repository at a time.
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::types::{GitHubCommit, GitHubRepository};
use crate::{
    config::FetchLimits,
    connector::ActivityConnector,
    error::Error,
    model::{Commit, RepositoryActivity},
    page::{ListingEndpoint, PageOutcome, PageRequest, PageTransport, fetch_page},
    rate_limit::{EpochClock, SystemClock},
    retry::{RetryBudget, wait_for_reset},
};

/// Registry key of the GitHub connector.
pub const PROVIDER: &str = "github";

/// Header carrying the Unix time at which the rate-limit window resets.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

const REPOSITORIES: ListingEndpoint = ListingEndpoint {
    label:         "repos",
    path_template: "/users/{owner}/repos",
    extra_query:   &[("type", "all",),],
};

const COMMITS: ListingEndpoint = ListingEndpoint {
    label:         "commits",
    path_template: "/repos/{owner}/{repo}/commits",
    extra_query:   &[],
};

static OWNER_PATTERN: LazyLock<Regex,> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,38})$",).expect("owner pattern is valid",)
},);

static REPOSITORY_PATTERN: LazyLock<Regex,> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$",).expect("repository pattern is valid",),);

/// Connector collecting repository activity from the GitHub REST API.
#[derive(Clone,)]
pub struct GitHubConnector
{
    transport: Arc<dyn PageTransport,>,
    clock:     Arc<dyn EpochClock,>,
    limits:    FetchLimits,
    cancel:    CancellationToken,
}

impl GitHubConnector
{
    /// Creates a connector using the wall clock and a fresh cancellation
    /// token.
    pub fn new(transport: Arc<dyn PageTransport,>, limits: FetchLimits,) -> Self
    {
        Self {
            transport,
            clock: Arc::new(SystemClock,),
            limits,
            cancel: CancellationToken::new(),
        }
    }

    /// Replaces the clock used to compute rate-limit waits.
    pub fn with_clock(mut self, clock: Arc<dyn EpochClock,>,) -> Self
    {
        self.clock = clock;
        self
    }

    /// Ties rate-limit waits to an external cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken,) -> Self
    {
        self.cancel = cancel;
        self
    }

    /// Lists every repository of `owner`, in upstream order.
    ///
    /// Paging stops at the first empty page. A skipped page (403, 404, 409)
    /// also ends the listing and keeps what was accumulated.
    ///
    /// # Errors
    ///
    /// Returns the fatal page error, [`Error::RateLimitRetriesExhausted`] or
    /// [`Error::Cancelled`].
    pub async fn list_repositories(&self, owner: &str,) -> Result<Vec<GitHubRepository,>, Error,>
    {
        let params = [("owner", owner,),];
        let repositories =
            self.collect_pages(&REPOSITORIES, &params, self.limits.repos_per_page, None,).await?;

        debug!("Listed {} repositories for {}", repositories.len(), owner);
        Ok(repositories,)
    }

    /// Collects at most `commit_limit` recent commits of `owner/repository`.
    ///
    /// Paging stops once enough commits were gathered, at the first empty
    /// page, or when the repository is skipped; commits from earlier pages
    /// are kept in every case.
    ///
    /// # Errors
    ///
    /// Returns the fatal page error, [`Error::RateLimitRetriesExhausted`] or
    /// [`Error::Cancelled`].
    pub async fn collect_commits(
        &self,
        owner: &str,
        repository: &str,
    ) -> Result<Vec<GitHubCommit,>, Error,>
    {
        let params = [("owner", owner,), ("repo", repository,),];
        let bound = self.limits.commit_limit;
        let commits = self
            .collect_pages(&COMMITS, &params, self.limits.commits_per_page, Some(bound,),)
            .await?;

        debug!("Collected {} commits for {}/{}", commits.len(), owner, repository);
        Ok(commits,)
    }

    async fn fetch_activities(&self, owner: &str,) -> Result<Vec<RepositoryActivity,>, Error,>
    {
        let repositories = self.list_repositories(owner,).await?;
        let mut activities = Vec::with_capacity(repositories.len(),);

        for repository in repositories {
            validate_repository(&repository.name,)?;
            let commits = self.collect_commits(owner, &repository.name,).await?;
            activities.push(RepositoryActivity::new(
                repository.name,
                commits.into_iter().map(Commit::from,).collect(),
            ),);
        }

        Ok(activities,)
    }

    /// Walks pages 1, 2, 3, … of one listing.
    ///
    /// The page number only advances after a non-empty page; throttled
    /// requests are repeated for the same page after the computed wait.
    /// Cancellation interrupts both the wait and an in-flight request.
    async fn collect_pages<T,>(
        &self,
        endpoint: &ListingEndpoint,
        params: &[(&str, &str,)],
        per_page: u32,
        limit: Option<usize,>,
    ) -> Result<Vec<T,>, Error,>
    where
        T: DeserializeOwned + Send,
    {
        let mut items = Vec::new();
        let mut page = 1u32;
        let mut budget = RetryBudget::new(self.limits.max_rate_limit_retries,);

        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled {
                    context: endpoint.context(params, page,),
                },);
            }

            let request = PageRequest {
                endpoint,
                params,
                page,
                per_page,
                reset_header: RATE_LIMIT_RESET_HEADER,
            };

            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Err(Error::Cancelled {
                        context: endpoint.context(params, page,),
                    },);
                }
                outcome = fetch_page::<T,>(self.transport.as_ref(), request, self.clock.as_ref(),) => outcome,
            };

            match outcome {
                PageOutcome::Items(batch,) => {
                    items.extend(batch,);
                    if limit.is_some_and(|limit| items.len() >= limit,) {
                        break;
                    }
                    page += 1;
                    budget.reset();
                }
                PageOutcome::Empty | PageOutcome::SkipResource => break,
                PageOutcome::RetryAfter(wait,) => {
                    let context = endpoint.context(params, page,);
                    budget.consume(&context,)?;
                    wait_for_reset(wait, &self.cancel, &context,).await?;
                }
                PageOutcome::Fatal(error,) => return Err(error,),
            }
        }

        if let Some(limit,) = limit {
            items.truncate(limit,);
        }
        Ok(items,)
    }
}

#[async_trait]
impl ActivityConnector for GitHubConnector
{
    fn provider(&self,) -> &'static str
    {
        PROVIDER
    }

    async fn get_activities(&self, owner: &str,) -> Result<Vec<RepositoryActivity,>, Error,>
    {
        validate_owner(owner,)?;

        let activities = self
            .fetch_activities(owner,)
            .await
            .map_err(|error| Error::connector(PROVIDER, owner, error,),)?;

        info!("Collected activity of {} repositories for {}", activities.len(), owner);
        Ok(activities,)
    }
}

/// Checks that `owner` has the shape of a GitHub login.
///
/// # Errors
///
/// Returns [`Error::Validation`] for empty names, names longer than 39
/// characters, or names with characters other than ASCII letters, digits and
/// inner hyphens.
pub fn validate_owner(owner: &str,) -> Result<(), Error,>
{
    if OWNER_PATTERN.is_match(owner,) {
        Ok((),)
    } else {
        Err(Error::validation(format!("invalid GitHub owner '{owner}'"),),)
    }
}

fn validate_repository(name: &str,) -> Result<(), Error,>
{
    if REPOSITORY_PATTERN.is_match(name,) {
        Ok((),)
    } else {
        Err(Error::validation(format!("unexpected repository name '{name}'"),),)
    }
}
