// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Single-page fetching for paginated listing endpoints.
//!
//! [`fetch_page`] performs exactly one GET through a [`PageTransport`],
//! consults the rate-limit policy and decodes the body into provider DTOs.
//! It holds no pagination state; the listing loops in the connectors decide
//! what to do with each [`PageOutcome`].

use std::time::Duration;

use async_trait::async_trait;
use http::HeaderMap;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    error::Error,
    rate_limit::{EpochClock, Verdict, classify},
};

/// Status, headers and body of one upstream response.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct RawResponse
{
    /// HTTP status code.
    pub status:  u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Undecoded response body.
    pub body:    String,
}

impl RawResponse
{
    /// Creates a response with no headers.
    pub fn new(status: u16, body: impl Into<String,>,) -> Self
    {
        Self {
            status, headers: HeaderMap::new(), body: body.into(),
        }
    }

    /// Replaces the response headers.
    pub fn with_headers(mut self, headers: HeaderMap,) -> Self
    {
        self.headers = headers;
        self
    }

    /// Looks a header up by case-insensitive name.
    ///
    /// Values that are not visible ASCII are treated as absent.
    pub fn header(&self, name: &str,) -> Option<&str,>
    {
        self.headers.get(name,)?.to_str().ok()
    }
}

/// Issues raw GET requests against the upstream API.
///
/// Implementations must return every HTTP status as a [`RawResponse`]; only
/// failures that produced no response at all are errors.
#[async_trait]
pub trait PageTransport: Send + Sync
{
    /// Performs a GET for a route relative to the API base URL.
    async fn get(&self, route: &str,) -> Result<RawResponse, Error,>;
}

/// A paginated listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub struct ListingEndpoint
{
    /// Short resource label used in logs and errors, e.g. `"repos"`.
    pub label:         &'static str,
    /// Path with `{name}` placeholders, e.g. `"/users/{owner}/repos"`.
    pub path_template: &'static str,
    /// Fixed query pairs appended after the paging parameters.
    pub extra_query:   &'static [(&'static str, &'static str,)],
}

impl ListingEndpoint
{
    /// Renders the route for one page.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when a placeholder has no matching
    /// parameter.
    ///
    /// # Example
    ///
    /// ```
    /// use repo_activity::page::ListingEndpoint;
    ///
    /// const COMMITS: ListingEndpoint = ListingEndpoint {
    ///     label:         "commits",
    ///     path_template: "/repos/{owner}/{repo}/commits",
    ///     extra_query:   &[],
    /// };
    ///
    /// let route = COMMITS.route(&[("owner", "octocat",), ("repo", "Hello-World",),], 2, 30,)?;
    /// assert_eq!(route, "/repos/octocat/Hello-World/commits?per_page=30&page=2");
    /// # Ok::<(), repo_activity::Error>(())
    /// ```
    pub fn route(&self, params: &[(&str, &str,)], page: u32, per_page: u32,)
    -> Result<String, Error,>
    {
        let mut path = self.path_template.to_string();
        for (name, value,) in params {
            path = path.replace(&format!("{{{name}}}"), value,);
        }
        if path.contains('{',) {
            return Err(Error::validation(format!(
                "missing path parameter for {} in {path}",
                self.label
            ),),);
        }

        let mut route = format!("{path}?per_page={per_page}&page={page}");
        for (key, value,) in self.extra_query {
            route.push('&',);
            route.push_str(key,);
            route.push('=',);
            route.push_str(value,);
        }
        Ok(route,)
    }

    /// Human readable description of one page, used as error context.
    ///
    /// The parameter values are joined with `/`, so the commit listing of
    /// `octocat/Hello-World` reads `commits page 2 for octocat/Hello-World`.
    pub fn context(&self, params: &[(&str, &str,)], page: u32,) -> String
    {
        let resource: Vec<&str,> = params.iter().map(|(_, value,)| *value,).collect();
        if resource.is_empty() {
            format!("{} page {page}", self.label)
        } else {
            format!("{} page {page} for {}", self.label, resource.join("/",))
        }
    }
}

/// Result of fetching one page.
#[derive(Debug,)]
pub enum PageOutcome<T,>
{
    /// The page carried at least one item.
    Items(Vec<T,>,),
    /// The page was empty; the listing is exhausted.
    Empty,
    /// Throttled; request the same page again after the delay.
    RetryAfter(Duration,),
    /// The resource is unavailable for this call.
    SkipResource,
    /// Unrecoverable failure.
    Fatal(Error,),
}

/// Parameters of a single page request.
#[derive(Debug, Clone, Copy,)]
pub struct PageRequest<'a,>
{
    /// Endpoint being listed.
    pub endpoint:     &'a ListingEndpoint,
    /// Values for the endpoint's path placeholders.
    pub params:       &'a [(&'a str, &'a str,)],
    /// 1-based page number.
    pub page:         u32,
    /// Number of items requested per page.
    pub per_page:     u32,
    /// Name of the provider's rate-limit reset header.
    pub reset_header: &'a str,
}

/// Fetches and classifies one page.
///
/// # Arguments
///
/// * `transport` - HTTP seam used for the GET
/// * `request` - Endpoint, parameters and paging of the request
/// * `clock` - Source of the current Unix time for rate-limit waits
pub async fn fetch_page<T,>(
    transport: &dyn PageTransport,
    request: PageRequest<'_,>,
    clock: &dyn EpochClock,
) -> PageOutcome<T,>
where
    T: DeserializeOwned,
{
    let context = request.endpoint.context(request.params, request.page,);

    let route = match request.endpoint.route(request.params, request.page, request.per_page,) {
        Ok(route,) => route,
        Err(error,) => return PageOutcome::Fatal(error,),
    };

    debug!("Fetching {}", route);
    let response = match transport.get(&route,).await {
        Ok(response,) => response,
        Err(error,) => return PageOutcome::Fatal(error,),
    };

    let verdict = match classify(
        response.status,
        response.header(request.reset_header,),
        clock.now_epoch(),
        &context,
    ) {
        Ok(verdict,) => verdict,
        Err(error,) => return PageOutcome::Fatal(error,),
    };

    match verdict {
        Verdict::Proceed => decode_page(&response.body, &context,),
        Verdict::Skip => {
            warn!("Skipping {} (status {})", context, response.status);
            PageOutcome::SkipResource
        }
        Verdict::Wait(wait,) => PageOutcome::RetryAfter(wait,),
    }
}

/// Decodes a successful page body.
///
/// Empty, `null` and `[]` bodies all mean the listing is exhausted.
fn decode_page<T,>(body: &str, context: &str,) -> PageOutcome<T,>
where
    T: DeserializeOwned,
{
    if body.trim().is_empty() {
        return PageOutcome::Empty;
    }

    match serde_json::from_str::<Option<Vec<T,>,>,>(body,) {
        Ok(Some(items,),) if !items.is_empty() => PageOutcome::Items(items,),
        Ok(_,) => PageOutcome::Empty,
        Err(source,) => PageOutcome::Fatal(Error::Decode {
            context: context.to_string(), source,
        },),
    }
}
