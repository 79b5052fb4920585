// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Octocrab-backed [`PageTransport`].
///
/// Requests go through octocrab's raw `_get` so every status, including 403
/// and 429, reaches the rate-limit policy untouched. Octocrab's own retry
/// middleware is disabled for the same reason.
use async_trait::async_trait;
use http::header::ACCEPT;
use octocrab::{Octocrab, service::middleware::retry::RetryConfig};

use crate::{
    error::Error,
    page::{PageTransport, RawResponse},
};

/// Media type requested from the GitHub REST API.
pub const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Raw GET access to the GitHub REST API.
#[derive(Clone,)]
pub struct OctocrabTransport
{
    client: Octocrab,
}

impl OctocrabTransport
{
    /// Builds a client for `api_url`, authenticated with a bearer token when
    /// one is supplied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the base URL is invalid or the
    /// client cannot be initialized.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use repo_activity::github::OctocrabTransport;
    ///
    /// # fn example() -> Result<(), repo_activity::Error> {
    /// let transport = OctocrabTransport::new("https://api.github.com", Some("ghp_token",),)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(api_url: &str, token: Option<&str,>,) -> Result<Self, Error,>
    {
        let builder = Octocrab::builder()
            .base_uri(api_url,)
            .map_err(|e| Error::validation(format!("invalid GitHub API url {api_url}: {e}"),),)?
            .add_header(ACCEPT, GITHUB_MEDIA_TYPE.to_string(),)
            .add_retry_config(RetryConfig::None,);

        let client = match token {
            Some(token,) => builder.personal_token(token.to_string(),).build(),
            None => builder.build(),
        }
        .map_err(|e| Error::validation(format!("failed to initialize GitHub client: {e}"),),)?;

        Ok(Self {
            client,
        },)
    }
}

#[async_trait]
impl PageTransport for OctocrabTransport
{
    async fn get(&self, route: &str,) -> Result<RawResponse, Error,>
    {
        let response =
            self.client._get(route,).await.map_err(|e| Error::transport(route, e.to_string(),),)?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();

        let body = self
            .client
            .body_to_string(response,)
            .await
            .map_err(|e| Error::transport(route, format!("failed to read body: {e}"),),)?;

        Ok(RawResponse::new(status, body,).with_headers(headers,),)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[tokio::test]
    async fn rejects_invalid_base_url()
    {
        let error = OctocrabTransport::new("not a url", None,).err().expect("invalid url",);
        assert!(matches!(error, Error::Validation { .. }));
    }

    #[tokio::test]
    async fn builds_with_and_without_token()
    {
        assert!(OctocrabTransport::new("https://api.github.com", None,).is_ok());
        assert!(OctocrabTransport::new("https://api.github.com", Some("ghp_token",),).is_ok());
    }
}
