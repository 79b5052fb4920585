// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Settings document for the activity service.
//!
//! Settings come from an optional YAML file; every field has a default, so an
//! absent file or an empty document yields a working configuration against
//! the public GitHub API. Command-line flags and environment variables are
//! applied on top by the binary through [`Settings::apply_overrides`].

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, io_error},
    retry::DEFAULT_MAX_RATE_LIMIT_RETRIES,
};

/// Public GitHub REST endpoint.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
/// Address the HTTP service binds to by default.
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

const MAX_PER_PAGE: u32 = 100;

/// Root settings document.
///
/// # Examples
///
/// ```
/// use repo_activity::Settings;
///
/// let yaml = r#"
/// github:
///   commit_limit: 10
/// server:
///   bind: 0.0.0.0:9000
/// "#;
/// let settings = Settings::from_yaml(yaml,)?;
/// assert_eq!(settings.github.limits.commit_limit, 10);
/// assert_eq!(settings.github.limits.repos_per_page, 20);
/// assert_eq!(settings.server.bind, "0.0.0.0:9000");
/// # Ok::<(), repo_activity::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize,)]
pub struct Settings
{
    /// GitHub connector settings.
    #[serde(default)]
    pub github: GitHubSettings,
    /// HTTP service settings.
    #[serde(default)]
    pub server: ServerSettings,
}

/// Connection and paging settings of the GitHub connector.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize,)]
pub struct GitHubSettings
{
    /// Base URL of the REST API.
    #[serde(default = "default_api_url", alias = "api-url", alias = "apiUrl")]
    pub api_url: String,
    /// Token sent as a bearer credential; anonymous when absent.
    #[serde(default, skip_serializing)]
    pub token:   Option<String,>,
    /// Paging limits.
    #[serde(flatten)]
    pub limits:  FetchLimits,
}

impl Default for GitHubSettings
{
    fn default() -> Self
    {
        Self {
            api_url: default_api_url(), token: None, limits: FetchLimits::default(),
        }
    }
}

/// Page sizes and bounds applied by a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize,)]
pub struct FetchLimits
{
    /// Repositories requested per listing page.
    #[serde(default = "default_repos_per_page")]
    pub repos_per_page:         u32,
    /// Commits requested per listing page.
    #[serde(default = "default_commits_per_page")]
    pub commits_per_page:       u32,
    /// Maximum number of recent commits kept per repository.
    #[serde(default = "default_commit_limit")]
    pub commit_limit:           usize,
    /// Consecutive rate-limit retries allowed for one page.
    #[serde(default = "default_max_rate_limit_retries")]
    pub max_rate_limit_retries: u32,
}

impl Default for FetchLimits
{
    fn default() -> Self
    {
        Self {
            repos_per_page:         default_repos_per_page(),
            commits_per_page:       default_commits_per_page(),
            commit_limit:           default_commit_limit(),
            max_rate_limit_retries: default_max_rate_limit_retries(),
        }
    }
}

impl FetchLimits
{
    /// Checks the limits against the upstream API constraints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when a page size is outside `1..=100` or
    /// the commit limit is zero.
    pub fn validate(&self,) -> Result<(), Error,>
    {
        validate_page_size("repos_per_page", self.repos_per_page,)?;
        validate_page_size("commits_per_page", self.commits_per_page,)?;
        if self.commit_limit == 0 {
            return Err(Error::validation("commit_limit must be at least 1",),);
        }
        Ok((),)
    }
}

/// Settings of the HTTP service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize,)]
pub struct ServerSettings
{
    /// Socket address to listen on.
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings
{
    fn default() -> Self
    {
        Self {
            bind: default_bind(),
        }
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default,)]
pub struct Overrides
{
    /// Replacement GitHub token.
    pub github_token:   Option<String,>,
    /// Replacement GitHub API base URL.
    pub github_api_url: Option<String,>,
    /// Replacement bind address.
    pub bind:           Option<String,>,
}

impl Settings
{
    /// Parses and validates a YAML settings document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for malformed YAML and [`Error::Validation`]
    /// when values violate the invariants checked by [`Settings::validate`].
    pub fn from_yaml(input: &str,) -> Result<Self, Error,>
    {
        let settings: Settings =
            if input.trim().is_empty() { Settings::default() } else { serde_yaml::from_str(input,)? };
        settings.validate()?;
        Ok(settings,)
    }

    /// Loads settings from `path`, or defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read, plus the errors of
    /// [`Settings::from_yaml`].
    pub fn load(path: Option<&Path,>,) -> Result<Self, Error,>
    {
        match path {
            Some(path,) => {
                let contents = fs::read_to_string(path,).map_err(|e| io_error(path, e,),)?;
                Self::from_yaml(&contents,)
            }
            None => Ok(Self::default(),),
        }
    }

    /// Applies command-line and environment overrides, then re-validates.
    ///
    /// Blank override values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the result is invalid.
    pub fn apply_overrides(mut self, overrides: Overrides,) -> Result<Self, Error,>
    {
        if let Some(token,) = non_blank(overrides.github_token,) {
            self.github.token = Some(token,);
        }
        if let Some(api_url,) = non_blank(overrides.github_api_url,) {
            self.github.api_url = api_url;
        }
        if let Some(bind,) = non_blank(overrides.bind,) {
            self.server.bind = bind;
        }
        self.validate()?;
        Ok(self,)
    }

    /// Checks every invariant of the document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] describing the first violation.
    pub fn validate(&self,) -> Result<(), Error,>
    {
        if self.github.api_url.trim().is_empty() {
            return Err(Error::validation("github.api_url cannot be empty",),);
        }
        if self.server.bind.trim().is_empty() {
            return Err(Error::validation("server.bind cannot be empty",),);
        }
        self.github.limits.validate()
    }
}

fn validate_page_size(name: &str, value: u32,) -> Result<(), Error,>
{
    if (1..=MAX_PER_PAGE).contains(&value,) {
        Ok((),)
    } else {
        Err(Error::validation(format!("{name} must be between 1 and {MAX_PER_PAGE}, got {value}"),),)
    }
}

fn non_blank(value: Option<String,>,) -> Option<String,>
{
    value.map(|value| value.trim().to_string(),).filter(|value| !value.is_empty(),)
}

fn default_api_url() -> String
{
    DEFAULT_GITHUB_API_URL.to_string()
}

fn default_bind() -> String
{
    DEFAULT_BIND.to_string()
}

fn default_repos_per_page() -> u32
{
    20
}

fn default_commits_per_page() -> u32
{
    30
}

fn default_commit_limit() -> usize
{
    20
}

fn default_max_rate_limit_retries() -> u32
{
    DEFAULT_MAX_RATE_LIMIT_RETRIES
}
