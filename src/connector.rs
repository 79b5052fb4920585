// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Provider-neutral connector interface and the registry resolving
//! provider names to connectors.

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    config::Settings,
    error::Error,
    github::{GitHubConnector, OctocrabTransport},
    model::RepositoryActivity,
};

/// Source of repository activity for one hosting provider.
#[async_trait]
pub trait ActivityConnector: Send + Sync
{
    /// Registry key of the provider, lower-case.
    fn provider(&self,) -> &'static str;

    /// Collects the activity of every repository owned by `owner`.
    ///
    /// The result has one entry per repository in listing order. Any fatal
    /// failure discards partial results and is reported as
    /// [`Error::Connector`]; invalid owners fail with [`Error::Validation`]
    /// before any request is sent.
    async fn get_activities(&self, owner: &str,) -> Result<Vec<RepositoryActivity,>, Error,>;
}

/// Map of provider names to connectors, populated at startup.
#[derive(Clone, Default,)]
pub struct ConnectorRegistry
{
    connectors: BTreeMap<String, Arc<dyn ActivityConnector,>,>,
}

impl ConnectorRegistry
{
    /// Creates an empty registry.
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Builds the registry holding every provider supported by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when a connector cannot be initialized.
    pub fn from_settings(settings: &Settings, cancel: CancellationToken,) -> Result<Self, Error,>
    {
        let github = &settings.github;
        let transport = OctocrabTransport::new(&github.api_url, github.token.as_deref(),)?;
        let connector =
            GitHubConnector::new(Arc::new(transport,), github.limits,).with_cancellation(cancel,);

        let mut registry = Self::new();
        registry.register(Arc::new(connector,),);
        Ok(registry,)
    }

    /// Adds `connector` under its provider key, replacing any previous one.
    pub fn register(&mut self, connector: Arc<dyn ActivityConnector,>,)
    {
        let provider = connector.provider().to_ascii_lowercase();
        debug!("Registering {} connector", provider);
        self.connectors.insert(provider, connector,);
    }

    /// Resolves a provider name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownProvider`] when nothing is registered under
    /// the name.
    pub fn resolve(&self, provider: &str,) -> Result<Arc<dyn ActivityConnector,>, Error,>
    {
        self.connectors.get(&provider.to_ascii_lowercase(),).cloned().ok_or_else(|| {
            Error::UnknownProvider {
                provider: provider.to_string(),
            }
        },)
    }

    /// Registered provider keys in alphabetical order.
    pub fn providers(&self,) -> Vec<&str,>
    {
        self.connectors.keys().map(String::as_str,).collect()
    }
}
