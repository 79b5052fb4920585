// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! HTTP routing layer exposing the activity connectors.
//!
//! Routes:
//! - `GET /api/v1/activity/{provider}/repos/{owner}` → JSON list of
//!   repository activity
//! - `GET /api/v1/activity/health` → plain-text liveness probe
//!
//! Error mappings:
//! - connector failures → 502 `EXTERNAL_API_ERROR`
//! - unknown provider → 400 `UNKNOWN_PROVIDER`
//! - invalid owner → 400 `INVALID_REQUEST`
//! - cancelled while waiting → 503 `CANCELLED`

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{connector::ConnectorRegistry, error::Error, model::RepositoryActivity};

/// Body returned by the health probe.
pub const HEALTH_BODY: &str = "SERVICE RUNNING";

/// Shared registry handed to every handler.
pub type SharedRegistry = Arc<ConnectorRegistry,>;

/// JSON body of every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize,)]
pub struct ErrorBody
{
    /// Stable machine-readable failure code.
    pub code:    String,
    /// Human readable diagnostic.
    pub message: String,
}

/// Builds the router for the activity API.
pub fn create_router(registry: SharedRegistry,) -> Router
{
    Router::new()
        .route("/api/v1/activity/health", get(health,),)
        .route("/api/v1/activity/{provider}/repos/{owner}", get(get_activity,),)
        .with_state(registry,)
}

/// Serves the activity API on `bind` until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns [`Error::Server`] when the address cannot be bound or the server
/// fails.
pub async fn serve(
    registry: ConnectorRegistry,
    bind: &str,
    shutdown: CancellationToken,
) -> Result<(), Error,>
{
    let listener = TcpListener::bind(bind,).await.map_err(|e| Error::Server {
        message: format!("failed to bind {bind}: {e}"),
    },)?;
    info!("Listening on {} for providers {:?}", bind, registry.providers());

    let app = create_router(Arc::new(registry,),).layer(TraceLayer::new_for_http(),);
    axum::serve(listener, app,)
        .with_graceful_shutdown(async move { shutdown.cancelled().await },)
        .await
        .map_err(|e| Error::Server {
            message: e.to_string(),
        },)
}

async fn health() -> &'static str
{
    HEALTH_BODY
}

async fn get_activity(
    State(registry,): State<SharedRegistry,>,
    Path((provider, owner,),): Path<(String, String,),>,
) -> Result<Json<Vec<RepositoryActivity,>,>, Error,>
{
    let connector = registry.resolve(&provider,)?;
    let activities = connector.get_activities(&owner,).await?;
    Ok(Json(activities,),)
}

/// Status and code reported for an error.
fn classify_error(error: &Error,) -> (StatusCode, &'static str,)
{
    match error.root_cause() {
        Error::UnknownProvider {
            ..
        } => (StatusCode::BAD_REQUEST, "UNKNOWN_PROVIDER",),
        Error::Validation {
            ..
        } if !matches!(error, Error::Connector { .. }) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST",),
        Error::Cancelled {
            ..
        } => (StatusCode::SERVICE_UNAVAILABLE, "CANCELLED",),
        _ => (StatusCode::BAD_GATEWAY, "EXTERNAL_API_ERROR",),
    }
}

impl IntoResponse for Error
{
    fn into_response(self,) -> Response
    {
        let (status, code,) = classify_error(&self,);
        if status.is_server_error() {
            tracing::warn!("Request failed: {}", self);
        }

        let body = ErrorBody {
            code: code.to_string(), message: self.to_string(),
        };
        (status, Json(body,),).into_response()
    }
}

#[cfg(test)]
mod tests
{
    use async_trait::async_trait;
    use axum::body::to_bytes;

    use super::*;
    use crate::connector::ActivityConnector;

    struct FixedConnector;

    #[async_trait]
    impl ActivityConnector for FixedConnector
    {
        fn provider(&self,) -> &'static str
        {
            "fixed"
        }

        async fn get_activities(&self, owner: &str,) -> Result<Vec<RepositoryActivity,>, Error,>
        {
            match owner {
                "broken" => Err(Error::connector(
                    "fixed",
                    owner,
                    Error::UnexpectedStatus {
                        status: 500, context: "repos page 1".to_string(),
                    },
                ),),
                "bad!" => Err(Error::validation("invalid owner 'bad!'",),),
                "waiting" => Err(Error::connector(
                    "fixed",
                    owner,
                    Error::Cancelled {
                        context: "repos page 1".to_string(),
                    },
                ),),
                _ => Ok(vec![RepositoryActivity::new("Hello-World", Vec::new(),)],),
            }
        }
    }

    fn registry() -> SharedRegistry
    {
        let mut registry = ConnectorRegistry::new();
        registry.register(Arc::new(FixedConnector,),);
        Arc::new(registry,)
    }

    async fn call(provider: &str, owner: &str,) -> Response
    {
        get_activity(State(registry(),), Path((provider.to_string(), owner.to_string(),),),)
            .await
            .into_response()
    }

    async fn error_body(response: Response,) -> ErrorBody
    {
        let bytes = to_bytes(response.into_body(), usize::MAX,).await.expect("body",);
        serde_json::from_slice(&bytes,).expect("error body is JSON",)
    }

    #[tokio::test]
    async fn returns_activities_as_json()
    {
        let response = call("fixed", "octocat",).await;
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX,).await.expect("body",);
        let json: serde_json::Value = serde_json::from_slice(&bytes,).expect("JSON body",);
        assert_eq!(json[0]["repositoryName"], "Hello-World");
        assert_eq!(json[0]["recentCommits"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn connector_failure_maps_to_bad_gateway()
    {
        let response = call("fixed", "broken",).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = error_body(response,).await;
        assert_eq!(body.code, "EXTERNAL_API_ERROR");
        assert!(body.message.starts_with("error fetching fixed activity for broken"));
    }

    #[tokio::test]
    async fn unknown_provider_maps_to_bad_request()
    {
        let response = call("bitbucket", "octocat",).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await.code, "UNKNOWN_PROVIDER");
    }

    #[tokio::test]
    async fn invalid_owner_maps_to_bad_request()
    {
        let response = call("fixed", "bad!",).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await.code, "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn cancellation_maps_to_service_unavailable()
    {
        let response = call("fixed", "waiting",).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(error_body(response).await.code, "CANCELLED");
    }

    #[test]
    fn wrapped_validation_errors_are_upstream_failures()
    {
        let error = Error::connector("github", "octocat", Error::validation("unexpected repository name",),);
        assert_eq!(classify_error(&error,), (StatusCode::BAD_GATEWAY, "EXTERNAL_API_ERROR",));
    }

    #[tokio::test]
    async fn health_reports_running()
    {
        assert_eq!(health().await, HEALTH_BODY);
    }
}
