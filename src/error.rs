#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the activity crate."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.
//!
//! Skipped resources and rate-limit waits are not errors: they are resolved
//! inside the pagination loops. Every variant below is fatal for the
//! operation that produced it.

use std::path::{Path, PathBuf};

/// Unified error type returned by the connectors, the configuration loader,
/// the HTTP layer and the CLI.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Wraps I/O errors that occur while reading configuration files.
    #[error("failed to read configuration from {path:?}: {source}")]
    Io {
        /// Location of the configuration file.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps YAML decoding errors.
    #[error("failed to parse configuration: {source}")]
    Parse {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Wraps serialization errors when writing activity output.
    #[error("failed to serialize activities: {source}")]
    Serialize {
        /// Underlying serialization error.
        source: serde_json::Error
    },
    /// Returned when user input or configuration violates invariants.
    #[error("invalid input: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    },
    /// Returned when no connector is registered under the requested name.
    #[error("unknown source: {provider}")]
    UnknownProvider {
        /// Provider name as supplied by the caller.
        provider: String
    },
    /// Upstream answered with a status the rate-limit policy cannot resolve.
    #[error("unexpected status {status} during {context}")]
    UnexpectedStatus {
        /// HTTP status code returned by the upstream API.
        status:  u16,
        /// Resource and page being fetched.
        context: String
    },
    /// Upstream throttled the request without telling when the budget resets.
    #[error("rate limit exceeded during {context} without a reset header")]
    MissingRateLimitReset {
        /// Resource and page being fetched.
        context: String
    },
    /// The rate-limit reset header is not an epoch second count.
    #[error("invalid rate limit reset header {value:?} during {context}")]
    InvalidRateLimitReset {
        /// Raw header value.
        value:   String,
        /// Resource and page being fetched.
        context: String
    },
    /// The same page kept being throttled.
    #[error("rate limit exceeded during {context} after {attempts} retries")]
    RateLimitRetriesExhausted {
        /// Resource and page being fetched.
        context:  String,
        /// Number of consecutive retries performed for the page.
        attempts: u32
    },
    /// The advertised reset lies further away than any real rate-limit window.
    #[error("rate limit reset during {context} is {wait_seconds}s away")]
    RateLimitResetTooFar {
        /// Resource and page being fetched.
        context:      String,
        /// Seconds until the advertised reset.
        wait_seconds: i64
    },
    /// A successful response carried a body that is not the expected JSON.
    #[error("failed to decode {context}: {source}")]
    Decode {
        /// Resource and page being fetched.
        context: String,
        /// Underlying decoding error.
        source:  serde_json::Error
    },
    /// The request never produced an HTTP response.
    #[error("request failed during {context}: {message}")]
    Transport {
        /// Resource and page being fetched.
        context: String,
        /// Description reported by the HTTP client.
        message: String
    },
    /// The operation was abandoned while waiting.
    #[error("interrupted while waiting during {context}")]
    Cancelled {
        /// Resource and page being fetched.
        context: String
    },
    /// The HTTP service could not bind or stopped unexpectedly.
    #[error("http server error: {message}")]
    Server {
        /// Description of the failure.
        message: String
    },
    /// Aggregate failure of a whole activity fetch for one owner.
    #[error("error fetching {provider} activity for {owner}: {source}")]
    Connector {
        /// Provider key of the failing connector.
        provider: String,
        /// Owner whose activity was being collected.
        owner:    String,
        /// Root cause.
        source:   Box<Error>
    }
}

impl Error {
    /// Constructs a validation error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the validation failure.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Constructs a transport error for the given request context.
    pub fn transport<C, M>(context: C, message: M) -> Self
    where
        C: Into<String>,
        M: Into<String>
    {
        Self::Transport {
            context: context.into(),
            message: message.into()
        }
    }

    /// Wraps a root cause with the owner and provider being processed.
    pub fn connector(provider: &str, owner: &str, source: Error) -> Self {
        Self::Connector {
            provider: provider.to_owned(),
            owner:    owner.to_owned(),
            source:   Box::new(source)
        }
    }

    /// Returns the innermost error, looking through [`Error::Connector`].
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::Connector {
                source, ..
            } => source.root_cause(),
            other => other
        }
    }

    /// Formats the error for diagnostics without the variant name.
    ///
    /// The returned string matches the [`std::fmt::Display`] implementation.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Parse {
            source
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize {
            source
        }
    }
}

/// Creates an [`Error::Io`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location of the configuration file that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn validation_constructor_populates_message() {
        let error = Error::validation("something went wrong");
        match error {
            Error::Validation {
                ref message
            } => {
                assert_eq!(message, "something went wrong");
            }
            other => panic!("expected validation error, got {other:?}")
        }
    }

    #[test]
    fn to_display_string_matches_display() {
        let error = Error::validation("display me");
        assert_eq!(error.to_string(), error.to_display_string());
    }

    #[test]
    fn io_error_helper_wraps_path_and_source() {
        let path = std::path::Path::new("/tmp/settings.yaml");
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = super::io_error(path, io_error);

        match error {
            Error::Io {
                path: ref stored_path,
                ref source
            } => {
                assert_eq!(stored_path, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected io error, got {other:?}")
        }
    }

    #[test]
    fn connector_error_names_owner_and_keeps_root_cause() {
        let cause = Error::UnexpectedStatus {
            status:  500,
            context: "repos page 1".to_owned()
        };
        let error = Error::connector("github", "octocat", cause);

        assert_eq!(
            error.to_string(),
            "error fetching github activity for octocat: unexpected status 500 during repos page 1"
        );
        assert!(matches!(
            error.root_cause(),
            Error::UnexpectedStatus {
                status: 500,
                ..
            }
        ));
    }

    #[test]
    fn serde_yaml_conversion_maps_to_parse_variant() {
        let error = serde_yaml::from_str::<usize>("not-a-number").unwrap_err();
        let mapped: Error = error.into();
        assert!(matches!(mapped, Error::Parse { .. }));
    }

    #[test]
    fn serde_json_conversion_maps_to_serialize_variant() {
        let invalid = serde_json::from_str::<serde_json::Value>("not-json").unwrap_err();
        let mapped: Error = invalid.into();
        assert!(matches!(mapped, Error::Serialize { .. }));
    }
}
