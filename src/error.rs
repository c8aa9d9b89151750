#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the discovery pipeline."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.
//!
//! Every fatal variant carries the URL, slug or path it concerns so the CLI
//! can report the offending resource without additional context.

use std::path::{Path, PathBuf};

use crate::model::ResourceKind;

/// Unified error type returned by the API client, model builder, resolver,
/// renderer and CLI.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// The token was rejected (HTTP 401 or 403).
    #[error("authentication failed for {url} (HTTP {status}); check the auth token")]
    Authentication {
        /// Requested URL.
        url:    String,
        /// HTTP status returned by the service.
        status: u16
    },
    /// The organization or resource does not exist (HTTP 404).
    #[error("resource not found: {url}")]
    NotFound {
        /// Requested URL.
        url: String
    },
    /// Transient failures persisted after every retry attempt.
    #[error("request to {url} failed after {attempts} attempts: {message}")]
    Transient {
        /// Requested URL.
        url:      String,
        /// Number of attempts performed.
        attempts: u32,
        /// Description of the last failure.
        message:  String
    },
    /// Non-retryable HTTP status other than 401, 403 and 404.
    #[error("request to {url} failed with HTTP {status}: {body}")]
    Http {
        /// Requested URL.
        url:    String,
        /// HTTP status returned by the service.
        status: u16,
        /// Response body, truncated.
        body:   String
    },
    /// The request could not be sent and retrying would not help.
    #[error("request to {url} could not be sent: {message}")]
    Request {
        /// Requested URL.
        url:     String,
        /// Transport error message.
        message: String
    },
    /// Response body did not match the expected JSON shape.
    #[error("unexpected response from {url}: {message}")]
    Decode {
        /// Requested URL or resource name.
        url:     String,
        /// Decoder message.
        message: String
    },
    /// A relationship references a slug missing from the graph.
    #[error("{owner} references unknown {kind} '{slug}'")]
    DanglingReference {
        /// Kind of the missing referent.
        kind:  ResourceKind,
        /// Description of the referencing node, e.g. `project 'api'`.
        owner: String,
        /// Missing slug.
        slug:  String
    },
    /// A slug normalizes to an empty identifier.
    #[error("{kind} '{slug}' cannot be converted into a Terraform identifier")]
    InvalidSlug {
        /// Kind of the offending node.
        kind: ResourceKind,
        /// Offending slug.
        slug: String
    },
    /// Returned when configuration or input data violates invariants.
    #[error("invalid configuration: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    },
    /// Wraps I/O errors together with the affected path.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        /// Affected location.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps YAML decoding errors from the configuration file.
    #[error("failed to parse configuration: {source}")]
    ConfigParse {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Wraps JSON serialization errors.
    #[error("failed to serialize output: {source}")]
    Serialize {
        /// Underlying serialization error.
        source: serde_json::Error
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

    /// Formats the error for diagnostics without the variant name.
    ///
    /// The returned string matches the [`std::fmt::Display`] implementation.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::ConfigParse {
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
/// * `path` - Location that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}
