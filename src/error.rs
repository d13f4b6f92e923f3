//! Unified error type.

use thiserror::Error;

use crate::method::Method;

/// The error type returned by switchyard's fallible operations.
///
/// Application-level failures (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// registration, configuration and infrastructure failures.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The service did not populate any endpoint map it could be probed for.
    #[error("service `{service}` has no endpoints to register")]
    NoEndpoints { service: String },

    #[error("invalid route `{method} {path}`: {reason}")]
    InvalidRoute {
        method: Method,
        path: String,
        reason: String,
    },

    #[error("unknown http method `{0}`")]
    UnknownMethod(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
}
