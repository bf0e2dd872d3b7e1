//! Error types for triggering and waiting on Janky builds.

use std::time::Duration;

use thiserror::Error;

/// Everything that can end a run. All variants are terminal.
#[derive(Debug, Error)]
pub enum Error {
    /// A required input was missing or empty.
    #[error("{0}")]
    Usage(String),

    /// An entry in the env var list was not a `key=value` pair.
    #[error("Invalid environment variable '{pair}': {reason}")]
    InvalidEnvVar { pair: String, reason: &'static str },

    /// A response body could not be decoded.
    #[error("Failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A request body could not be encoded.
    #[error("Failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The submission response did not mention a build number.
    #[error("No build id found in Janky response: {result:?}")]
    MissingBuildId { result: String },

    /// The configured base URL cannot be used.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The poll interval cannot drive a ticker.
    #[error("Invalid poll settings: {0}")]
    InvalidPollSettings(String),

    /// The underlying HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// Janky answered but the response body could not be read.
    #[error("Failed to read response from {url} (status {status}): {source}")]
    ResponseBody {
        url: String,
        status: u16,
        #[source]
        source: reqwest::Error,
    },

    /// Janky answered 404 to the build request.
    #[error(
        "Failed to trigger build! Either {job} is not the name of a Janky job or {branch} is not a branch for the repository that job belongs to."
    )]
    NotFound { job: String, branch: String },

    /// Janky answered with an unexpected status.
    #[error("Janky rejected the {what} (status {status}): {body}")]
    Rejected {
        what: &'static str,
        status: u16,
        body: String,
    },

    /// The request kept failing after every retry was used up.
    #[error("{method} {url} giving up after {attempts} attempt(s): {message}")]
    Transient {
        method: String,
        url: String,
        attempts: u32,
        message: String,
    },

    /// The build completed without going green.
    #[error("Build failed, see Janky for more info: {url}")]
    BuildFailed { url: String },

    /// The build did not complete within the poll budget.
    #[error("Failed to poll for build status after {}s", .elapsed.as_secs())]
    Timeout { elapsed: Duration },
}

/// Result type for Janky operations.
pub type Result<T> = std::result::Result<T, Error>;
