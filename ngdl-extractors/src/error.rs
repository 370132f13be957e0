use crate::auth::Error;
use thiserror::Error;

/// Enumerates the possible errors that can arise during extractor operations.
///
/// Only a few of these end a listing. Per-post failures are caught by the
/// extractor, logged and skipped, so they never reach the consumer of the stream.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// An error occurred during a network request (e.g., connection timeout, DNS resolution failure).
    #[error("Connection Error")]
    ConnectionError(#[from] reqwest::Error),

    /// An error occurred while deserializing a JSON response.
    #[error("Error while deserializing JSON")]
    JsonSerializeFail(#[from] serde_json::Error),

    /// The server reported errors inside a paginated payload. Ends the whole listing.
    #[error("Extraction stopped by server: {message}")]
    StopExtraction { message: String },

    /// Logging in failed. Raised before any post is fetched.
    #[error("Authentication failed. error: {source}")]
    AuthenticationFailure {
        #[from]
        source: Error,
    },

    /// A request that must succeed came back with an error status.
    #[error("HTTP request to {url} failed with status {status}")]
    HttpStatus { status: u16, url: String },

    /// None of the known URL patterns matched.
    #[error("No extractor found for {url}")]
    UnsupportedUrl { url: String },

    /// A post page lacks a field the parser cannot do without.
    #[error("Post is missing an essential field {field}")]
    MissingField { field: String },

    /// The options file could not be read or written.
    #[error("Failed to access config file. error: {source}")]
    ConfigIOError {
        #[from]
        source: std::io::Error,
    },

    /// The options file is not valid TOML or does not match the expected layout.
    #[error("Failed to parse config file")]
    ConfigParseError(#[from] toml::de::Error),
}
