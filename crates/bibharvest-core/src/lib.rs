//! Bibharvest Core - shared plumbing for the harvest pipelines
//!
//! HTTP with 429 backoff, namespace-agnostic XML access, JSON dataset
//! files, logging and progress output.

pub mod error;
pub mod http;
pub mod json;
pub mod logging;
pub mod progress;
pub mod retry;
pub mod xml;

// Re-exports for convenience
pub use error::HttpError;
pub use http::{
    Clock, DEFAULT_USER_AGENT, Fetch, HttpClient, RawResponse, ReqwestTransport, SHARED_RUNTIME,
    SystemClock, Transport,
};
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress};
pub use retry::{RetryPolicy, linear_backoff};
pub use xml::Element;
