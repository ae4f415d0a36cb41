//! fleetdesk HTTP client.
//!
//! A thin wrapper over the logistics REST API. Every response body is an
//! envelope (`{success, data?, error?}`); [`ApiClient`] turns
//! `success: false` into [`ApiError::Api`] and hands everything else back
//! untouched. The wire is abstracted behind [`Transport`] so callers can
//! swap in an in-memory implementation.
//!
//! # Usage
//!
//! ```ignore
//! use fleetdesk_client::{ApiClient, Query, Resource};
//!
//! let client = ApiClient::http("http://localhost:5000")?;
//! let env = client.list(Resource::Materials, &Query::new().search("sand")).await?;
//! ```

pub mod client;
pub mod envelope;
pub mod error;
pub mod query;
pub mod resource;
pub mod transport;

pub use client::ApiClient;
pub use envelope::{Envelope, EnvelopeError, ErrorEntry};
pub use error::ApiError;
pub use query::Query;
pub use resource::{Resource, UnknownResource};
pub use transport::{ApiRequest, HttpTransport, Transport};

pub use reqwest::Method;
