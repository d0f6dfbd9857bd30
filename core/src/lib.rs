//! Synchronous client for the Campbell Cloud REST API.
//!
//! # Overview
//! `CampbellCloud::new` exchanges a username and password for a bearer token
//! and keeps the resulting header for its lifetime. Each endpoint method
//! builds one request from a declarative descriptor, sends it, and returns
//! the response as a `serde_json::Value` normalized by [`normalize()`].
//!
//! # Design
//! - HTTP statuses are data, not errors. Empty or non-JSON bodies become
//!   small `status`/`message` objects; see [`normalize::normalize`].
//! - Requests and responses are plain data (`http`), so the round-trip is a
//!   swappable `Transport`. `UreqTransport` is the default.
//! - Endpoints are rows in a table (`api`), expanded by the `endpoints!`
//!   macro into descriptors and methods. A handful of operations whose
//!   bodies are derived or validated are written by hand.
//! - The session is immutable. There is no token refresh.

pub mod endpoint;

pub mod api;
pub mod client;
pub mod error;
pub mod http;
pub mod normalize;
pub mod session;
pub mod types;

pub use client::{CampbellCloud, ClientBuilder};
pub use endpoint::{Auth, BaseUrls, EndpointDescriptor, QueryValue, RequestArgs, Root};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport, DEFAULT_BODY_LIMIT};
pub use normalize::{normalize, NormalizedResult};
pub use session::{Credentials, Session};
pub use types::SoftwareUpdate;
