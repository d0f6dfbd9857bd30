//! The authenticated Campbell Cloud client.
//!
//! # Design
//! `CampbellCloud` owns an immutable `Session` and a `Transport`. Every
//! endpoint method, generated or hand-built, funnels through `request`:
//! build the `HttpRequest` from a descriptor, send it, normalize whatever
//! came back. HTTP statuses never become errors on this path, and a failed
//! round-trip degrades to the "no result" status object. `request_raw` is the
//! same call without normalization, for callers that want the transport
//! error or the untouched response.

use std::fmt;
use std::time::Duration;

use tracing::{debug, warn};

use crate::endpoint::{BaseUrls, EndpointDescriptor, RequestArgs};
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport, DEFAULT_BODY_LIMIT};
use crate::normalize::{normalize, NormalizedResult};
use crate::session::{authenticate, Credentials, Session};

pub const DEFAULT_HOST: &str = "https://us-west-2.campbell-cloud.com/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CLIENT_ID: &str = "cloud";
pub const DEFAULT_GRANT_TYPE: &str = "password";

/// Builder for a [`CampbellCloud`] client.
pub struct ClientBuilder {
    organization_id: String,
    credentials: Credentials,
    host: String,
    timeout: Option<Duration>,
    body_limit: u64,
    transport: Option<Box<dyn Transport>>,
}

impl ClientBuilder {
    fn new(organization_id: String, credentials: Credentials) -> Self {
        Self {
            organization_id,
            credentials,
            host: DEFAULT_HOST.to_string(),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            body_limit: DEFAULT_BODY_LIMIT,
            transport: None,
        }
    }

    /// API root, up to and including the version segment.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Per-call timeout for the default transport. `None` disables it.
    /// Ignored when a custom transport is supplied.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Largest response body the default transport reads, in bytes.
    /// Ignored when a custom transport is supplied.
    pub fn body_limit(mut self, limit: u64) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.credentials.client_id = client_id.into();
        self
    }

    pub fn grant_type(mut self, grant_type: impl Into<String>) -> Self {
        self.credentials.grant_type = grant_type.into();
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Exchange the credentials for a token and return the client.
    ///
    /// ## Errors
    ///
    /// `InvalidCredentials` when the token endpoint answers without an
    /// access token, `Transport` when it cannot be reached.
    pub fn build(self) -> Result<CampbellCloud, ApiError> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Box::new(UreqTransport::new(self.timeout).with_body_limit(self.body_limit)),
        };
        let urls = BaseUrls::new(&self.host, &self.organization_id);
        let session = authenticate(transport.as_ref(), urls, self.organization_id, &self.credentials)?;
        Ok(CampbellCloud { session, transport })
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("organization_id", &self.organization_id)
            .field("credentials", &self.credentials)
            .field("host", &self.host)
            .field("timeout", &self.timeout)
            .field("body_limit", &self.body_limit)
            .field("custom_transport", &self.transport.is_some())
            .finish()
    }
}

/// Synchronous client for one Campbell Cloud organization.
pub struct CampbellCloud {
    session: Session,
    transport: Box<dyn Transport>,
}

impl CampbellCloud {
    /// Authenticate against the default host.
    pub fn new(organization_id: &str, username: &str, password: &str) -> Result<Self, ApiError> {
        Self::builder(organization_id, username, password).build()
    }

    pub fn builder(organization_id: &str, username: &str, password: &str) -> ClientBuilder {
        ClientBuilder::new(organization_id.to_string(), Credentials::new(username, password))
    }

    pub fn organization_id(&self) -> &str {
        self.session.organization_id()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Send one request and normalize the outcome.
    ///
    /// Only request-building failures are errors; a failed round-trip yields
    /// `{"status": "Results is type None"}`.
    pub fn request(
        &self,
        descriptor: &EndpointDescriptor,
        args: RequestArgs,
    ) -> Result<NormalizedResult, ApiError> {
        let request = self.session.build_request(descriptor, &args)?;
        match self.dispatch(descriptor, &request) {
            Ok(response) => Ok(normalize(Some(&response))),
            Err(e) => {
                warn!(endpoint = descriptor.name, error = %e, "no response obtained");
                Ok(normalize(None))
            }
        }
    }

    /// Send one request and return the raw response or transport error.
    pub fn request_raw(
        &self,
        descriptor: &EndpointDescriptor,
        args: RequestArgs,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.session.build_request(descriptor, &args)?;
        self.dispatch(descriptor, &request)
    }

    fn dispatch(
        &self,
        descriptor: &EndpointDescriptor,
        request: &HttpRequest,
    ) -> Result<HttpResponse, ApiError> {
        debug!(
            endpoint = descriptor.name,
            method = %request.method,
            url = %request.url,
            "sending request"
        );
        self.transport.send(request)
    }
}

impl fmt::Debug for CampbellCloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CampbellCloud")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::endpoint::descriptor;
    use serde_json::json;

    const GET_ASSET: EndpointDescriptor = descriptor!(
        get_asset(asset_id) Get Organization "assets/{asset_id}" [] [] [] []
    );

    #[test]
    fn construction_fails_fast_on_rejected_credentials() {
        let transport = Scripted::default();
        transport.push(Some((401, r#"{"message":"Invalid authentication credentials"}"#)));
        let err = CampbellCloud::builder("org-1", "ada", "wrong")
            .transport(transport.clone())
            .build()
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));
        assert_eq!(transport.count(), 1);
    }

    #[test]
    fn builder_overrides_oauth_parameters() {
        let transport = Scripted::default();
        transport.push(Some((200, TOKEN_REPLY)));
        CampbellCloud::builder("org-1", "ada", "pw")
            .client_id("field-app")
            .grant_type("client_credentials")
            .transport(transport.clone())
            .build()
            .unwrap();
        let body: serde_json::Value = serde_json::from_str(transport.last().body.as_deref().unwrap()).unwrap();
        assert_eq!(body["client_id"], "field-app");
        assert_eq!(body["grant_type"], "client_credentials");
        assert_eq!(transport.last().url, "https://us-west-2.campbell-cloud.com/api/v1/tokens");
    }

    #[test]
    fn request_attaches_cached_header() {
        let (client, transport) = client();
        transport.push(Some((200, r#"{"id":"a1"}"#)));
        let out = client
            .request(&GET_ASSET, RequestArgs::new().path("asset_id", "a1"))
            .unwrap();
        assert_eq!(out, json!({"id": "a1"}));
        let req = transport.last();
        assert_eq!(req.url, "https://example.test/api/v1/organizations/org-1/assets/a1");
        assert_eq!(req.header("Authorization"), Some("Bearer tok123"));
    }

    #[test]
    #[tracing_test::traced_test]
    fn dropped_connection_degrades_to_status_object() {
        let (client, transport) = client();
        transport.push(None);
        let out = client
            .request(&GET_ASSET, RequestArgs::new().path("asset_id", "a1"))
            .unwrap();
        assert_eq!(out, json!({"status": "Results is type None"}));
        assert!(logs_contain("no response obtained"));
    }

    #[test]
    fn request_raw_exposes_transport_error_and_status() {
        let (client, transport) = client();
        transport.push(None);
        let err = client
            .request_raw(&GET_ASSET, RequestArgs::new().path("asset_id", "a1"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(ref m) if m.contains("reset")));

        transport.push(Some((404, "")));
        let raw = client
            .request_raw(&GET_ASSET, RequestArgs::new().path("asset_id", "a1"))
            .unwrap();
        assert_eq!(raw.status, 404);
    }

    #[test]
    fn missing_path_argument_sends_nothing() {
        let (client, transport) = client();
        let before = transport.count();
        let err = client.request(&GET_ASSET, RequestArgs::new()).unwrap_err();
        assert!(matches!(err, ApiError::MissingPathArgument { .. }));
        assert_eq!(transport.count(), before);
    }

    #[test]
    fn client_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CampbellCloud>();
    }
}
