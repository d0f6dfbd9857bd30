//! Credential exchange and the authenticated session.
//!
//! # Design
//! A `Session` only exists once the token endpoint has answered with an
//! `access_token`; there is no unauthenticated session value and no way to
//! swap the token afterwards. A new token means a new client.

use std::fmt;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::endpoint::{descriptor, BaseUrls, EndpointDescriptor, RequestArgs};
use crate::error::ApiError;
use crate::http::{HttpRequest, Transport};
use crate::normalize::normalize;

/// POST `{host}/tokens`, sent without a bearer header.
pub const TOKEN_EXCHANGE: EndpointDescriptor = descriptor!(
    create_token() Post Tokens ""
    [] ["username", "password", "client_id", "grant_type"] [] [Anonymous]
);

/// Username/password pair plus the OAuth client parameters sent with it.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub grant_type: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            client_id: crate::client::DEFAULT_CLIENT_ID.to_string(),
            grant_type: crate::client::DEFAULT_GRANT_TYPE.to_string(),
        }
    }

    pub(crate) fn token_args(&self) -> Result<RequestArgs, ApiError> {
        RequestArgs::new()
            .field("username", &self.username)?
            .field("password", &self.password)?
            .field("client_id", &self.client_id)?
            .field("grant_type", &self.grant_type)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("grant_type", &self.grant_type)
            .finish()
    }
}

/// An organization's base URLs and the bearer header for every later call.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    organization_id: String,
    urls: BaseUrls,
    authorization: String,
}

impl Session {
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    pub fn urls(&self) -> &BaseUrls {
        &self.urls
    }

    /// The `Authorization` header value, `Bearer <token>`.
    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    pub fn build_request(
        &self,
        descriptor: &EndpointDescriptor,
        args: &RequestArgs,
    ) -> Result<HttpRequest, ApiError> {
        descriptor.build(&self.urls, args, Some(&self.authorization))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("organization_id", &self.organization_id)
            .field("urls", &self.urls)
            .field("authorization", &"Bearer <redacted>")
            .finish()
    }
}

/// Exchange credentials for a bearer token.
///
/// A reply without a string `access_token` is `InvalidCredentials`, whatever
/// its status. Failing to reach the token endpoint is `Transport`.
pub fn authenticate(
    transport: &dyn Transport,
    urls: BaseUrls,
    organization_id: String,
    credentials: &Credentials,
) -> Result<Session, ApiError> {
    let request = TOKEN_EXCHANGE.build(&urls, &credentials.token_args()?, None)?;
    debug!(url = %request.url, username = %credentials.username, "exchanging credentials for a token");

    let response = transport.send(&request)?;
    let result = normalize(Some(&response));

    let Some(token) = result.get("access_token").and_then(Value::as_str) else {
        warn!(status = response.status, "token exchange returned no access_token");
        return Err(ApiError::InvalidCredentials);
    };

    info!(organization_id = %organization_id, "authenticated");
    Ok(Session {
        organization_id,
        urls,
        authorization: format!("Bearer {token}"),
    })
}
