//! Declarative endpoint descriptors and request assembly.
//!
//! # Design
//! One `EndpointDescriptor` per remote operation records the verb, the URL
//! root, a path template with `{name}` placeholders, and the names of the
//! query and body fields it forwards. `EndpointDescriptor::build` turns a
//! descriptor plus caller `RequestArgs` into an `HttpRequest`; it is the only
//! request-building code in the crate.
//!
//! The `endpoints!` macro declares table-driven operations once and expands
//! to both the `GENERATED` descriptor table and one `CampbellCloud` method per
//! row, so descriptor and method can never drift apart.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};

/// Which fixed base URL a path is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Root {
    /// `{host}/organizations/{organization_id}`
    Organization,
    /// `{host}/organizations`
    Organizations,
    /// `{host}/libraries`
    Libraries,
    /// `{host}/tokens`
    Tokens,
    /// `{host}/product-registrations`
    ProductRegistrations,
}

/// Whether the cached bearer header is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Auth {
    Bearer,
    Anonymous,
}

/// The base URLs of one organization on one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrls {
    organization: String,
    organizations: String,
    libraries: String,
    tokens: String,
    product_registrations: String,
}

impl BaseUrls {
    pub fn new(host: &str, organization_id: &str) -> Self {
        let host = host.trim_end_matches('/');
        Self {
            organization: format!("{host}/organizations/{organization_id}"),
            organizations: format!("{host}/organizations"),
            libraries: format!("{host}/libraries"),
            tokens: format!("{host}/tokens"),
            product_registrations: format!("{host}/product-registrations"),
        }
    }

    pub fn root(&self, root: Root) -> &str {
        match root {
            Root::Organization => &self.organization,
            Root::Organizations => &self.organizations,
            Root::Libraries => &self.libraries,
            Root::Tokens => &self.tokens,
            Root::ProductRegistrations => &self.product_registrations,
        }
    }

    fn join(&self, root: Root, path: &str) -> String {
        let base = self.root(root);
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{path}")
        }
    }
}

/// Declarative record of one remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub name: &'static str,
    pub method: HttpMethod,
    pub root: Root,
    /// Relative to `root`; may be empty.
    pub path: &'static str,
    /// Names the caller must supply; equal to the placeholders in `path`.
    pub path_params: &'static [&'static str],
    pub query: &'static [&'static str],
    pub body_fields: &'static [&'static str],
    /// The caller's JSON value is sent as the whole body.
    pub verbatim_body: bool,
    pub auth: Auth,
}

impl EndpointDescriptor {
    /// Placeholder names in `path`, in order.
    pub fn placeholders(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut rest = self.path;
        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}') else {
                break;
            };
            names.push(&rest[open + 1..open + close]);
            rest = &rest[open + close + 1..];
        }
        names
    }

    fn render_path(&self, args: &RequestArgs) -> Result<String, ApiError> {
        let mut out = String::with_capacity(self.path.len());
        let mut rest = self.path;
        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}') else {
                break;
            };
            let name = &rest[open + 1..open + close];
            let value = args
                .path_value(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ApiError::MissingPathArgument {
                    endpoint: self.name,
                    name: name.to_string(),
                })?;
            out.push_str(&rest[..open]);
            out.push_str(value);
            rest = &rest[open + close + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }

    /// Assemble the request. `authorization` is the full header value
    /// (`Bearer <token>`) and is ignored for anonymous endpoints.
    pub fn build(
        &self,
        urls: &BaseUrls,
        args: &RequestArgs,
        authorization: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let url = urls.join(self.root, &self.render_path(args)?);

        let mut headers = Vec::new();
        if let (Auth::Bearer, Some(value)) = (self.auth, authorization) {
            headers.push(("Authorization".to_string(), value.to_string()));
        }
        headers.extend(args.headers.iter().cloned());

        let body = match (&args.body, args.fields.is_empty()) {
            (Some(body), _) => Some(serde_json::to_string(body)?),
            (None, false) => Some(serde_json::to_string(&args.fields)?),
            (None, true) => None,
        };
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }

        Ok(HttpRequest {
            method: self.method,
            url,
            query: args.query.clone(),
            headers,
            body,
        })
    }
}

/// Values that can be sent as query parameters.
///
/// `None` sends nothing and a slice repeats its key once per element.
pub trait QueryValue {
    fn query_values(&self) -> Vec<String>;
}

impl QueryValue for str {
    fn query_values(&self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl QueryValue for String {
    fn query_values(&self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl QueryValue for i64 {
    fn query_values(&self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl QueryValue for u32 {
    fn query_values(&self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl QueryValue for bool {
    fn query_values(&self) -> Vec<String> {
        // The service has only ever been sent capitalized booleans.
        let rendered = if *self { "True" } else { "False" };
        vec![rendered.to_string()]
    }
}

impl<T: QueryValue> QueryValue for Option<T> {
    fn query_values(&self) -> Vec<String> {
        self.as_ref().map(T::query_values).unwrap_or_default()
    }
}

impl<T: QueryValue> QueryValue for [T] {
    fn query_values(&self) -> Vec<String> {
        self.iter().flat_map(T::query_values).collect()
    }
}

impl<T: QueryValue + ?Sized> QueryValue for &T {
    fn query_values(&self) -> Vec<String> {
        (**self).query_values()
    }
}

/// Caller-supplied values for one request.
///
/// A verbatim `json` body takes precedence over named `field`s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestArgs {
    path: Vec<(String, String)>,
    query: Vec<(String, String)>,
    fields: Map<String, Value>,
    body: Option<Value>,
    headers: Vec<(String, String)>,
}

impl RequestArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, name: &str, value: &str) -> Self {
        self.path.push((name.to_string(), value.to_string()));
        self
    }

    pub fn query(mut self, name: &str, value: impl QueryValue) -> Self {
        for v in value.query_values() {
            self.query.push((name.to_string(), v));
        }
        self
    }

    pub fn field(mut self, name: &str, value: impl Serialize) -> Result<Self, ApiError> {
        self.fields.insert(name.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    fn path_value(&self, name: &str) -> Option<&str> {
        self.path
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

macro_rules! descriptor {
    (@verbatim) => { false };
    (@verbatim $json:ident) => { true };
    (@auth) => { $crate::endpoint::Auth::Bearer };
    (@auth $auth:ident) => { $crate::endpoint::Auth::$auth };
    (
        $name:ident($($p:ident),*) $method:ident $root:ident $path:literal
        [$($qname:literal),*] [$($bname:literal),*] [$($json:ident)?] [$($auth:ident)?]
    ) => {
        $crate::endpoint::EndpointDescriptor {
            name: stringify!($name),
            method: $crate::http::HttpMethod::$method,
            root: $crate::endpoint::Root::$root,
            path: $path,
            path_params: &[$(stringify!($p)),*],
            query: &[$($qname),*],
            body_fields: &[$($bname),*],
            verbatim_body: $crate::endpoint::descriptor!(@verbatim $($json)?),
            auth: $crate::endpoint::descriptor!(@auth $($auth)?),
        }
    };
}

/// Declare table-driven endpoints.
///
/// ```text
/// fn get_asset(asset_id) => Get Organization "assets/{asset_id}";
/// fn list_asset_historical(asset_id) => Get Organization "assets/{asset_id}/historical"
///     query { start_epoch: i64 => "startEpoch", end_epoch: i64 => "endEpoch" };
/// fn update_asset_state(asset_id) => Put Organization "assets/{asset_id}/status"
///     body { status: &str => "status" };
/// fn create_asset() => Post Organization "assets" json metadata;
/// ```
///
/// Path parameters become `&str` arguments, then query, body and verbatim
/// JSON arguments follow in that order.
macro_rules! endpoints {
    ($(
        $(#[$attr:meta])*
        fn $name:ident($($p:ident),* $(,)?) => $method:ident $root:ident $path:literal
            $(query { $($qf:ident: $qty:ty => $qname:literal),* $(,)? })?
            $(body { $($bf:ident: $bty:ty => $bname:literal),* $(,)? })?
            $(json $json:ident)?
            $(auth $auth:ident)?
        ;
    )*) => {
        /// Descriptors of every table-driven endpoint, in declaration order.
        pub const GENERATED: &[$crate::endpoint::EndpointDescriptor] = &[$(
            $crate::endpoint::descriptor!(
                $name($($p),*) $method $root $path
                [$($($qname),*)?] [$($($bname),*)?] [$($json)?] [$($auth)?]
            )
        ),*];

        impl $crate::client::CampbellCloud {
            $(
                $(#[$attr])*
                #[allow(clippy::too_many_arguments)]
                pub fn $name(
                    &self,
                    $($p: &str,)*
                    $($($qf: $qty,)*)?
                    $($($bf: $bty,)*)?
                    $($json: &serde_json::Value,)?
                ) -> Result<$crate::normalize::NormalizedResult, $crate::error::ApiError> {
                    const DESCRIPTOR: $crate::endpoint::EndpointDescriptor = $crate::endpoint::descriptor!(
                        $name($($p),*) $method $root $path
                        [$($($qname),*)?] [$($($bname),*)?] [$($json)?] [$($auth)?]
                    );
                    #[allow(unused_mut)]
                    let mut args = $crate::endpoint::RequestArgs::new();
                    $(args = args.path(stringify!($p), $p);)*
                    $($(args = args.query($qname, $qf);)*)?
                    $($(args = args.field($bname, &$bf)?;)*)?
                    $(args = args.json($json.clone());)?
                    self.request(&DESCRIPTOR, args)
                }
            )*
        }
    };
}

pub(crate) use descriptor;
pub(crate) use endpoints;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URLS_HOST: &str = "https://example.test/api/v1/";

    fn urls() -> BaseUrls {
        BaseUrls::new(URLS_HOST, "org-1")
    }

    const HISTORICAL: EndpointDescriptor = descriptor!(
        get_station_historical_by_id(station_id, station_historical_id) Get Organization
        "stations/{station_id}/historical/{station_historical_id}"
        [] [] [] []
    );

    const TOKENS: EndpointDescriptor = descriptor!(
        create_token() Post Tokens "" [] ["username", "password"] [] [Anonymous]
    );

    #[test]
    fn base_urls_strip_trailing_slash() {
        let urls = urls();
        assert_eq!(urls.root(Root::Organization), "https://example.test/api/v1/organizations/org-1");
        assert_eq!(urls.root(Root::Organizations), "https://example.test/api/v1/organizations");
        assert_eq!(urls.root(Root::Libraries), "https://example.test/api/v1/libraries");
        assert_eq!(urls.root(Root::Tokens), "https://example.test/api/v1/tokens");
        assert_eq!(
            urls.root(Root::ProductRegistrations),
            "https://example.test/api/v1/product-registrations"
        );
    }

    #[test]
    fn placeholders_are_listed_in_order() {
        assert_eq!(HISTORICAL.placeholders(), vec!["station_id", "station_historical_id"]);
        assert!(TOKENS.placeholders().is_empty());
    }

    #[test]
    fn build_substitutes_path_and_attaches_bearer() {
        let args = RequestArgs::new()
            .path("station_historical_id", "h9")
            .path("station_id", "s1");
        let req = HISTORICAL.build(&urls(), &args, Some("Bearer tok")).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "https://example.test/api/v1/organizations/org-1/stations/s1/historical/h9"
        );
        assert_eq!(req.headers, vec![("Authorization".to_string(), "Bearer tok".to_string())]);
        assert!(req.body.is_none());
    }

    #[test]
    fn build_rejects_missing_or_empty_path_argument() {
        let args = RequestArgs::new().path("station_id", "s1");
        let err = HISTORICAL.build(&urls(), &args, Some("Bearer tok")).unwrap_err();
        assert!(matches!(
            err,
            ApiError::MissingPathArgument { endpoint: "get_station_historical_by_id", ref name }
                if name == "station_historical_id"
        ));

        let args = RequestArgs::new().path("station_id", "").path("station_historical_id", "h9");
        let err = HISTORICAL.build(&urls(), &args, Some("Bearer tok")).unwrap_err();
        assert!(matches!(err, ApiError::MissingPathArgument { ref name, .. } if name == "station_id"));
    }

    #[test]
    fn anonymous_endpoint_never_sends_authorization() {
        let args = RequestArgs::new()
            .field("username", "u")
            .unwrap()
            .field("password", "p")
            .unwrap();
        let req = TOKENS.build(&urls(), &args, Some("Bearer tok")).unwrap();
        assert_eq!(req.url, "https://example.test/api/v1/tokens");
        assert!(req.header("authorization").is_none());
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"username": "u", "password": "p"}));
    }

    #[test]
    fn verbatim_body_wins_over_fields() {
        let args = RequestArgs::new()
            .field("ignored", 1)
            .unwrap()
            .json(json!({"name": "Station 4"}));
        let req = TOKENS.build(&urls(), &args, None).unwrap();
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"name": "Station 4"}));
    }

    #[test]
    fn query_values_expand_options_slices_and_booleans() {
        let aliases = vec!["air_temp".to_string(), "rh".to_string()];
        let args = RequestArgs::new()
            .query("aliases", aliases.as_slice())
            .query("startEpoch", 10_i64)
            .query("brief", true)
            .query("stationId", None::<&str>)
            .query("assetId", Some("a1"));
        let req = HISTORICAL
            .build(&urls(), &args.path("station_id", "s").path("station_historical_id", "h"), None)
            .unwrap();
        let pairs: Vec<(&str, &str)> = req.query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(
            pairs,
            vec![
                ("aliases", "air_temp"),
                ("aliases", "rh"),
                ("startEpoch", "10"),
                ("brief", "True"),
                ("assetId", "a1"),
            ]
        );
    }

    #[test]
    fn extra_headers_follow_authorization() {
        let args = RequestArgs::new()
            .path("station_id", "s")
            .path("station_historical_id", "h")
            .header("x-campbell-software-type", "datalogger-os");
        let req = HISTORICAL.build(&urls(), &args, Some("Bearer tok")).unwrap();
        assert_eq!(req.headers[0].0, "Authorization");
        assert_eq!(req.header("x-campbell-software-type"), Some("datalogger-os"));
    }
}
