//! Purpose: Blocking HTTP/JSON transport for the Databricks REST API.
//! Exports: `DatabricksClient`, `ApiResult`.
//! Role: Owns base URL, bearer token and agent; every resource wrapper borrows it.
//! Invariants: One request per call; no retry, no pagination, no rate limiting.
//! Invariants: Databricks error envelopes map to `ErrorKind` by `error_code`, then by status.
//! Invariants: Undecodable success bodies are `Format` errors, transport failures are `Io`.
#![allow(clippy::result_large_err)]

use super::clusters::ClustersApi;
use super::dbfs::DbfsApi;
use super::jobs::JobsApi;
use super::libraries::LibrariesApi;
use super::permissions::PermissionsApi;
use super::secrets::SecretsApi;
use super::unity_catalog::{
    CatalogsApi, ConnectionsApi, GrantsApi, LineageApi, SchemasApi, SharesApi,
    StorageCredentialsApi, TablesApi, VolumesApi, WorkspaceBindingsApi,
};
use crate::core::error::{Error, ErrorKind};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub type ApiResult<T> = Result<T, Error>;

#[derive(Clone)]
pub struct DatabricksClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    base_url: Url,
    token: Option<String>,
    agent: ureq::Agent,
}

/// Path plus query string of one API call.
///
/// Fixed path pieces are split on `/`; dynamic segments added with
/// [`Endpoint::segment`] are percent-encoded as single path segments, so
/// dotted Unity Catalog names and DBFS-like strings survive intact.
#[derive(Clone, Debug)]
pub(crate) struct Endpoint {
    segments: Vec<String>,
    query: Vec<(&'static str, String)>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error_code: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl Endpoint {
    pub(crate) fn new(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|piece| !piece.is_empty())
                .map(str::to_string)
                .collect(),
            query: Vec::new(),
        }
    }

    pub(crate) fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub(crate) fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    pub(crate) fn query_opt<V: ToString>(self, key: &'static str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    /// `true` is sent, `false` is left to the server default.
    pub(crate) fn query_flag(self, key: &'static str, enabled: bool) -> Self {
        if enabled { self.query(key, true) } else { self }
    }

    fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

impl DatabricksClient {
    /// Accepts `https://<workspace>`, `http://<host>` or a bare workspace host.
    pub fn new(host: impl Into<String>) -> ApiResult<Self> {
        let base_url = normalize_base_url(host.into())?;
        let agent = ureq::AgentBuilder::new().build();
        Ok(Self {
            inner: Arc::new(ClientInner {
                base_url,
                token: None,
                agent,
            }),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.token = Some(token.into());
        } else {
            self.inner = Arc::new(ClientInner {
                base_url: self.inner.base_url.clone(),
                token: Some(token.into()),
                agent: self.inner.agent.clone(),
            });
        }
        self
    }

    /// Overall per-request timeout (connect + read + write).
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        self.with_agent(agent)
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn clusters(&self) -> ClustersApi<'_> {
        ClustersApi::new(self)
    }

    pub fn libraries(&self) -> LibrariesApi<'_> {
        LibrariesApi::new(self)
    }

    pub fn jobs(&self) -> JobsApi<'_> {
        JobsApi::new(self)
    }

    pub fn dbfs(&self) -> DbfsApi<'_> {
        DbfsApi::new(self)
    }

    pub fn secrets(&self) -> SecretsApi<'_> {
        SecretsApi::new(self)
    }

    pub fn permissions(&self) -> PermissionsApi<'_> {
        PermissionsApi::new(self)
    }

    pub fn catalogs(&self) -> CatalogsApi<'_> {
        CatalogsApi::new(self)
    }

    pub fn schemas(&self) -> SchemasApi<'_> {
        SchemasApi::new(self)
    }

    pub fn tables(&self) -> TablesApi<'_> {
        TablesApi::new(self)
    }

    pub fn volumes(&self) -> VolumesApi<'_> {
        VolumesApi::new(self)
    }

    pub fn connections(&self) -> ConnectionsApi<'_> {
        ConnectionsApi::new(self)
    }

    pub fn shares(&self) -> SharesApi<'_> {
        SharesApi::new(self)
    }

    pub fn storage_credentials(&self) -> StorageCredentialsApi<'_> {
        StorageCredentialsApi::new(self)
    }

    pub fn workspace_bindings(&self) -> WorkspaceBindingsApi<'_> {
        WorkspaceBindingsApi::new(self)
    }

    pub fn grants(&self) -> GrantsApi<'_> {
        GrantsApi::new(self)
    }

    pub fn lineage(&self) -> LineageApi<'_> {
        LineageApi::new(self)
    }

    pub(crate) fn get<R: DeserializeOwned>(&self, endpoint: Endpoint) -> ApiResult<R> {
        self.send::<(), R>("GET", endpoint, None)
    }

    pub(crate) fn delete<R: DeserializeOwned>(&self, endpoint: Endpoint) -> ApiResult<R> {
        self.send::<(), R>("DELETE", endpoint, None)
    }

    pub(crate) fn delete_unit(&self, endpoint: Endpoint) -> ApiResult<()> {
        self.delete::<IgnoredAny>(endpoint).map(|_| ())
    }

    pub(crate) fn post<B, R>(&self, endpoint: Endpoint, body: &B) -> ApiResult<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        self.send("POST", endpoint, Some(body))
    }

    pub(crate) fn post_unit<B: Serialize>(&self, endpoint: Endpoint, body: &B) -> ApiResult<()> {
        self.post::<B, IgnoredAny>(endpoint, body).map(|_| ())
    }

    pub(crate) fn patch<B, R>(&self, endpoint: Endpoint, body: &B) -> ApiResult<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        self.send("PATCH", endpoint, Some(body))
    }

    pub(crate) fn patch_unit<B: Serialize>(&self, endpoint: Endpoint, body: &B) -> ApiResult<()> {
        self.patch::<B, IgnoredAny>(endpoint, body).map(|_| ())
    }

    pub(crate) fn put<B, R>(&self, endpoint: Endpoint, body: &B) -> ApiResult<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        self.send("PUT", endpoint, Some(body))
    }

    fn send<B, R>(&self, method: &str, endpoint: Endpoint, body: Option<&B>) -> ApiResult<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let path = endpoint.path();
        let url = self.endpoint_url(&endpoint)?;
        tracing::debug!(method, endpoint = %path, "databricks request");

        let request = self.request(method, &url).set("Accept", "application/json");
        let response = match body {
            None => request.call(),
            Some(body) => {
                let payload = serde_json::to_string(body).map_err(|err| {
                    Error::new(ErrorKind::Internal)
                        .with_message("failed to encode request json")
                        .with_endpoint(path.clone())
                        .with_source(err)
                })?;
                tracing::trace!(bytes = payload.len(), "request body");
                request
                    .set("Content-Type", "application/json")
                    .send_string(&payload)
            }
        };

        match response {
            Ok(resp) => {
                tracing::debug!(status = resp.status(), endpoint = %path, "databricks response");
                read_json_response(resp, &path)
            }
            Err(ureq::Error::Status(code, resp)) => {
                tracing::debug!(status = code, endpoint = %path, "databricks error response");
                Err(parse_error_response(code, resp, &path))
            }
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Io)
                .with_message("request failed")
                .with_endpoint(path)
                .with_source(err)),
        }
    }

    fn request(&self, method: &str, url: &Url) -> ureq::Request {
        let mut request = self.inner.agent.request(method, url.as_str());
        if let Some(token) = &self.inner.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }
        request
    }

    fn endpoint_url(&self, endpoint: &Endpoint) -> ApiResult<Url> {
        let mut url = self.inner.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                Error::new(ErrorKind::Usage).with_message("workspace url cannot be a base")
            })?;
            path.clear();
            for segment in &endpoint.segments {
                path.push(segment);
            }
        }
        if !endpoint.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &endpoint.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn with_agent(mut self, agent: ureq::Agent) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.agent = agent;
        } else {
            self.inner = Arc::new(ClientInner {
                base_url: self.inner.base_url.clone(),
                token: self.inner.token.clone(),
                agent,
            });
        }
        self
    }
}

impl fmt::Debug for DatabricksClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabricksClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("token", &self.inner.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn normalize_base_url(raw: String) -> ApiResult<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("workspace host is empty")
            .with_hint(
                "Pass --host or set DATABRICKS_HOST, e.g. https://adb-123.4.azuredatabricks.net.",
            ));
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let mut url = Url::parse(&candidate).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("invalid workspace url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("workspace url must use http or https scheme"));
    }
    if url.path() != "/" && !url.path().is_empty() {
        return Err(
            Error::new(ErrorKind::Usage).with_message("workspace url must not include a path")
        );
    }
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn read_json_response<R>(response: ureq::Response, endpoint: &str) -> ApiResult<R>
where
    R: DeserializeOwned,
{
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read response body")
            .with_endpoint(endpoint)
            .with_source(err)
    })?;
    let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
    serde_json::from_str(body).map_err(|err| {
        Error::new(ErrorKind::Format)
            .with_message("invalid response json")
            .with_endpoint(endpoint)
            .with_source(err)
    })
}

fn parse_error_response(status: u16, response: ureq::Response, endpoint: &str) -> Error {
    let body = response.into_string().unwrap_or_default();
    let envelope = serde_json::from_str::<ErrorEnvelope>(&body).ok();
    let error_code = envelope.as_ref().and_then(|env| env.error_code.clone());
    let message = envelope
        .and_then(|env| env.message.or(env.error))
        .unwrap_or_else(|| format!("remote error status {status}"));

    let kind = error_code
        .as_deref()
        .and_then(error_kind_from_code)
        .unwrap_or_else(|| error_kind_from_status(status));
    let mut err = Error::new(kind)
        .with_message(message)
        .with_status(status)
        .with_endpoint(endpoint);
    if let Some(code) = error_code {
        err = err.with_error_code(code);
    }
    if kind == ErrorKind::Permission {
        err = err.with_hint(
            "Check the token (--token, DATABRICKS_TOKEN) and its workspace permissions.",
        );
    }
    err
}

fn error_kind_from_code(code: &str) -> Option<ErrorKind> {
    let kind = match code {
        "RESOURCE_DOES_NOT_EXIST" | "NOT_FOUND" => ErrorKind::NotFound,
        "RESOURCE_ALREADY_EXISTS" | "ALREADY_EXISTS" => ErrorKind::AlreadyExists,
        "PERMISSION_DENIED" | "UNAUTHENTICATED" => ErrorKind::Permission,
        "INVALID_PARAMETER_VALUE" | "BAD_REQUEST" | "MALFORMED_REQUEST" | "INVALID_STATE" => {
            ErrorKind::Usage
        }
        "REQUEST_LIMIT_EXCEEDED" | "TEMPORARILY_UNAVAILABLE" | "RESOURCE_EXHAUSTED" => {
            ErrorKind::Busy
        }
        _ => return None,
    };
    Some(kind)
}

fn error_kind_from_status(status: u16) -> ErrorKind {
    match status {
        400 => ErrorKind::Usage,
        401 | 403 => ErrorKind::Permission,
        404 => ErrorKind::NotFound,
        409 => ErrorKind::AlreadyExists,
        429 => ErrorKind::Busy,
        500..=599 => ErrorKind::Remote,
        _ => ErrorKind::Io,
    }
}
