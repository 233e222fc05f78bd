//! HTTP client for the Tessera API.
//!
//! ```no_run
//! # async fn demo() -> tessera_client::ClientResult<()> {
//! use tessera_client::{Client, Worker};
//!
//! let client = Client::new("http://127.0.0.1:12345", "secrettoken")?;
//! let worker = client
//!     .workers()
//!     .create(&Worker {
//!         concurrent_users: 5,
//!         ehs_cluster_id: "c1".into(),
//!         dicom_endpoint: "d1".into(),
//!         ..Default::default()
//!     })
//!     .await?;
//! client.workers().delete(&worker.id).await?;
//! # Ok(())
//! # }
//! ```

use std::marker::PhantomData;

use bytes::Bytes;
use http::{Method, Request, Uri, header};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client as HttpClient;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tessera_core::*;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

const USER_AGENT: &str = concat!("tessera-client/", env!("CARGO_PKG_VERSION"));

/// Header the server checks for the shared secret.
const AUTHENTICATION: &str = "authentication";

/// A pooled connection to one Tessera server.
#[derive(Clone)]
pub struct Client {
    http: HttpClient<HttpConnector, Full<Bytes>>,
    base_url: String,
    token: Option<String>,
}

impl Client {
    /// `base_url` must be `http://host[:port]`, optionally with a path
    /// prefix. An empty `token` sends no credential.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> ClientResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let uri: Uri = base_url
            .parse()
            .map_err(|e: http::uri::InvalidUri| ClientError::InvalidBaseUrl {
                url: base_url.clone(),
                reason: e.to_string(),
            })?;
        if uri.scheme_str() != Some("http") || uri.authority().is_none() {
            return Err(ClientError::InvalidBaseUrl {
                url: base_url,
                reason: "expected http://host[:port]".to_string(),
            });
        }

        let token = token.into();
        Ok(Self {
            http: HttpClient::builder(TokioExecutor::new()).build_http(),
            base_url,
            token: (!token.is_empty()).then_some(token),
        })
    }

    pub fn collection<R: Record>(&self) -> Collection<'_, R> {
        Collection {
            client: self,
            _record: PhantomData,
        }
    }

    pub fn storage_clusters(&self) -> Collection<'_, StorageCluster> {
        self.collection()
    }

    pub fn compute_clusters(&self) -> Collection<'_, ComputeCluster> {
        self.collection()
    }

    pub fn workers(&self) -> Collection<'_, Worker> {
        self.collection()
    }

    pub fn tenant_gateways(&self) -> Collection<'_, TenantGateway> {
        self.collection()
    }

    pub fn speakers(&self) -> Collection<'_, Speaker> {
        self.collection()
    }

    pub fn talks(&self) -> Collection<'_, Talk> {
        self.collection()
    }

    pub fn workshops(&self) -> Collection<'_, Workshop> {
        self.collection()
    }

    async fn send<R: Record>(&self, method: Method, path: &str, body: Option<&R>) -> ClientResult<R> {
        let uri = format!("{}{}", self.base_url, path);
        let payload = match body {
            Some(record) => Bytes::from(serde_json::to_vec(record).map_err(ClientError::Encode)?),
            None => Bytes::new(),
        };

        let mut builder = Request::builder()
            .method(method.clone())
            .uri(&uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, USER_AGENT);
        if let Some(token) = &self.token {
            builder = builder
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(AUTHENTICATION, token.as_str());
        }
        let request = builder.body(Full::new(payload))?;

        debug!(%method, %uri, "sending request");
        let response = self
            .http
            .request(request)
            .await
            .map_err(|e| ClientError::Transport(Box::new(e)))?;
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e: hyper::Error| ClientError::Transport(Box::new(e)))?
            .to_bytes();

        let envelope: Envelope<R> =
            serde_json::from_slice(&body).map_err(|source| ClientError::Decode { status, source })?;
        if !envelope.errors.is_empty() {
            debug!(%status, errors = ?envelope.errors, "request rejected");
            return Err(ClientError::from_response_errors(envelope.errors));
        }
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus(status));
        }
        envelope
            .items
            .into_iter()
            .next()
            .ok_or(ClientError::EmptyResponse)
    }
}

/// Typed CRUD over one collection.
pub struct Collection<'a, R> {
    client: &'a Client,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Collection<'_, R> {
    /// Create a record. The server assigns the ID.
    pub async fn create(&self, input: &R) -> ClientResult<R> {
        let path = format!("/{}", R::COLLECTION);
        self.client.send(Method::POST, &path, Some(input)).await
    }

    pub async fn get(&self, id: &str) -> ClientResult<R> {
        let path = item_path::<R>(id)?;
        self.client.send::<R>(Method::GET, &path, None).await
    }

    /// Replace the record at `id`. The ID inside `input` is ignored.
    pub async fn update(&self, id: &str, input: &R) -> ClientResult<R> {
        let path = item_path::<R>(id)?;
        self.client.send(Method::PUT, &path, Some(input)).await
    }

    /// Delete the record at `id`, returning it as it was.
    pub async fn delete(&self, id: &str) -> ClientResult<R> {
        let path = item_path::<R>(id)?;
        self.client.send::<R>(Method::DELETE, &path, None).await
    }
}

/// `/{collection}/{id}` with the ID escaped into a single path segment.
fn item_path<R: Record>(id: &str) -> ClientResult<String> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ClientError::MissingId);
    }
    Ok(format!("/{}/{}", R::COLLECTION, urlencoding::encode(id)))
}
