//! Identity resolver

use serde::Deserialize;
use std::sync::Arc;
use url::Url;

use frontpage_xrpc::{HttpRequest, HttpTransport};

use crate::error::IdentityError;
use crate::handle::strip_trailing_slashes;
use crate::Result;

pub const DEFAULT_RESOLVE_HANDLE_ENDPOINT: &str =
    "https://public.api.bsky.app/xrpc/com.atproto.identity.resolveHandle";
pub const DEFAULT_PLC_DIRECTORY: &str = "https://plc.directory";
pub const PDS_SERVICE_TYPE: &str = "AtprotoPersonalDataServer";

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Full URL of a `com.atproto.identity.resolveHandle` endpoint
    pub resolve_handle_endpoint: String,
    /// Base URL of the PLC directory
    pub plc_directory_url: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            resolve_handle_endpoint: DEFAULT_RESOLVE_HANDLE_ENDPOINT.to_string(),
            plc_directory_url: DEFAULT_PLC_DIRECTORY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub did: String,
    /// Home server base URL, without trailing slash
    pub pds: String,
}

#[derive(Deserialize)]
struct ResolveHandleOutput {
    did: Option<String>,
}

pub struct IdentityResolver {
    transport: Arc<dyn HttpTransport>,
    config: ResolverConfig,
}

impl IdentityResolver {
    pub fn new(transport: Arc<dyn HttpTransport>, config: ResolverConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve a handle to its DID.
    pub async fn resolve_handle(&self, handle: &str) -> Result<String> {
        let mut url = Url::parse(&self.config.resolve_handle_endpoint)
            .map_err(|_| IdentityError::InvalidEndpoint(self.config.resolve_handle_endpoint.clone()))?;
        url.query_pairs_mut().append_pair("handle", handle);

        let response = self.transport.send(HttpRequest::get(url.as_str())).await?;
        if !response.is_success() {
            return Err(IdentityError::HandleStatus(response.status));
        }

        let output: ResolveHandleOutput =
            response.json().map_err(|source| IdentityError::Malformed {
                what: "handle resolution",
                source,
            })?;

        let did = output
            .did
            .filter(|d| !d.trim().is_empty())
            .ok_or(IdentityError::MissingDid)?;

        tracing::debug!(handle = %handle, did = %did, "Resolved handle");
        Ok(did)
    }

    /// Look up the personal data server advertised in the DID document.
    pub async fn lookup_home_server(&self, did: &str) -> Result<String> {
        let url = self.document_url(did)?;

        let response = self.transport.send(HttpRequest::get(url)).await?;
        if !response.is_success() {
            return Err(IdentityError::DocumentStatus(response.status));
        }

        let document: serde_json::Value =
            response.json().map_err(|source| IdentityError::Malformed {
                what: "DID document",
                source,
            })?;

        let pds = pds_endpoint(&document)
            .ok_or_else(|| IdentityError::NoPersonalDataServer(did.to_string()))?;

        tracing::debug!(did = %did, pds = %pds, "Found personal data server");
        Ok(pds)
    }

    pub async fn resolve_home_server(&self, handle: &str) -> Result<ResolvedIdentity> {
        let did = self.resolve_handle(handle).await?;
        let pds = self.lookup_home_server(&did).await?;
        Ok(ResolvedIdentity { did, pds })
    }

    fn document_url(&self, did: &str) -> Result<String> {
        if did.starts_with("did:plc:") {
            let encoded: String = url::form_urlencoded::byte_serialize(did.as_bytes()).collect();
            return Ok(format!(
                "{}/{}",
                strip_trailing_slashes(&self.config.plc_directory_url),
                encoded
            ));
        }

        if let Some(host) = did.strip_prefix("did:web:") {
            // Ports are percent-encoded in did:web identifiers
            let host = host.replace("%3A", ":").replace("%3a", ":");
            if host.is_empty() || host.matches(':').count() > 1 {
                return Err(IdentityError::UnsupportedDid(did.to_string()));
            }
            return Ok(format!("https://{host}/.well-known/did.json"));
        }

        Err(IdentityError::UnsupportedDid(did.to_string()))
    }
}

impl Clone for IdentityResolver {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: self.config.clone(),
        }
    }
}

/// First `AtprotoPersonalDataServer` service entry with an endpoint.
fn pds_endpoint(document: &serde_json::Value) -> Option<String> {
    document
        .get("service")?
        .as_array()?
        .iter()
        .filter(|s| s.get("type").and_then(|t| t.as_str()) == Some(PDS_SERVICE_TYPE))
        .filter_map(|s| s.get("serviceEndpoint").and_then(|e| e.as_str()))
        .map(|e| strip_trailing_slashes(e.trim()).to_string())
        .find(|e| !e.is_empty())
}
