//! The request pipeline every backend call goes through.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;

use crate::base::BaseAddress;
use crate::cache::{CachePolicy, ResponseCache, cache_key};
use crate::classify::{self, Failure};
use crate::credentials::CredentialStore;
use crate::error::{ErrorKind, ErrorRecord};
use crate::normalize;
use crate::rewrite::MediaRewriter;
use crate::transport::{Method, OutboundRequest, ReqwestTransport, Transport, TransportError};

/// How a read interacts with the response cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheMode {
    /// Serve a live entry if present; store the response otherwise.
    #[default]
    Use,
    /// Skip the lookup but store the response (re-fetch after a mutation).
    Refresh,
    /// Neither read nor write the cache.
    Bypass,
}

/// Per-call options: query parameters, JSON body, cache mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub params: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub cache: CacheMode,
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for a read that must reach the network.
    #[must_use]
    pub fn fresh() -> Self {
        Self {
            cache: CacheMode::Refresh,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn params(mut self, params: BTreeMap<String, String>) -> Self {
        self.params.extend(params);
        self
    }

    #[must_use]
    pub const fn cache(mut self, mode: CacheMode) -> Self {
        self.cache = mode;
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns a `Validation` [`ErrorRecord`] if `body` cannot be encoded.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ErrorRecord> {
        let value = serde_json::to_value(body).map_err(|e| {
            classify::invalid_payload(format!("Could not encode request body: {e}"))
        })?;
        self.body = Some(value);
        Ok(self)
    }
}

pub struct RequestPipeline {
    transport: Arc<dyn Transport>,
    base: BaseAddress,
    cache: Arc<ResponseCache>,
    credentials: Arc<dyn CredentialStore>,
    rewriter: Option<MediaRewriter>,
}

impl RequestPipeline {
    /// A pipeline with a default cache and no media rewriting.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        base: BaseAddress,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            transport,
            base,
            cache: Arc::new(ResponseCache::default()),
            credentials,
            rewriter: None,
        }
    }

    /// The production pipeline: `reqwest` transport with the configured
    /// timeout, the process-wide base address, cache policy and media
    /// rewriting from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the HTTP client cannot be built.
    pub fn from_config(
        config: &alms_config::AlmsConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(Duration::from_secs(config.api.timeout_secs))?;
        let base = BaseAddress::process_wide(&config.api).clone();
        let rewriter = MediaRewriter::for_base(&config.api, &base);
        Ok(Self::new(Arc::new(transport), base, credentials)
            .with_cache(Arc::new(ResponseCache::new(CachePolicy::from(&config.cache))))
            .with_rewriter(rewriter))
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn with_rewriter(mut self, rewriter: Option<MediaRewriter>) -> Self {
        self.rewriter = rewriter;
        self
    }

    #[must_use]
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    #[must_use]
    pub const fn base(&self) -> &BaseAddress {
        &self.base
    }

    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn get(&self, path: &str) -> Result<Value, ErrorRecord> {
        self.send(Method::Get, path, RequestOptions::new()).await
    }

    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn get_with(&self, path: &str, options: RequestOptions) -> Result<Value, ErrorRecord> {
        self.send(Method::Get, path, options).await
    }

    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call, or a
    /// `Validation` record if `body` cannot be encoded.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Value, ErrorRecord> {
        self.send(Method::Post, path, RequestOptions::new().json(body)?)
            .await
    }

    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call, or a
    /// `Validation` record if `body` cannot be encoded.
    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ErrorRecord> {
        self.send(Method::Put, path, RequestOptions::new().json(body)?)
            .await
    }

    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call, or a
    /// `Validation` record if `body` cannot be encoded.
    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Value, ErrorRecord> {
        self.send(Method::Patch, path, RequestOptions::new().json(body)?)
            .await
    }

    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn delete(&self, path: &str) -> Result<Value, ErrorRecord> {
        self.send(Method::Delete, path, RequestOptions::new()).await
    }

    /// Send one call through the pipeline.
    ///
    /// GETs consult the cache first (per `options.cache`); successful
    /// responses have media URLs rewritten and GET responses are cached.
    /// Failures are classified; an `Auth` failure also clears the stored
    /// token.
    ///
    /// # Errors
    ///
    /// Returns the classified [`ErrorRecord`] of a failed call.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Value, ErrorRecord> {
        let started = Instant::now();
        let is_read = method == Method::Get;
        let key = cache_key(path, &options.params);

        if is_read
            && options.cache == CacheMode::Use
            && let Some(hit) = self.cache.get(&key)
        {
            tracing::debug!(method = method.as_str(), path, "cache hit");
            return Ok(hit);
        }

        let request = OutboundRequest {
            method,
            url: self.base.join(path),
            query: options.params.into_iter().collect(),
            headers: self.auth_headers(),
            body: options.body,
        };

        let failure = match self.transport.send(request).await {
            Err(error) => Failure::NoResponse(error),
            Ok(resp) if !resp.is_success() || normalize::is_error_envelope(&resp.body) => {
                Failure::Rejected {
                    status: resp.status,
                    body: resp.body,
                }
            }
            Ok(resp) => {
                let mut payload = resp.body;
                if let Some(rewriter) = &self.rewriter {
                    rewriter.rewrite(&mut payload);
                }
                if is_read && options.cache != CacheMode::Bypass {
                    self.cache.set(&key, payload.clone());
                }
                tracing::debug!(
                    method = method.as_str(),
                    path,
                    status = resp.status,
                    elapsed_ms = elapsed_ms(started),
                    "request succeeded"
                );
                return Ok(payload);
            }
        };

        let record = classify::classify(&failure);
        if record.kind() == ErrorKind::Auth {
            tracing::warn!(path, status = ?record.status(), "session rejected; clearing stored token");
            self.credentials.clear();
        } else {
            tracing::debug!(
                method = method.as_str(),
                path,
                kind = ?record.kind(),
                status = ?record.status(),
                elapsed_ms = elapsed_ms(started),
                "request failed"
            );
        }
        Err(record)
    }

    /// Headers are rebuilt per call so a cleared token is never reused.
    fn auth_headers(&self) -> Vec<(String, String)> {
        self.credentials
            .token()
            .filter(|token| !token.trim().is_empty())
            .map(|token| vec![("Authorization".to_string(), format!("Bearer {token}"))])
            .unwrap_or_default()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
