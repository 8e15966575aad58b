//! The request dispatch pipeline.

use crate::cache::{fingerprint, CachePolicy, KeyValueStore, MemoryStore, ResponseCache};
use crate::error::{DispatchError, DispatchResult};
use crate::overrides::ResponseOverride;
use crate::rewrite::RewriteEngine;
use crate::throttle::ThrottleGate;
use crate::url::UrlResolver;
use bytes::Bytes;
use courier_common_config::{CourierConfig, RewriteRuleConfig};
use courier_common_http::{
    merge_headers, parse_response, HeaderMap, HttpError, Method, RequestDescriptor, Response,
    Transport,
};
use courier_common_log::spans::{
    dispatch_span, instrument_future, record_error, transport_span, Timer,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Sends requests through override, cache, rewrite, throttle and transport.
///
/// Cheap to share behind an `Arc`; concurrent dispatches are serialized only
/// at the throttle gate.
pub struct RequestDispatcher {
    transport: Arc<dyn Transport>,
    cache: ResponseCache,
    rewrite: RewriteEngine,
    throttle: ThrottleGate,
    default_headers: HashMap<String, String>,
    override_hook: Option<Arc<dyn ResponseOverride>>,
    resolver: Option<UrlResolver>,
}

impl RequestDispatcher {
    /// Start building a dispatcher around `transport`.
    pub fn builder(transport: impl Transport + 'static) -> DispatcherBuilder {
        DispatcherBuilder::new(transport)
    }

    /// Resolve every request URL against `base` before dispatching.
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.resolver = Some(UrlResolver::new(base));
        self
    }

    pub fn is_caching(&self) -> bool {
        self.cache.is_enabled()
    }

    pub fn throttle_interval(&self) -> Duration {
        self.throttle.interval()
    }

    pub fn base_url(&self) -> Option<&str> {
        self.resolver.as_ref().map(UrlResolver::base)
    }

    /// Shorthand for a GET without headers.
    pub async fn get(&self, url: impl Into<String>) -> DispatchResult<Response> {
        self.dispatch(RequestDescriptor::get(url)).await
    }

    /// Shorthand for a POST with a payload.
    pub async fn post(
        &self,
        url: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> DispatchResult<Response> {
        self.dispatch(RequestDescriptor::post(url, payload)).await
    }

    /// Dispatch from loose parts.
    pub async fn send(
        &self,
        method: Method,
        url: impl Into<String>,
        payload: Option<Bytes>,
        headers: HeaderMap,
    ) -> DispatchResult<Response> {
        let mut request = RequestDescriptor::new(method, url).headers(headers);
        request.payload = payload;
        self.dispatch(request).await
    }

    /// Dispatch one request.
    ///
    /// With an override installed the override answers and nothing else
    /// runs. Otherwise a cache hit is returned directly; a miss is
    /// rewritten, throttled, sent and, when small enough, cached.
    pub async fn dispatch(&self, request: RequestDescriptor) -> DispatchResult<Response> {
        if request.payload.is_some() && !request.method.carries_body() {
            return Err(DispatchError::InvalidRequest(format!(
                "{} requests cannot carry a payload",
                request.method
            )));
        }

        let request = match &self.resolver {
            Some(resolver) => RequestDescriptor {
                url: resolver.resolve(&request.url),
                ..request
            },
            None => request,
        };

        let span = dispatch_span(request.method.as_str(), &request.url);
        instrument_future(self.run(request), span).await
    }

    async fn run(&self, request: RequestDescriptor) -> DispatchResult<Response> {
        let timer = Timer::start("dispatch");

        if let Some(hook) = &self.override_hook {
            let response = hook.respond(&request).await;
            if let Err(e) = response.validate() {
                record_error(&e);
                return Err(DispatchError::contract(e));
            }
            tracing::debug!(status = response.status(), "answered by override");
            return Ok(response);
        }

        let key = self.cache.is_enabled().then(|| {
            fingerprint(request.method, &request.url, request.payload.as_deref())
        });

        if let Some(key) = &key {
            if let Some(hit) = self.cache.lookup(key).await {
                log_dispatch(request.method, &request.url, &hit, None);
                return Ok(hit);
            }
        }

        let url = self.rewrite.rewrite(&request.url);
        let outbound = RequestDescriptor {
            method: request.method,
            url,
            payload: request.payload,
            headers: merge_headers(&self.default_headers, &request.headers),
        };

        self.throttle.wait().await;

        let response = match self.send_outbound(&outbound).await {
            Ok(response) => response,
            Err(e) => {
                record_error(&e);
                warn!(method = %outbound.method, url = %outbound.url, error = %e, "dispatch failed");
                return Err(e.into());
            }
        };

        if let Some(key) = &key {
            self.cache.store(key, &response).await;
        }

        log_dispatch(outbound.method, &outbound.url, &response, Some(timer.finish()));
        Ok(response)
    }

    async fn send_outbound(&self, outbound: &RequestDescriptor) -> Result<Response, HttpError> {
        let span = transport_span(outbound.method.as_str(), &outbound.url);
        let raw = instrument_future(self.transport.execute(outbound), span).await?;
        Ok(parse_response(raw)?)
    }
}

/// Emit the per-dispatch record. `elapsed` is `None` for cache hits.
fn log_dispatch(method: Method, url: &str, response: &Response, elapsed: Option<Duration>) {
    let content_type = response.content_type().unwrap_or("");
    let bytes = response.body().len();

    match elapsed {
        Some(elapsed) => info!(
            method = %method,
            url = %url,
            status = response.status(),
            content_type = %content_type,
            bytes = bytes,
            cached = false,
            elapsed_ms = elapsed.as_millis() as u64,
            "dispatched"
        ),
        None => info!(
            method = %method,
            url = %url,
            status = response.status(),
            content_type = %content_type,
            bytes = bytes,
            cached = true,
            elapsed_ms = "cached",
            "dispatched"
        ),
    }
}

/// Builder for [`RequestDispatcher`].
pub struct DispatcherBuilder {
    transport: Arc<dyn Transport>,
    store: Option<Arc<dyn KeyValueStore>>,
    cache_policy: Option<CachePolicy>,
    rewrite: RewriteEngine,
    throttle: Duration,
    default_headers: HashMap<String, String>,
    override_hook: Option<Arc<dyn ResponseOverride>>,
    base_url: Option<String>,
}

impl DispatcherBuilder {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            store: None,
            cache_policy: None,
            rewrite: RewriteEngine::new(),
            throttle: Duration::ZERO,
            default_headers: HashMap::new(),
            override_hook: None,
            base_url: None,
        }
    }

    /// Apply cache, throttle, default header and rewrite settings.
    pub fn config(self, config: &CourierConfig) -> Self {
        self.cache_policy(CachePolicy::from_config(&config.cache))
            .throttle(config.throttle.interval())
            .default_headers(config.http.default_headers.clone())
            .rewrite_rules(&config.rewrite)
    }

    /// Backing store for the response cache. Defaults to a [`MemoryStore`].
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Enable caching with the given TTL and exclusive body size limit.
    pub fn cache(self, ttl: Duration, max_size: usize) -> Self {
        self.cache_policy(Some(CachePolicy::new(ttl, max_size)))
    }

    pub fn cache_policy(mut self, policy: Option<CachePolicy>) -> Self {
        self.cache_policy = policy;
        self
    }

    /// Compile and append rewrite rules. Invalid patterns are logged and skipped.
    pub fn rewrite_rules<'a, I>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = &'a RewriteRuleConfig>,
    {
        for rule in RewriteEngine::compile(rules).rules() {
            self.rewrite.push(rule.clone());
        }
        self
    }

    pub fn rewrite_engine(mut self, engine: RewriteEngine) -> Self {
        self.rewrite = engine;
        self
    }

    /// Minimum spacing between outbound requests; zero disables throttling.
    pub fn throttle(mut self, interval: Duration) -> Self {
        self.throttle = interval;
        self
    }

    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    pub fn default_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.default_headers.extend(headers);
        self
    }

    /// Answer every request with `hook` instead of dispatching it.
    pub fn override_with(mut self, hook: impl ResponseOverride + 'static) -> Self {
        self.override_hook = Some(Arc::new(hook));
        self
    }

    pub fn base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = Some(base.into());
        self
    }

    pub fn build(self) -> RequestDispatcher {
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>);

        RequestDispatcher {
            transport: self.transport,
            cache: ResponseCache::new(store, self.cache_policy),
            rewrite: self.rewrite,
            throttle: ThrottleGate::new(self.throttle),
            default_headers: self.default_headers,
            override_hook: self.override_hook,
            resolver: self.base_url.map(UrlResolver::new),
        }
    }
}
