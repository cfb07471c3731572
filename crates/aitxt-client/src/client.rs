//! HTTP discovery of site policies.

use crate::cache::{cache_ttl, CacheEntry, ResponseCache};
use crate::config::ClientConfig;
use crate::error::ClientError;
use aitxt::{parse_as, Format, ParseResult, PolicyField};
use aitxt_policy::{can_access, AccessResult};
use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use std::time::Instant;
use tracing::debug;

/// A fetched and parsed policy document
#[derive(Debug, Clone, Serialize)]
pub struct Discovery {
    /// URL the document was fetched from
    pub url: String,
    pub format: Format,
    pub result: ParseResult,
}

pub struct AiTxtClient {
    http: Client,
    config: ClientConfig,
    cache: ResponseCache,
}

impl AiTxtClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::http("<client>", e))?;

        Ok(Self {
            http,
            config,
            cache: ResponseCache::default(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Find a site's policy: `/ai.json` first, then `/ai.txt`
    ///
    /// Any path in `site_url` is ignored; discovery always starts at the
    /// origin. When both locations fail, the `/ai.txt` error is returned.
    pub async fn discover(&self, site_url: &str) -> Result<Discovery, ClientError> {
        let origin = origin_of(site_url)?;

        let json_url = format!("{}/ai.json", origin);
        match self.fetch(&json_url).await {
            Ok(found) if found.result.success => return Ok(found),
            Ok(found) => debug!(
                url = %json_url,
                errors = found.result.errors.len(),
                "ai.json did not parse, trying ai.txt"
            ),
            Err(e) => debug!(url = %json_url, error = %e, "ai.json unavailable, trying ai.txt"),
        }

        self.fetch(&format!("{}/ai.txt", origin)).await
    }

    /// Fetch and parse one policy document
    ///
    /// The format follows the URL suffix, falling back to content
    /// detection. Fresh cache entries are served without a request; stale
    /// ones are revalidated with their ETag.
    pub async fn fetch(&self, url: &str) -> Result<Discovery, ClientError> {
        let parsed = Url::parse(url).map_err(|e| ClientError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let cached = self.cache.get(url);
        if let Some(entry) = cached.as_ref().filter(|e| e.is_fresh(Instant::now())) {
            debug!(url, "policy cache hit");
            return Ok(entry.discovery.clone());
        }

        let mut request = self.http.get(parsed.clone());
        if let Some(etag) = cached.as_ref().and_then(|e| e.etag.as_deref()) {
            debug!(url, etag, "revalidating cached policy");
            request = request.header(IF_NONE_MATCH, etag);
        }

        let mut response = request
            .send()
            .await
            .map_err(|e| ClientError::http(url, e))?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            if let Some(entry) = cached {
                match cache_ttl(response.headers(), self.config.default_ttl) {
                    Some(ttl) => self.cache.refresh(url, Instant::now() + ttl),
                    None => self.cache.remove(url),
                }
                debug!(url, "cached policy not modified");
                return Ok(entry.discovery);
            }
        }

        if !status.is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let limit = self.config.max_body_bytes;
        if response.content_length().map_or(false, |len| len > limit as u64) {
            return Err(ClientError::TooLarge {
                url: url.to_string(),
                limit,
            });
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let ttl = cache_ttl(response.headers(), self.config.default_ttl);

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| ClientError::http(url, e))? {
            if body.len() + chunk.len() > limit {
                return Err(ClientError::TooLarge {
                    url: url.to_string(),
                    limit,
                });
            }
            body.extend_from_slice(&chunk);
        }
        let body = String::from_utf8_lossy(&body);

        let format = format_for(&parsed, &body);
        let discovery = Discovery {
            url: url.to_string(),
            format,
            result: parse_as(&body, format),
        };
        debug!(
            url,
            %format,
            success = discovery.result.success,
            bytes = body.len(),
            "fetched policy"
        );

        match ttl {
            Some(ttl) if discovery.result.success => self.cache.insert(
                url,
                CacheEntry {
                    discovery: discovery.clone(),
                    etag,
                    expires_at: Instant::now() + ttl,
                },
            ),
            _ => self.cache.remove(url),
        }

        Ok(discovery)
    }

    /// Discover a site's policy and decide one access question
    pub async fn check_access(
        &self,
        site_url: &str,
        agent: &str,
        field: PolicyField,
        path: Option<&str>,
    ) -> Result<AccessResult, ClientError> {
        let discovery = self.discover(site_url).await?;
        let url = discovery.url;
        let doc = discovery
            .result
            .into_result()
            .map_err(|errors| ClientError::Parse {
                url,
                errors: errors.iter().map(ToString::to_string).collect(),
            })?;
        Ok(can_access(&doc, agent, field, path))
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Number of cached documents, fresh or stale
    pub fn cached_documents(&self) -> usize {
        self.cache.len()
    }
}

/// Scheme, host and port of `site_url`
fn origin_of(site_url: &str) -> Result<String, ClientError> {
    let invalid = |reason: String| ClientError::InvalidUrl {
        url: site_url.to_string(),
        reason,
    };

    let url = Url::parse(site_url.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url.origin().ascii_serialization())
}

fn format_for(url: &Url, body: &str) -> Format {
    let path = url.path().to_ascii_lowercase();
    if path.ends_with(".json") {
        Format::Json
    } else if path.ends_with(".txt") {
        Format::Text
    } else {
        Format::detect(body)
    }
}
