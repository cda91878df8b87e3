//! Read-only HTTP client for the public plugin registry.
//!
//! One persistent `reqwest` client with pooled connections; parsed
//! responses are cached in the shared [`TtlCache`], and every registry
//! refresh rebuilds the [`SearchIndex`] and publishes it as a new
//! snapshot.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Deserialize;

use crate::cache::TtlCache;
use crate::kernel::constants;
use crate::registry::error::RegistryError;
use crate::registry::index::SearchIndex;
use crate::registry::metadata::{PluginMetadata, PluginRegistry};
use crate::security::validate_plugin_name;

/// Cache keys.
const KEY_REGISTRY: &str = "registry:full";

/// Cached value shapes, one per endpoint family.
#[derive(Clone)]
enum CacheValue {
    Registry(Arc<PluginRegistry>),
    Plugin(Arc<PluginMetadata>),
    Search(Arc<Vec<PluginMetadata>>),
}

/// Connection and caching knobs for the registry client.
#[derive(Debug, Clone)]
pub struct RegistryClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: Duration,
    /// TTL for cached parsed responses.
    pub cache_ttl: Duration,
}

impl Default for RegistryClientConfig {
    fn default() -> Self {
        Self {
            base_url: constants::DEFAULT_REGISTRY_URL.to_string(),
            timeout: Duration::from_secs(constants::DEFAULT_HTTP_TIMEOUT_SECS),
            user_agent: format!("{}/{}", constants::APP_NAME, constants::APP_VERSION),
            pool_max_idle_per_host: 2,
            pool_idle_timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(5 * 60),
        }
    }
}

/// Error body the registry sends with non-2xx responses.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
    cache: TtlCache<CacheValue>,
    index: RwLock<Arc<SearchIndex>>,
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl RegistryClient {
    /// Build a client with its persistent connection pool. Must be called
    /// within a tokio runtime (the response cache spawns its sweeper).
    pub fn new(config: RegistryClientConfig) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache: TtlCache::new(config.cache_ttl),
            index: RwLock::new(Arc::new(SearchIndex::default())),
        })
    }

    /// The currently published search index snapshot.
    pub fn index(&self) -> Arc<SearchIndex> {
        self.index
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Close the response cache. Subsequent calls hit the network.
    pub fn close(&self) {
        self.cache.close();
    }

    /// Response-cache counters, for the wizard's system overview.
    pub fn cache_metrics(&self) -> crate::cache::CacheMetrics {
        self.cache.metrics()
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, RegistryError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| body.trim().to_string());
            return Err(RegistryError::Http {
                status: status.as_u16(),
                message,
            });
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Fetch the full registry snapshot, from cache when fresh. A network
    /// fetch rebuilds and republishes the search index.
    pub async fn get_registry(&self) -> Result<Arc<PluginRegistry>, RegistryError> {
        if let Some(CacheValue::Registry(registry)) = self.cache.get(KEY_REGISTRY) {
            return Ok(registry);
        }

        let registry: PluginRegistry =
            self.get_json(constants::REGISTRY_API_REGISTRY).await?;
        let registry = Arc::new(registry);

        let snapshot = Arc::new(SearchIndex::build(&registry));
        if let Ok(mut guard) = self.index.write() {
            *guard = snapshot;
        }
        self.cache
            .set(KEY_REGISTRY, CacheValue::Registry(registry.clone()));
        log::debug!(
            "Registry refreshed: {} plugins, last updated {}",
            registry.plugins.len(),
            registry.last_updated
        );
        Ok(registry)
    }

    /// Fetch one plugin's metadata by name.
    pub async fn get_plugin(&self, name: &str) -> Result<Arc<PluginMetadata>, RegistryError> {
        validate_plugin_name(name)?;

        let key = format!("plugin:{}", name);
        if let Some(CacheValue::Plugin(plugin)) = self.cache.get(&key) {
            return Ok(plugin);
        }

        let path = format!("{}/{}", constants::REGISTRY_API_PLUGINS, name);
        let plugin: PluginMetadata = match self.get_json(&path).await {
            Ok(plugin) => plugin,
            Err(RegistryError::Http { status: 404, .. }) => {
                return Err(RegistryError::PluginNotFound {
                    name: name.to_string(),
                })
            }
            Err(err) => return Err(err),
        };
        let plugin = Arc::new(plugin);
        self.cache.set(key, CacheValue::Plugin(plugin.clone()));
        Ok(plugin)
    }

    /// Search plugins by free-text query and tags. Results come from the
    /// published index snapshot; the registry is fetched first if no
    /// snapshot exists yet.
    pub async fn search_plugins(
        &self,
        query: &str,
        tags: &[String],
        limit: usize,
    ) -> Result<Vec<PluginMetadata>, RegistryError> {
        let key = format!("search:{}:{}:{}", query.to_lowercase(), tags.join(","), limit);
        if let Some(CacheValue::Search(results)) = self.cache.get(&key) {
            return Ok(results.as_ref().clone());
        }

        if self.index().is_empty() {
            self.get_registry().await?;
        }
        let results = self.index().search(query, tags, limit);
        self.cache
            .set(key, CacheValue::Search(Arc::new(results.clone())));
        Ok(results)
    }
}
