//! Client facade
//!
//! [`Client`] composes the registry, request encoding, and the response
//! multiplexer over one engine context. All chains added through a client
//! share that context. The engine is injected explicitly rather than hidden
//! behind a global; for the common embedded case a process-wide shared
//! client is available through [`Client::shared_with`].

use std::sync::{Arc, Once, OnceLock};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::chain::{Chain, ChainId};
use crate::config::ClientConfig;
use crate::engine::Engine;
use crate::error::{LightlinkError, Result};
use crate::jsonrpc::{Request, Response};
use crate::multiplexer::{BufferPolicy, ResponseMultiplexer, ResponseStream};
use crate::registry::ChainRegistry;

static LOG_INIT: Once = Once::new();
static SHARED: OnceLock<Client> = OnceLock::new();

/// Main lightlink client for talking to a light-client engine.
pub struct Client {
    engine: Arc<dyn Engine>,
    registry: ChainRegistry,
    multiplexer: ResponseMultiplexer,
    config: ClientConfig,
}

impl Client {
    /// Create a client over the given engine with default configuration.
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self::with_config(engine, ClientConfig::default())
    }

    /// Create a client over the given engine.
    ///
    /// The first client constructed in the process initializes logging: the
    /// configured level (falling back to the `RUST_LOG` environment
    /// variable) is installed as a `tracing` env-filter and forwarded to the
    /// engine's own logger. Logging is never re-initialized afterwards.
    pub fn with_config(engine: Arc<dyn Engine>, config: ClientConfig) -> Self {
        init_logging(engine.as_ref(), config.log_level.as_deref());
        Self {
            registry: ChainRegistry::new(Arc::clone(&engine)),
            multiplexer: ResponseMultiplexer::new(Arc::clone(&engine)),
            engine,
            config,
        }
    }

    /// The process-wide shared client, created over `engine` on first call.
    ///
    /// Later calls return the same instance and ignore their argument; every
    /// chain registered through it shares one engine context.
    pub fn shared_with(engine: Arc<dyn Engine>) -> &'static Client {
        SHARED.get_or_init(|| Client::new(engine))
    }

    /// The process-wide shared client over the linked smoldot engine.
    #[cfg(feature = "smoldot")]
    pub fn shared() -> &'static Client {
        Self::shared_with(Arc::new(crate::ffi::FfiEngine::new()))
    }

    /// Add a chain to the client, committing engine resources for it.
    ///
    /// See [`ChainRegistry::add`] for the failure modes.
    pub fn add_chain(&self, chain: &Chain) -> Result<ChainId> {
        self.registry.add(chain)
    }

    /// Remove a chain from the client, releasing its engine resources.
    pub fn remove_chain(&self, chain: &Chain) -> Result<()> {
        self.registry.remove(chain)
    }

    /// Whether the chain is registered and its handle is still live
    /// engine-side.
    pub fn is_valid(&self, chain: &Chain) -> bool {
        self.registry.is_valid(chain)
    }

    /// Send a validated JSON-RPC request to a chain.
    ///
    /// Fire-and-forget: responses are consumed separately through
    /// [`response`](Client::response) or [`responses`](Client::responses),
    /// and correlating them with request ids is the caller's concern. Fails
    /// with `NotRegistered` before the engine is touched if the chain
    /// carries no handle.
    pub fn send(&self, request: &Request, chain: &Chain) -> Result<()> {
        let encoded = request.to_json()?;
        let id = chain.id().ok_or(LightlinkError::NotRegistered)?;
        debug!(handle = %id, method = %request.method(), "submitting request");
        self.engine.submit_request(id, &encoded);
        Ok(())
    }

    /// Wait for the next response produced for a chain.
    ///
    /// `Ok(None)` means the engine closed the chain's response queue.
    pub async fn response(&self, chain: &Chain) -> Result<Option<Response>> {
        self.multiplexer.pull(chain).await
    }

    /// Subscribe to a chain's responses as an async stream, buffered under
    /// the client's configured policy.
    pub fn responses(&self, chain: &Chain) -> Result<ResponseStream> {
        self.multiplexer.subscribe(chain, self.config.buffer_policy)
    }

    /// Subscribe with an explicit buffering policy.
    pub fn responses_with_policy(
        &self,
        chain: &Chain,
        policy: BufferPolicy,
    ) -> Result<ResponseStream> {
        self.multiplexer.subscribe(chain, policy)
    }

    /// The client's configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

// Lazy one-time logging setup shared by every client in the process. The
// level travels two ways: into a tracing subscriber for this crate and into
// the engine's own logger.
fn init_logging(engine: &dyn Engine, configured: Option<&str>) {
    LOG_INIT.call_once(|| {
        let level = configured
            .map(str::to_owned)
            .or_else(|| std::env::var("RUST_LOG").ok());
        if let Some(level) = level {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new(&level))
                .try_init();
            engine.set_log_level(&level);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngine;
    use crate::specification::ChainSpecification;

    fn client() -> Client {
        Client::new(Arc::new(MockEngine::new()))
    }

    fn local_chain() -> Chain {
        Chain::new(ChainSpecification::from_json(r#"{"name":"Local","id":"local"}"#).unwrap())
    }

    #[test]
    fn test_send_to_unadded_chain_fails_before_engine() {
        let client = client();
        let request = Request::from_json(
            r#"{"id":1,"jsonrpc":"2.0","method":"system_chain","params":[]}"#,
        )
        .unwrap();
        assert!(matches!(
            client.send(&request, &local_chain()),
            Err(LightlinkError::NotRegistered)
        ));
    }

    #[test]
    fn test_add_send_lifecycle() {
        let client = client();
        let chain = local_chain();
        client.add_chain(&chain).unwrap();
        assert!(client.is_valid(&chain));

        let request = Request::new("system_chain", Some(serde_json::json!([])), None).unwrap();
        client.send(&request, &chain).unwrap();

        client.remove_chain(&chain).unwrap();
        assert!(!client.is_valid(&chain));
    }

    #[test]
    fn test_shared_client_is_a_singleton() {
        let a = Client::shared_with(Arc::new(MockEngine::new()));
        let b = Client::shared_with(Arc::new(MockEngine::new()));
        assert!(std::ptr::eq(a, b));
    }
}
