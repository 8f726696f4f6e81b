//! Engine boundary
//!
//! The actual light client — peer discovery, sync, consensus verification,
//! JSON-RPC servicing — lives behind this trait. The binding layer treats it
//! as an opaque, already-thread-safe dependency: it hands over serialized
//! chain specifications and request envelopes, and polls per-handle response
//! queues. [`MockEngine`] provides an in-process scripted stand-in so the
//! registry, multiplexer, and facade can be exercised without linking a real
//! engine.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Value, json};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::mpsc;

use crate::chain::ChainId;

/// The external light-client engine.
///
/// Implementations must be internally thread-safe. All methods are cheap and
/// non-suspending except [`next_response`](Engine::next_response), the sole
/// blocking primitive, and [`add_chain`](Engine::add_chain), which may be
/// slow while the engine allocates networking and sync state.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Register a chain from its serialized specification.
    ///
    /// Returns the raw handle; a negative value is the engine's failure
    /// sentinel and must be rejected by the caller before use. No timeout is
    /// defined at this layer.
    fn add_chain(&self, specification_json: &str) -> i64;

    /// Free all engine resources held for a handle.
    fn remove_chain(&self, chain_id: ChainId);

    /// Liveness check for a handle. A handle can die out-of-band if the
    /// engine fails internally, so callers must re-query rather than cache.
    fn is_valid_chain(&self, chain_id: ChainId) -> bool;

    /// Enqueue a serialized JSON-RPC request. Fire-and-forget; the engine
    /// routes by handle.
    fn submit_request(&self, chain_id: ChainId, request_json: &str);

    /// Wait for the next JSON-RPC response produced for a handle, in arrival
    /// order. `None` means the engine closed the handle's response stream.
    async fn next_response(&self, chain_id: ChainId) -> Option<String>;

    /// Forward a log level (error, warn, info, debug, trace) to the engine's
    /// own logger.
    fn set_log_level(&self, level: &str);
}

struct MockChain {
    name: String,
    // Sender lives apart from the receiver so removal can drop it and close
    // the stream while a consumer is still waiting.
    tx: Mutex<Option<mpsc::UnboundedSender<String>>>,
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
}

/// An in-process scripted engine for tests and development.
///
/// Handles are assigned sequentially. Requests are answered from the chain
/// specification itself (`system_chain` returns its `name`), unknown methods
/// get a standard `-32601` error, and notifications produce no response.
/// Removing a chain closes its response stream.
pub struct MockEngine {
    next_handle: AtomicI64,
    chains: DashMap<ChainId, std::sync::Arc<MockChain>>,
    log_level: Mutex<Option<String>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            next_handle: AtomicI64::new(0),
            chains: DashMap::new(),
            log_level: Mutex::new(None),
        }
    }

    /// Inject a raw response string into a handle's queue, bypassing request
    /// routing. Lets tests script arbitrary delivery sequences.
    pub fn push_raw(&self, chain_id: ChainId, response: String) {
        if let Some(chain) = self.chains.get(&chain_id) {
            if let Some(tx) = &*chain.tx.lock().unwrap() {
                let _ = tx.send(response);
            }
        }
    }

    /// The last level handed to [`set_log_level`](Engine::set_log_level).
    pub fn log_level(&self) -> Option<String> {
        self.log_level.lock().unwrap().clone()
    }

    fn respond(&self, chain_id: ChainId, response: Value) {
        self.push_raw(chain_id, response.to_string());
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Engine for MockEngine {
    fn add_chain(&self, specification_json: &str) -> i64 {
        // The mock validates exactly what a real engine would reject
        // immediately: a specification that is not an object carrying
        // string `name` and `id` fields.
        let Ok(Value::Object(document)) = serde_json::from_str::<Value>(specification_json) else {
            return -1;
        };
        let Some(Value::String(name)) = document.get("name") else {
            return -1;
        };
        if !matches!(document.get("id"), Some(Value::String(_))) {
            return -1;
        }

        let raw = self.next_handle.fetch_add(1, Ordering::SeqCst);
        let chain_id = ChainId::from_raw(raw).expect("sequential handles are non-negative");
        let (tx, rx) = mpsc::unbounded_channel();
        self.chains.insert(
            chain_id,
            std::sync::Arc::new(MockChain {
                name: name.clone(),
                tx: Mutex::new(Some(tx)),
                rx: tokio::sync::Mutex::new(rx),
            }),
        );
        raw
    }

    fn remove_chain(&self, chain_id: ChainId) {
        if let Some((_, chain)) = self.chains.remove(&chain_id) {
            // Dropping the sender ends the stream for any pending consumer.
            chain.tx.lock().unwrap().take();
        }
    }

    fn is_valid_chain(&self, chain_id: ChainId) -> bool {
        self.chains.contains_key(&chain_id)
    }

    fn submit_request(&self, chain_id: ChainId, request_json: &str) {
        let Some(chain) = self.chains.get(&chain_id).map(|c| c.value().clone()) else {
            return;
        };

        let Ok(Value::Object(request)) = serde_json::from_str::<Value>(request_json) else {
            self.respond(
                chain_id,
                json!({"jsonrpc": "2.0", "id": null,
                       "error": {"code": -32700, "message": "Parse error"}}),
            );
            return;
        };

        // Notifications never produce a response.
        let Some(id) = request.get("id").cloned() else {
            return;
        };

        match request.get("method").and_then(Value::as_str) {
            Some("system_chain") => self.respond(
                chain_id,
                json!({"jsonrpc": "2.0", "id": id, "result": chain.name}),
            ),
            Some("system_name") => self.respond(
                chain_id,
                json!({"jsonrpc": "2.0", "id": id, "result": "lightlink-mock"}),
            ),
            Some("system_version") => self.respond(
                chain_id,
                json!({"jsonrpc": "2.0", "id": id, "result": crate::VERSION}),
            ),
            Some(_) => self.respond(
                chain_id,
                json!({"jsonrpc": "2.0", "id": id,
                       "error": {"code": -32601, "message": "Method not found"}}),
            ),
            None => self.respond(
                chain_id,
                json!({"jsonrpc": "2.0", "id": id,
                       "error": {"code": -32600, "message": "Invalid Request"}}),
            ),
        }
    }

    async fn next_response(&self, chain_id: ChainId) -> Option<String> {
        // Clone the Arc out before awaiting; holding a map guard across a
        // suspension point would block writers.
        let chain = self.chains.get(&chain_id).map(|c| c.value().clone())?;
        chain.rx.lock().await.recv().await
    }

    fn set_log_level(&self, level: &str) {
        *self.log_level.lock().unwrap() = Some(level.to_owned());
    }
}
