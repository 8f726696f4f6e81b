//! Chain registry
//!
//! Handle bookkeeping between [`Chain`] values and the engine. Registration
//! is two-phase by design: a specification is constructed (and can be
//! validated) without side effects, and engine resources are only committed
//! once `add` serializes it successfully.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::chain::{Chain, ChainId};
use crate::engine::Engine;
use crate::error::{LightlinkError, Result};

/// Tracks which chains hold live engine handles.
pub struct ChainRegistry {
    engine: Arc<dyn Engine>,
    // Handle -> specification id, for diagnostics and liveness accounting.
    live: DashMap<ChainId, String>,
}

impl ChainRegistry {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            live: DashMap::new(),
        }
    }

    /// Register a chain with the engine and attach the resulting handle.
    ///
    /// Fails with `AlreadyRegistered` if the chain already carries a live
    /// handle, and with `InvalidSpecification` if the in-memory document
    /// cannot be serialized. Schema conformance is not checked here; an
    /// engine-side rejection surfaces as `Engine`.
    ///
    /// May block while the engine allocates networking and sync state. No
    /// timeout is applied at this layer.
    pub fn add(&self, chain: &Chain) -> Result<ChainId> {
        // The write guard is held across the engine call: add and remove on
        // the same chain are serialized, and `is_valid` can never observe a
        // half-attached handle.
        let mut handle = chain.handle_mut();
        if let Some(existing) = *handle {
            if self.engine.is_valid_chain(existing) {
                return Err(LightlinkError::AlreadyRegistered);
            }
            // The engine invalidated the handle out-of-band; the stale
            // registration is discarded and the chain re-added.
            debug!(chain = %chain.specification().id(), handle = %existing,
                   "discarding stale handle");
            self.live.remove(&existing);
        }

        let document = chain.specification().to_json()?;
        let raw = self.engine.add_chain(&document);
        let id = ChainId::from_raw(raw).ok_or_else(|| {
            LightlinkError::Engine(format!(
                "engine rejected chain specification `{}`",
                chain.specification().id()
            ))
        })?;

        *handle = Some(id);
        self.live.insert(id, chain.specification().id().to_owned());
        info!(chain = %chain.specification().id(), handle = %id, "chain added");
        Ok(id)
    }

    /// Remove a chain, freeing its engine resources and clearing its handle.
    ///
    /// Fails with `NotRegistered` if the chain carries no handle. After
    /// removal the handle is dead for good; re-adding the chain yields a
    /// fresh one.
    pub fn remove(&self, chain: &Chain) -> Result<()> {
        let mut handle = chain.handle_mut();
        let id = handle.take().ok_or(LightlinkError::NotRegistered)?;
        self.engine.remove_chain(id);
        self.live.remove(&id);
        info!(chain = %chain.specification().id(), handle = %id, "chain removed");
        Ok(())
    }

    /// Whether the chain holds a handle the engine still considers live.
    ///
    /// Delegates to the engine on every call; a handle can die out-of-band,
    /// so liveness is never cached.
    pub fn is_valid(&self, chain: &Chain) -> bool {
        match chain.id() {
            Some(id) => self.engine.is_valid_chain(id),
            None => false,
        }
    }

    /// Number of handles registered through this registry and not yet removed.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngine;
    use crate::specification::ChainSpecification;

    fn registry() -> ChainRegistry {
        ChainRegistry::new(Arc::new(MockEngine::new()))
    }

    fn local_chain(id: &str) -> Chain {
        Chain::new(
            ChainSpecification::from_json(&format!(r#"{{"name":"Local","id":"{id}"}}"#)).unwrap(),
        )
    }

    #[test]
    fn test_add_attaches_handle() {
        let registry = registry();
        let chain = local_chain("local");
        let id = registry.add(&chain).unwrap();
        assert_eq!(chain.id(), Some(id));
        assert!(registry.is_valid(&chain));
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_duplicate_add_fails() {
        let registry = registry();
        let chain = local_chain("local");
        registry.add(&chain).unwrap();
        let err = registry.add(&chain).unwrap_err();
        assert!(matches!(err, LightlinkError::AlreadyRegistered));
    }

    #[test]
    fn test_duplicate_add_through_clone_fails() {
        let registry = registry();
        let chain = local_chain("local");
        let clone = chain.clone();
        registry.add(&chain).unwrap();
        assert!(matches!(
            registry.add(&clone),
            Err(LightlinkError::AlreadyRegistered)
        ));
    }

    #[test]
    fn test_remove_clears_handle() {
        let registry = registry();
        let chain = local_chain("local");
        registry.add(&chain).unwrap();
        registry.remove(&chain).unwrap();
        assert!(chain.id().is_none());
        assert!(!registry.is_valid(&chain));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_remove_unregistered_fails() {
        let registry = registry();
        let chain = local_chain("local");
        assert!(matches!(
            registry.remove(&chain),
            Err(LightlinkError::NotRegistered)
        ));
        assert!(!registry.is_valid(&chain));
    }

    #[test]
    fn test_readd_after_remove_yields_fresh_handle() {
        let registry = registry();
        let chain = local_chain("local");
        let first = registry.add(&chain).unwrap();
        registry.remove(&chain).unwrap();
        let second = registry.add(&chain).unwrap();
        assert_ne!(first, second);
        assert!(registry.is_valid(&chain));
    }

    #[test]
    fn test_engine_rejection_surfaces_and_leaves_chain_unregistered() {
        // An engine that answers every registration with its failure sentinel.
        struct Rejecting;
        #[async_trait::async_trait]
        impl Engine for Rejecting {
            fn add_chain(&self, _: &str) -> i64 {
                -1
            }
            fn remove_chain(&self, _: ChainId) {}
            fn is_valid_chain(&self, _: ChainId) -> bool {
                false
            }
            fn submit_request(&self, _: ChainId, _: &str) {}
            async fn next_response(&self, _: ChainId) -> Option<String> {
                None
            }
            fn set_log_level(&self, _: &str) {}
        }

        let registry = ChainRegistry::new(Arc::new(Rejecting));
        let chain = local_chain("local");
        let err = registry.add(&chain).unwrap_err();
        assert!(matches!(err, LightlinkError::Engine(_)));
        assert!(chain.id().is_none());
        assert_eq!(registry.live_count(), 0);
    }
}
