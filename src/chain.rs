//! Chain model and engine handles

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use crate::error::Result;
use crate::specification::ChainSpecification;

/// Engine-assigned handle identifying a registered chain context.
///
/// Handles are unique among currently-live registrations and become invalid
/// the instant the chain is removed. Whether the engine later reuses the
/// integer is an engine concern this layer never relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(i64);

impl ChainId {
    /// Convert a raw engine return value into a handle.
    ///
    /// Engines signal registration failure with a negative sentinel, which
    /// must be rejected here before anything downstream can address it.
    pub(crate) fn from_raw(raw: i64) -> Option<Self> {
        (raw >= 0).then_some(Self(raw))
    }

    /// The raw integer passed across the engine boundary.
    pub fn raw(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Polkadot-based blockchain network, optionally registered with a client.
///
/// A `Chain` pairs an immutable [`ChainSpecification`] with the engine handle
/// attached at registration time. Clones share registration state: adding a
/// chain through one clone makes every clone registered. Equality is defined
/// by specification identity alone, independent of registration.
#[derive(Debug, Clone)]
pub struct Chain {
    specification: Arc<ChainSpecification>,
    handle: Arc<RwLock<Option<ChainId>>>,
}

impl Chain {
    /// Create an unregistered chain from a specification.
    ///
    /// No engine resources are held until the chain is added to a client.
    pub fn new(specification: ChainSpecification) -> Self {
        Self {
            specification: Arc::new(specification),
            handle: Arc::new(RwLock::new(None)),
        }
    }

    /// Create a chain from a specification file on disk.
    pub fn from_specification_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(ChainSpecification::from_file(path)?))
    }

    /// The Polkadot relay chain.
    pub fn polkadot() -> Self {
        Self::new(ChainSpecification::polkadot())
    }

    /// The Kusama canary network.
    pub fn kusama() -> Self {
        Self::new(ChainSpecification::kusama())
    }

    /// The Rococo testnet.
    pub fn rococo() -> Self {
        Self::new(ChainSpecification::rococo())
    }

    /// The Westend testnet.
    pub fn westend() -> Self {
        Self::new(ChainSpecification::westend())
    }

    /// The chain's specification.
    pub fn specification(&self) -> &ChainSpecification {
        &self.specification
    }

    /// The engine handle, if the chain is currently registered.
    pub fn id(&self) -> Option<ChainId> {
        *self.handle.read().unwrap()
    }

    /// True if the chain carries a handle. Engine-side liveness is a
    /// separate question answered by the registry.
    pub fn is_registered(&self) -> bool {
        self.id().is_some()
    }

    // Exclusive access to the handle slot. Registration and removal hold
    // this guard across the engine call, which serializes add/remove per
    // chain and keeps `is_valid` from observing a half-updated handle.
    pub(crate) fn handle_mut(&self) -> RwLockWriteGuard<'_, Option<ChainId>> {
        self.handle.write().unwrap()
    }
}

impl PartialEq for Chain {
    fn eq(&self, other: &Self) -> bool {
        self.specification == other.specification
    }
}

impl Eq for Chain {}

impl Hash for Chain {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.specification.hash(state);
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "{} [chain {}]", self.specification, id),
            None => write!(f, "{} [unregistered]", self.specification),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_handles_rejected() {
        assert_eq!(ChainId::from_raw(0), Some(ChainId(0)));
        assert_eq!(ChainId::from_raw(7).map(ChainId::raw), Some(7));
        assert_eq!(ChainId::from_raw(-1), None);
        assert_eq!(ChainId::from_raw(i64::MIN), None);
    }

    #[test]
    fn test_new_chain_is_unregistered() {
        let chain = Chain::polkadot();
        assert!(!chain.is_registered());
        assert!(chain.id().is_none());
    }

    #[test]
    fn test_clones_share_registration_state() {
        let chain = Chain::westend();
        let clone = chain.clone();
        *chain.handle_mut() = ChainId::from_raw(3);
        assert_eq!(clone.id(), ChainId::from_raw(3));
    }

    #[test]
    fn test_equality_ignores_registration() {
        let a = Chain::polkadot();
        let b = Chain::polkadot();
        *a.handle_mut() = ChainId::from_raw(1);
        assert_eq!(a, b);
        assert_ne!(a, Chain::kusama());
    }
}
