//! # Lightlink
//!
//! Rust client bindings for embedded Polkadot light-client engines.
//!
//! Lightlink implements the binding-side core of a light client: chain
//! registration and handle bookkeeping, JSON-RPC 2.0 envelope validation,
//! and per-chain response multiplexing over the engine's blocking polling
//! interface. The engine itself — sync, networking, consensus verification —
//! is an opaque dependency reached through the [`engine::Engine`] trait,
//! with an FFI implementation for smoldot-compatible libraries behind the
//! `smoldot` feature.
//!
//! ## Features
//!
//! - Two-phase registration: specifications are parsed and validated before
//!   any engine resources are committed
//! - Strict JSON-RPC 2.0 request validation, rejected before submission
//! - Per-chain ordered response delivery: one-shot pulls or async streams
//!   with configurable buffering policies
//! - Bundled specifications for the well-known networks (Polkadot, Kusama,
//!   Rococo, Westend)
//!
//! ## Quick Start
//!
//! ```rust
//! use lightlink::{Chain, Client, Request, engine::MockEngine};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(Arc::new(MockEngine::new()));
//!
//!     let chain = Chain::polkadot();
//!     client.add_chain(&chain)?;
//!
//!     let request = Request::from_json(
//!         r#"{"id":1,"jsonrpc":"2.0","method":"system_chain","params":[]}"#,
//!     )?;
//!     client.send(&request, &chain)?;
//!
//!     if let Some(response) = client.response(&chain).await? {
//!         println!("chain: {:?}", response.result());
//!     }
//!
//!     client.remove_chain(&chain)?;
//!     Ok(())
//! }
//! ```

pub mod chain;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod jsonrpc;
pub mod multiplexer;
pub mod registry;
pub mod specification;

#[cfg(feature = "smoldot")]
pub mod ffi;

// Re-exports for convenience
pub use chain::{Chain, ChainId};
pub use client::Client;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{LightlinkError, Result};
pub use jsonrpc::{Request, RequestId, Response, ResponseError};
pub use multiplexer::{BufferPolicy, ResponseStream};
pub use specification::{ChainSpecification, WELL_KNOWN_NETWORKS};

/// Current version of lightlink
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
