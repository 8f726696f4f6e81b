use thiserror::Error;

/// Main error type for lightlink operations
#[derive(Error, Debug)]
pub enum LightlinkError {
    /// The chain already carries a live engine handle
    #[error("chain has already been added")]
    AlreadyRegistered,

    /// The chain carries no engine handle (never added, or removed)
    #[error("chain not found in client")]
    NotRegistered,

    /// The in-memory chain specification could not be serialized or is
    /// structurally malformed (schema conformance is the engine's concern)
    #[error("invalid chain specification: {0}")]
    InvalidSpecification(String),

    /// Unparseable JSON text
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Malformed JSON-RPC 2.0 request envelope or wrong protocol version
    #[error("invalid JSON-RPC request: {0}")]
    InvalidRequest(String),

    /// Malformed JSON-RPC 2.0 response envelope produced by the engine
    #[error("invalid JSON-RPC response: {0}")]
    InvalidResponse(String),

    /// A bounded response buffer overflowed under the fail-fast policy
    #[error("response buffer overflow")]
    Overflow,

    /// The engine rejected an operation
    #[error("engine error: {0}")]
    Engine(String),

    /// I/O errors while loading specification files
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for lightlink operations
pub type Result<T> = std::result::Result<T, LightlinkError>;
