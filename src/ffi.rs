// Smoldot FFI Bindings
//
// Raw C bindings for a smoldot-compatible light-client engine, plus the
// [`Engine`] implementation wrapping them. These correspond to the extern
// "C" functions exported by the precompiled engine library.

use async_trait::async_trait;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};

use crate::chain::ChainId;
use crate::engine::Engine;

unsafe extern "C" {
    /// Register a chain from a NUL-terminated specification JSON document.
    /// Returns the chain handle, or a negative sentinel on failure.
    pub fn smoldot_add_chain(specification_json: *const c_char) -> isize;

    /// Free all engine resources held for a chain handle.
    pub fn smoldot_remove_chain(chain_id: isize);

    /// Liveness check for a chain handle.
    pub fn smoldot_is_valid_chain_id(chain_id: isize) -> c_int;

    /// Enqueue a NUL-terminated JSON-RPC request for a chain.
    pub fn smoldot_json_rpc_request(chain_id: isize, request_json: *const c_char);

    /// Block until the next JSON-RPC response for a chain is ready. Returns
    /// an engine-owned buffer, or null at end-of-stream. The buffer must be
    /// released with `smoldot_next_json_rpc_response_free` after copying.
    pub fn smoldot_wait_next_json_rpc_response(chain_id: isize) -> *mut c_char;

    /// Release a response buffer returned by `smoldot_wait_next_json_rpc_response`.
    pub fn smoldot_next_json_rpc_response_free(response: *mut c_char);

    /// Configure the engine's logger with a NUL-terminated level string.
    pub fn smoldot_env_logger(level: *const c_char);
}

/// [`Engine`] backed by a linked smoldot-compatible library.
///
/// The engine context is process-wide state inside the library itself; all
/// `FfiEngine` values address the same context.
#[derive(Debug, Default)]
pub struct FfiEngine;

impl FfiEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Engine for FfiEngine {
    fn add_chain(&self, specification_json: &str) -> i64 {
        // Interior NULs cannot cross the C boundary; surface the engine's
        // own failure sentinel rather than a separate error path.
        let Ok(specification) = CString::new(specification_json) else {
            return -1;
        };
        unsafe { smoldot_add_chain(specification.as_ptr()) as i64 }
    }

    fn remove_chain(&self, chain_id: ChainId) {
        unsafe { smoldot_remove_chain(chain_id.raw() as isize) }
    }

    fn is_valid_chain(&self, chain_id: ChainId) -> bool {
        unsafe { smoldot_is_valid_chain_id(chain_id.raw() as isize) != 0 }
    }

    fn submit_request(&self, chain_id: ChainId, request_json: &str) {
        let Ok(request) = CString::new(request_json) else {
            return;
        };
        unsafe { smoldot_json_rpc_request(chain_id.raw() as isize, request.as_ptr()) }
    }

    async fn next_response(&self, chain_id: ChainId) -> Option<String> {
        let raw = chain_id.raw() as isize;
        // The C call parks the thread until the engine produces a response,
        // so it must not run on the async runtime's worker threads.
        let joined = tokio::task::spawn_blocking(move || unsafe {
            let pointer = smoldot_wait_next_json_rpc_response(raw);
            if pointer.is_null() {
                return None;
            }
            let response = CStr::from_ptr(pointer).to_string_lossy().into_owned();
            smoldot_next_json_rpc_response_free(pointer);
            Some(response)
        })
        .await;
        joined.ok().flatten()
    }

    fn set_log_level(&self, level: &str) {
        let Ok(level) = CString::new(level) else {
            return;
        };
        unsafe { smoldot_env_logger(level.as_ptr()) }
    }
}
