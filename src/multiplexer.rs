//! Response multiplexer
//!
//! Translates the engine's blocking per-handle polling primitive into async
//! consumption: a one-shot [`pull`](ResponseMultiplexer::pull) and a
//! [`subscribe`](ResponseMultiplexer::subscribe) stream backed by a
//! cancellable background polling task. Responses for one handle arrive in
//! the order the engine produced them; nothing is guaranteed across handles.
//!
//! The engine interface is single-consumer-per-handle: at most one pull or
//! one live stream may consume a given chain at a time. Multiple chains can
//! be consumed concurrently without coordination.

use futures::Stream;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};
use tracing::{debug, trace};

use crate::chain::Chain;
use crate::engine::Engine;
use crate::error::{LightlinkError, Result};
use crate::jsonrpc::Response;

/// Strategy applied when a subscription buffer reaches capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BufferPolicy {
    /// Never drop; the buffer grows with the backlog.
    Unbounded,
    /// Bounded ring: overflow evicts the oldest buffered response.
    DropOldest(usize),
    /// Bounded ring: overflow discards the incoming response.
    DropNewest(usize),
    /// Fail fast: overflow yields [`LightlinkError::Overflow`] and ends the
    /// stream.
    Error(usize),
}

impl Default for BufferPolicy {
    fn default() -> Self {
        Self::Unbounded
    }
}

#[derive(Debug)]
struct State {
    queue: VecDeque<Result<Response>>,
    waker: Option<Waker>,
    closed: bool,
}

// Single-producer single-consumer buffer between the polling task and the
// stream. Hand-rolled because the drop-oldest and fail-fast policies need
// producer-side access to the queued backlog.
#[derive(Debug)]
struct Buffer {
    state: Mutex<State>,
    cancelled: AtomicBool,
}

impl Buffer {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State {
                queue: VecDeque::new(),
                waker: None,
                closed: false,
            }),
            cancelled: AtomicBool::new(false),
        })
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Enqueue one item under the buffering policy. Returns false once the
    /// producer should stop feeding the buffer.
    fn push(&self, item: Result<Response>, policy: BufferPolicy) -> bool {
        if self.is_cancelled() {
            return false;
        }
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return false;
        }
        let mut open = true;
        match policy {
            BufferPolicy::Unbounded => state.queue.push_back(item),
            BufferPolicy::DropOldest(capacity) => {
                if state.queue.len() >= capacity {
                    state.queue.pop_front();
                    trace!("buffer full, dropped oldest response");
                }
                state.queue.push_back(item);
            }
            BufferPolicy::DropNewest(capacity) => {
                if state.queue.len() >= capacity {
                    trace!("buffer full, dropped newest response");
                } else {
                    state.queue.push_back(item);
                }
            }
            BufferPolicy::Error(capacity) => {
                if state.queue.len() >= capacity {
                    state.queue.push_back(Err(LightlinkError::Overflow));
                    state.closed = true;
                    open = false;
                } else {
                    state.queue.push_back(item);
                }
            }
        }
        if let Some(waker) = state.waker.take() {
            waker.wake();
        }
        open
    }

    fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        if let Some(waker) = state.waker.take() {
            waker.wake();
        }
    }
}

/// An infinite, non-restartable stream of responses for one chain.
///
/// Ends when the engine closes the handle's response queue. Dropping the
/// stream signals the polling task to stop promptly; an in-flight poll may
/// still complete, and its result is discarded.
#[derive(Debug)]
pub struct ResponseStream {
    buffer: Arc<Buffer>,
}

impl Stream for ResponseStream {
    type Item = Result<Response>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut state = self.buffer.state.lock().unwrap();
        if let Some(item) = state.queue.pop_front() {
            return Poll::Ready(Some(item));
        }
        if state.closed {
            return Poll::Ready(None);
        }
        state.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl Drop for ResponseStream {
    fn drop(&mut self) {
        self.buffer.cancelled.store(true, Ordering::Release);
    }
}

/// Per-handle response delivery on top of the engine's polling primitive.
pub struct ResponseMultiplexer {
    engine: Arc<dyn Engine>,
}

impl ResponseMultiplexer {
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self { engine }
    }

    /// Wait for the next response produced for a chain.
    ///
    /// Resolves to `Ok(None)` when the engine closes the handle's response
    /// queue. Removal of the chain while waiting is a race inherent to the
    /// engine's polling interface, so validity is re-checked after the
    /// suspension and surfaces as `NotRegistered`.
    pub async fn pull(&self, chain: &Chain) -> Result<Option<Response>> {
        let id = chain.id().ok_or(LightlinkError::NotRegistered)?;
        let next = self.engine.next_response(id).await;
        if chain.id() != Some(id) {
            return Err(LightlinkError::NotRegistered);
        }
        match next {
            Some(raw) => Ok(Some(Response::from_json(&raw)?)),
            None => Ok(None),
        }
    }

    /// Subscribe to a chain's responses as an async stream.
    ///
    /// Spawns a background task that repeatedly polls the engine and feeds a
    /// buffer governed by `policy`. Fails with `NotRegistered` if the chain
    /// carries no handle at subscription time.
    pub fn subscribe(&self, chain: &Chain, policy: BufferPolicy) -> Result<ResponseStream> {
        let initial = chain.id().ok_or(LightlinkError::NotRegistered)?;
        let buffer = Buffer::new();

        let engine = Arc::clone(&self.engine);
        let chain = chain.clone();
        let producer = Arc::clone(&buffer);
        tokio::spawn(async move {
            debug!(handle = %initial, "response subscription started");
            loop {
                if producer.is_cancelled() {
                    break;
                }
                let Some(id) = chain.id() else {
                    producer.push(Err(LightlinkError::NotRegistered), policy);
                    break;
                };
                match engine.next_response(id).await {
                    Some(raw) => {
                        if producer.is_cancelled() {
                            // Consumer went away while the poll was in
                            // flight; the response is discarded.
                            break;
                        }
                        if chain.id() != Some(id) {
                            producer.push(Err(LightlinkError::NotRegistered), policy);
                            break;
                        }
                        if !producer.push(Response::from_json(&raw), policy) {
                            break;
                        }
                    }
                    None => {
                        if chain.id() != Some(id) {
                            producer.push(Err(LightlinkError::NotRegistered), policy);
                        }
                        break;
                    }
                }
            }
            producer.close();
            debug!(handle = %initial, "response subscription ended");
        });

        Ok(ResponseStream { buffer })
    }
}
