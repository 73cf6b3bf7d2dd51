//! Transport abstraction.
//!
//! The replication core never talks to the network itself. A producer needs a
//! fire-and-forget broadcast plus a way to answer full-state requests; a
//! consumer needs a way to issue those requests. Implementations may use any
//! messaging backend; [`InMemoryChannel`] is a loopback used in tests.

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Synchronous responder invoked once per incoming full-state request.
pub type RequestHandler = Arc<dyn Fn(&[u8]) -> Bytes + Send + Sync>;

/// Producer side of the transport.
pub trait SyncChannel: Send + Sync {
    /// Broadcast a payload to all consumers. Delivery is best-effort.
    fn publish(&self, payload: Bytes);

    /// Register the responder for full-state requests, replacing any
    /// previous one.
    fn serve_requests(&self, handler: RequestHandler);
}

/// Consumer side of the request/reply pattern.
pub trait StateRequester {
    /// Send a request and wait for the reply. `None` if nobody answered.
    fn request(&self, payload: &[u8]) -> Option<Bytes>;
}

impl<T: SyncChannel + ?Sized> SyncChannel for Arc<T> {
    fn publish(&self, payload: Bytes) {
        (**self).publish(payload);
    }

    fn serve_requests(&self, handler: RequestHandler) {
        (**self).serve_requests(handler);
    }
}

impl<T: StateRequester + ?Sized> StateRequester for Arc<T> {
    fn request(&self, payload: &[u8]) -> Option<Bytes> {
        (**self).request(payload)
    }
}

impl<T: StateRequester + ?Sized> StateRequester for &T {
    fn request(&self, payload: &[u8]) -> Option<Bytes> {
        (**self).request(payload)
    }
}

/// A loopback channel that records every published payload and routes
/// requests straight to the registered responder.
#[derive(Default)]
pub struct InMemoryChannel {
    published: Mutex<Vec<Bytes>>,
    responder: RwLock<Option<RequestHandler>>,
}

impl InMemoryChannel {
    /// Creates an empty channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All payloads published so far, oldest first.
    #[must_use]
    pub fn published(&self) -> Vec<Bytes> {
        self.published.lock().clone()
    }

    /// Drains and returns the published payloads.
    pub fn take_published(&self) -> Vec<Bytes> {
        std::mem::take(&mut *self.published.lock())
    }

    /// Number of payloads published so far.
    #[must_use]
    pub fn publish_count(&self) -> usize {
        self.published.lock().len()
    }

    /// Whether a responder has been registered.
    #[must_use]
    pub fn has_responder(&self) -> bool {
        self.responder.read().is_some()
    }
}

impl std::fmt::Debug for InMemoryChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryChannel")
            .field("published", &self.publish_count())
            .field("has_responder", &self.has_responder())
            .finish()
    }
}

impl SyncChannel for InMemoryChannel {
    fn publish(&self, payload: Bytes) {
        self.published.lock().push(payload);
    }

    fn serve_requests(&self, handler: RequestHandler) {
        *self.responder.write() = Some(handler);
    }
}

impl StateRequester for InMemoryChannel {
    fn request(&self, payload: &[u8]) -> Option<Bytes> {
        let handler = self.responder.read().clone()?;
        Some(handler(payload))
    }
}
