//! Request dispatch: serialization, observer callbacks, transport exchange
//! and response parsing.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, error, trace};

use crate::error::{Error, Result};
use crate::transport::{ConnectionBuffers, Credentials, Transport, TransportRequest};
use crate::xml::XmlDoc;

/// Observer called with the endpoint and the outgoing request of every
/// exchange.
pub type Handler = Box<dyn FnMut(&str, &XmlDoc) + Send>;

/// Registered observers, most recently added first.
#[derive(Default)]
pub struct HandlerRegistry {
    entries: VecDeque<(u32, Handler)>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler and return its id.
    ///
    /// The id is one more than the id of the most recently registered
    /// handler still present, or 1 when the registry is empty.
    pub fn add(&mut self, handler: Handler) -> u32 {
        let id = self.entries.front().map_or(1, |(id, _)| id + 1);
        self.entries.push_front((id, handler));
        debug!(id, "Handler registered");
        id
    }

    /// Remove the first handler with `id`. Returns whether one was removed.
    pub fn remove(&mut self, id: u32) -> bool {
        match self.entries.iter().position(|(entry, _)| *entry == id) {
            Some(pos) => {
                self.entries.remove(pos);
                debug!(id, "Handler removed");
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered ids in call order.
    pub fn ids(&self) -> Vec<u32> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    /// Call every handler and return the time spent in them.
    pub fn notify(&mut self, endpoint: &str, request: &XmlDoc) -> Duration {
        let mut total = Duration::ZERO;
        for (id, handler) in self.entries.iter_mut() {
            let start = Instant::now();
            handler(endpoint, request);
            let elapsed = start.elapsed();
            trace!(id = *id, ?elapsed, "Handler called");
            total += elapsed;
        }
        total
    }
}

/// Accumulated transfer time, read and reset by [`TransferTimer::take`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransferTimer {
    elapsed: Duration,
}

impl TransferTimer {
    pub fn add(&mut self, elapsed: Duration) {
        self.elapsed += elapsed;
    }

    /// Current total without resetting it.
    pub fn peek(&self) -> Duration {
        self.elapsed
    }

    /// Return the total and reset it to zero.
    pub fn take(&mut self) -> Duration {
        std::mem::take(&mut self.elapsed)
    }
}

/// Per-client dispatch state.
#[derive(Debug, Default)]
pub struct Dispatcher {
    pub handlers: HandlerRegistry,
    pub timer: TransferTimer,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send `request` and parse the response.
    ///
    /// The serialized request and the raw response are left in `buffers`
    /// until the caller releases them. `timeout` is in milliseconds, 0 for
    /// none.
    pub fn send(
        &mut self,
        transport: &mut dyn Transport,
        buffers: &mut ConnectionBuffers,
        endpoint: &str,
        credentials: Option<&Credentials>,
        request: &XmlDoc,
        timeout: u64,
    ) -> Result<XmlDoc> {
        buffers.request = Some(request.to_xml_string()?);
        let in_handlers = self.handlers.notify(endpoint, request);

        let body = buffers.request.as_deref().unwrap_or_default();
        let start = Instant::now();
        let response = transport.exchange(&TransportRequest {
            endpoint,
            body,
            timeout: (timeout > 0).then(|| Duration::from_millis(timeout)),
            credentials,
        });
        self.timer.add(in_handlers + start.elapsed());

        match response? {
            Some(raw) => {
                trace!(bytes = raw.len(), "Response received");
                let doc = XmlDoc::parse(raw.as_bytes());
                buffers.response = Some(raw);
                doc
            }
            None => {
                error!(endpoint, "response doc is null");
                Err(Error::TransportFailure {
                    endpoint: endpoint.to_string(),
                })
            }
        }
    }
}
