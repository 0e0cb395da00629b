use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::error;

use crate::message::Message;
use crate::utils::error::Result;

/// Outcome of one handler invocation: an optional reply body.
pub type HandlerResult = Result<Option<Value>>;

/// A registered message handler. Handlers only read the message; the node
/// publishes whatever reply they return.
pub type Handler = Arc<dyn Fn(&Message) -> HandlerResult + Send + Sync>;

/// Token identifying a registered handler, returned by [`HandlerRegistry::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct Registered {
    id: HandlerId,
    handler: Handler,
}

/// Ordered collection of message handlers.
///
/// Registration and removal may run concurrently with dispatch: dispatch
/// snapshots the list before invoking anything, so an in-progress iteration
/// never observes a mutation (and a handler may itself add or remove
/// handlers without deadlocking).
#[derive(Default)]
pub struct HandlerRegistry {
    entries: Mutex<Vec<Registered>>,
    next_id: AtomicU64,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler and returns its removal token.
    pub fn add<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&Message) -> HandlerResult + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().unwrap().push(Registered {
            id,
            handler: Arc::new(handler),
        });
        id
    }

    /// Removes a handler. Returns false if it was already gone.
    pub fn remove(&self, id: HandlerId) -> bool {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs every handler against `message`, in registration order, and
    /// returns the first non-null reply. Handler failures go to the log and
    /// do not stop the remaining handlers.
    pub fn dispatch(&self, message: &Message) -> Option<Value> {
        let snapshot: Vec<Handler> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.handler.clone())
            .collect();

        let mut reply = None;
        for handler in snapshot {
            match handler(message) {
                Ok(Some(value)) if reply.is_none() => reply = Some(value),
                Ok(_) => {}
                Err(e) => error!("message handler failed: {e}"),
            }
        }
        reply
    }
}

/// Combines a base handler with a post-processing step into one handler.
///
/// Useful for wrapping an external responder: `base` produces the reply body
/// and `post` reshapes it before the node publishes it. A null reply from
/// `base` stays null.
pub fn compose<F, G>(base: F, post: G) -> impl Fn(&Message) -> HandlerResult + Send + Sync
where
    F: Fn(&Message) -> HandlerResult + Send + Sync,
    G: Fn(Value) -> Value + Send + Sync,
{
    move |message| Ok(base(message)?.map(&post))
}
