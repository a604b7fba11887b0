//! Handler registry keyed by message kind.

use std::collections::HashMap;
use std::sync::Arc;

use super::message::{InboundMessage, MessageKind};

/// Callback for inbound messages.
pub type MessageHandler = Arc<dyn Fn(&InboundMessage) + Send + Sync>;

/// Dispatch table for inbound messages.
///
/// Handlers for a kind run in registration order, followed by the catch-all
/// handlers, which see every message including unknown ones. Once closed,
/// nothing is dispatched again.
#[derive(Default)]
pub struct HandlerRegistry {
    by_kind: HashMap<MessageKind, Vec<MessageHandler>>,
    any: Vec<MessageHandler>,
    closed: bool,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: MessageKind, handler: MessageHandler) {
        self.by_kind.entry(kind).or_default().push(handler);
    }

    pub fn register_any(&mut self, handler: MessageHandler) {
        self.any.push(handler);
    }

    /// Invoke matching handlers. Returns how many ran.
    pub fn dispatch(&self, message: &InboundMessage) -> usize {
        if self.closed {
            return 0;
        }
        let specific = self.by_kind.get(&message.kind()).map(Vec::as_slice).unwrap_or(&[]);
        for handler in specific.iter().chain(self.any.iter()) {
            handler(message);
        }
        specific.len() + self.any.len()
    }

    /// Drop all handlers and refuse further dispatch.
    pub fn close(&mut self) {
        self.closed = true;
        self.by_kind.clear();
        self.any.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn broadcast(event: &str) -> InboundMessage {
        InboundMessage::Broadcast {
            event: event.to_string(),
            data: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = HandlerRegistry::new();

        for tag in ["first", "second"] {
            let log = log.clone();
            registry.register(
                MessageKind::Event("news".into()),
                Arc::new(move |_| log.lock().unwrap().push(tag)),
            );
        }
        let any_log = log.clone();
        registry.register_any(Arc::new(move |_| any_log.lock().unwrap().push("any")));

        assert_eq!(registry.dispatch(&broadcast("news")), 3);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "any"]);
    }

    #[test]
    fn test_unknown_messages_reach_catch_all_only() {
        let hits = Arc::new(Mutex::new(0));
        let mut registry = HandlerRegistry::new();
        registry.register(MessageKind::JobAssignment, Arc::new(|_| panic!("wrong kind")));
        let counter = hits.clone();
        registry.register_any(Arc::new(move |_| *counter.lock().unwrap() += 1));

        assert_eq!(registry.dispatch(&broadcast("mystery")), 1);
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn test_closed_registry_dispatches_nothing() {
        let mut registry = HandlerRegistry::new();
        registry.register_any(Arc::new(|_| panic!("closed")));
        registry.close();
        assert!(registry.is_closed());
        assert_eq!(registry.dispatch(&broadcast("x")), 0);
    }
}
