//! Named-topic publish/subscribe hub.
//!
//! The bus is instance-scoped: construct one per playback session and inject
//! it into the [`crate::VariableManager`] and [`crate::DialogueEngine`] so
//! independent sessions (and tests) stay isolated.
//!
//! Dispatch is synchronous and re-entrant-safe. Handlers run in subscription
//! order on the caller's stack, and a handler may subscribe, unsubscribe, or
//! publish on the same bus mid-dispatch. A panicking handler is isolated:
//! the panic is caught and logged, the remaining handlers still run, and
//! `publish` never aborts mid-dispatch.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use tracing::{debug, error, warn};

use crate::events::EventPayload;

/// Soft cap on subscribers per topic; crossing it logs a warning because it
/// usually means a render layer is resubscribing without unsubscribing.
const SUBSCRIBER_WARN_THRESHOLD: usize = 100;

/// Token identifying one subscription, returned by [`EventBus::subscribe`].
///
/// Closures have no identity in Rust, so unsubscribing takes this token where
/// a scripting runtime would compare the handler function itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler = Rc<dyn Fn(&EventPayload)>;

struct Subscriber {
    id: HandlerId,
    handler: Handler,
    once: bool,
    /// Set before the first invocation so a recursive publish of the same
    /// topic cannot fire a `once` handler twice.
    fired: Cell<bool>,
}

type SubscriberList = Vec<Rc<Subscriber>>;

/// Synchronous publish/subscribe hub connecting the engine to its observers.
pub struct EventBus {
    topics: RefCell<HashMap<String, SubscriberList>>,
    next_id: Cell<u64>,
    debug: Cell<bool>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            topics: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
            debug: Cell::new(false),
        }
    }

    /// Enable or disable diagnostic traces for subscribe/publish calls.
    ///
    /// Tracing never alters dispatch order or timing.
    pub fn set_debug(&self, enabled: bool) {
        self.debug.set(enabled);
    }

    /// Subscribe a handler to a topic. Returns the token for unsubscribing.
    pub fn subscribe<F>(&self, topic: &str, handler: F) -> HandlerId
    where
        F: Fn(&EventPayload) + 'static,
    {
        self.add_subscriber(topic, Rc::new(handler), false)
    }

    /// Subscribe a handler that auto-unsubscribes after its first invocation,
    /// even if the topic is published recursively during its own dispatch.
    pub fn once<F>(&self, topic: &str, handler: F) -> HandlerId
    where
        F: Fn(&EventPayload) + 'static,
    {
        self.add_subscriber(topic, Rc::new(handler), true)
    }

    fn add_subscriber(&self, topic: &str, handler: Handler, once: bool) -> HandlerId {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);

        let mut topics = self.topics.borrow_mut();
        let subscribers = topics.entry(topic.to_string()).or_default();
        if subscribers.len() >= SUBSCRIBER_WARN_THRESHOLD {
            warn!(topic, count = subscribers.len(), "topic has an unusually large subscriber count");
        }
        subscribers.push(Rc::new(Subscriber {
            id,
            handler,
            once,
            fired: Cell::new(false),
        }));
        if self.debug.get() {
            debug!(topic, count = subscribers.len(), "subscribe");
        }
        id
    }

    /// Remove one subscription from a topic. Unknown tokens are ignored.
    pub fn unsubscribe(&self, topic: &str, id: HandlerId) {
        self.remove(topic, id);
        if self.debug.get() {
            debug!(topic, count = self.listener_count(topic), "unsubscribe");
        }
    }

    /// Alias of [`EventBus::unsubscribe`].
    pub fn off(&self, topic: &str, id: HandlerId) {
        self.unsubscribe(topic, id);
    }

    /// Publish a payload to every current subscriber of a topic, in
    /// subscription order, on the caller's stack.
    pub fn publish(&self, topic: &str, payload: EventPayload) {
        let snapshot: SubscriberList = match self.topics.borrow().get(topic) {
            Some(subscribers) => subscribers.clone(),
            None => {
                if self.debug.get() {
                    debug!(topic, "publish with no subscribers");
                }
                return;
            }
        };
        if self.debug.get() {
            debug!(topic, count = snapshot.len(), "publish");
        }

        for subscriber in snapshot {
            // An earlier handler may have unsubscribed this one mid-dispatch.
            let still_subscribed = self
                .topics
                .borrow()
                .get(topic)
                .is_some_and(|subs| subs.iter().any(|s| s.id == subscriber.id));
            if !still_subscribed {
                continue;
            }
            if subscriber.once {
                if subscriber.fired.get() {
                    continue;
                }
                subscriber.fired.set(true);
            }

            let outcome = catch_unwind(AssertUnwindSafe(|| (subscriber.handler)(&payload)));
            if let Err(panic) = outcome {
                error!(topic, "event handler panicked: {}", panic_message(panic.as_ref()));
            }

            if subscriber.once {
                self.remove(topic, subscriber.id);
            }
        }
    }

    /// Number of subscribers for one topic.
    pub fn listener_count(&self, topic: &str) -> usize {
        self.topics.borrow().get(topic).map_or(0, Vec::len)
    }

    /// Number of subscribers across all topics.
    pub fn total_listener_count(&self) -> usize {
        self.topics.borrow().values().map(Vec::len).sum()
    }

    /// Topics currently having at least one subscriber, sorted by name.
    pub fn events(&self) -> Vec<String> {
        let mut names: Vec<String> = self.topics.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    /// Remove all subscribers for one topic.
    pub fn clear(&self, topic: &str) {
        self.topics.borrow_mut().remove(topic);
        if self.debug.get() {
            debug!(topic, "clear");
        }
    }

    /// Remove all subscribers for every topic.
    pub fn clear_all(&self) {
        self.topics.borrow_mut().clear();
        if self.debug.get() {
            debug!("clear all topics");
        }
    }

    fn remove(&self, topic: &str, id: HandlerId) {
        let mut topics = self.topics.borrow_mut();
        if let Some(subscribers) = topics.get_mut(topic) {
            subscribers.retain(|s| s.id != id);
            if subscribers.is_empty() {
                topics.remove(topic);
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_handler(
        log: Rc<RefCell<Vec<&'static str>>>,
        tag: &'static str,
    ) -> impl Fn(&EventPayload) + 'static {
        move |_| log.borrow_mut().push(tag)
    }

    #[test]
    fn dispatch_in_subscription_order() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.subscribe("tick", log_handler(Rc::clone(&log), "first"));
        bus.subscribe("tick", log_handler(Rc::clone(&log), "second"));
        bus.subscribe("tick", log_handler(Rc::clone(&log), "third"));

        bus.publish("tick", EventPayload::None);
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn once_fires_exactly_once() {
        let bus = EventBus::new();
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        bus.once("tick", move |_| counter.set(counter.get() + 1));

        bus.publish("tick", EventPayload::None);
        bus.publish("tick", EventPayload::None);
        assert_eq!(count.get(), 1);
        assert_eq!(bus.listener_count("tick"), 0);
    }

    #[test]
    fn once_survives_recursive_publish() {
        let bus = Rc::new(EventBus::new());
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        let recursive = Rc::clone(&bus);
        bus.once("tick", move |_| {
            counter.set(counter.get() + 1);
            // Re-publishing the same topic from inside the handler must not
            // fire this handler a second time.
            if counter.get() == 1 {
                recursive.publish("tick", EventPayload::None);
            }
        });

        bus.publish("tick", EventPayload::None);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn panicking_handler_is_isolated() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.subscribe("tick", log_handler(Rc::clone(&log), "before"));
        bus.subscribe("tick", |_| panic!("handler exploded"));
        bus.subscribe("tick", log_handler(Rc::clone(&log), "after"));

        bus.publish("tick", EventPayload::None);
        assert_eq!(*log.borrow(), vec!["before", "after"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let id = bus.subscribe("tick", log_handler(Rc::clone(&log), "gone"));
        bus.off("tick", id);

        bus.publish("tick", EventPayload::None);
        assert!(log.borrow().is_empty());
        assert_eq!(bus.listener_count("tick"), 0);
    }

    #[test]
    fn handler_removed_mid_dispatch_is_skipped() {
        let bus = Rc::new(EventBus::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        // The remover runs first and unsubscribes the victim, which was
        // subscribed after it. The victim's token is filled in below.
        let victim_id: Rc<Cell<Option<HandlerId>>> = Rc::new(Cell::new(None));
        let remover_bus = Rc::clone(&bus);
        let remover_log = Rc::clone(&log);
        let remover_target = Rc::clone(&victim_id);
        bus.subscribe("tick", move |_| {
            remover_log.borrow_mut().push("remover");
            if let Some(id) = remover_target.get() {
                remover_bus.unsubscribe("tick", id);
            }
        });
        victim_id.set(Some(bus.subscribe("tick", log_handler(Rc::clone(&log), "victim"))));

        bus.publish("tick", EventPayload::None);
        assert_eq!(*log.borrow(), vec!["remover"]);
    }

    #[test]
    fn listener_counts_and_topic_listing() {
        let bus = EventBus::new();
        let a = bus.subscribe("a", |_| {});
        bus.subscribe("a", |_| {});
        bus.subscribe("b", |_| {});

        assert_eq!(bus.listener_count("a"), 2);
        assert_eq!(bus.listener_count("missing"), 0);
        assert_eq!(bus.total_listener_count(), 3);
        assert_eq!(bus.events(), vec!["a".to_string(), "b".to_string()]);

        bus.unsubscribe("a", a);
        assert_eq!(bus.listener_count("a"), 1);

        bus.clear("a");
        assert_eq!(bus.listener_count("a"), 0);
        assert_eq!(bus.events(), vec!["b".to_string()]);

        bus.clear_all();
        assert_eq!(bus.total_listener_count(), 0);
    }

    #[test]
    fn subscribe_during_dispatch_does_not_fire_immediately() {
        let bus = Rc::new(EventBus::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner_bus = Rc::clone(&bus);
        let inner_log = Rc::clone(&log);
        bus.subscribe("tick", move |_| {
            inner_log.borrow_mut().push("outer");
            let late_log = Rc::clone(&inner_log);
            inner_bus.subscribe("tick", move |_| late_log.borrow_mut().push("late"));
        });

        bus.publish("tick", EventPayload::None);
        assert_eq!(*log.borrow(), vec!["outer"]);

        bus.publish("tick", EventPayload::None);
        assert_eq!(*log.borrow(), vec!["outer", "outer", "late"]);
    }

    #[test]
    fn debug_flag_does_not_change_semantics() {
        let bus = EventBus::new();
        bus.set_debug(true);
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.subscribe("tick", log_handler(Rc::clone(&log), "first"));
        bus.subscribe("tick", log_handler(Rc::clone(&log), "second"));

        bus.publish("tick", EventPayload::None);
        bus.publish("silent", EventPayload::None);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }
}
