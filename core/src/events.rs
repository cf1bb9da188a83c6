//! System lifecycle notifications (sleep, wake, terminate).
//!
//! The core never talks to the OS directly. Platform shells translate their
//! native notifications into [`SystemEvent`]s and post them into an
//! [`EventHub`], usually [`EventHub::global`].

use log::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemEvent {
    WillSleep,
    DidWake,
    WillTerminate,
}

/// Callback type for system event notifications
pub type EventHandler = Arc<dyn Fn(SystemEvent) + Send + Sync + 'static>;

/// Identifies one subscription so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

/// Anything that can deliver system events to subscribers.
pub trait SystemEventSource: Send + Sync {
    fn subscribe(&self, handler: EventHandler) -> SubscriptionToken;
    fn unsubscribe(&self, token: SubscriptionToken);
}

/// In-process fan-out of system events to registered handlers.
#[derive(Default)]
pub struct EventHub {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(SubscriptionToken, EventHandler)>>,
}

static GLOBAL_HUB: OnceLock<Arc<EventHub>> = OnceLock::new();

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide hub that platform observers post into.
    pub fn global() -> Arc<EventHub> {
        GLOBAL_HUB
            .get_or_init(|| Arc::new(EventHub::new()))
            .clone()
    }

    /// Deliver `event` to every current subscriber.
    /// Handlers run outside the lock, so they may subscribe or unsubscribe.
    pub fn post(&self, event: SystemEvent) {
        let handlers: Vec<EventHandler> = self
            .lock()
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        debug!(
            "Posting {:?} to {} subscriber(s)",
            event,
            handlers.len()
        );
        for handler in handlers {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(SubscriptionToken, EventHandler)>> {
        // A panicking handler never runs under this lock, so the data is intact.
        self.handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SystemEventSource for EventHub {
    fn subscribe(&self, handler: EventHandler) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((token, handler));
        debug!("Added system event subscription {:?}", token);
        token
    }

    fn unsubscribe(&self, token: SubscriptionToken) {
        let mut handlers = self.lock();
        let before = handlers.len();
        handlers.retain(|(t, _)| *t != token);
        if handlers.len() == before {
            warn!("Unknown system event subscription {:?}", token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_handler(counter: &Arc<AtomicUsize>) -> EventHandler {
        let counter = Arc::clone(counter);
        Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn post_reaches_every_subscriber() {
        let hub = EventHub::new();
        let counter = Arc::new(AtomicUsize::new(0));
        hub.subscribe(counting_handler(&counter));
        hub.subscribe(counting_handler(&counter));

        hub.post(SystemEvent::DidWake);

        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsubscribed_handler_is_not_called() {
        let hub = EventHub::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let token = hub.subscribe(counting_handler(&counter));
        hub.unsubscribe(token);

        hub.post(SystemEvent::WillSleep);

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn handler_may_unsubscribe_itself() {
        let hub = Arc::new(EventHub::new());
        let token_slot: Arc<Mutex<Option<SubscriptionToken>>> = Arc::new(Mutex::new(None));

        let hub_ref = Arc::clone(&hub);
        let slot = Arc::clone(&token_slot);
        let token = hub.subscribe(Arc::new(move |_| {
            if let Some(token) = slot.lock().unwrap().take() {
                hub_ref.unsubscribe(token);
            }
        }));
        *token_slot.lock().unwrap() = Some(token);

        hub.post(SystemEvent::WillTerminate);

        assert_eq!(hub.subscriber_count(), 0);
    }
}
