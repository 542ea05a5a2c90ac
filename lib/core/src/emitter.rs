use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::event::{EventName, ScrollEvent};

pub type EventCallback<E> = Rc<dyn Fn(&ScrollEvent<E>)>;

/// Identifies a subscription, used to remove it with `off`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Subscription<E> {
    id: ListenerId,
    event: EventName,
    callback: EventCallback<E>,
    once: bool,
}

/// Minimal synchronous pub/sub. Listeners run in subscription order within the emitting call.
pub struct Emitter<E> {
    next_id: Cell<u64>,
    subscriptions: RefCell<Vec<Subscription<E>>>,
}

impl<E> Default for Emitter<E> {
    fn default() -> Self {
        Emitter {
            next_id: Cell::new(0),
            subscriptions: RefCell::new(Vec::new()),
        }
    }
}

impl<E> Emitter<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, event: EventName, callback: EventCallback<E>) -> ListenerId {
        self.subscribe(event, callback, false)
    }

    pub fn once(&self, event: EventName, callback: EventCallback<E>) -> ListenerId {
        self.subscribe(event, callback, true)
    }

    /// Removes the subscription `id` from `event`, returns whether it existed.
    pub fn off(&self, event: EventName, id: ListenerId) -> bool {
        let mut subscriptions = self.subscriptions.borrow_mut();
        let count = subscriptions.len();
        subscriptions.retain(|subscription| !(subscription.event == event && subscription.id == id));
        subscriptions.len() != count
    }

    pub fn emit(&self, event: &ScrollEvent<E>) {
        let name = event.name();
        // Collected first so that listeners can subscribe or unsubscribe while running.
        let callbacks: Vec<EventCallback<E>> = {
            let mut subscriptions = self.subscriptions.borrow_mut();
            let callbacks = subscriptions.iter()
                .filter(|subscription| subscription.event == name)
                .map(|subscription| subscription.callback.clone())
                .collect();
            subscriptions.retain(|subscription| !(subscription.once && subscription.event == name));
            callbacks
        };
        for callback in callbacks {
            callback(event);
        }
    }

    pub fn listener_count(&self, event: EventName) -> usize {
        self.subscriptions.borrow().iter().filter(|subscription| subscription.event == event).count()
    }

    fn subscribe(&self, event: EventName, callback: EventCallback<E>, once: bool) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscriptions.borrow_mut().push(Subscription { id, event, callback, once });
        id
    }
}
