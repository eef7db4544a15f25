//! Session-scoped publish/subscribe bus for window lifecycle notifications.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use desktop_app_contract::Subscription;

use crate::model::{WindowEvent, WindowEventKind};

type EventHandler = Rc<dyn Fn(&WindowEvent)>;

struct Subscriber {
    id: u64,
    kind: Option<WindowEventKind>,
    handler: EventHandler,
}

#[derive(Default)]
struct BusState {
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

#[derive(Clone, Default)]
/// Typed notification bus. Clones share subscribers.
pub struct EventBus {
    state: Rc<RefCell<BusState>>,
}

impl EventBus {
    /// Registers `handler` for one notification kind.
    pub fn subscribe(
        &self,
        kind: WindowEventKind,
        handler: impl Fn(&WindowEvent) + 'static,
    ) -> Subscription {
        self.register(Some(kind), Rc::new(handler))
    }

    /// Registers `handler` for every notification kind.
    pub fn subscribe_all(&self, handler: impl Fn(&WindowEvent) + 'static) -> Subscription {
        self.register(None, Rc::new(handler))
    }

    fn register(&self, kind: Option<WindowEventKind>, handler: EventHandler) -> Subscription {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            state.subscribers.push(Subscriber { id, kind, handler });
            id
        };

        let weak: Weak<RefCell<BusState>> = Rc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = weak.upgrade() {
                state
                    .borrow_mut()
                    .subscribers
                    .retain(|subscriber| subscriber.id != id);
            }
        })
    }

    /// Delivers `event` to matching subscribers in registration order.
    ///
    /// Handlers run after the internal borrow is released, so they may subscribe or drop
    /// subscriptions while being notified.
    pub fn publish(&self, event: &WindowEvent) {
        let handlers: Vec<EventHandler> = self
            .state
            .borrow()
            .subscribers
            .iter()
            .filter(|subscriber| subscriber.kind.map_or(true, |kind| kind == event.kind))
            .map(|subscriber| Rc::clone(&subscriber.handler))
            .collect();

        for handler in handlers {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().subscribers.len()
    }
}
