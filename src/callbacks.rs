//! Condition-triggered callbacks checked once per tick.

use std::fmt;

/// Handle returned by [`CallbackHandler::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

type Condition<C> = Box<dyn Fn(&C) -> bool>;
type Action<C> = Box<dyn FnMut(&C)>;

struct Listener<C> {
    id: CallbackId,
    condition: Condition<C>,
    action: Action<C>,
    one_time: bool,
}

/// A list of `(condition, action)` pairs evaluated against a context `C`.
///
/// [`CallbackHandler::check`] runs every action whose condition holds, in
/// registration order. One-time listeners are dropped after firing.
pub struct CallbackHandler<C> {
    listeners: Vec<Listener<C>>,
    next_id: u64,
}

impl<C> Default for CallbackHandler<C> {
    fn default() -> Self {
        CallbackHandler {
            listeners: Vec::new(),
            next_id: 0,
        }
    }
}

impl<C> fmt::Debug for CallbackHandler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackHandler")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<C> CallbackHandler<C> {
    pub fn new() -> Self {
        CallbackHandler::default()
    }

    pub fn add(
        &mut self,
        condition: impl Fn(&C) -> bool + 'static,
        action: impl FnMut(&C) + 'static,
        one_time: bool,
    ) -> CallbackId {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener {
            id,
            condition: Box::new(condition),
            action: Box::new(action),
            one_time,
        });
        id
    }

    pub fn remove(&mut self, id: CallbackId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|listener| listener.id != id);
        self.listeners.len() != before
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Fires every listener whose condition holds for `context`. Returns how many fired.
    pub fn check(&mut self, context: &C) -> usize {
        let mut fired = 0;
        self.listeners.retain_mut(|listener| {
            if !(listener.condition)(context) {
                return true;
            }
            (listener.action)(context);
            fired += 1;
            !listener.one_time
        });
        fired
    }
}
