//! Signal/slot system for dragline.
//!
//! Signals are the observer primitive every drag source and drop target uses to
//! publish its lifecycle. Unlike a plain notification, slots receive the
//! payload mutably: a slot may veto a cancelable event or rewrite a proposed
//! value before the emitter reads it back.
//!
//! # Example
//!
//! ```
//! use dragline_core::Signal;
//!
//! #[derive(Default)]
//! struct Proposal {
//!     value: i32,
//!     cancel: bool,
//! }
//!
//! let proposed = Signal::<Proposal>::new();
//! proposed.connect(|args| {
//!     if args.value > 10 {
//!         args.cancel = true;
//!     }
//! });
//!
//! let mut args = Proposal { value: 42, cancel: false };
//! proposed.emit(&mut args);
//! assert!(args.cancel);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    pub struct ConnectionId;
}

/// The boxed slot type stored by a signal.
type BoxedSlot<Args> = Box<dyn FnMut(&mut Args) + Send + 'static>;

/// A type-safe signal that can have multiple connected slots.
///
/// Slots are invoked in connection order. Emission holds the connection lock,
/// so a slot must not connect to, disconnect from, or emit the signal it is
/// currently running on.
pub struct Signal<Args> {
    /// All active connections.
    connections: Mutex<SlotMap<ConnectionId, BoxedSlot<Args>>>,
    /// Whether signal emission is temporarily blocked.
    blocked: AtomicBool,
}

impl<Args> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connection_count())
            .field("blocked", &self.is_blocked())
            .finish()
    }
}

impl<Args> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: FnMut(&mut Args) + Send + 'static,
    {
        self.connections.lock().insert(Box::new(slot))
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` do nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking all connected slots with the payload.
    ///
    /// Any changes slots make to `args` are visible to the caller afterwards.
    #[tracing::instrument(skip_all, target = "dragline_core::signal", level = "trace")]
    pub fn emit(&self, args: &mut Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return;
        }

        let mut connections = self.connections.lock();
        tracing::trace!(
            target: targets::SIGNAL,
            connection_count = connections.len(),
            "emitting signal"
        );

        for (_, slot) in connections.iter_mut() {
            slot(args);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct Vetoable {
        value: i32,
        cancel: bool,
    }

    #[test]
    fn test_signal_connect_emit() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        signal.connect(move |value| {
            received_clone.lock().push(*value);
        });

        signal.emit(&mut 42);
        signal.emit(&mut 100);

        let values = received.lock();
        assert_eq!(*values, vec![42, 100]);
    }

    #[test]
    fn test_signal_disconnect() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        let conn_id = signal.connect(move |value| {
            received_clone.lock().push(*value);
        });

        signal.emit(&mut 1);
        assert!(signal.disconnect(conn_id));
        assert!(!signal.disconnect(conn_id));
        signal.emit(&mut 2);

        let values = received.lock();
        assert_eq!(*values, vec![1]);
    }

    #[test]
    fn test_signal_blocked() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        signal.connect(move |value| {
            received_clone.lock().push(*value);
        });

        signal.emit(&mut 1);
        signal.set_blocked(true);
        signal.emit(&mut 2);
        signal.set_blocked(false);
        signal.emit(&mut 3);

        let values = received.lock();
        assert_eq!(*values, vec![1, 3]);
    }

    #[test]
    fn test_slot_can_veto() {
        let signal = Signal::<Vetoable>::new();
        signal.connect(|args| {
            if args.value < 0 {
                args.cancel = true;
            }
        });

        let mut allowed = Vetoable {
            value: 5,
            cancel: false,
        };
        signal.emit(&mut allowed);
        assert!(!allowed.cancel);

        let mut vetoed = Vetoable {
            value: -5,
            cancel: false,
        };
        signal.emit(&mut vetoed);
        assert!(vetoed.cancel);
    }

    #[test]
    fn test_slots_run_in_connection_order() {
        let signal = Signal::<Vec<&'static str>>::new();
        signal.connect(|log| log.push("first"));
        signal.connect(|log| log.push("second"));

        let mut log = Vec::new();
        signal.emit(&mut log);
        assert_eq!(log, vec!["first", "second"]);
    }

    #[test]
    fn test_disconnect_all() {
        let signal = Signal::<()>::new();

        for _ in 0..5 {
            signal.connect(|_| {});
        }

        assert_eq!(signal.connection_count(), 5);
        signal.disconnect_all();
        assert_eq!(signal.connection_count(), 0);
    }
}
