//! Synchronous signal/slot primitive.
//!
//! [`Signal<Args>`] is the publish/subscribe mechanism underneath change
//! notification: slots (closures) are connected to a signal, and emitting the
//! signal invokes every connected slot with a reference to the arguments.
//!
//! Dispatch is strictly synchronous and runs on the emitting call stack: each
//! slot runs to completion before the next, and `emit` returns only after the
//! last slot has returned. There is no queuing, no cross-thread delivery, and
//! no reentrancy guard: a slot that causes the same signal to be emitted
//! again recurses, which is what lets a chain of bindings settle (writes stop
//! notifying once a property stops changing) and what makes a genuinely
//! cyclic, never-stabilizing binding the caller's bug.
//!
//! Slots are invoked outside the connection lock, so a slot may connect or
//! disconnect slots on the signal it was invoked from. Connections made during
//! an emission are not invoked by that emission.
//!
//! # Example
//!
//! ```
//! use propbind::{PropertyChanged, Signal};
//!
//! let property_changed = Signal::<PropertyChanged>::new();
//!
//! let conn_id = property_changed.connect(|change| {
//!     println!("property {} changed", change.name);
//! });
//!
//! property_changed.emit(PropertyChanged { name: "volume" });
//!
//! property_changed.disconnect(conn_id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific slot via [`Signal::disconnect`].
    /// Note that the binding registrar never exposes the connections it
    /// installs: bindings live for the lifetime of their source.
    pub struct ConnectionId;
}

/// Internal storage for a single connection.
struct Connection<Args> {
    /// The slot to invoke (Arc-wrapped so it can be cloned out of the lock).
    slot: Arc<dyn Fn(&Args) + Send + Sync>,
}

/// A type-safe signal with synchronously invoked slots.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots by reference. Use
///   `()` for signals with no arguments, or a tuple for several.
///
/// # Thread Safety
///
/// `Signal<Args>` is `Send + Sync`; connections may be added or removed from
/// any thread. Emission always runs the slots on the emitting thread.
pub struct Signal<Args> {
    /// All active connections, in subscription order.
    connections: Mutex<SlotMap<ConnectionId, Connection<Args>>>,
    /// Whether emission is temporarily blocked.
    blocked: AtomicBool,
}

impl<Args> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
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
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let connection = Connection {
            slot: Arc::new(slot),
        };
        self.connections.lock().insert(connection)
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed.
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
    /// While blocked, calls to `emit()` do nothing. Useful during batch
    /// updates to prevent cascading notifications.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking all connected slots in subscription order.
    ///
    /// Does nothing if the signal is blocked. The slots run synchronously on
    /// the current call stack; the connection lock is released before any slot
    /// runs, so slots may re-enter this signal.
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: "propbind::signal", "signal blocked, skipping emit");
            return;
        }

        let slots: Vec<Arc<dyn Fn(&Args) + Send + Sync>> = {
            let connections = self.connections.lock();
            connections.values().map(|c| c.slot.clone()).collect()
        };
        tracing::trace!(target: "propbind::signal", connection_count = slots.len(), "emitting signal");

        for slot in slots {
            slot(&args);
        }
    }
}
