//! Reactive property cells.
//!
//! [`Property<T>`] is the recommended storage for bindable state. It wraps a
//! value with interior mutability and change detection: [`Property::set`]
//! reports whether the stored value actually changed, so the owning object can
//! raise its change notification only for genuine changes and a chain of
//! bindings stabilizes instead of notifying forever.
//!
//! The binding engine itself never touches a `Property<T>` directly; it only
//! sees the read/write accessors resolved from a
//! [`PropertyRef`](crate::PropertyRef). Any storage with the same semantics
//! can back a binding.
//!
//! # Example
//!
//! ```
//! use propbind::Property;
//!
//! let volume = Property::new(30);
//! assert_eq!(volume.get(), 30);
//!
//! // Setting the same value reports no change.
//! assert!(!volume.set(30));
//!
//! // Setting a different value reports a change; the owner should now
//! // raise its property-changed notification.
//! assert!(volume.set(55));
//! assert_eq!(volume.get(), 55);
//! ```

use std::fmt;

use parking_lot::RwLock;

/// A value cell with change detection.
///
/// `Property<T>` is `Send + Sync` (interior mutability via `RwLock`) and is
/// shared between the application and any bindings through the accessor
/// closures that capture its owner.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Get the current value.
    ///
    /// This clones the value. For large types, consider using `with()` instead.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Access the value through a closure without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.read())
    }

    /// Set the value without change detection.
    ///
    /// Useful for plain (non-observable) binding targets and for
    /// initialization, where no notification should follow the write.
    pub fn set_silent(&self, value: T) {
        *self.value.write() = value;
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Set the value, returning `true` if the value changed.
    ///
    /// The caller should raise the owner's change notification when this
    /// returns `true`.
    pub fn set(&self, value: T) -> bool {
        let mut current = self.value.write();
        if *current != value {
            *current = value;
            true
        } else {
            false
        }
    }

    /// Set the value, returning the old value if it changed.
    pub fn replace(&self, value: T) -> Option<T> {
        let mut current = self.value.write();
        if *current != value {
            let old = std::mem::replace(&mut *current, value);
            Some(old)
        } else {
            None
        }
    }
}

impl<T: Clone> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_new_property_holds_initial_value() {
        let volume = Property::new(30);
        assert_eq!(volume.get(), 30);
    }

    #[test]
    fn test_property_set_detects_change() {
        let prop = Property::new(10);

        // Same value - no change
        assert!(!prop.set(10));
        assert_eq!(prop.get(), 10);

        // Different value - changed
        assert!(prop.set(20));
        assert_eq!(prop.get(), 20);
    }

    #[test]
    fn test_property_set_silent() {
        let prop = Property::new(100);
        prop.set_silent(200);
        assert_eq!(prop.get(), 200);
    }

    #[test]
    fn test_replace_reports_old_value_only_on_change() {
        let state = Property::new("idle".to_string());

        assert!(state.replace("idle".to_string()).is_none());

        let old = state.replace("running".to_string());
        assert_eq!(old, Some("idle".to_string()));
        assert_eq!(state.get(), "running");
    }

    #[test]
    fn test_property_with_closure() {
        let prop = Property::new(vec![1, 2, 3]);

        let sum: i32 = prop.with(|v| v.iter().sum());
        assert_eq!(sum, 6);
    }

    #[test]
    fn test_optional_property() {
        let prop: Property<Option<i32>> = Property::new(None);
        assert_eq!(prop.get(), None);

        assert!(prop.set(Some(7)));
        assert_eq!(prop.get(), Some(7));

        assert!(prop.set(None));
        assert_eq!(prop.get(), None);
    }

    #[test]
    fn test_property_thread_safe() {
        let prop = Arc::new(Property::new(0));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let prop = prop.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        prop.set_silent(i);
                        let _ = prop.get();
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn test_property_default() {
        let prop: Property<i32> = Property::default();
        assert_eq!(prop.get(), 0);

        let prop: Property<String> = Property::default();
        assert_eq!(prop.get(), "");
    }
}
