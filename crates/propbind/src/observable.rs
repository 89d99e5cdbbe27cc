//! The observable-object capability.
//!
//! Any type used as a binding source must expose a change-notification
//! stream: a [`Signal`] that reports which property changed by name. The
//! [`Observable`] trait requires that capability statically, so raising a
//! change notification on a type that has none is a compile-time error
//! rather than a silent no-op.
//!
//! Implementations typically pair a `property_changed` signal field with
//! [`Property<T>`](crate::Property) fields and raise only when a set call
//! reports a genuine change; `#[derive(Observable)]` from `propbind-macros`
//! generates exactly that pattern.

use crate::accessor::PropertyKey;
use crate::signal::Signal;

/// Payload of a property change notification: the name of the property that
/// changed on the emitting object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertyChanged {
    /// The changed property's name, as resolved from its [`PropertyKey`].
    pub name: &'static str,
}

/// The signal type every observable object exposes.
pub type PropertyChangedSignal = Signal<PropertyChanged>;

static_assertions::assert_impl_all!(PropertyChangedSignal: Send, Sync);

/// The capability consumed by the binding registrar: subscribe to "a named
/// property changed" events and raise them.
pub trait Observable {
    /// The object's change-notification signal.
    fn property_changed(&self) -> &PropertyChangedSignal;

    /// Raise a change notification for the property named by `property`.
    ///
    /// All slots connected to [`property_changed`](Self::property_changed)
    /// run synchronously before this returns.
    fn raise_property_changed(&self, property: PropertyKey) {
        tracing::trace!(
            target: "propbind::observable",
            property = property.name(),
            "raising property changed"
        );
        self.property_changed().emit(PropertyChanged {
            name: property.name(),
        });
    }
}
