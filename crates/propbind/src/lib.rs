//! One-way property binding for observable objects.
//!
//! This crate keeps a target property synchronized with a source property:
//! whenever the source object reports "property X changed", the binding reads
//! the source value, coerces it across nullable/non-nullable shapes, applies
//! optional boolean negation, and writes the target. Components:
//!
//! - **Signal/Notification**: [`Signal`] plus the [`Observable`] capability,
//!   the publish/subscribe primitive carrying [`PropertyChanged`] events
//! - **Properties**: [`Property<T>`], a value cell with change detection
//! - **Accessors**: [`PropertyKey`], [`PropertyRef`], and [`BindingExpr`],
//!   declarative, type-erased property references
//! - **Binding engine**: [`bind_property`], [`handle_on_property_changed`],
//!   and [`BindOptions`]
//!
//! Accessor descriptors are usually generated with `#[derive(Observable)]`
//! from the `propbind-macros` crate.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use propbind::{bind_property, BindOptions, Property, PropertyChangedSignal};
//! use propbind_macros::Observable;
//!
//! #[derive(Observable, Default)]
//! struct Session {
//!     user: Property<Option<String>>,
//!     property_changed: PropertyChangedSignal,
//! }
//!
//! #[derive(Observable, Default)]
//! struct TitleBar {
//!     caption: Property<String>,
//!     property_changed: PropertyChangedSignal,
//! }
//!
//! let session = Arc::new(Session::default());
//! let title_bar = Arc::new(TitleBar::default());
//!
//! // `caption` follows `user`; a signed-out (null) user resets it to "".
//! bind_property(
//!     &*session,
//!     Session::user_ref(&session),
//!     TitleBar::caption_ref(&title_bar),
//!     BindOptions::INITIALISE_TARGET,
//! )?;
//!
//! session.set_user(Some("ada".to_string()));
//! assert_eq!(title_bar.caption(), "ada");
//! # Ok::<(), propbind::BindError>(())
//! ```
//!
//! # Semantics
//!
//! Bindings are one-directional and permanent: once installed, a binding
//! lives as long as its source, and its accessor closures keep the target
//! alive for that long. Dispatch is synchronous on the notifying call stack
//! with no queuing and no reentrancy protection; a cycle of bindings
//! recurses until the values stabilize, which [`Property::set`]'s change
//! detection guarantees for settling values.
//!
//! All validation is performed by the bind call itself; every failure mode
//! of [`bind_property`] is reported before any subscription is installed.

mod accessor;
mod binding;
mod error;
mod observable;
mod property;
mod signal;

pub use accessor::{BindingExpr, PropertyKey, PropertyRef};
pub use binding::{BindOptions, bind_property, handle_on_property_changed};
pub use error::{BindError, Result};
pub use observable::{Observable, PropertyChanged, PropertyChangedSignal};
pub use property::Property;
pub use signal::{ConnectionId, Signal};
