//! The binding rule engine and registrar.
//!
//! [`bind_property`] resolves a source and a target property reference,
//! validates them against each other, builds the transfer function, and
//! installs it on the source's change-notification signal filtered to the
//! bound property's name. All validation happens here, at bind time; the
//! installed transfer runs without checks for the lifetime of the source.
//!
//! The value-transfer rules cover the four nullability pairings of one base
//! type, with two option flags and boolean negation layered on top:
//!
//! - identical shapes, or a non-null source value, transfer verbatim;
//! - a null source value becomes null on a nullable target;
//! - a null source value becomes the base type's default on a non-nullable
//!   target, unless [`BindOptions::SUPPRESS_NULL_TO_DEFAULT`] leaves the
//!   target untouched instead;
//! - negation applies after null/default resolution, treating null as
//!   `false`, so a null negated source yields `true` by default.

use std::any::TypeId;
use std::sync::Arc;

use bitflags::bitflags;

use crate::accessor::{
    BindingExpr, DefaultFn, PropertyKey, ReadFn, ResolvedSource, ResolvedTarget, WriteFn,
    resolve_source, resolve_target,
};
use crate::error::{BindError, Result};
use crate::observable::Observable;

bitflags! {
    /// Options controlling a single binding. Combinable with `|`; the
    /// default (empty) set installs a purely reactive, coercing binding.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct BindOptions: u8 {
        /// Run the transfer once at bind time, before the subscription is
        /// installed, instead of waiting for the first change notification.
        const INITIALISE_TARGET = 1;

        /// When the source value is null and the target is non-nullable,
        /// leave the target unchanged instead of writing the base type's
        /// default value.
        const SUPPRESS_NULL_TO_DEFAULT = 1 << 1;
    }
}

/// The value-transfer function of one binding.
///
/// Captures the erased accessors and the decisions made at bind time;
/// carries no other state between invocations.
pub(crate) struct Transfer {
    source: PropertyKey,
    target: PropertyKey,
    read: ReadFn,
    write: WriteFn,
    make_default: Option<DefaultFn>,
    same_shape: bool,
    target_nullable: bool,
    suppress_null_to_default: bool,
    negated: bool,
}

impl Transfer {
    /// Run one value transfer from source to target.
    pub(crate) fn apply(&self) {
        let source_value = (self.read)();

        let (value, should_write) = if self.same_shape || source_value.is_some() {
            (source_value, true)
        } else if self.target_nullable {
            (None, true)
        } else if !self.suppress_null_to_default {
            let make_default = self
                .make_default
                .as_ref()
                .expect("non-nullable target resolved without a default factory");
            (Some(make_default()), true)
        } else {
            (None, false)
        };

        if !should_write {
            tracing::trace!(
                target: "propbind::binding",
                source = self.source.name(),
                target = self.target.name(),
                "null source suppressed, target unchanged"
            );
            return;
        }

        // Negation runs after null/default resolution: a null negated
        // source is treated as `false` and therefore written as `true`.
        let value = if self.negated {
            let current = value
                .map(|boxed| {
                    *boxed
                        .downcast::<bool>()
                        .expect("negated binding resolved over a non-boolean source")
                })
                .unwrap_or(false);
            Some(Box::new(!current) as _)
        } else {
            value
        };

        tracing::trace!(
            target: "propbind::binding",
            source = self.source.name(),
            target = self.target.name(),
            "transferring value"
        );
        (self.write)(value);
    }
}

/// Validate a resolved source/target pair and build its transfer function.
pub(crate) fn build_transfer(
    source: ResolvedSource,
    target: ResolvedTarget,
    negated: bool,
    options: BindOptions,
) -> Result<Transfer> {
    if source.base_type != target.base_type {
        return Err(BindError::IncompatibleTypes {
            source: source.base_type_name,
            target: target.base_type_name,
        });
    }

    if negated && source.base_type != TypeId::of::<bool>() {
        return Err(BindError::InvalidNegation {
            source: source.base_type_name,
        });
    }

    Ok(Transfer {
        source: source.key,
        target: target.key,
        read: source.read,
        write: target.write,
        make_default: target.make_default,
        same_shape: source.nullable == target.nullable,
        target_nullable: target.nullable,
        suppress_null_to_default: options.contains(BindOptions::SUPPRESS_NULL_TO_DEFAULT),
        negated,
    })
}

/// Bind a target property to a source property.
///
/// Whenever `source` raises a change notification for the property named by
/// `source_property`, the target property is updated with the source's
/// current value, coerced across nullability and negated as requested. With
/// [`BindOptions::INITIALISE_TARGET`] the first transfer runs immediately,
/// before the subscription is installed, so the initial call and the first
/// reactive call cannot double-fire for one external event.
///
/// Fails without installing anything if either reference is unusable for its
/// position, the base types differ, or negation is requested for a
/// non-boolean source. The binding cannot be removed; it lives as long as
/// the source, and its accessors keep the target alive for that long.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use propbind::{
///     BindOptions, Observable, Property, PropertyChangedSignal, PropertyKey, PropertyRef,
///     bind_property,
/// };
///
/// struct Thermostat {
///     celsius: Property<i32>,
///     property_changed: PropertyChangedSignal,
/// }
///
/// impl Thermostat {
///     const CELSIUS: PropertyKey = PropertyKey::new("celsius");
///
///     fn set_celsius(&self, value: i32) {
///         if self.celsius.set(value) {
///             self.raise_property_changed(Self::CELSIUS);
///         }
///     }
/// }
///
/// impl Observable for Thermostat {
///     fn property_changed(&self) -> &PropertyChangedSignal {
///         &self.property_changed
///     }
/// }
///
/// let thermostat = Arc::new(Thermostat {
///     celsius: Property::new(20),
///     property_changed: PropertyChangedSignal::new(),
/// });
/// let display = Arc::new(Property::new(0));
///
/// let source = {
///     let t = Arc::clone(&thermostat);
///     PropertyRef::getter(Thermostat::CELSIUS, move || t.celsius.get())
/// };
/// let target = {
///     let d = Arc::clone(&display);
///     PropertyRef::setter(PropertyKey::new("reading"), move |value| d.set_silent(value))
/// };
///
/// bind_property(&*thermostat, source, target, BindOptions::empty())?;
///
/// thermostat.set_celsius(23);
/// assert_eq!(display.get(), 23);
/// # Ok::<(), propbind::BindError>(())
/// ```
pub fn bind_property<S>(
    source: &S,
    source_property: impl Into<BindingExpr>,
    target_property: impl Into<BindingExpr>,
    options: BindOptions,
) -> Result<()>
where
    S: Observable + ?Sized,
{
    let resolved_source = resolve_source(source_property.into())?;
    let (resolved_target, negated) = resolve_target(target_property.into())?;
    let transfer = build_transfer(resolved_source, resolved_target, negated, options)?;

    if options.contains(BindOptions::INITIALISE_TARGET) {
        transfer.apply();
    }

    let filter = transfer.source;
    tracing::debug!(
        target: "propbind::binding",
        source = filter.name(),
        target = transfer.target.name(),
        negated,
        ?options,
        "installing binding"
    );
    source.property_changed().connect(move |change| {
        if change.name == filter.name() {
            transfer.apply();
        }
    });
    Ok(())
}

/// Attach a change handler filtered to one property of `source`.
///
/// `handler` is invoked with the source object every time the property named
/// by `property` reports a change. Purely forward-looking: the handler never
/// runs at attach time, and like a binding it cannot be detached.
pub fn handle_on_property_changed<S, F>(source: &Arc<S>, property: PropertyKey, handler: F)
where
    S: Observable + Send + Sync + 'static,
    F: Fn(&S) + Send + Sync + 'static,
{
    let subject = Arc::clone(source);
    source.property_changed().connect(move |change| {
        if change.name == property.name() {
            handler(&subject);
        }
    });
}
