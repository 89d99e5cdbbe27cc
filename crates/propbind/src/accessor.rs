//! Property accessor descriptors and their resolution.
//!
//! The binding engine does not inspect expressions or reflect over fields.
//! Callers describe each end of a binding with a [`PropertyRef`]: a
//! [`PropertyKey`] (the property's name) plus read and/or write delegates
//! bound to a concrete instance. The typed constructors erase the value type
//! behind `dyn Any` while recording its `TypeId` and nullability, which is
//! what lets the rule engine check compatibility between independently
//! constructed descriptors at bind time.
//!
//! Descriptors are usually generated by `#[derive(Observable)]` from the
//! `propbind-macros` crate, but can be written by hand:
//!
//! ```
//! use std::sync::Arc;
//! use propbind::{Property, PropertyKey, PropertyRef};
//!
//! let score = Arc::new(Property::new(0i32));
//!
//! let read = {
//!     let score = Arc::clone(&score);
//!     move || score.get()
//! };
//! let source = PropertyRef::getter(PropertyKey::new("score"), read);
//! assert_eq!(source.key().name(), "score");
//! assert!(!source.is_nullable());
//! ```
//!
//! A target reference may be negated with the `!` operator, mirroring a
//! declared `!object.flag` target expression; negation is only legal for
//! boolean bindings, which the rule engine checks once it sees both ends.

use std::any::{Any, TypeId};
use std::fmt;
use std::ops::Not;

use crate::error::{BindError, Result};

/// A type-erased property value. `None` models a null nullable value.
pub(crate) type BoxedValue = Box<dyn Any + Send + Sync>;

pub(crate) type ReadFn = Box<dyn Fn() -> Option<BoxedValue> + Send + Sync>;
pub(crate) type WriteFn = Box<dyn Fn(Option<BoxedValue>) + Send + Sync>;
pub(crate) type DefaultFn = Box<dyn Fn() -> BoxedValue + Send + Sync>;

/// A zero-cost handle naming a property.
///
/// The name is what change notifications report and what binding
/// subscriptions filter on; comparison is ordinal and case-sensitive.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyKey {
    name: &'static str,
}

impl PropertyKey {
    /// Create a key for the given property name.
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    /// The property name this key stands for.
    pub const fn name(self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropertyKey({:?})", self.name)
    }
}

/// A resolved property accessor: a name, optional read delegate, optional
/// write delegate, and the type information the rule engine validates.
///
/// Created once per binding call and consumed by it. A reference used in
/// source position must have a read delegate; one used in target position
/// must have a write delegate.
pub struct PropertyRef {
    key: PropertyKey,
    base_type: TypeId,
    base_type_name: &'static str,
    nullable: bool,
    read: Option<ReadFn>,
    write: Option<WriteFn>,
    make_default: Option<DefaultFn>,
}

impl PropertyRef {
    /// A read-only reference to a non-nullable property.
    pub fn getter<B, R>(key: PropertyKey, read: R) -> Self
    where
        B: Any + Send + Sync,
        R: Fn() -> B + Send + Sync + 'static,
    {
        Self {
            key,
            base_type: TypeId::of::<B>(),
            base_type_name: std::any::type_name::<B>(),
            nullable: false,
            read: Some(erased_read(read)),
            write: None,
            make_default: None,
        }
    }

    /// A read-only reference to a nullable (`Option`-valued) property.
    pub fn getter_opt<B, R>(key: PropertyKey, read: R) -> Self
    where
        B: Any + Send + Sync,
        R: Fn() -> Option<B> + Send + Sync + 'static,
    {
        Self {
            key,
            base_type: TypeId::of::<B>(),
            base_type_name: std::any::type_name::<B>(),
            nullable: true,
            read: Some(erased_read_opt(read)),
            write: None,
            make_default: None,
        }
    }

    /// A write-only reference to a non-nullable property.
    ///
    /// `B: Default` backs the null-to-default coercion rule: when a nullable
    /// source goes null and the target cannot hold null, the target receives
    /// `B::default()` unless the binding suppresses that.
    pub fn setter<B, W>(key: PropertyKey, write: W) -> Self
    where
        B: Any + Send + Sync + Default,
        W: Fn(B) + Send + Sync + 'static,
    {
        Self {
            key,
            base_type: TypeId::of::<B>(),
            base_type_name: std::any::type_name::<B>(),
            nullable: false,
            read: None,
            write: Some(erased_write(key.name(), write)),
            make_default: Some(default_factory::<B>()),
        }
    }

    /// A write-only reference to a nullable property.
    pub fn setter_opt<B, W>(key: PropertyKey, write: W) -> Self
    where
        B: Any + Send + Sync,
        W: Fn(Option<B>) + Send + Sync + 'static,
    {
        Self {
            key,
            base_type: TypeId::of::<B>(),
            base_type_name: std::any::type_name::<B>(),
            nullable: true,
            read: None,
            write: Some(erased_write_opt(key.name(), write)),
            make_default: None,
        }
    }

    /// A read-write reference to a non-nullable property.
    pub fn accessor<B, R, W>(key: PropertyKey, read: R, write: W) -> Self
    where
        B: Any + Send + Sync + Default,
        R: Fn() -> B + Send + Sync + 'static,
        W: Fn(B) + Send + Sync + 'static,
    {
        let mut this = Self::setter(key, write);
        this.read = Some(erased_read(read));
        this
    }

    /// A read-write reference to a nullable property.
    pub fn accessor_opt<B, R, W>(key: PropertyKey, read: R, write: W) -> Self
    where
        B: Any + Send + Sync,
        R: Fn() -> Option<B> + Send + Sync + 'static,
        W: Fn(Option<B>) + Send + Sync + 'static,
    {
        let mut this = Self::setter_opt(key, write);
        this.read = Some(erased_read_opt(read));
        this
    }

    /// The key naming the referenced property.
    pub fn key(&self) -> PropertyKey {
        self.key
    }

    /// Whether the referenced property is nullable (`Option`-valued).
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// The name of the non-nullable base type of the referenced property.
    pub fn base_type_name(&self) -> &'static str {
        self.base_type_name
    }
}

impl fmt::Debug for PropertyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyRef")
            .field("key", &self.key)
            .field("base_type", &self.base_type_name)
            .field("nullable", &self.nullable)
            .field("readable", &self.read.is_some())
            .field("writable", &self.write.is_some())
            .finish()
    }
}

static_assertions::assert_impl_all!(PropertyRef: Send, Sync);

fn erased_read<B, R>(read: R) -> ReadFn
where
    B: Any + Send + Sync,
    R: Fn() -> B + Send + Sync + 'static,
{
    Box::new(move || Some(Box::new(read()) as BoxedValue))
}

fn erased_read_opt<B, R>(read: R) -> ReadFn
where
    B: Any + Send + Sync,
    R: Fn() -> Option<B> + Send + Sync + 'static,
{
    Box::new(move || read().map(|value| Box::new(value) as BoxedValue))
}

fn erased_write<B, W>(name: &'static str, write: W) -> WriteFn
where
    B: Any + Send + Sync,
    W: Fn(B) + Send + Sync + 'static,
{
    Box::new(move |value| {
        // The rule engine resolves null to a concrete value before a
        // non-nullable write, and checks base types at bind time; violating
        // either here is a construction bug, not a runtime condition.
        let boxed = value
            .unwrap_or_else(|| panic!("null written to non-nullable property '{name}'"));
        let typed = boxed
            .downcast::<B>()
            .unwrap_or_else(|_| panic!("type-mismatched value written to property '{name}'"));
        write(*typed);
    })
}

fn erased_write_opt<B, W>(name: &'static str, write: W) -> WriteFn
where
    B: Any + Send + Sync,
    W: Fn(Option<B>) + Send + Sync + 'static,
{
    Box::new(move |value| {
        let typed = value.map(|boxed| {
            *boxed
                .downcast::<B>()
                .unwrap_or_else(|_| panic!("type-mismatched value written to property '{name}'"))
        });
        write(typed);
    })
}

fn default_factory<B: Any + Send + Sync + Default>() -> DefaultFn {
    Box::new(|| Box::new(B::default()) as BoxedValue)
}

/// A possibly-negated property reference, as accepted by the bind call.
///
/// Built from a plain [`PropertyRef`] via `From`, or a negated one via the
/// `!` operator. Negation is only meaningful for target references over
/// boolean properties; the rule engine rejects everything else.
#[derive(Debug)]
pub struct BindingExpr {
    pub(crate) property: PropertyRef,
    pub(crate) negated: bool,
}

impl From<PropertyRef> for BindingExpr {
    fn from(property: PropertyRef) -> Self {
        Self {
            property,
            negated: false,
        }
    }
}

impl Not for PropertyRef {
    type Output = BindingExpr;

    fn not(self) -> BindingExpr {
        BindingExpr {
            property: self,
            negated: true,
        }
    }
}

/// A source reference resolved for binding: read delegate required.
pub(crate) struct ResolvedSource {
    pub(crate) key: PropertyKey,
    pub(crate) base_type: TypeId,
    pub(crate) base_type_name: &'static str,
    pub(crate) nullable: bool,
    pub(crate) read: ReadFn,
}

impl fmt::Debug for ResolvedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedSource")
            .field("key", &self.key)
            .field("base_type", &self.base_type)
            .field("base_type_name", &self.base_type_name)
            .field("nullable", &self.nullable)
            .finish_non_exhaustive()
    }
}

/// A target reference resolved for binding: write delegate required.
pub(crate) struct ResolvedTarget {
    pub(crate) key: PropertyKey,
    pub(crate) base_type: TypeId,
    pub(crate) base_type_name: &'static str,
    pub(crate) nullable: bool,
    pub(crate) write: WriteFn,
    pub(crate) make_default: Option<DefaultFn>,
}

impl fmt::Debug for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedTarget")
            .field("key", &self.key)
            .field("base_type", &self.base_type)
            .field("base_type_name", &self.base_type_name)
            .field("nullable", &self.nullable)
            .finish_non_exhaustive()
    }
}

/// Resolve an expression for source position.
///
/// Sources must be plain, readable property references; negation belongs on
/// the target side only.
pub(crate) fn resolve_source(expr: BindingExpr) -> Result<ResolvedSource> {
    if expr.negated {
        return Err(BindError::InvalidExpression {
            reason: "source must be a plain property reference",
        });
    }
    let PropertyRef {
        key,
        base_type,
        base_type_name,
        nullable,
        read,
        ..
    } = expr.property;
    let read = read.ok_or(BindError::InvalidExpression {
        reason: "source property reference has no getter",
    })?;
    Ok(ResolvedSource {
        key,
        base_type,
        base_type_name,
        nullable,
        read,
    })
}

/// Resolve an expression for target position, reporting whether it was
/// negated. Whether negation is legal depends on the source's base type and
/// is checked by the rule engine, which sees both ends.
pub(crate) fn resolve_target(expr: BindingExpr) -> Result<(ResolvedTarget, bool)> {
    let negated = expr.negated;
    let PropertyRef {
        key,
        base_type,
        base_type_name,
        nullable,
        write,
        make_default,
        ..
    } = expr.property;
    let write = write.ok_or(BindError::InvalidExpression {
        reason: "target property reference has no setter",
    })?;
    Ok((
        ResolvedTarget {
            key,
            base_type,
            base_type_name,
            nullable,
            write,
            make_default,
        },
        negated,
    ))
}
