//! Procedural macros for the propbind binding engine.
//!
//! This crate provides `#[derive(Observable)]`, which turns a struct of
//! `Property<T>` fields into an observable object with generated accessor
//! descriptors, replacing runtime expression inspection in the binding API
//! with a codegen step.
//!
//! # Requirements
//!
//! The struct must have a `property_changed: PropertyChangedSignal` field.
//! Every other field of type `Property<T>` (or `Property<Option<T>>` for a
//! nullable property) becomes a bindable property; `T` must be
//! `Clone + PartialEq + Send + Sync + 'static`, and non-nullable writable
//! properties additionally need `T: Default` for null-to-default coercion.
//!
//! # Generated items
//!
//! For a field `number: Property<i32>` on `struct Counter`:
//!
//! - `Counter::NUMBER`: the `PropertyKey` naming the property
//! - `counter.number()`: getter
//! - `counter.set_number(value)`: setter that raises `property_changed`
//!   only when the stored value actually changed
//! - `Counter::number_ref(&arc)`: a `PropertyRef` whose read/write
//!   closures capture a strong `Arc` to the instance
//!
//! plus an `Observable` implementation for the struct.
//!
//! # Field attributes
//!
//! - `#[property(skip)]`: the field is not treated as a property
//! - `#[property(read_only)]`: no setter and no write delegate are
//!   generated; the property can only be used in source position
//! - `#[property(rename = "Name")]`: the reported property name differs
//!   from the field name
//!
//! # Example
//!
//! ```ignore
//! use propbind::{Property, PropertyChangedSignal};
//! use propbind_macros::Observable;
//!
//! #[derive(Observable, Default)]
//! struct Counter {
//!     value: Property<i32>,
//!     #[property(read_only)]
//!     limit: Property<i32>,
//!     property_changed: PropertyChangedSignal,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    Data, DeriveInput, Expr, ExprLit, Field, Fields, Ident, Lit, Type, parse_macro_input,
};

/// Derive the `Observable` trait and generate property accessors.
#[proc_macro_derive(Observable, attributes(property))]
pub fn derive_observable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match impl_derive_observable(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Parsed property information.
struct PropertyInfo {
    field_name: Ident,
    /// The `T` of `Property<T>`, as written.
    inner_type: Type,
    /// The `B` of `Property<Option<B>>`, when the property is nullable.
    optional_base: Option<Type>,
    /// The reported property name (field name unless renamed).
    property_name: String,
    read_only: bool,
}

fn impl_derive_observable(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Observable derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Observable derive only supports structs",
            ));
        }
    };

    let signal_field = fields
        .iter()
        .find(|f| f.ident.as_ref().is_some_and(|i| i == "property_changed"));

    if signal_field.is_none() {
        return Err(syn::Error::new_spanned(
            input,
            "Observable derive requires a `property_changed: PropertyChangedSignal` field",
        ));
    }

    let mut properties = Vec::new();
    for field in fields.iter() {
        if let Some(info) = parse_property_field(field)? {
            properties.push(info);
        }
    }

    let property_items: Vec<TokenStream2> = properties
        .iter()
        .map(|prop| generate_property_items(prop))
        .collect();

    let expanded = quote! {
        impl #struct_name {
            #(#property_items)*
        }

        impl propbind::Observable for #struct_name {
            fn property_changed(&self) -> &propbind::PropertyChangedSignal {
                &self.property_changed
            }
        }
    };

    Ok(expanded)
}

/// Parse a struct field into property information, if it is one.
fn parse_property_field(field: &Field) -> syn::Result<Option<PropertyInfo>> {
    let field_name = match &field.ident {
        Some(name) => name.clone(),
        None => return Ok(None),
    };

    if field_name == "property_changed" {
        return Ok(None);
    }

    let mut read_only = false;
    let mut skip = false;
    let mut rename = None;

    for attr in &field.attrs {
        if !attr.path().is_ident("property") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("read_only") {
                read_only = true;
            } else if meta.path.is_ident("skip") {
                skip = true;
            } else if meta.path.is_ident("rename") {
                let value: Expr = meta.value()?.parse()?;
                if let Expr::Lit(ExprLit {
                    lit: Lit::Str(lit_str),
                    ..
                }) = value
                {
                    rename = Some(lit_str.value());
                }
            }
            Ok(())
        })?;
    }

    if skip {
        return Ok(None);
    }

    // Only Property<T> fields are bindable; anything else is plain state.
    let inner_type = match extract_property_inner(&field.ty) {
        Some(inner) => inner,
        None => return Ok(None),
    };

    let optional_base = extract_option_inner(&inner_type);
    let property_name = rename.unwrap_or_else(|| field_name.to_string());

    Ok(Some(PropertyInfo {
        field_name,
        inner_type,
        optional_base,
        property_name,
        read_only,
    }))
}

/// Extract the `T` from a `Property<T>` field type.
fn extract_property_inner(ty: &Type) -> Option<Type> {
    generic_argument_of(ty, "Property")
}

/// Extract the `B` from an `Option<B>` property value type.
fn extract_option_inner(ty: &Type) -> Option<Type> {
    generic_argument_of(ty, "Option")
}

fn generic_argument_of(ty: &Type, wrapper: &str) -> Option<Type> {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == wrapper {
                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
                        return Some(inner.clone());
                    }
                }
            }
        }
    }
    None
}

/// Generate the key const, getter, setter, and descriptor fn for a property.
fn generate_property_items(prop: &PropertyInfo) -> TokenStream2 {
    let field_name = &prop.field_name;
    let inner_type = &prop.inner_type;
    let property_name = &prop.property_name;
    let const_name = format_ident!("{}", field_name.to_string().to_uppercase());
    let setter_name = format_ident!("set_{}", field_name);
    let ref_name = format_ident!("{}_ref", field_name);

    let const_doc = format!("Key naming the `{property_name}` property.");
    let getter_doc = format!("Current value of `{property_name}`.");
    let setter_doc = format!(
        "Set `{property_name}`, raising a change notification if the value changed."
    );
    let ref_doc = format!("Accessor descriptor for binding `{property_name}`.");

    let key_const = quote! {
        #[doc = #const_doc]
        pub const #const_name: propbind::PropertyKey =
            propbind::PropertyKey::new(#property_name);
    };

    let getter = quote! {
        #[doc = #getter_doc]
        pub fn #field_name(&self) -> #inner_type {
            self.#field_name.get()
        }
    };

    let setter = if prop.read_only {
        quote! {}
    } else {
        quote! {
            #[doc = #setter_doc]
            pub fn #setter_name(&self, value: #inner_type) {
                if self.#field_name.set(value) {
                    propbind::Observable::raise_property_changed(self, Self::#const_name);
                }
            }
        }
    };

    let descriptor_ctor = match (&prop.optional_base, prop.read_only) {
        (Some(_), true) => quote! { propbind::PropertyRef::getter_opt(Self::#const_name, read) },
        (Some(_), false) => {
            quote! { propbind::PropertyRef::accessor_opt(Self::#const_name, read, write) }
        }
        (None, true) => quote! { propbind::PropertyRef::getter(Self::#const_name, read) },
        (None, false) => {
            quote! { propbind::PropertyRef::accessor(Self::#const_name, read, write) }
        }
    };

    let write_closure = if prop.read_only {
        quote! {}
    } else {
        quote! {
            let write = {
                let this = std::sync::Arc::clone(this);
                move |value| this.#setter_name(value)
            };
        }
    };

    let descriptor = quote! {
        #[doc = #ref_doc]
        pub fn #ref_name(this: &std::sync::Arc<Self>) -> propbind::PropertyRef {
            let read = {
                let this = std::sync::Arc::clone(this);
                move || this.#field_name.get()
            };
            #write_closure
            #descriptor_ctor
        }
    };

    quote! {
        #key_const
        #getter
        #setter
        #descriptor
    }
}
