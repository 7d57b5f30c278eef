//! Procedural macros for the Lattice Forms metadata registry.
//!
//! This crate provides `#[derive(Model)]`, which generates the cached
//! `MetaObject` for a struct and implements the `Model` trait.
//!
//! # Attributes
//!
//! ## `#[model(...)]`
//!
//! Struct-level configuration. Declares the groups fields can be placed in:
//!
//! ```ignore
//! #[derive(Model)]
//! #[model(group(id = 1, title = "Address", priority = 10, span = "full"))]
//! struct Customer {
//!     // ...
//! }
//! ```
//!
//! ## `#[field(...)]`
//!
//! Field-level annotations:
//!
//! - `skip`: Leaves the field out of the metadata entirely
//! - `exclude`: Registers the field but excludes it from binding
//! - `read_only`: No setter is generated
//! - `label = "..."`, `description = "..."`
//! - `group = 1`, `span = "half"`
//! - `watch("a", "b")`: Properties whose changes refresh this one
//! - `enable_when(property = "age", op = ">=", value = 18)`, `visible_when(...)`
//! - `compute = "method"`: Value derived by calling `self.method()`
//! - `dropdown = "provider"`: Choices come from a named provider
//! - `validate("required", "max_len:40")`
//! - `editor = "multiline"` or `"password"`
//! - `range(min = 0, max = 120, step = 1)`
//! - `annotate = expr`: Attach any custom annotation value
//!
//! Fields whose name starts with `_` are skipped.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::parse::Parse;
use syn::{
    Attribute, Data, DeriveInput, Expr, ExprLit, ExprUnary, Field, Fields, Ident, Lit, LitInt,
    LitStr, Token, Type, UnOp, parse_macro_input,
};

/// Derive the `Model` trait and generate the type's metadata.
///
/// This macro generates:
/// - `static_meta()`, returning the cached `MetaObject` (registered in the
///   global `TypeRegistry` on first use)
/// - Type-erased getter/setter functions for every field
/// - Implementation of the `Model` trait
///
/// # Example
///
/// ```ignore
/// use lattice_forms::prelude::*;
///
/// #[derive(Model, Default)]
/// struct Person {
///     #[field(label = "Name", validate("required"))]
///     name: String,
///
///     #[field(enable_when(property = "name", op = "is_set"))]
///     age: Option<u32>,
/// }
/// ```
#[proc_macro_derive(Model, attributes(model, field))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match impl_derive_model(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// A struct-level group declaration.
struct GroupInfo {
    id: LitInt,
    title: LitStr,
    priority: Option<Expr>,
    span: Option<Ident>,
}

/// Parsed field information.
struct FieldInfo {
    field_name: Ident,
    field_type: Type,
    read_only: bool,
    annotations: Vec<TokenStream2>,
}

fn impl_derive_model(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Model derive does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Model derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Model derive only supports structs",
            ));
        }
    };

    let groups = parse_model_attrs(&input.attrs)?;

    let mut properties = Vec::new();
    for field in fields.iter() {
        if let Some(info) = parse_field(struct_name, field)? {
            properties.push(info);
        }
    }

    let group_exprs = groups.iter().map(generate_group);
    let property_exprs = properties
        .iter()
        .map(|prop| generate_property(struct_name, prop));
    let type_name = LitStr::new(&struct_name.to_string(), struct_name.span());

    Ok(quote! {
        impl #struct_name {
            /// The cached meta-object for this type (generated by `#[derive(Model)]`).
            pub fn static_meta() -> &'static ::lattice_forms_core::MetaObject {
                static META: ::std::sync::OnceLock<::lattice_forms_core::MetaObject> =
                    ::std::sync::OnceLock::new();
                ::lattice_forms_core::TypeRegistry::static_meta(&META, || {
                    ::lattice_forms_core::MetaObject::builder::<#struct_name>(#type_name)
                        #(.group(#group_exprs))*
                        #(.property(#property_exprs))*
                        .build()
                })
            }
        }

        impl ::lattice_forms_core::Model for #struct_name {
            fn meta_object(&self) -> &'static ::lattice_forms_core::MetaObject {
                Self::static_meta()
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
        }
    })
}

/// Parse struct-level #[model(...)] attributes.
fn parse_model_attrs(attrs: &[Attribute]) -> syn::Result<Vec<GroupInfo>> {
    let mut groups = Vec::new();

    for attr in attrs {
        if !attr.path().is_ident("model") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("group") {
                groups.push(parse_group(&meta)?);
                Ok(())
            } else {
                Err(meta.error("unsupported model attribute, expected `group(...)`"))
            }
        })?;
    }

    Ok(groups)
}

fn parse_group(meta: &ParseNestedMeta) -> syn::Result<GroupInfo> {
    let mut id = None;
    let mut title = None;
    let mut priority = None;
    let mut span = None;

    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("id") {
            id = Some(inner.value()?.parse::<LitInt>()?);
        } else if inner.path.is_ident("title") {
            title = Some(inner.value()?.parse::<LitStr>()?);
        } else if inner.path.is_ident("priority") {
            priority = Some(inner.value()?.parse::<Expr>()?);
        } else if inner.path.is_ident("span") {
            span = Some(span_variant(&inner.value()?.parse::<LitStr>()?)?);
        } else {
            return Err(inner.error("unsupported group key"));
        }
        Ok(())
    })?;

    let id = id.ok_or_else(|| meta.error("group requires `id`"))?;
    if id.base10_parse::<u32>()? == 0 {
        return Err(syn::Error::new_spanned(
            &id,
            "group id 0 is reserved for the default group",
        ));
    }
    let title = title.ok_or_else(|| meta.error("group requires `title`"))?;

    Ok(GroupInfo {
        id,
        title,
        priority,
        span,
    })
}

/// Parse a field and its #[field(...)] attributes.
fn parse_field(struct_name: &Ident, field: &Field) -> syn::Result<Option<FieldInfo>> {
    let field_name = match &field.ident {
        Some(name) => name.clone(),
        None => return Ok(None),
    };

    if field_name.to_string().starts_with('_') {
        return Ok(None);
    }

    let mut skip = false;
    let mut read_only = false;
    let mut annotations = Vec::new();

    for attr in &field.attrs {
        if !attr.path().is_ident("field") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let path = &meta.path;
            if path.is_ident("skip") {
                skip = true;
            } else if path.is_ident("read_only") {
                read_only = true;
            } else if path.is_ident("exclude") {
                annotations.push(quote! { ::lattice_forms_core::annotation::Exclude });
            } else if path.is_ident("label") {
                let label: LitStr = meta.value()?.parse()?;
                annotations.push(quote! {
                    ::lattice_forms_core::annotation::DisplayName(::std::string::String::from(#label))
                });
            } else if path.is_ident("description") {
                let text: LitStr = meta.value()?.parse()?;
                annotations.push(quote! {
                    ::lattice_forms_core::annotation::Description(::std::string::String::from(#text))
                });
            } else if path.is_ident("group") {
                let id: LitInt = meta.value()?.parse()?;
                let id = id.base10_parse::<u32>()?;
                annotations.push(quote! { ::lattice_forms_core::annotation::Group(#id) });
            } else if path.is_ident("span") {
                let variant = span_variant(&meta.value()?.parse::<LitStr>()?)?;
                annotations.push(quote! {
                    ::lattice_forms_core::annotation::Span(::lattice_forms_core::ColumnSpan::#variant)
                });
            } else if path.is_ident("watch") {
                let names = parse_str_list(&meta)?;
                annotations.push(quote! {
                    ::lattice_forms_core::annotation::WatchOn::new([#(#names),*])
                });
            } else if path.is_ident("enable_when") || path.is_ident("visible_when") {
                let constructor = if path.is_ident("enable_when") {
                    quote! { enabled_when }
                } else {
                    quote! { visible_when }
                };
                let (property, op, value) = parse_condition(&meta)?;
                annotations.push(quote! {
                    ::lattice_forms_core::annotation::Condition::#constructor(
                        #property,
                        ::lattice_forms_core::annotation::Comparison::#op,
                        #value,
                    )
                });
            } else if path.is_ident("compute") {
                let method: LitStr = meta.value()?.parse()?;
                let method = Ident::new(&method.value(), method.span());
                annotations.push(quote! {
                    ::lattice_forms_core::annotation::Computed::new(|obj| {
                        obj.downcast_ref::<#struct_name>()
                            .map(|model| ::lattice_forms_core::FieldValue::to_value(&model.#method()))
                    })
                });
            } else if path.is_ident("dropdown") {
                let provider: LitStr = meta.value()?.parse()?;
                annotations.push(quote! {
                    ::lattice_forms_core::annotation::Dropdown::new(#provider)
                });
            } else if path.is_ident("validate") {
                let rules = parse_str_list(&meta)?;
                annotations.push(quote! {
                    ::lattice_forms_core::annotation::Validate::new([#(#rules),*])
                });
            } else if path.is_ident("editor") {
                let editor: LitStr = meta.value()?.parse()?;
                let variant = match editor.value().to_ascii_lowercase().as_str() {
                    "multiline" | "textarea" => quote! { Multiline },
                    "password" => quote! { Password },
                    _ => {
                        return Err(syn::Error::new_spanned(
                            &editor,
                            "unknown editor, expected \"multiline\" or \"password\"",
                        ));
                    }
                };
                annotations.push(quote! { ::lattice_forms_core::annotation::Editor::#variant });
            } else if path.is_ident("range") {
                annotations.push(parse_range(&meta)?);
            } else if path.is_ident("annotate") {
                let expr: Expr = meta.value()?.parse()?;
                annotations.push(quote! { #expr });
            } else {
                return Err(meta.error("unsupported field attribute"));
            }
            Ok(())
        })?;
    }

    if skip {
        return Ok(None);
    }

    Ok(Some(FieldInfo {
        field_name,
        field_type: field.ty.clone(),
        read_only,
        annotations,
    }))
}

/// Parse `name("a", "b", ...)`.
fn parse_str_list(meta: &ParseNestedMeta) -> syn::Result<Vec<LitStr>> {
    let content;
    syn::parenthesized!(content in meta.input);
    let list = content.parse_terminated(<LitStr as Parse>::parse, Token![,])?;
    Ok(list.into_iter().collect())
}

/// Parse `enable_when(property = "...", op = "...", value = ...)`.
fn parse_condition(meta: &ParseNestedMeta) -> syn::Result<(LitStr, Ident, TokenStream2)> {
    let mut property = None;
    let mut op = None;
    let mut value = None;

    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("property") {
            property = Some(inner.value()?.parse::<LitStr>()?);
        } else if inner.path.is_ident("op") {
            op = Some(comparison_variant(&inner.value()?.parse::<LitStr>()?)?);
        } else if inner.path.is_ident("value") {
            value = Some(value_tokens(&inner.value()?.parse::<Expr>()?));
        } else {
            return Err(inner.error("unsupported condition key"));
        }
        Ok(())
    })?;

    let property = property.ok_or_else(|| meta.error("condition requires `property`"))?;
    let op = op.unwrap_or_else(|| Ident::new("Equal", proc_macro2::Span::call_site()));
    let value = value.unwrap_or_else(|| quote! { ::lattice_forms_core::Value::Null });
    Ok((property, op, value))
}

/// Parse `range(min = .., max = .., step = ..)`.
fn parse_range(meta: &ParseNestedMeta) -> syn::Result<TokenStream2> {
    let mut min = quote! { None };
    let mut max = quote! { None };
    let mut step = quote! { None };

    meta.parse_nested_meta(|inner| {
        let expr: Expr = inner.value()?.parse()?;
        let bound = quote! { Some((#expr) as f64) };
        if inner.path.is_ident("min") {
            min = bound;
        } else if inner.path.is_ident("max") {
            max = bound;
        } else if inner.path.is_ident("step") {
            step = bound;
        } else {
            return Err(inner.error("unsupported range key, expected min, max or step"));
        }
        Ok(())
    })?;

    Ok(quote! {
        ::lattice_forms_core::annotation::NumberRange {
            min: #min,
            max: #max,
            step: #step,
        }
    })
}

/// Turn a literal (possibly negated) into a `Value` constructor.
fn value_tokens(expr: &Expr) -> TokenStream2 {
    let lit = match expr {
        Expr::Lit(ExprLit { lit, .. }) => Some(lit),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr: inner,
            ..
        }) => match inner.as_ref() {
            Expr::Lit(ExprLit { lit, .. }) => Some(lit),
            _ => None,
        },
        _ => None,
    };

    match lit {
        Some(Lit::Int(_)) => quote! { ::lattice_forms_core::Value::Int((#expr) as i64) },
        Some(Lit::Float(_)) => quote! { ::lattice_forms_core::Value::Float((#expr) as f64) },
        Some(Lit::Bool(_)) => quote! { ::lattice_forms_core::Value::Bool(#expr) },
        Some(Lit::Str(_)) => {
            quote! { ::lattice_forms_core::Value::Text(::std::string::String::from(#expr)) }
        }
        _ => quote! { ::lattice_forms_core::Value::from(#expr) },
    }
}

fn span_variant(lit: &LitStr) -> syn::Result<Ident> {
    let name = match lit.value().trim().to_ascii_lowercase().as_str() {
        "none" | "hidden" | "0" => "None",
        "one" | "1" => "One",
        "two" | "third" | "2" => "Two",
        "half" | "three" | "3" => "Half",
        "four" | "4" => "Four",
        "five" | "5" => "Five",
        "full" | "six" | "6" => "Full",
        _ => {
            return Err(syn::Error::new_spanned(
                lit,
                "unknown span, expected none, one, two, half, four, five or full",
            ));
        }
    };
    Ok(Ident::new(name, lit.span()))
}

fn comparison_variant(lit: &LitStr) -> syn::Result<Ident> {
    let name = match lit.value().trim().to_ascii_lowercase().as_str() {
        "==" | "=" | "eq" => "Equal",
        "!=" | "<>" | "ne" => "NotEqual",
        "<" | "lt" => "Less",
        "<=" | "le" => "LessOrEqual",
        ">" | "gt" => "Greater",
        ">=" | "ge" => "GreaterOrEqual",
        "set" | "is_set" => "IsSet",
        "unset" | "is_not_set" => "IsNotSet",
        _ => {
            return Err(syn::Error::new_spanned(lit, "unknown comparison operator"));
        }
    };
    Ok(Ident::new(name, lit.span()))
}

fn generate_group(group: &GroupInfo) -> TokenStream2 {
    let id = &group.id;
    let title = &group.title;
    let priority = group
        .priority
        .as_ref()
        .map(|p| quote! { .with_priority(#p) });
    let span = group
        .span
        .as_ref()
        .map(|s| quote! { .with_column_span(::lattice_forms_core::ColumnSpan::#s) });

    quote! {
        ::lattice_forms_core::GroupDetail::new(#id, #title) #priority #span
    }
}

fn generate_property(struct_name: &Ident, prop: &FieldInfo) -> TokenStream2 {
    let field_name = &prop.field_name;
    let field_type = &prop.field_type;
    let name_str = LitStr::new(
        field_name.to_string().trim_start_matches("r#"),
        field_name.span(),
    );
    let annotations = &prop.annotations;

    let setter = if prop.read_only {
        quote! {}
    } else {
        quote! {
            .setter(|obj, value| {
                match (
                    obj.downcast_mut::<#struct_name>(),
                    <#field_type as ::lattice_forms_core::FieldValue>::from_value(value),
                ) {
                    (Some(model), Some(value)) => {
                        model.#field_name = value;
                        true
                    }
                    _ => false,
                }
            })
        }
    };

    quote! {
        ::lattice_forms_core::Metadata::builder::<#struct_name, #field_type>(#name_str)
            .getter(|obj| {
                obj.downcast_ref::<#struct_name>()
                    .map(|model| ::lattice_forms_core::FieldValue::to_value(&model.#field_name))
            })
            #setter
            #(.annotate(#annotations))*
    }
}
