//! Derive macro implementation for `HazelcastCompact`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::{
    parse_macro_input, Data, DeriveInput, Field, Fields, GenericArgument, LitStr, PathArguments,
    Type,
};

pub fn derive_compact_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let type_name = parse_type_name(&input.attrs)?.unwrap_or_else(|| name.to_string());

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new(
                    input.span(),
                    "HazelcastCompact only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new(
                input.span(),
                "HazelcastCompact can only be derived for structs",
            ))
        }
    };

    let mut write_stmts = Vec::new();
    let mut field_inits = Vec::new();

    for field in fields {
        let Some(field_ident) = field.ident.as_ref() else {
            continue;
        };
        let attrs = parse_field_attrs(field)?;

        if attrs.skip {
            field_inits.push(quote! { #field_ident: ::std::default::Default::default() });
            continue;
        }

        let wire_name = attrs.field_name.unwrap_or_else(|| field_ident.to_string());
        let shape = Shape::of(&field.ty, attrs.compact)?;

        write_stmts.push(shape.write(field_ident, &wire_name));
        let read_expr = shape.read(&wire_name);
        field_inits.push(quote! { #field_ident: #read_expr });
    }

    Ok(quote! {
        impl #impl_generics ::hazelcast_compact::Compact for #name #ty_generics #where_clause {
            fn type_name() -> &'static str {
                #type_name
            }

            fn write<W: ::hazelcast_compact::CompactWriter>(
                &self,
                writer: &mut W,
            ) -> ::hazelcast_compact::Result<()> {
                #(#write_stmts)*
                ::std::result::Result::Ok(())
            }

            fn read<R: ::hazelcast_compact::CompactReader>(
                reader: &mut R,
            ) -> ::hazelcast_compact::Result<Self> {
                ::std::result::Result::Ok(Self {
                    #(#field_inits,)*
                })
            }
        }
    })
}

/// The element type of a field, as far as the wire format is concerned.
enum Base {
    /// Fixed-size primitive; the name is the method suffix (`int32`, `boolean`, ...).
    Primitive(&'static str),
    String,
    /// Decimal or temporal value; the name is the method suffix.
    Value(&'static str),
    /// Nested record type.
    Compact(Type),
}

/// How the element type is wrapped.
enum Shape {
    Plain(Base),
    Option(Base),
    Vec(Base),
    VecOfOption(Base),
    OptionOfVec(Base),
}

impl Base {
    fn of(ty: &Type, compact: bool) -> syn::Result<Self> {
        if compact {
            return Ok(Base::Compact(ty.clone()));
        }
        let unsupported = || {
            syn::Error::new(
                ty.span(),
                "unsupported field type for HazelcastCompact; \
                 use #[hazelcast(compact)] for nested Compact types",
            )
        };
        let ident = last_segment(ty).ok_or_else(unsupported)?.ident.to_string();
        Ok(match ident.as_str() {
            "bool" => Base::Primitive("boolean"),
            "i8" => Base::Primitive("int8"),
            "i16" => Base::Primitive("int16"),
            "i32" => Base::Primitive("int32"),
            "i64" => Base::Primitive("int64"),
            "f32" => Base::Primitive("float32"),
            "f64" => Base::Primitive("float64"),
            "String" => Base::String,
            "Decimal" => Base::Value("decimal"),
            "NaiveTime" => Base::Value("time"),
            "NaiveDate" => Base::Value("date"),
            "NaiveDateTime" => Base::Value("timestamp"),
            "DateTime" => Base::Value("timestamp_with_timezone"),
            _ => return Err(unsupported()),
        })
    }

    /// Suffix of the reader/writer methods for a single value.
    fn suffix(&self) -> &'static str {
        match self {
            Base::Primitive(name) | Base::Value(name) => *name,
            Base::String => "string",
            Base::Compact(_) => "compact",
        }
    }

    /// Turbofish for the generic reader methods.
    fn turbofish(&self) -> TokenStream2 {
        match self {
            Base::Compact(ty) => quote! { ::<#ty> },
            _ => TokenStream2::new(),
        }
    }
}

impl Shape {
    fn of(ty: &Type, compact: bool) -> syn::Result<Self> {
        if let Some(inner) = generic_argument(ty, "Option") {
            if let Some(item) = generic_argument(inner, "Vec") {
                let base = Base::of(item, compact)?;
                if !matches!(base, Base::Primitive(_)) {
                    return Err(syn::Error::new(
                        ty.span(),
                        "Option<Vec<T>> is only supported for primitive T; use Vec<Option<T>> instead",
                    ));
                }
                return Ok(Shape::OptionOfVec(base));
            }
            return Ok(Shape::Option(Base::of(inner, compact)?));
        }
        if let Some(inner) = generic_argument(ty, "Vec") {
            if let Some(item) = generic_argument(inner, "Option") {
                return Ok(Shape::VecOfOption(Base::of(item, compact)?));
            }
            return Ok(Shape::Vec(Base::of(inner, compact)?));
        }
        Ok(Shape::Plain(Base::of(ty, compact)?))
    }

    fn write(&self, field: &syn::Ident, wire_name: &str) -> TokenStream2 {
        match self {
            Shape::Plain(base) => {
                let method = format_ident!("write_{}", base.suffix());
                let value = match base {
                    Base::Primitive(_) => quote! { self.#field },
                    Base::String => quote! { ::std::option::Option::Some(self.#field.as_str()) },
                    Base::Value(_) => quote! { ::std::option::Option::Some(self.#field) },
                    Base::Compact(_) => quote! { ::std::option::Option::Some(&self.#field) },
                };
                quote! { writer.#method(#wire_name, #value)?; }
            }
            Shape::Option(base) => {
                let value = match base {
                    Base::Primitive(_) | Base::Value(_) => quote! { self.#field },
                    Base::String => quote! { self.#field.as_deref() },
                    Base::Compact(_) => quote! { self.#field.as_ref() },
                };
                let method = match base {
                    Base::Primitive(name) => format_ident!("write_nullable_{}", name),
                    other => format_ident!("write_{}", other.suffix()),
                };
                quote! { writer.#method(#wire_name, #value)?; }
            }
            Shape::Vec(base) => {
                let method = format_ident!("write_array_of_{}", base.suffix());
                match base {
                    Base::Primitive(_) => {
                        quote! { writer.#method(#wire_name, ::std::option::Option::Some(self.#field.as_slice()))?; }
                    }
                    _ => quote! {
                        {
                            let items: ::std::vec::Vec<::std::option::Option<_>> = self
                                .#field
                                .iter()
                                .cloned()
                                .map(::std::option::Option::Some)
                                .collect();
                            writer.#method(#wire_name, ::std::option::Option::Some(items.as_slice()))?;
                        }
                    },
                }
            }
            Shape::VecOfOption(base) => {
                let method = match base {
                    Base::Primitive(name) => format_ident!("write_array_of_nullable_{}", name),
                    other => format_ident!("write_array_of_{}", other.suffix()),
                };
                quote! { writer.#method(#wire_name, ::std::option::Option::Some(self.#field.as_slice()))?; }
            }
            Shape::OptionOfVec(base) => {
                let method = format_ident!("write_array_of_{}", base.suffix());
                quote! { writer.#method(#wire_name, self.#field.as_deref())?; }
            }
        }
    }

    fn read(&self, wire_name: &str) -> TokenStream2 {
        match self {
            Shape::Plain(Base::Primitive(name)) => {
                let method = format_ident!("read_{}", name);
                quote! { reader.#method(#wire_name)? }
            }
            Shape::Plain(base) => {
                let method = format_ident!("read_{}", base.suffix());
                let turbofish = base.turbofish();
                let null = unexpected_null(wire_name, &method);
                quote! { reader.#method #turbofish(#wire_name)?.ok_or_else(|| #null)? }
            }
            Shape::Option(base) => {
                let method = match base {
                    Base::Primitive(name) => format_ident!("read_nullable_{}", name),
                    other => format_ident!("read_{}", other.suffix()),
                };
                let turbofish = base.turbofish();
                quote! { reader.#method #turbofish(#wire_name)? }
            }
            Shape::Vec(base) => {
                let method = format_ident!("read_array_of_{}", base.suffix());
                let turbofish = base.turbofish();
                let null = unexpected_null(wire_name, &method);
                match base {
                    Base::Primitive(_) => {
                        quote! { reader.#method(#wire_name)?.ok_or_else(|| #null)? }
                    }
                    _ => quote! {
                        reader
                            .#method #turbofish(#wire_name)?
                            .ok_or_else(|| #null)?
                            .into_iter()
                            .collect::<::std::option::Option<::std::vec::Vec<_>>>()
                            .ok_or_else(|| ::hazelcast_compact::CompactError::UnexpectedNullInArray {
                                field: ::std::string::ToString::to_string(#wire_name),
                                method: ::std::stringify!(#method),
                            })?
                    },
                }
            }
            Shape::VecOfOption(base) => {
                let method = match base {
                    Base::Primitive(name) => format_ident!("read_array_of_nullable_{}", name),
                    other => format_ident!("read_array_of_{}", other.suffix()),
                };
                let turbofish = base.turbofish();
                let null = unexpected_null(wire_name, &method);
                quote! { reader.#method #turbofish(#wire_name)?.ok_or_else(|| #null)? }
            }
            Shape::OptionOfVec(base) => {
                let method = format_ident!("read_array_of_{}", base.suffix());
                quote! { reader.#method(#wire_name)? }
            }
        }
    }
}

fn unexpected_null(wire_name: &str, method: &syn::Ident) -> TokenStream2 {
    quote! {
        ::hazelcast_compact::CompactError::UnexpectedNull {
            field: ::std::string::ToString::to_string(#wire_name),
            method: ::std::stringify!(#method),
        }
    }
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(path) if path.qself.is_none() => path.path.segments.last(),
        _ => None,
    }
}

/// Returns `T` if `ty` is `wrapper<T>`.
fn generic_argument<'t>(ty: &'t Type, wrapper: &str) -> Option<&'t Type> {
    let segment = last_segment(ty)?;
    if segment.ident != wrapper {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) if args.args.len() == 1 => match args.args.first() {
            Some(GenericArgument::Type(inner)) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

fn parse_type_name(attrs: &[syn::Attribute]) -> syn::Result<Option<String>> {
    let mut type_name = None;
    for attr in attrs {
        if !attr.path().is_ident("hazelcast") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("type_name") {
                let lit: LitStr = meta.value()?.parse()?;
                type_name = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unsupported hazelcast attribute; expected `type_name`"))
            }
        })?;
    }
    Ok(type_name)
}

#[derive(Default)]
struct FieldAttrs {
    field_name: Option<String>,
    skip: bool,
    compact: bool,
}

fn parse_field_attrs(field: &Field) -> syn::Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("hazelcast") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("field_name") {
                let lit: LitStr = meta.value()?.parse()?;
                attrs.field_name = Some(lit.value());
            } else if meta.path.is_ident("skip") {
                attrs.skip = true;
            } else if meta.path.is_ident("compact") {
                attrs.compact = true;
            } else {
                return Err(meta.error(
                    "unsupported hazelcast attribute; expected `field_name`, `skip` or `compact`",
                ));
            }
            Ok(())
        })?;
    }
    Ok(attrs)
}
