//! Derive macros for the `Encode` and `Decode` traits.
//!
//! This crate provides derive macros for automatically implementing the
//! `Encode` and `Decode` traits from the `tagpack` crate.
//!
//! # Wire shape
//!
//! - **Structs** (named, tuple, or unit) serialize as their non-skipped
//!   fields in declaration order with no surrounding header: the *custom*
//!   wire category, where the aggregate's own hooks define the layout.
//! - **Enums** serialize in the *variant* wire category: a header whose
//!   sub nibble records the active alternative's category and whose length
//!   is the number of alternatives, a 4-byte discriminator, then the
//!   alternative's payload. Unit variants carry an `Empty` sub nibble and
//!   no payload; single-field variants record the field's category;
//!   variants with several fields record `Custom` and lay the fields out
//!   in declaration order.
//!
//! # Examples
//!
//! ```ignore
//! use tagpack::{Decode, Encode};
//!
//! #[derive(Encode, Decode)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! #[derive(Encode, Decode)]
//! enum Message {
//!     Quit,
//!     Move { x: i32, y: i32 },
//!     Write(String),
//! }
//! ```
//!
//! # Field attributes
//!
//! ## `#[pack(skip)]`
//!
//! Skip a field during serialization and use `Default::default()` during
//! deserialization.
//!
//! ```ignore
//! use tagpack::{Decode, Encode};
//!
//! #[derive(Encode, Decode)]
//! struct Config {
//!     name: String,
//!     #[pack(skip)]
//!     cache: Vec<u8>, // Uses Default::default() when decoding
//! }
//! ```

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Data, DataEnum, DataStruct, DeriveInput, Field, Fields, Index,
    parse_macro_input,
};

/// Checks if a field has the `#[pack(skip)]` attribute.
fn should_skip(field: &Field) -> bool {
    field.attrs.iter().any(|attr| {
        if !attr.path().is_ident("pack") {
            return false;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                Ok(())
            } else {
                Err(meta.error("unknown pack attribute"))
            }
        })
        .is_ok()
    })
}

/// The sub-nibble expression for a variant's payload on the encode side.
fn encode_variant_sub(
    wire_fields: &[&syn::Type],
) -> proc_macro2::TokenStream {
    match wire_fields {
        [] => quote! { ::tagpack::Kind::Empty },
        [ty] => quote! { <#ty as ::tagpack::Encode>::KIND },
        _ => quote! { ::tagpack::Kind::Custom },
    }
}

/// The sub-nibble expression for a variant's payload on the decode side.
fn decode_variant_sub(
    wire_fields: &[&syn::Type],
) -> proc_macro2::TokenStream {
    match wire_fields {
        [] => quote! { ::tagpack::Kind::Empty },
        [ty] => quote! { <#ty as ::tagpack::Decode>::KIND },
        _ => quote! { ::tagpack::Kind::Custom },
    }
}

// =============================================================================
// Encode
// =============================================================================

/// Derive macro for `Encode`.
///
/// For structs, all non-skipped fields are encoded in declaration order
/// with no surrounding header. For enums, a variant header and a 4-byte
/// discriminator precede the active alternative's payload.
#[proc_macro_derive(Encode, attributes(pack))]
pub fn derive_encode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) =
        input.generics.split_for_impl();

    // Build where clause with Encode bounds for all type parameters.
    let mut where_clause =
        where_clause.cloned().unwrap_or_else(|| syn::parse_quote!(where));
    for param in &input.generics.params {
        if let syn::GenericParam::Type(type_param) = param {
            let ident = &type_param.ident;
            where_clause
                .predicates
                .push(syn::parse_quote!(#ident: ::tagpack::Encode));
        }
    }

    let (kind, encode_impl, size_impl) = match &input.data {
        Data::Struct(data_struct) => (
            quote! { ::tagpack::Kind::Custom },
            impl_encode_struct(data_struct),
            impl_struct_size(data_struct),
        ),
        Data::Enum(data_enum) => (
            quote! { ::tagpack::Kind::Variant },
            impl_encode_enum(data_enum),
            impl_enum_size(data_enum),
        ),
        Data::Union(_) => {
            return syn::Error::new_spanned(
                &input,
                "Encode cannot be derived for unions",
            )
            .to_compile_error()
            .into();
        }
    };

    let expanded = quote! {
        #[allow(clippy::trait_duplication_in_bounds)]
        impl #impl_generics ::tagpack::Encode for #name #ty_generics #where_clause {
            const KIND: ::tagpack::Kind = #kind;

            fn encode<__W: ::tagpack::Writer + ?Sized>(
                &self,
                writer: &mut __W,
            ) {
                #encode_impl
            }

            fn byte_size(&self) -> usize {
                #size_impl
            }
        }
    };

    TokenStream::from(expanded)
}

fn impl_encode_struct(data_struct: &DataStruct) -> proc_macro2::TokenStream {
    match &data_struct.fields {
        Fields::Named(fields) => {
            let field_encodes = fields
                .named
                .iter()
                .filter(|field| !should_skip(field))
                .map(|field| {
                    let field_name = &field.ident;
                    quote! {
                        ::tagpack::Encode::encode(&self.#field_name, writer);
                    }
                });

            quote! {
                #(#field_encodes)*
            }
        }
        Fields::Unnamed(fields) => {
            let field_encodes = fields
                .unnamed
                .iter()
                .enumerate()
                .filter(|(_, field)| !should_skip(field))
                .map(|(i, _)| {
                    let index = Index::from(i);
                    quote! {
                        ::tagpack::Encode::encode(&self.#index, writer);
                    }
                });

            quote! {
                #(#field_encodes)*
            }
        }
        Fields::Unit => {
            quote! {
                // Unit struct has no fields to encode.
            }
        }
    }
}

fn impl_struct_size(data_struct: &DataStruct) -> proc_macro2::TokenStream {
    match &data_struct.fields {
        Fields::Named(fields) => {
            let field_sizes = fields
                .named
                .iter()
                .filter(|field| !should_skip(field))
                .map(|field| {
                    let field_name = &field.ident;
                    quote! {
                        + ::tagpack::Encode::byte_size(&self.#field_name)
                    }
                });

            quote! { 0usize #(#field_sizes)* }
        }
        Fields::Unnamed(fields) => {
            let field_sizes = fields
                .unnamed
                .iter()
                .enumerate()
                .filter(|(_, field)| !should_skip(field))
                .map(|(i, _)| {
                    let index = Index::from(i);
                    quote! {
                        + ::tagpack::Encode::byte_size(&self.#index)
                    }
                });

            quote! { 0usize #(#field_sizes)* }
        }
        Fields::Unit => quote! { 0usize },
    }
}

/// Pattern bindings and the wire (non-skipped) field list for one enum
/// variant.
struct VariantFields<'a> {
    pattern: proc_macro2::TokenStream,
    bindings: Vec<proc_macro2::Ident>,
    wire_types: Vec<&'a syn::Type>,
}

fn variant_fields<'a>(variant: &'a syn::Variant) -> VariantFields<'a> {
    match &variant.fields {
        Fields::Named(fields) => {
            let mut bindings = Vec::new();
            let mut wire_types = Vec::new();
            let pattern_bindings: Vec<_> = fields
                .named
                .iter()
                .map(|field| {
                    let field_name = &field.ident;
                    if should_skip(field) {
                        quote! { #field_name: _ }
                    } else {
                        if let Some(name) = field_name {
                            bindings.push(name.clone());
                        }
                        wire_types.push(&field.ty);
                        quote! { #field_name }
                    }
                })
                .collect();
            let pattern = quote! { { #(#pattern_bindings),* } };
            VariantFields { pattern, bindings, wire_types }
        }
        Fields::Unnamed(fields) => {
            let mut bindings = Vec::new();
            let mut wire_types = Vec::new();
            let pattern_bindings: Vec<_> = fields
                .unnamed
                .iter()
                .enumerate()
                .map(|(i, field)| {
                    if should_skip(field) {
                        quote! { _ }
                    } else {
                        let binding = proc_macro2::Ident::new(
                            &format!("__field_{i}"),
                            proc_macro2::Span::call_site(),
                        );
                        bindings.push(binding.clone());
                        wire_types.push(&field.ty);
                        quote! { #binding }
                    }
                })
                .collect();
            let pattern = quote! { ( #(#pattern_bindings),* ) };
            VariantFields { pattern, bindings, wire_types }
        }
        Fields::Unit => VariantFields {
            pattern: quote! {},
            bindings: Vec::new(),
            wire_types: Vec::new(),
        },
    }
}

fn impl_encode_enum(data_enum: &DataEnum) -> proc_macro2::TokenStream {
    #[allow(clippy::cast_possible_truncation)]
    let variant_count = data_enum.variants.len() as u32;

    let variant_matches =
        data_enum.variants.iter().enumerate().map(|(idx, variant)| {
            let variant_name = &variant.ident;
            #[allow(clippy::cast_possible_truncation)]
            let idx = idx as u32;

            let VariantFields { pattern, bindings, wire_types } =
                variant_fields(variant);
            let sub = encode_variant_sub(&wire_types);
            let field_encodes = bindings.iter().map(|binding| {
                quote! {
                    ::tagpack::Encode::encode(#binding, writer);
                }
            });

            quote! {
                Self::#variant_name #pattern => {
                    ::tagpack::DataHeader::with_sub(
                        ::tagpack::Kind::Variant,
                        #sub,
                        #variant_count,
                    )
                    .emit(writer);
                    ::tagpack::Writer::emit_u32(writer, #idx);
                    #(#field_encodes)*
                }
            }
        });

    quote! {
        match self {
            #(#variant_matches)*
        }
    }
}

fn impl_enum_size(data_enum: &DataEnum) -> proc_macro2::TokenStream {
    let variant_matches = data_enum.variants.iter().map(|variant| {
        let variant_name = &variant.ident;
        let VariantFields { pattern, bindings, .. } = variant_fields(variant);
        let field_sizes = bindings.iter().map(|binding| {
            quote! { + ::tagpack::Encode::byte_size(#binding) }
        });

        quote! {
            Self::#variant_name #pattern => {
                ::tagpack::DataHeader::SIZE
                    + ::std::mem::size_of::<u32>()
                    #(#field_sizes)*
            }
        }
    });

    quote! {
        match self {
            #(#variant_matches)*
        }
    }
}

// =============================================================================
// Decode
// =============================================================================

/// Derive macro for `Decode`.
///
/// For structs, all fields are decoded in declaration order; skipped
/// fields use `Default::default()`. For enums, the variant header is
/// validated (category, arity, and the recorded alternative's category),
/// then the discriminator selects the alternative to decode.
#[proc_macro_derive(Decode, attributes(pack))]
pub fn derive_decode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) =
        input.generics.split_for_impl();

    // Build where clause with Decode bounds for all type parameters.
    let mut where_clause =
        where_clause.cloned().unwrap_or_else(|| syn::parse_quote!(where));
    for param in &input.generics.params {
        if let syn::GenericParam::Type(type_param) = param {
            let ident = &type_param.ident;
            where_clause
                .predicates
                .push(syn::parse_quote!(#ident: ::tagpack::Decode));
        }
    }

    let (kind, decode_impl) = match &input.data {
        Data::Struct(data_struct) => (
            quote! { ::tagpack::Kind::Custom },
            impl_decode_struct(data_struct),
        ),
        Data::Enum(data_enum) => (
            quote! { ::tagpack::Kind::Variant },
            impl_decode_enum(name, data_enum),
        ),
        Data::Union(_) => {
            return syn::Error::new_spanned(
                &input,
                "Decode cannot be derived for unions",
            )
            .to_compile_error()
            .into();
        }
    };

    let expanded = quote! {
        #[allow(clippy::trait_duplication_in_bounds)]
        impl #impl_generics ::tagpack::Decode for #name #ty_generics #where_clause {
            const KIND: ::tagpack::Kind = #kind;

            fn decode<__R: ::tagpack::Reader + ?Sized>(
                reader: &mut __R,
            ) -> ::std::io::Result<Self> {
                #decode_impl
            }
        }
    };

    TokenStream::from(expanded)
}

fn decode_fields(fields: &Fields) -> proc_macro2::TokenStream {
    match fields {
        Fields::Named(fields) => {
            let field_decodes = fields.named.iter().map(|field| {
                let field_name = &field.ident;
                let field_type = &field.ty;

                if should_skip(field) {
                    quote! {
                        #field_name: <#field_type as ::std::default::Default>::default(),
                    }
                } else {
                    quote! {
                        #field_name: <#field_type as ::tagpack::Decode>::decode(reader)?,
                    }
                }
            });

            quote! { { #(#field_decodes)* } }
        }
        Fields::Unnamed(fields) => {
            let field_decodes = fields.unnamed.iter().map(|field| {
                let field_type = &field.ty;

                if should_skip(field) {
                    quote! {
                        <#field_type as ::std::default::Default>::default(),
                    }
                } else {
                    quote! {
                        <#field_type as ::tagpack::Decode>::decode(reader)?,
                    }
                }
            });

            quote! { ( #(#field_decodes)* ) }
        }
        Fields::Unit => quote! {},
    }
}

fn impl_decode_struct(data_struct: &DataStruct) -> proc_macro2::TokenStream {
    let fields = decode_fields(&data_struct.fields);
    quote! {
        Ok(Self #fields)
    }
}

fn impl_decode_enum(
    name: &syn::Ident,
    data_enum: &DataEnum,
) -> proc_macro2::TokenStream {
    let variant_count = data_enum.variants.len();
    let variant_matches =
        data_enum.variants.iter().enumerate().map(|(idx, variant)| {
            let variant_name = &variant.ident;
            #[allow(clippy::cast_possible_truncation)]
            let idx = idx as u32;

            let VariantFields { wire_types, .. } = variant_fields(variant);
            let sub = decode_variant_sub(&wire_types);
            let fields = decode_fields(&variant.fields);

            quote! {
                #idx => {
                    ::tagpack::decode::expect_alternative(__sub, #sub)?;
                    Ok(Self::#variant_name #fields)
                }
            }
        });

    let name_str = name.to_string();

    quote! {
        let __header = ::tagpack::DataHeader::read(reader)?
            .expect_main(::tagpack::Kind::Variant)?;
        if __header.length as usize != #variant_count {
            return Err(::std::io::Error::new(
                ::std::io::ErrorKind::InvalidData,
                ::std::format!(
                    "variant header declares {} alternatives but enum {} has {}",
                    __header.length,
                    #name_str,
                    #variant_count
                ),
            ));
        }
        let __index = ::tagpack::Reader::read_u32(reader)?;
        let __sub = __header.sub()?;
        match __index {
            #(#variant_matches)*
            _ => Err(::std::io::Error::new(
                ::std::io::ErrorKind::InvalidData,
                ::std::format!(
                    "variant discriminator {} is out of range for enum {}",
                    __index,
                    #name_str
                ),
            )),
        }
    }
}
