use darling::ast::NestedMeta;
use darling::{Error, FromMeta};
use quote::quote;
use syn::{Data, DeriveInput, Fields, ItemStruct, parse_macro_input};

use proc_macro::TokenStream;

/// Serializes every field in declaration order through `WriteBytesLe`.
///
/// Only structs with named fields are accepted, so every byte of a block is
/// tied to a field name.
#[proc_macro_derive(ToBytes)]
pub fn derive_to_bytes(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = input.ident;

    let fields: Vec<&syn::Ident> = match &input.data {
        Data::Struct(s) => match &s.fields {
            Fields::Named(nf) => nf.named.iter().filter_map(|f| f.ident.as_ref()).collect(),
            _ => {
                return TokenStream::from(
                    syn::Error::new_spanned(&name, "ToBytes blocks need named fields")
                        .to_compile_error(),
                );
            }
        },
        _ => {
            return TokenStream::from(
                syn::Error::new_spanned(&name, "ToBytes can only be derived for structs")
                    .to_compile_error(),
            );
        }
    };

    let expanded = quote! {
        impl crate::utils::bytes::WriteBytesLe for #name {
            fn write_le(&self, dst: &mut Vec<u8>) {
                #( crate::utils::bytes::WriteBytesLe::write_le(&self.#fields, dst); )*
            }
        }
    };

    TokenStream::from(expanded)
}

#[derive(Debug, FromMeta)]
struct FixedBlockArgs {
    size: usize,
}

/// Marks a struct as an on-disk block of exactly `size` bytes.
///
/// ```ignore
/// #[derive(ToBytes)]
/// #[fixed_block(size = 1024)]
/// struct HeaderBlock { ... }
/// ```
#[proc_macro_attribute]
pub fn fixed_block(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match NestedMeta::parse_meta_list(attr.into()) {
        Ok(v) => v,
        Err(e) => {
            return TokenStream::from(Error::from(e).write_errors());
        }
    };

    let args = match FixedBlockArgs::from_list(&args) {
        Ok(v) => v,
        Err(e) => {
            return TokenStream::from(e.write_errors());
        }
    };

    if args.size == 0 {
        return TokenStream::from(quote! {
            compile_error!("fixed_block size must be non-zero");
        });
    }

    let size = args.size;
    let input = parse_macro_input!(item as ItemStruct);
    let name = &input.ident;

    let expanded = quote! {
        #input

        impl crate::utils::bytes::FixedBlock for #name {
            const SIZE: usize = #size;
        }
    };
    TokenStream::from(expanded)
}
