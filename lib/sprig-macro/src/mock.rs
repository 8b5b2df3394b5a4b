//! Mock Synthesizer: the `{Trait}Mock` type.
//!
//! One public result slot per operation. Invocations never resolve the
//! template, never touch the registry and never dispatch.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Ident, Visibility};

use crate::model::{Arity, Operation, QUERY_ITEMS, Surface};

/// Generate the mock struct, its constructors and its trait implementation.
pub(crate) fn generate_mock(
    vis: &Visibility,
    trait_name: &Ident,
    url: Option<&str>,
    operations: &[Operation],
) -> TokenStream {
    let name = format_ident!("{}Mock", trait_name);
    let type_doc = format!(
        "Mock implementation of [`{trait_name}`].\n\n\
         Each operation returns a clone of its `*_result` slot; every slot starts as \
         [`::sprig::Error::Unknown`]."
    );

    let slot_fields = operations.iter().map(|op| {
        let slot = op.slot_ident();
        let ty = slot_type(op);
        let doc = format!("Outcome of [`{trait_name}::{}`].", op.name);
        quote! {
            #[doc = #doc]
            pub #slot: #ty,
        }
    });
    let slot_inits = operations.iter().map(|op| {
        let slot = op.slot_ident();
        let value = slot_default(op);
        quote!(#slot: #value,)
    });
    let methods = operations.iter().map(generate_operation);

    let default_url = url.map(|url| {
        quote! {
            impl #name {
                /// Base URL declared on the trait.
                pub const DEFAULT_URL: &'static str = #url;
            }

            impl ::std::default::Default for #name {
                #[allow(clippy::expect_used)]
                fn default() -> Self {
                    Self::new(Self::DEFAULT_URL).expect("base URL validated at compile time")
                }
            }
        }
    });

    quote! {
        #[doc = #type_doc]
        #vis struct #name {
            config: ::sprig::ServiceConfig,
            interceptors: ::sprig::Interceptors,
            #(#slot_fields)*
        }

        impl #name {
            /// Mock against `base_url`.
            ///
            /// # Errors
            ///
            /// Returns an error if the URL does not parse.
            pub fn new(base_url: impl ::std::convert::AsRef<str>) -> ::sprig::Result<Self> {
                Ok(Self::with_config(::sprig::ServiceConfig::parse(base_url.as_ref())?))
            }

            /// Mock with an explicit configuration.
            #[must_use]
            pub fn with_config(config: ::sprig::ServiceConfig) -> Self {
                Self {
                    config,
                    interceptors: ::sprig::Interceptors::new(),
                    #(#slot_inits)*
                }
            }
        }

        #default_url

        impl ::sprig::Service for #name {
            fn config(&self) -> &::sprig::ServiceConfig {
                &self.config
            }

            fn interceptors(&self) -> &::sprig::Interceptors {
                &self.interceptors
            }

            fn interceptors_mut(&mut self) -> &mut ::sprig::Interceptors {
                &mut self.interceptors
            }
        }

        impl #trait_name for #name {
            #(#methods)*
        }
    }
}

/// Type of the result slot of `op`.
fn slot_type(op: &Operation) -> TokenStream {
    match (op.returns.surface, &op.returns.arity) {
        (Surface::Throwing, Arity::None) => quote!(::std::option::Option<::sprig::Error>),
        (Surface::Throwing, _) => {
            let declared = &op.returns.declared;
            quote!(#declared)
        }
        (Surface::NonThrowing, Arity::Required(ty)) => quote!(::sprig::Result<#ty>),
        (Surface::NonThrowing, Arity::None | Arity::Optional(_)) => quote!(::sprig::Result<()>),
    }
}

fn slot_default(op: &Operation) -> TokenStream {
    match (op.returns.surface, &op.returns.arity) {
        (Surface::Throwing, Arity::None) => quote!(::std::option::Option::Some(::sprig::Error::Unknown)),
        _ => quote!(::std::result::Result::Err(::sprig::Error::Unknown)),
    }
}

fn generate_operation(op: &Operation) -> TokenStream {
    let method_name = op.with_query_ident();
    let params = op.typed_params();
    let idents = op.param_idents();
    let query_items = format_ident!("{}", QUERY_ITEMS);
    let declared = &op.returns.declared;
    let slot = op.slot_ident();

    let outcome = match (op.returns.surface, &op.returns.arity) {
        (Surface::Throwing, Arity::None) => quote! {
            match &self.#slot {
                ::std::option::Option::Some(error) => Err(::std::clone::Clone::clone(error)),
                ::std::option::Option::None => Ok(()),
            }
        },
        (Surface::Throwing, _) => quote!(::std::clone::Clone::clone(&self.#slot)),
        (Surface::NonThrowing, _) => quote!(::std::clone::Clone::clone(&self.#slot).ok()),
    };

    quote! {
        async fn #method_name(
            &self,
            #(#params,)*
            #query_items: ::std::vec::Vec<::sprig::QueryItem>,
        ) -> #declared {
            let _ = (#(#idents,)* #query_items,);
            #outcome
        }
    }
}
