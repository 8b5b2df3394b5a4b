//! Macro expansion logic for `#[service]`.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{ItemTrait, LitBool, LitStr, TraitItem, parse2};

use crate::attrs::parse_trait_headers;
use crate::error::ErrorKind;
use crate::live::generate_live;
use crate::mock::generate_mock;
use crate::model::{Binding, Operation, QUERY_ITEMS};

/// Arguments for the `#[service]` attribute.
#[derive(Debug)]
pub(crate) struct ServiceArgs {
    pub(crate) url: Option<String>,
    pub(crate) mock: bool,
}

impl Default for ServiceArgs {
    fn default() -> Self {
        Self { url: None, mock: true }
    }
}

/// Parse the service attribute arguments.
fn parse_service_args(attr: TokenStream) -> syn::Result<ServiceArgs> {
    let mut args = ServiceArgs::default();

    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("url") {
            let value: LitStr = meta.value()?.parse()?;
            if let Err(e) = url::Url::parse(&value.value()) {
                return Err(syn::Error::new_spanned(&value, format!("invalid base URL: {e}")));
            }
            args.url = Some(value.value());
            Ok(())
        } else if meta.path.is_ident("mock") {
            let value: LitBool = meta.value()?.parse()?;
            args.mock = value.value;
            Ok(())
        } else {
            Err(meta.error("unsupported service attribute, expected `url` or `mock`"))
        }
    });

    syn::parse::Parser::parse2(parser, attr).map_err(|e| ErrorKind::InvalidAttribute.wrap(&e))?;
    Ok(args)
}

/// Expand the `#[service]` attribute on a trait.
///
/// The first violated rule aborts the whole trait and nothing but the error
/// is emitted.
pub(crate) fn expand_service(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    let args = parse_service_args(attr)?;
    let trait_def: ItemTrait = parse2(item)?;

    if !trait_def.generics.params.is_empty() || trait_def.generics.where_clause.is_some() {
        return Err(ErrorKind::UnsupportedSignature.spanned(&trait_def.generics, "service traits must not be generic"));
    }
    if trait_def.unsafety.is_some() || trait_def.auto_token.is_some() {
        return Err(ErrorKind::UnsupportedSignature.spanned(&trait_def.ident, "service traits must be plain traits"));
    }

    let trait_headers = parse_trait_headers(&trait_def.attrs)?;
    let operations = trait_def
        .items
        .iter()
        .map(|item| match item {
            TraitItem::Fn(method) => Operation::from_trait_fn(method, &trait_headers),
            other => Err(ErrorKind::UnsupportedSignature.spanned(
                other,
                "service traits may only declare `async fn` operations",
            )),
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let vis = &trait_def.vis;
    let name = &trait_def.ident;
    let clean_trait = generate_clean_trait(&trait_def, &operations);
    let live = generate_live(vis, name, args.url.as_deref(), &operations);
    let mock = args
        .mock
        .then(|| generate_mock(vis, name, args.url.as_deref(), &operations));

    Ok(quote! {
        #clean_trait
        #live
        #mock
    })
}

/// Generate the trait without macro attributes, with the query and defaults overloads.
fn generate_clean_trait(original: &ItemTrait, operations: &[Operation]) -> TokenStream {
    let vis = &original.vis;
    let name = &original.ident;
    let supertraits = original.supertraits.iter();
    let trait_attrs = original
        .attrs
        .iter()
        .filter(|attr| !attr.path().is_ident("headers") && !attr.path().is_ident("service"));
    let query_items = syn::Ident::new(QUERY_ITEMS, Span::call_site());

    let methods = operations.iter().map(|op| {
        let op_name = &op.name;
        let with_query = op.with_query_ident();
        let declared = &op.returns.declared;
        let params: Vec<TokenStream> = op.typed_params().collect();
        let idents: Vec<_> = op.param_idents().collect();
        let attrs = &op.attrs;
        let other_attrs: Vec<_> = op.attrs.iter().filter(|attr| !attr.path().is_ident("doc")).collect();
        let query_doc = format!(
            "Same as [`Self::{op_name}`], with `{QUERY_ITEMS}` appended to the URL after the declared query parameters."
        );

        let with_defaults = op.has_defaults().then(|| {
            let defaults_name = op.with_defaults_ident();
            let kept = op
                .params
                .iter()
                .filter(|param| param.default().is_none())
                .map(|param| {
                    let ident = &param.ident;
                    let ty = &param.ty;
                    quote!(#ident: #ty)
                });
            let args = op.params.iter().map(|param| match (&param.binding, param.default()) {
                (Binding::Path { .. }, Some(default)) => default.clone(),
                _ => {
                    let ident = &param.ident;
                    quote!(#ident)
                }
            });
            let doc = format!("Same as [`Self::{op_name}`], with the template defaults filled in.");
            quote! {
                #(#other_attrs)*
                #[doc = #doc]
                async fn #defaults_name(&self, #(#kept),*) -> #declared {
                    self.#op_name(#(#args),*).await
                }
            }
        });

        quote! {
            #(#attrs)*
            async fn #op_name(&self, #(#params),*) -> #declared {
                self.#with_query(#(#idents,)* ::std::vec::Vec::new()).await
            }

            #(#other_attrs)*
            #[doc = #query_doc]
            async fn #with_query(
                &self,
                #(#params,)*
                #query_items: ::std::vec::Vec<::sprig::QueryItem>,
            ) -> #declared;

            #with_defaults
        }
    });

    quote! {
        #(#trait_attrs)*
        #[allow(async_fn_in_trait)]
        #vis trait #name: ::sprig::Service #(+ #supertraits)* {
            #(#methods)*
        }
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    fn expand(attr: TokenStream, item: TokenStream) -> Result<String, String> {
        expand_service(attr, item)
            .map(|tokens| tokens.to_string())
            .map_err(|error| error.to_string())
    }

    #[test]
    fn parse_args_with_url() {
        let_assert!(Ok(args) = parse_service_args(quote!(url = "https://jsonplaceholder.typicode.com")));
        check!(args.url.as_deref() == Some("https://jsonplaceholder.typicode.com"));
        check!(args.mock);

        let_assert!(Ok(args) = parse_service_args(quote!(mock = false)));
        check!(args.url.is_none());
        check!(!args.mock);
    }

    #[test]
    fn parse_args_rejects_bad_input() {
        let_assert!(Err(error) = parse_service_args(quote!(url = "not a url")));
        check!(error.to_string().starts_with("InvalidAttribute:"));

        let_assert!(Err(error) = parse_service_args(quote!(user_agent = "x")));
        check!(error.to_string().starts_with("InvalidAttribute:"));
    }

    #[test]
    fn expands_trait_live_and_mock() {
        let_assert!(
            Ok(code) = expand(
                quote!(url = "https://jsonplaceholder.typicode.com"),
                quote! {
                    /// Posts of the placeholder API.
                    #[headers(Accept = "application/json")]
                    pub trait Posts {
                        /// Fetch one post.
                        #[get("/posts/{id=2}")]
                        async fn get_post(&self, id: u64) -> sprig::Result<Post>;
                    }
                },
            )
        );

        check!(code.contains("pub trait Posts : :: sprig :: Service"));
        check!(code.contains("async fn get_post (& self , id : u64) -> sprig :: Result < Post > { self . get_post_with_query (id , :: std :: vec :: Vec :: new ()) . await }"));
        check!(code.contains("async fn get_post_with_defaults (& self ,) -> sprig :: Result < Post > { self . get_post (2) . await }"));
        check!(code.contains("pub struct PostsService"));
        check!(code.contains("pub struct PostsMock"));
        check!(code.contains("\"Accept\" , \"application/json\""));
        check!(!code.contains("# [get"));
        check!(!code.contains("# [headers"));
    }

    #[test]
    fn no_defaults_overload_without_defaults() {
        let_assert!(
            Ok(code) = expand(
                quote!(),
                quote! {
                    trait Posts {
                        #[get("/posts/{id}")]
                        async fn get_post(&self, id: u64) -> sprig::Result<Post>;
                    }
                },
            )
        );
        check!(!code.contains("get_post_with_defaults"));
        check!(!code.contains("DEFAULT_URL"));
    }

    #[test]
    fn mock_can_be_disabled() {
        let_assert!(
            Ok(code) = expand(
                quote!(mock = false),
                quote! {
                    trait Posts {
                        #[get("/posts")]
                        async fn get_posts(&self) -> sprig::Result<Vec<Post>>;
                    }
                },
            )
        );
        check!(!code.contains("PostsMock"));
    }

    #[test]
    fn first_error_aborts_expansion() {
        let_assert!(
            Err(message) = expand(
                quote!(),
                quote! {
                    trait Posts {
                        #[get("/posts")]
                        async fn get_posts(&self) -> sprig::Result<Vec<Post>>;

                        async fn missing(&self) -> sprig::Result<()>;
                    }
                },
            )
        );
        check!(message.starts_with("MissingMethod:"));
    }

    #[test]
    fn rejects_non_fn_items_and_generic_traits() {
        let_assert!(
            Err(message) = expand(
                quote!(),
                quote! {
                    trait Posts {
                        const LIMIT: u32 = 10;
                    }
                },
            )
        );
        check!(message.starts_with("UnsupportedSignature:"));

        let_assert!(
            Err(message) = expand(
                quote!(),
                quote! {
                    trait Posts<T> {
                        #[get("/posts")]
                        async fn get_posts(&self) -> sprig::Result<Vec<T>>;
                    }
                },
            )
        );
        check!(message.starts_with("UnsupportedSignature:"));
    }
}
