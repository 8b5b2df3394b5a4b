//! Implementation Synthesizer: the live `{Trait}Service` type.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Ident, Visibility};

use crate::model::{Arity, Binding, Encoding, Operation, QUERY_ITEMS, Surface};

/// Generate the live struct, its constructors and its trait implementation.
pub(crate) fn generate_live(
    vis: &Visibility,
    trait_name: &Ident,
    url: Option<&str>,
    operations: &[Operation],
) -> TokenStream {
    let name = format_ident!("{}Service", trait_name);
    let type_doc = format!(
        "Live implementation of [`{trait_name}`], sending each operation over HTTP.\n\n\
         Generic over the transport; defaults to [`::sprig::HyperClient`]."
    );

    let default_url = url.map(|url| {
        quote! {
            /// Base URL declared on the trait.
            pub const DEFAULT_URL: &'static str = #url;

            /// Service against [`Self::DEFAULT_URL`].
            ///
            /// # Errors
            ///
            /// Returns an error if the transport cannot be built.
            pub fn from_default_url() -> ::sprig::Result<Self> {
                Self::new(Self::DEFAULT_URL)
            }
        }
    });

    let methods = operations.iter().map(generate_operation);

    quote! {
        #[doc = #type_doc]
        #vis struct #name<C = ::sprig::HyperClient> {
            config: ::sprig::ServiceConfig,
            interceptors: ::sprig::Interceptors,
            client: C,
        }

        impl #name {
            #default_url

            /// Service against `base_url` with default configuration.
            ///
            /// # Errors
            ///
            /// Returns an error if the URL does not parse or the transport cannot be built.
            pub fn new(base_url: impl ::std::convert::AsRef<str>) -> ::sprig::Result<Self> {
                Self::with_config(::sprig::ServiceConfig::parse(base_url.as_ref())?)
            }

            /// Service with an explicit configuration; the transport honours its pinning policy.
            ///
            /// # Errors
            ///
            /// Returns an error if the transport cannot be built.
            pub fn with_config(config: ::sprig::ServiceConfig) -> ::sprig::Result<Self> {
                let client = ::sprig::HyperClient::for_service(&config)?;
                Ok(Self::with_client(client, config))
            }
        }

        impl<C> #name<C> {
            /// Service over a custom transport.
            #[must_use]
            pub fn with_client(client: C, config: ::sprig::ServiceConfig) -> Self {
                Self {
                    config,
                    interceptors: ::sprig::Interceptors::new(),
                    client,
                }
            }

            /// The transport.
            #[must_use]
            pub fn client(&self) -> &C {
                &self.client
            }
        }

        impl<C: ::std::clone::Clone> ::std::clone::Clone for #name<C> {
            fn clone(&self) -> Self {
                Self {
                    config: self.config.clone(),
                    interceptors: self.interceptors.clone(),
                    client: self.client.clone(),
                }
            }
        }

        impl<C> ::std::fmt::Debug for #name<C> {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(stringify!(#name))
                    .field("config", &self.config)
                    .field("interceptors", &self.interceptors)
                    .finish_non_exhaustive()
            }
        }

        impl<C> ::sprig::Service for #name<C> {
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

        #[allow(clippy::used_underscore_binding)]
        impl<C: ::sprig::HttpClient> #trait_name for #name<C> {
            #(#methods)*
        }
    }
}

/// The `*_with_query` implementation of one operation.
fn generate_operation(op: &Operation) -> TokenStream {
    let method_name = op.with_query_ident();
    let params = op.typed_params();
    let query_items = format_ident!("{}", QUERY_ITEMS);
    let declared = &op.returns.declared;

    let build = generate_request(op);
    let dispatch = generate_dispatch(op);

    let body = match op.returns.surface {
        Surface::Throwing => quote! {
            #build
            #dispatch
        },
        Surface::NonThrowing => {
            let value = match &op.returns.arity {
                Arity::Required(ty) => quote!(#ty),
                Arity::None | Arity::Optional(_) => quote!(()),
            };
            let operation = op.name.to_string();
            quote! {
                let __outcome: ::sprig::Result<#value> = async {
                    #build
                    #dispatch
                }
                .await;
                match __outcome {
                    Ok(value) => Some(value),
                    Err(error) => {
                        ::sprig::tracing::debug!(operation = #operation, %error, "non-throwing operation failed");
                        None
                    }
                }
            }
        }
    };

    quote! {
        async fn #method_name(
            &self,
            #(#params,)*
            #query_items: ::std::vec::Vec<::sprig::QueryItem>,
        ) -> #declared {
            #body
        }
    }
}

/// Statements resolving the URL and building `__request` and `__raw_url`.
fn generate_request(op: &Operation) -> TokenStream {
    let source = op.template.source();
    let query_items = format_ident!("{}", QUERY_ITEMS);
    let method = format_ident!("{}", op.method.variant_name());

    let bindings = op.params.iter().filter_map(|param| {
        let Binding::Path { placeholder, .. } = &param.binding else {
            return None;
        };
        let ident = &param.ident;
        let value = if param.is_option() {
            quote!(#ident.as_ref().map(::std::string::ToString::to_string))
        } else {
            quote!(::std::option::Option::Some(::std::string::ToString::to_string(&#ident)))
        };
        Some(quote!((#placeholder, #value)))
    });

    let query_params: Vec<TokenStream> = op
        .params
        .iter()
        .filter_map(|param| {
            let Binding::Query(key) = &param.binding else {
                return None;
            };
            let ident = &param.ident;
            Some(if param.is_option() {
                quote! {
                    if let ::std::option::Option::Some(value) = &#ident {
                        __query.push(::sprig::QueryItem::new(#key, value));
                    }
                }
            } else if param.is_vec() {
                quote! {
                    for value in &#ident {
                        __query.push(::sprig::QueryItem::new(#key, value));
                    }
                }
            } else {
                quote!(__query.push(::sprig::QueryItem::new(#key, &#ident));)
            })
        })
        .collect();
    let query = if query_params.is_empty() {
        quote!(let __query = #query_items;)
    } else {
        quote! {
            let mut __query = ::std::vec::Vec::<::sprig::QueryItem>::new();
            #(#query_params)*
            __query.extend(#query_items);
        }
    };

    let static_headers = if op.headers.is_empty() {
        quote!()
    } else {
        let pairs = op.headers.iter().map(|(name, value)| quote!((#name, #value)));
        quote!(.headers([#(#pairs),*]))
    };

    let header_params = op.params.iter().filter_map(|param| {
        let Binding::Header(name) = &param.binding else {
            return None;
        };
        let ident = &param.ident;
        Some(if param.is_option() {
            quote! {
                let __builder = match &#ident {
                    ::std::option::Option::Some(value) => {
                        __builder.header(#name, ::std::string::ToString::to_string(value))
                    }
                    ::std::option::Option::None => __builder,
                };
            }
        } else {
            quote! {
                let __builder = __builder.header(#name, ::std::string::ToString::to_string(&#ident));
            }
        })
    });

    let body = generate_body(op);

    quote! {
        let __template = ::sprig::Template::parse(#source)?;
        let __path = __template.resolve(&[#(#bindings),*])?;
        let __config = ::sprig::Service::config(self);
        let __url = __config.endpoint(&__path)?;
        let __raw_template = __template.raw();
        let __raw_url = __config
            .endpoint(&__raw_template)
            .map_or_else(|_| __config.endpoint_key(&__raw_template), ::std::string::String::from);

        #query

        let __builder = ::sprig::Request::builder(::sprig::Method::#method, __url)
            #static_headers
            .query_items(&__query);
        #(#header_params)*
        #body
        let __request = __builder.build();
    }
}

/// Statement encoding the body parameter onto `__builder`, if any.
fn generate_body(op: &Operation) -> TokenStream {
    let (Some(param), Some(encoding)) = (op.body(), &op.encoding) else {
        return quote!();
    };
    let ident = &param.ident;

    match encoding {
        Encoding::Structured => quote!(let __builder = __builder.json(&#ident)?;),
        Encoding::UrlForm => quote!(let __builder = __builder.form(&#ident)?;),
        Encoding::Raw => quote! {
            let __builder = __builder.body(::sprig::bytes::Bytes::copy_from_slice(
                ::std::convert::AsRef::<[u8]>::as_ref(&#ident),
            ));
        },
        Encoding::Multipart(upload) => {
            let name = &upload.name;
            let file_name = &upload.file_name;
            quote! {
                let __data = ::sprig::bytes::Bytes::copy_from_slice(::std::convert::AsRef::<[u8]>::as_ref(&#ident));
                let __payload = ::sprig::PayloadDescription::for_data(#name, #file_name, &__data);
                let __builder = __builder.multipart(&__payload, __data);
            }
        }
    }
}

/// Tail expression handing `__request` to the dispatch collaborator.
fn generate_dispatch(op: &Operation) -> TokenStream {
    let context = quote! {
        ::sprig::Dispatch::new(&__raw_url, &self.config, &self.interceptors)
    };

    match &op.returns.arity {
        Arity::None => quote! {
            ::sprig::perform_request(&self.client, __request, #context)
                .await
                .map(|_| ())
        },
        Arity::Optional(ty) => quote! {
            ::sprig::perform_request_and_decode_optional::<_, #ty>(&self.client, __request, #context).await
        },
        Arity::Required(ty) => quote! {
            ::sprig::perform_request_and_decode::<_, #ty>(&self.client, __request, #context).await
        },
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use syn::parse_quote;

    use super::*;

    fn operation(method: syn::TraitItemFn) -> Operation {
        let_assert!(Ok(op) = Operation::from_trait_fn(&method, &[]));
        op
    }

    fn render(op: &Operation) -> String {
        generate_operation(op).to_string()
    }

    #[test]
    fn resolves_template_and_dispatches() {
        let code = render(&operation(parse_quote! {
            #[get("/posts/{id=2}")]
            async fn get_post(&self, id: u64) -> sprig::Result<Post>;
        }));
        check!(code.contains("async fn get_post_with_query"));
        check!(code.contains("Template :: parse (\"/posts/{id=2}\")"));
        check!(code.contains("(\"id\" , :: std :: option :: Option :: Some"));
        check!(code.contains("perform_request_and_decode :: < _ , Post >"));
        check!(code.contains("let __query = query_items ;"));
    }

    #[test]
    fn nullable_path_param_passes_option() {
        let code = render(&operation(parse_quote! {
            #[get("/posts/{id}")]
            async fn get_nullable_post(&self, id: Option<u64>) -> sprig::Result<Vec<Post>>;
        }));
        check!(code.contains("id . as_ref () . map"));
    }

    #[test]
    fn query_params_precede_explicit_items() {
        let code = render(&operation(parse_quote! {
            #[get("/posts")]
            async fn search(&self, #[query("boolVal")] bool_val: bool, #[query] page: Option<u32>) -> sprig::Result<Vec<Post>>;
        }));
        let pushed = code.find("QueryItem :: new (\"boolVal\"");
        let extended = code.find("__query . extend (query_items)");
        check!(pushed.is_some());
        check!(pushed < extended);
        check!(code.contains("if let :: std :: option :: Option :: Some (value) = & page"));
    }

    #[test]
    fn body_encodings() {
        let code = render(&operation(parse_quote! {
            #[post("/posts")]
            #[body("post")]
            async fn add_post(&self, post: Post) -> sprig::Result<Post>;
        }));
        check!(code.contains("__builder . json (& post) ?"));

        let code = render(&operation(parse_quote! {
            #[post("/upload")]
            #[body("data")]
            #[file_upload(file_name = "photo.png")]
            async fn upload(&self, data: Vec<u8>) -> sprig::Result<()>;
        }));
        check!(code.contains("PayloadDescription :: for_data (\"payload\" , \"photo.png\" , & __data)"));
        check!(code.contains("perform_request (& self . client , __request"));
    }

    #[test]
    fn static_headers_in_order() {
        let code = render(&operation(parse_quote! {
            #[get("/posts")]
            #[headers(Accept = "application/json", X_Trace = "1")]
            async fn get_posts(&self) -> sprig::Result<Vec<Post>>;
        }));
        check!(code.contains(". headers ([(\"Accept\" , \"application/json\") , (\"X-Trace\" , \"1\")])"));
    }

    #[test]
    fn non_throwing_logs_and_returns_none() {
        let code = render(&operation(parse_quote! {
            #[get("/posts/")]
            async fn get_non_throwing_posts(&self) -> Option<Vec<Post>>;
        }));
        check!(code.contains("let __outcome : :: sprig :: Result < Vec < Post > >"));
        check!(code.contains("tracing :: debug !"));
        check!(code.contains("None"));
    }

    #[test]
    fn live_type_surface() {
        let op = operation(parse_quote! {
            #[get("/posts")]
            async fn get_posts(&self) -> sprig::Result<Vec<Post>>;
        });
        let code = generate_live(
            &parse_quote!(pub),
            &parse_quote!(Posts),
            Some("https://jsonplaceholder.typicode.com"),
            &[op],
        )
        .to_string();
        check!(code.contains("pub struct PostsService < C = :: sprig :: HyperClient >"));
        check!(code.contains("DEFAULT_URL"));
        check!(code.contains("impl < C : :: sprig :: HttpClient > Posts for PostsService < C >"));
    }
}
