//! Attribute parsing for the `#[service]` macro.

use proc_macro2::Span;
use sprig_core::{Method, PayloadDescription};
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Attribute, Ident, LitStr, Meta, Token};

use crate::error::ErrorKind;

/// Method attribute names consumed by the macro; everything else is kept.
const METHOD_ATTRS: &[&str] = &[
    "get",
    "post",
    "put",
    "delete",
    "patch",
    "head",
    "options",
    "http",
    "headers",
    "body",
    "file_upload",
];

/// HTTP method and raw template of an operation.
pub(crate) struct Verb {
    pub(crate) method: Method,
    pub(crate) template: String,
    /// The literal the template came from, for diagnostics.
    pub(crate) lit: LitStr,
}

/// Field and file name of a multipart upload.
#[derive(Debug, Clone)]
pub(crate) struct FileUpload {
    pub(crate) name: String,
    pub(crate) file_name: String,
    pub(crate) span: Span,
}

/// Everything declared on a trait method besides its parameters.
pub(crate) struct MethodAttrs {
    pub(crate) verb: Verb,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Option<LitStr>,
    pub(crate) file_upload: Option<FileUpload>,
    /// Attributes the macro does not own (docs, `cfg`, lints).
    pub(crate) passthrough: Vec<Attribute>,
}

/// Binding declared on a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParamAttr {
    /// `#[path]` or `#[path("placeholder")]`.
    Path(Option<String>),
    /// `#[query]` or `#[query("key")]`.
    Query(Option<String>),
    /// `#[header("Name")]`.
    Header(String),
}

/// Parse the method-level attributes of an operation.
///
/// `fallback` spans the `MissingMethod` error.
pub(crate) fn parse_method_attrs(attrs: &[Attribute], fallback: &Ident) -> syn::Result<MethodAttrs> {
    let mut verb: Option<Verb> = None;
    let mut headers = Vec::new();
    let mut body = None;
    let mut file_upload = None;
    let mut passthrough = Vec::new();

    for attr in attrs {
        if let Some(parsed) = parse_verb(attr)? {
            if verb.is_some() {
                return Err(ErrorKind::DuplicateMethod.spanned(
                    attr,
                    format!("`{fallback}` already has an HTTP method attribute"),
                ));
            }
            verb = Some(parsed);
        } else if attr.path().is_ident("headers") {
            for (name, value) in parse_headers(attr)? {
                upsert_header(&mut headers, name, value);
            }
        } else if attr.path().is_ident("body") {
            if body.is_some() {
                return Err(ErrorKind::InvalidAttribute.spanned(attr, "repeated #[body] attribute"));
            }
            body = Some(parse_string_arg(attr)?);
        } else if attr.path().is_ident("file_upload") {
            if file_upload.is_some() {
                return Err(ErrorKind::InvalidAttribute.spanned(attr, "repeated #[file_upload] attribute"));
            }
            file_upload = Some(parse_file_upload(attr)?);
        } else if !METHOD_ATTRS.iter().any(|name| attr.path().is_ident(name)) {
            passthrough.push(attr.clone());
        }
    }

    let verb = verb.ok_or_else(|| {
        ErrorKind::MissingMethod.spanned(
            fallback,
            format!(
                "`{fallback}` needs one of #[get], #[post], #[put], #[patch], #[delete], #[head], #[options] or #[http]"
            ),
        )
    })?;

    Ok(MethodAttrs {
        verb,
        headers,
        body,
        file_upload,
        passthrough,
    })
}

/// Parse `#[get("/path")]` and friends, or `#[http("VERB /path")]`.
fn parse_verb(attr: &Attribute) -> syn::Result<Option<Verb>> {
    if let Some(method) = Method::ALL
        .into_iter()
        .find(|method| attr.path().is_ident(method.attribute_name()))
    {
        let lit = parse_string_arg(attr)?;
        return Ok(Some(Verb {
            method,
            template: lit.value(),
            lit,
        }));
    }

    if attr.path().is_ident("http") {
        let lit = parse_string_arg(attr)?;
        let declared = lit.value();
        let (method, template) = declared.trim().split_once(' ').ok_or_else(|| {
            ErrorKind::InvalidAttribute.spanned(
                &lit,
                "expected format: \"METHOD /path\" (e.g., \"GET /posts/{id}\")",
            )
        })?;
        let method = method
            .parse::<Method>()
            .map_err(|e| ErrorKind::InvalidAttribute.spanned(&lit, e))?;
        return Ok(Some(Verb {
            method,
            template: template.trim().to_string(),
            lit,
        }));
    }

    Ok(None)
}

/// Parse the single string argument of `#[attr("value")]`.
fn parse_string_arg(attr: &Attribute) -> syn::Result<LitStr> {
    attr.parse_args::<LitStr>().map_err(|e| {
        ErrorKind::InvalidAttribute.spanned(
            attr,
            format!("#[{}] expects a string literal: {e}", attr_name(attr)),
        )
    })
}

fn attr_name(attr: &Attribute) -> String {
    attr.path()
        .get_ident()
        .map_or_else(|| "?".to_string(), ToString::to_string)
}

/// Parse `#[file_upload]` or `#[file_upload(name = "...", file_name = "...")]`.
fn parse_file_upload(attr: &Attribute) -> syn::Result<FileUpload> {
    let mut upload = FileUpload {
        name: PayloadDescription::DEFAULT_NAME.to_string(),
        file_name: PayloadDescription::DEFAULT_NAME.to_string(),
        span: attr.span(),
    };

    match &attr.meta {
        Meta::Path(_) => {}
        Meta::List(_) => attr
            .parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    upload.name = meta.value()?.parse::<LitStr>()?.value();
                    Ok(())
                } else if meta.path.is_ident("file_name") {
                    upload.file_name = meta.value()?.parse::<LitStr>()?.value();
                    Ok(())
                } else {
                    Err(meta.error("expected `name` or `file_name`"))
                }
            })
            .map_err(|e| ErrorKind::InvalidAttribute.wrap(&e))?,
        Meta::NameValue(_) => {
            return Err(ErrorKind::InvalidAttribute.spanned(
                attr,
                "expected #[file_upload] or #[file_upload(name = \"...\", file_name = \"...\")]",
            ));
        }
    }

    Ok(upload)
}

/// One `Name = "value"` entry of `#[headers(...)]`.
struct HeaderEntry {
    name: String,
    value: LitStr,
}

impl Parse for HeaderEntry {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let name = if input.peek(LitStr) {
            input.parse::<LitStr>()?.value()
        } else {
            // Underscores become hyphens: `X_Api_Key` is `X-Api-Key`
            input
                .call(Ident::parse_any)?
                .unraw()
                .to_string()
                .replace('_', "-")
        };
        input.parse::<Token![=]>()?;
        let value = input.parse()?;
        Ok(Self { name, value })
    }
}

/// Parse `#[headers("Content-Type" = "application/json", Accept = "text/plain")]`.
pub(crate) fn parse_headers(attr: &Attribute) -> syn::Result<Vec<(String, String)>> {
    let entries = attr
        .parse_args_with(Punctuated::<HeaderEntry, Token![,]>::parse_terminated)
        .map_err(|e| ErrorKind::InvalidAttribute.wrap(&e))?;

    entries
        .into_iter()
        .map(|entry| {
            if entry.name.is_empty() {
                return Err(ErrorKind::InvalidAttribute.spanned(&entry.value, "empty header name"));
            }
            Ok((entry.name, entry.value.value()))
        })
        .collect()
}

/// Headers declared on the trait itself; they precede every method's headers.
pub(crate) fn parse_trait_headers(attrs: &[Attribute]) -> syn::Result<Vec<(String, String)>> {
    let mut headers = Vec::new();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("headers")) {
        for (name, value) in parse_headers(attr)? {
            upsert_header(&mut headers, name, value);
        }
    }
    Ok(headers)
}

/// Insert a header, replacing an existing value in place (case-insensitive names).
pub(crate) fn upsert_header(headers: &mut Vec<(String, String)>, name: String, value: String) {
    if let Some((_, existing)) = headers
        .iter_mut()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
    {
        *existing = value;
    } else {
        headers.push((name, value));
    }
}

/// Parse the binding attribute of a parameter, if any.
pub(crate) fn parse_param_attr(attrs: &[Attribute]) -> syn::Result<Option<ParamAttr>> {
    let mut found: Option<ParamAttr> = None;

    for attr in attrs {
        let parsed = if attr.path().is_ident("path") {
            ParamAttr::Path(parse_optional_string_arg(attr)?)
        } else if attr.path().is_ident("query") {
            ParamAttr::Query(parse_optional_string_arg(attr)?)
        } else if attr.path().is_ident("header") {
            ParamAttr::Header(parse_string_arg(attr)?.value())
        } else {
            continue;
        };

        if found.is_some() {
            return Err(ErrorKind::InvalidAttribute.spanned(
                attr,
                "a parameter takes at most one of #[path], #[query] and #[header]",
            ));
        }
        found = Some(parsed);
    }

    Ok(found)
}

/// `#[attr]` gives `None`, `#[attr("value")]` gives the value.
fn parse_optional_string_arg(attr: &Attribute) -> syn::Result<Option<String>> {
    match &attr.meta {
        Meta::Path(_) => Ok(None),
        Meta::List(_) => parse_string_arg(attr).map(|lit| Some(lit.value())),
        Meta::NameValue(_) => Err(ErrorKind::InvalidAttribute.spanned(
            attr,
            format!("expected #[{0}] or #[{0}(\"name\")]", attr_name(attr)),
        )),
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use syn::parse_quote;

    use super::*;

    fn ident() -> Ident {
        parse_quote!(get_post)
    }

    #[test]
    fn verb_attributes() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[patch("/posts/{id}")])];
        let_assert!(Ok(parsed) = parse_method_attrs(&attrs, &ident()));
        check!(parsed.verb.method == Method::Patch);
        check!(parsed.verb.template == "/posts/{id}");
    }

    #[test]
    fn custom_http_attribute() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[http("delete /posts/{id}")])];
        let_assert!(Ok(parsed) = parse_method_attrs(&attrs, &ident()));
        check!(parsed.verb.method == Method::Delete);
        check!(parsed.verb.template == "/posts/{id}");

        let attrs: Vec<Attribute> = vec![parse_quote!(#[http("BREW /pot")])];
        let_assert!(Err(error) = parse_method_attrs(&attrs, &ident()));
        check!(error.to_string().starts_with("InvalidAttribute:"));

        let attrs: Vec<Attribute> = vec![parse_quote!(#[http("/pot")])];
        let_assert!(Err(error) = parse_method_attrs(&attrs, &ident()));
        check!(error.to_string().starts_with("InvalidAttribute:"));
    }

    #[test]
    fn missing_and_duplicate_methods() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[doc = "Docs only"])];
        let_assert!(Err(error) = parse_method_attrs(&attrs, &ident()));
        check!(error.to_string().starts_with("MissingMethod:"));

        let attrs: Vec<Attribute> = vec![parse_quote!(#[get("/a")]), parse_quote!(#[post("/b")])];
        let_assert!(Err(error) = parse_method_attrs(&attrs, &ident()));
        check!(error.to_string().starts_with("DuplicateMethod:"));
    }

    #[test]
    fn headers_keep_order_and_replace_in_place() {
        let attrs: Vec<Attribute> = vec![
            parse_quote!(#[get("/")]),
            parse_quote!(#[headers("Content-Type" = "text/plain", X_Api_Key = "k")]),
            parse_quote!(#[headers("content-type" = "application/json")]),
        ];
        let_assert!(Ok(parsed) = parse_method_attrs(&attrs, &ident()));
        check!(
            parsed.headers
                == vec![
                    ("Content-Type".to_string(), "application/json".to_string()),
                    ("X-Api-Key".to_string(), "k".to_string()),
                ]
        );
    }

    #[test]
    fn malformed_headers() {
        let attr: Attribute = parse_quote!(#[headers(Accept)]);
        let_assert!(Err(error) = parse_headers(&attr));
        check!(error.to_string().starts_with("InvalidAttribute:"));
    }

    #[test]
    fn body_and_file_upload() {
        let attrs: Vec<Attribute> = vec![
            parse_quote!(#[post("/upload")]),
            parse_quote!(#[body("data")]),
            parse_quote!(#[file_upload(name = "image", file_name = "avatar.png")]),
            parse_quote!(#[doc = "Uploads"]),
        ];
        let_assert!(Ok(parsed) = parse_method_attrs(&attrs, &ident()));
        check!(parsed.body.map(|lit| lit.value()) == Some("data".to_string()));
        let_assert!(Some(upload) = parsed.file_upload);
        check!(upload.name == "image");
        check!(upload.file_name == "avatar.png");
        check!(parsed.passthrough.len() == 1);
    }

    #[test]
    fn file_upload_defaults() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[post("/upload")]), parse_quote!(#[file_upload])];
        let_assert!(Ok(parsed) = parse_method_attrs(&attrs, &ident()));
        let_assert!(Some(upload) = parsed.file_upload);
        check!(upload.name == "payload");
        check!(upload.file_name == "payload");
    }

    #[test]
    fn repeated_body_is_rejected() {
        let attrs: Vec<Attribute> = vec![
            parse_quote!(#[post("/")]),
            parse_quote!(#[body("a")]),
            parse_quote!(#[body("b")]),
        ];
        let_assert!(Err(error) = parse_method_attrs(&attrs, &ident()));
        check!(error.to_string().starts_with("InvalidAttribute:"));
    }

    #[test]
    fn param_attributes() {
        let attrs: Vec<Attribute> = vec![parse_quote!(#[path])];
        check!(parse_param_attr(&attrs).ok() == Some(Some(ParamAttr::Path(None))));

        let attrs: Vec<Attribute> = vec![parse_quote!(#[query("boolVal")])];
        check!(parse_param_attr(&attrs).ok() == Some(Some(ParamAttr::Query(Some("boolVal".to_string())))));

        let attrs: Vec<Attribute> = vec![parse_quote!(#[header("X-Request-Id")])];
        check!(parse_param_attr(&attrs).ok() == Some(Some(ParamAttr::Header("X-Request-Id".to_string()))));

        let attrs: Vec<Attribute> = vec![parse_quote!(#[header])];
        check!(parse_param_attr(&attrs).is_err());

        let attrs: Vec<Attribute> = vec![parse_quote!(#[path]), parse_quote!(#[query])];
        check!(parse_param_attr(&attrs).is_err());
    }
}
