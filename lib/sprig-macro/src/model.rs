//! Attribute Model: one [`Operation`] per trait method.
//!
//! Everything the synthesizers need is resolved and validated here, so that
//! `live` and `mock` are pure functions of the operation list.

use std::collections::HashSet;

use proc_macro2::{Span, TokenStream};
use quote::{ToTokens, format_ident, quote};
use sprig_core::{ContentType, Method, Template, TemplateError};
use syn::{
    Attribute, FnArg, Ident, LitBool, LitChar, LitFloat, LitInt, LitStr, Pat, ReturnType, TraitItemFn, Type,
};

use crate::attrs::{FileUpload, ParamAttr, parse_method_attrs, parse_param_attr, upsert_header};
use crate::error::ErrorKind;
use crate::types::{Scalar, is_option_type, is_unit_type, scalar_of, unwrap_option_type, unwrap_result_type};

/// Name of the explicit query parameter added to every operation.
pub(crate) const QUERY_ITEMS: &str = "query_items";

/// What a successful call yields.
#[derive(Debug, Clone)]
pub(crate) enum Arity {
    /// `()`: the payload is discarded.
    None,
    /// `Option<T>` inside `Result`: an empty or `null` body is `None`.
    Optional(Type),
    /// `T`: the body must decode.
    Required(Type),
}

/// Whether failures reach the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Surface {
    /// `Result<..>`: errors propagate.
    Throwing,
    /// `Option<..>`: errors are logged and become `None`.
    NonThrowing,
}

/// Analyzed return type.
#[derive(Debug, Clone)]
pub(crate) struct Returns {
    pub(crate) declared: Type,
    pub(crate) arity: Arity,
    pub(crate) surface: Surface,
}

/// How the body parameter is put on the wire.
#[derive(Debug, Clone)]
pub(crate) enum Encoding {
    Structured,
    UrlForm,
    Multipart(FileUpload),
    Raw,
}

/// Where a parameter ends up in the request.
#[derive(Debug, Clone)]
pub(crate) enum Binding {
    /// Substituted into a placeholder; `default` is the expression passed by
    /// the `*_with_defaults` overload.
    Path {
        placeholder: String,
        default: Option<TokenStream>,
    },
    Query(String),
    Header(String),
    Body,
}

#[derive(Debug, Clone)]
pub(crate) struct Param {
    pub(crate) ident: Ident,
    pub(crate) ty: Type,
    pub(crate) binding: Binding,
}

impl Param {
    pub(crate) fn is_option(&self) -> bool {
        is_option_type(&self.ty)
    }

    pub(crate) fn is_vec(&self) -> bool {
        crate::types::is_vec_type(&self.ty)
    }

    /// The literal used by the defaulted overload, if this is a defaulted path parameter.
    pub(crate) fn default(&self) -> Option<&TokenStream> {
        match &self.binding {
            Binding::Path { default, .. } => default.as_ref(),
            _ => None,
        }
    }
}

/// One declared endpoint.
#[derive(Debug, Clone)]
pub(crate) struct Operation {
    pub(crate) name: Ident,
    /// Attributes carried over to the generated trait (docs, `cfg`, lints).
    pub(crate) attrs: Vec<Attribute>,
    pub(crate) method: Method,
    pub(crate) template: Template,
    /// Static headers, trait-level first.
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) params: Vec<Param>,
    /// Set iff a parameter is the body.
    pub(crate) encoding: Option<Encoding>,
    pub(crate) returns: Returns,
}

impl Operation {
    /// Build and validate the operation declared by `method`.
    ///
    /// # Errors
    ///
    /// The first violated rule, tagged with its [`ErrorKind`].
    pub(crate) fn from_trait_fn(method: &TraitItemFn, trait_headers: &[(String, String)]) -> syn::Result<Self> {
        check_signature(method)?;
        let sig = &method.sig;
        let attrs = parse_method_attrs(&method.attrs, &sig.ident)?;

        let template = Template::parse(&attrs.verb.template).map_err(|error| match error {
            TemplateError::UnsupportedDefault { .. } => {
                ErrorKind::UnsupportedDefault.spanned(&attrs.verb.lit, error)
            }
            TemplateError::Malformed { .. } | TemplateError::Unbound { .. } | TemplateError::DotSegment { .. } => {
                ErrorKind::MalformedTemplate.spanned(&attrs.verb.lit, error)
            }
        })?;
        let returns = analyze_return(&sig.output, &sig.ident)?;

        let placeholders: Vec<String> = template.placeholders().map(|(name, _)| name.to_string()).collect();
        let body_name = attrs.body.as_ref().map(LitStr::value);

        let mut params = Vec::new();
        for input in sig.inputs.iter().skip(1) {
            params.push(classify_param(input, &placeholders, body_name.as_deref(), &template)?);
        }

        let has_body = params.iter().any(|param| matches!(param.binding, Binding::Body));
        if let Some(lit) = &attrs.body
            && !has_body
        {
            return Err(ErrorKind::UnknownBodyParameter.spanned(
                lit,
                format!("`{}` is not a parameter of `{}`", lit.value(), sig.ident),
            ));
        }
        if let Some(upload) = &attrs.file_upload
            && !has_body
        {
            return Err(ErrorKind::FileUploadWithoutBody.at(
                upload.span,
                format!("`{}` is a file upload but declares no #[body]", sig.ident),
            ));
        }

        check_placeholders(&params, &template, &attrs.verb.lit)?;

        let mut headers = trait_headers.to_vec();
        for (name, value) in attrs.headers {
            upsert_header(&mut headers, name, value);
        }
        let encoding = has_body.then(|| select_encoding(&headers, attrs.file_upload));

        Ok(Self {
            name: sig.ident.clone(),
            attrs: attrs.passthrough,
            method: attrs.verb.method,
            template,
            headers,
            params,
            encoding,
            returns,
        })
    }

    pub(crate) fn body(&self) -> Option<&Param> {
        self.params
            .iter()
            .find(|param| matches!(param.binding, Binding::Body))
    }

    /// Whether a `*_with_defaults` overload is emitted.
    pub(crate) fn has_defaults(&self) -> bool {
        self.params.iter().any(|param| param.default().is_some())
    }

    pub(crate) fn with_query_ident(&self) -> Ident {
        format_ident!("{}_with_query", self.name)
    }

    pub(crate) fn with_defaults_ident(&self) -> Ident {
        format_ident!("{}_with_defaults", self.name)
    }

    /// Name of the mock result slot.
    pub(crate) fn slot_ident(&self) -> Ident {
        format_ident!("{}_result", self.name)
    }

    /// `ident: Type` for every declared parameter.
    pub(crate) fn typed_params(&self) -> impl Iterator<Item = TokenStream> + '_ {
        self.params.iter().map(|Param { ident, ty, .. }| quote!(#ident: #ty))
    }

    pub(crate) fn param_idents(&self) -> impl Iterator<Item = &Ident> {
        self.params.iter().map(|param| &param.ident)
    }
}

fn check_signature(method: &TraitItemFn) -> syn::Result<()> {
    let sig = &method.sig;
    let name = &sig.ident;
    let unsupported = |tokens: &dyn ToTokens, message: String| {
        Err(ErrorKind::UnsupportedSignature.spanned(tokens, message))
    };

    if let Some(block) = &method.default {
        return unsupported(block, format!("`{name}` must be declared without a body"));
    }
    if sig.asyncness.is_none() {
        return unsupported(&sig.fn_token, format!("`{name}` must be an `async fn`"));
    }
    if !sig.generics.params.is_empty() || sig.generics.where_clause.is_some() {
        return unsupported(&sig.generics, format!("`{name}` must not be generic"));
    }
    if sig.constness.is_some() || sig.unsafety.is_some() || sig.abi.is_some() || sig.variadic.is_some() {
        return unsupported(sig, format!("`{name}` must be a plain `async fn`"));
    }

    match sig.inputs.first() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() && receiver.colon_token.is_none() =>
        {
            Ok(())
        }
        Some(other) => unsupported(other, format!("`{name}` must take `&self` first")),
        None => unsupported(name, format!("`{name}` must take `&self` first")),
    }
}

/// Classify the declared return type.
pub(crate) fn analyze_return(output: &ReturnType, name: &Ident) -> syn::Result<Returns> {
    let expected = || {
        ErrorKind::UnsupportedSignature.spanned(
            output,
            format!("`{name}` must return `Result<()>`, `Result<T>`, `Result<Option<T>>` or `Option<T>`"),
        )
    };
    let ReturnType::Type(_, declared) = output else {
        return Err(ErrorKind::UnsupportedSignature.spanned(
            name,
            format!("`{name}` must return `Result<()>`, `Result<T>`, `Result<Option<T>>` or `Option<T>`"),
        ));
    };

    let (arity, surface) = if let Some(inner) = unwrap_result_type(declared) {
        let arity = if is_unit_type(inner) {
            Arity::None
        } else if let Some(value) = unwrap_option_type(inner) {
            Arity::Optional(value.clone())
        } else {
            Arity::Required(inner.clone())
        };
        (arity, Surface::Throwing)
    } else if let Some(inner) = unwrap_option_type(declared) {
        let arity = if is_unit_type(inner) {
            Arity::None
        } else {
            Arity::Required(inner.clone())
        };
        (arity, Surface::NonThrowing)
    } else {
        return Err(expected());
    };

    Ok(Returns {
        declared: (**declared).clone(),
        arity,
        surface,
    })
}

fn classify_param(
    input: &FnArg,
    placeholders: &[String],
    body_name: Option<&str>,
    template: &Template,
) -> syn::Result<Param> {
    let FnArg::Typed(pat_type) = input else {
        return Err(ErrorKind::UnsupportedSignature.spanned(input, "unexpected receiver"));
    };
    let Pat::Ident(pat_ident) = pat_type.pat.as_ref() else {
        return Err(ErrorKind::UnsupportedSignature.spanned(
            &pat_type.pat,
            "parameters must be plain identifiers",
        ));
    };
    if pat_ident.by_ref.is_some() || pat_ident.subpat.is_some() {
        return Err(ErrorKind::UnsupportedSignature.spanned(pat_ident, "parameters must be plain identifiers"));
    }

    let ident = pat_ident.ident.clone();
    let name = ident.to_string();
    if name == QUERY_ITEMS {
        return Err(ErrorKind::UnsupportedSignature.spanned(
            &ident,
            format!("`{QUERY_ITEMS}` is reserved for the explicit query overload"),
        ));
    }

    let ty = (*pat_type.ty).clone();
    let attr = parse_param_attr(&pat_type.attrs)?;
    let is_body = body_name == Some(name.as_str());

    let binding = match attr {
        Some(_) if is_body => {
            return Err(ErrorKind::InvalidAttribute.spanned(
                pat_type,
                format!("`{name}` is the body and cannot carry #[path], #[query] or #[header]"),
            ));
        }
        Some(ParamAttr::Path(alias)) => {
            let placeholder = alias.unwrap_or_else(|| name.clone());
            if !placeholders.contains(&placeholder) {
                return Err(ErrorKind::InvalidAttribute.spanned(
                    pat_type,
                    format!("no placeholder `{placeholder}` in `{}`", template.source()),
                ));
            }
            path_binding(placeholder, &ty, template)?
        }
        Some(ParamAttr::Query(alias)) => Binding::Query(alias.unwrap_or(name)),
        Some(ParamAttr::Header(header)) => Binding::Header(header),
        None if is_body => Binding::Body,
        None if placeholders.contains(&name) => path_binding(name, &ty, template)?,
        None => {
            return Err(ErrorKind::UnsupportedSignature.spanned(
                pat_type,
                format!(
                    "parameter `{name}` matches no placeholder of `{}`, is not the #[body] and has no #[query] or #[header]",
                    template.source()
                ),
            ));
        }
    };

    Ok(Param { ident, ty, binding })
}

fn path_binding(placeholder: String, ty: &Type, template: &Template) -> syn::Result<Binding> {
    let default = match template.default_of(&placeholder) {
        Some(literal) => Some(default_literal(ty, literal).ok_or_else(|| {
            ErrorKind::UnsupportedDefault.spanned(
                ty,
                format!(
                    "default `{literal}` of `{placeholder}` is not a literal of type `{}`",
                    ty.to_token_stream()
                ),
            )
        })?),
        None => None,
    };
    Ok(Binding::Path { placeholder, default })
}

/// Every placeholder is bound at most once, and unbound ones carry a default.
fn check_placeholders(params: &[Param], template: &Template, lit: &LitStr) -> syn::Result<()> {
    let mut bound = HashSet::new();
    for param in params {
        if let Binding::Path { placeholder, .. } = &param.binding
            && !bound.insert(placeholder.as_str())
        {
            return Err(ErrorKind::InvalidAttribute.spanned(
                &param.ident,
                format!("placeholder `{placeholder}` is bound twice"),
            ));
        }
    }

    for (name, default) in template.placeholders() {
        if default.is_none() && !bound.contains(name) {
            return Err(ErrorKind::UnboundPlaceholder.spanned(
                lit,
                format!("placeholder `{name}` matches no parameter and has no default"),
            ));
        }
    }
    Ok(())
}

/// Body encoding from the declared `Content-Type` and upload marker.
fn select_encoding(headers: &[(String, String)], upload: Option<FileUpload>) -> Encoding {
    let content_type = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(sprig_core::CONTENT_TYPE))
        .map(|(_, value)| ContentType::classify(value));

    match (content_type, upload) {
        (Some(ContentType::Json), _) | (None, None) => Encoding::Structured,
        (Some(ContentType::FormUrlEncoded), _) => Encoding::UrlForm,
        (_, Some(upload)) => Encoding::Multipart(upload),
        (Some(ContentType::Multipart | ContentType::Other), None) => Encoding::Raw,
    }
}

/// The expression a template default stands for, when it fits `ty`.
///
/// `Option<T>` parameters are checked against `T` but passed as `None`, which
/// resolves to the default at runtime.
pub(crate) fn default_literal(ty: &Type, literal: &str) -> Option<TokenStream> {
    let span = Span::call_site();
    let scalar = scalar_of(ty)?;
    let tokens = match scalar {
        Scalar::SignedInt | Scalar::UnsignedInt => {
            let (negative, digits) = match literal.strip_prefix('-') {
                Some(digits) if scalar == Scalar::SignedInt => (true, digits),
                _ => (false, literal),
            };
            if !digits.starts_with(|ch: char| ch.is_ascii_digit()) {
                return None;
            }
            let lit = syn::parse_str::<LitInt>(digits).ok()?;
            if !lit.suffix().is_empty() {
                return None;
            }
            if negative { quote!(-#lit) } else { quote!(#lit) }
        }
        Scalar::Float => {
            let (negative, digits) = match literal.strip_prefix('-') {
                Some(digits) => (true, digits),
                None => (false, literal),
            };
            if !digits.starts_with(|ch: char| ch.is_ascii_digit()) {
                return None;
            }
            let lit = match syn::parse_str::<syn::Lit>(digits).ok()? {
                syn::Lit::Float(lit) if lit.suffix().is_empty() => lit,
                syn::Lit::Int(lit) if lit.suffix().is_empty() => {
                    LitFloat::new(&format!("{}.0", lit.base10_digits()), span)
                }
                _ => return None,
            };
            if negative { quote!(-#lit) } else { quote!(#lit) }
        }
        Scalar::Bool => {
            let value = match literal {
                "true" => true,
                "false" => false,
                _ => return None,
            };
            LitBool::new(value, span).to_token_stream()
        }
        Scalar::Char => {
            let mut chars = literal.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => LitChar::new(ch, span).to_token_stream(),
                _ => return None,
            }
        }
        Scalar::Str => LitStr::new(literal, span).to_token_stream(),
        Scalar::OwnedString => {
            let lit = LitStr::new(literal, span);
            quote!(::std::string::String::from(#lit))
        }
    };

    if is_option_type(ty) {
        Some(quote!(::std::option::Option::None))
    } else {
        Some(tokens)
    }
}
