//! Compile-time error kinds.
//!
//! Every diagnostic emitted by `#[service]` starts with the name of its kind,
//! e.g. `MissingMethod: ...`, and is spanned at the offending tokens.

use std::fmt;

use proc_macro2::Span;
use quote::ToTokens;

/// Why a declaration was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorKind {
    MalformedTemplate,
    UnsupportedDefault,
    MissingMethod,
    DuplicateMethod,
    UnknownBodyParameter,
    FileUploadWithoutBody,
    UnboundPlaceholder,
    UnsupportedSignature,
    InvalidAttribute,
}

impl ErrorKind {
    pub(crate) const fn name(self) -> &'static str {
        match self {
            Self::MalformedTemplate => "MalformedTemplate",
            Self::UnsupportedDefault => "UnsupportedDefault",
            Self::MissingMethod => "MissingMethod",
            Self::DuplicateMethod => "DuplicateMethod",
            Self::UnknownBodyParameter => "UnknownBodyParameter",
            Self::FileUploadWithoutBody => "FileUploadWithoutBody",
            Self::UnboundPlaceholder => "UnboundPlaceholder",
            Self::UnsupportedSignature => "UnsupportedSignature",
            Self::InvalidAttribute => "InvalidAttribute",
        }
    }

    /// Error spanned at `tokens`.
    pub(crate) fn spanned(self, tokens: impl ToTokens, message: impl fmt::Display) -> syn::Error {
        syn::Error::new_spanned(tokens, format!("{self}: {message}"))
    }

    /// Error at `span`.
    pub(crate) fn at(self, span: Span, message: impl fmt::Display) -> syn::Error {
        syn::Error::new(span, format!("{self}: {message}"))
    }

    /// Re-tag a parser error from `syn` with this kind.
    pub(crate) fn wrap(self, error: &syn::Error) -> syn::Error {
        self.at(error.span(), error)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
