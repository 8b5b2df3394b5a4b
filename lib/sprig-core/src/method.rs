//! HTTP method types.

use std::str::FromStr;

use derive_more::Display;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Method {
    /// GET method - retrieve a resource.
    #[display("GET")]
    Get,
    /// POST method - create a resource.
    #[display("POST")]
    Post,
    /// PUT method - replace a resource.
    #[display("PUT")]
    Put,
    /// DELETE method - remove a resource.
    #[display("DELETE")]
    Delete,
    /// PATCH method - partially update a resource.
    #[display("PATCH")]
    Patch,
    /// HEAD method - retrieve headers only.
    #[display("HEAD")]
    Head,
    /// OPTIONS method - retrieve allowed methods.
    #[display("OPTIONS")]
    Options,
}

impl Method {
    /// Every supported method, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Delete,
        Self::Patch,
        Self::Head,
        Self::Options,
    ];

    /// Lower-case name, as used by the method attributes (`get`, `post`, ...).
    #[must_use]
    pub const fn attribute_name(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
            Self::Patch => "patch",
            Self::Head => "head",
            Self::Options => "options",
        }
    }

    /// Variant name, as used in generated code (`Get`, `Post`, ...).
    #[must_use]
    pub const fn variant_name(&self) -> &'static str {
        match self {
            Self::Get => "Get",
            Self::Post => "Post",
            Self::Put => "Put",
            Self::Delete => "Delete",
            Self::Patch => "Patch",
            Self::Head => "Head",
            Self::Options => "Options",
        }
    }
}

impl FromStr for Method {
    type Err = crate::Error;

    /// Case-insensitive parse of a method token.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.attribute_name().eq_ignore_ascii_case(token))
            .ok_or_else(|| crate::Error::invalid_request(format!("unsupported HTTP method: {token}")))
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
            Method::Patch => Self::PATCH,
            Method::Head => Self::HEAD,
            Method::Options => Self::OPTIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    #[test]
    fn method_display() {
        check!(Method::Get.to_string() == "GET");
        check!(Method::Patch.to_string() == "PATCH");
        check!(Method::Options.to_string() == "OPTIONS");
    }

    #[test]
    fn method_parse_is_case_insensitive() {
        check!("get".parse::<Method>().ok() == Some(Method::Get));
        check!("DELETE".parse::<Method>().ok() == Some(Method::Delete));
        check!("Patch".parse::<Method>().ok() == Some(Method::Patch));
    }

    #[test]
    fn method_parse_rejects_unknown() {
        let_assert!(Err(err) = "TRACE".parse::<Method>());
        check!(err.to_string() == "invalid request: unsupported HTTP method: TRACE");
    }

    #[test]
    fn method_names() {
        for method in Method::ALL {
            check!(method.variant_name().to_uppercase() == method.to_string());
            check!(method.attribute_name().to_uppercase() == method.to_string());
        }
    }

    #[test]
    fn method_into_http() {
        check!(http::Method::from(Method::Get) == http::Method::GET);
        check!(http::Method::from(Method::Head) == http::Method::HEAD);
    }
}
