//! URL path templates with inline defaults.
//!
//! A template is a path such as `/posts/{id=2}/comments`: literal text
//! interleaved with placeholders. A placeholder is `{name}` or
//! `{name=default}`, where `default` is a literal substituted when no value
//! is bound at call time.
//!
//! ```
//! use sprig_core::Template;
//!
//! let template = Template::parse("/posts/{id=2}/comments").expect("valid template");
//! assert_eq!(template.raw(), "/posts/{id}/comments");
//! assert_eq!(template.resolve(&[]).expect("resolved"), "/posts/2/comments");
//! assert_eq!(
//!     template.resolve(&[("id", Some("12".to_string()))]).expect("resolved"),
//!     "/posts/12/comments"
//! );
//! ```

use derive_more::{Display, Error};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters escaped in a substituted path segment.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-encode a value for use as a single path segment.
#[must_use]
pub fn encode_path_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT_ENCODE_SET).to_string()
}

fn is_dot_segment(value: &str) -> bool {
    matches!(value, "." | "..")
}

/// Errors raised while parsing or resolving a [`Template`].
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum TemplateError {
    /// Structural problem: unclosed `{`, stray `}`, bad placeholder name.
    #[display("{reason} at byte {position} in `{template}`")]
    Malformed {
        /// The offending template.
        #[error(not(source))]
        template: String,
        /// Byte offset of the problem.
        position: usize,
        /// What went wrong.
        reason: &'static str,
    },

    /// The default of a placeholder is not a plain literal.
    #[display("default `{default}` of placeholder `{name}` is not a literal")]
    UnsupportedDefault {
        /// Placeholder name.
        #[error(not(source))]
        name: String,
        /// The rejected default text.
        default: String,
    },

    /// The substituted value is `.` or `..`, which URL parsing would fold
    /// into the surrounding path.
    #[display("value `{value}` of placeholder `{name}` is a dot segment")]
    DotSegment {
        /// Placeholder name.
        #[error(not(source))]
        name: String,
        /// The rejected value.
        value: String,
    },

    /// No value was bound for a placeholder that has no default.
    #[display("placeholder `{name}` has no value and no default")]
    Unbound {
        /// Placeholder name.
        #[error(not(source))]
        name: String,
    },
}

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied verbatim.
    Literal(String),
    /// Substitution point.
    Placeholder {
        /// Name bound to a call-site parameter.
        name: String,
        /// Literal used when no value is bound.
        default: Option<String>,
    },
}

/// A parsed URL path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parse a template in a single left-to-right scan.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Malformed`] for unbalanced braces or invalid
    /// names, and [`TemplateError::UnsupportedDefault`] for defaults that are
    /// not plain literals.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let malformed = |position, reason| TemplateError::Malformed {
            template: source.to_string(),
            position,
            reason,
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices();

        while let Some((start, ch)) = chars.next() {
            match ch {
                '{' => {
                    let mut body = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        body.push(inner);
                    }
                    if !closed {
                        return Err(malformed(start, "unclosed `{`"));
                    }

                    let (name, default) = match body.split_once('=') {
                        Some((name, default)) => (name.trim(), Some(default.trim())),
                        None => (body.trim(), None),
                    };
                    if name.is_empty() {
                        return Err(malformed(start, "empty placeholder name"));
                    }
                    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                        return Err(malformed(start, "invalid placeholder name"));
                    }
                    if let Some(default) = default
                        && (default.is_empty() || default.contains('{') || is_dot_segment(default))
                    {
                        return Err(TemplateError::UnsupportedDefault {
                            name: name.to_string(),
                            default: default.to_string(),
                        });
                    }

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder {
                        name: name.to_string(),
                        default: default.map(str::to_string),
                    });
                }
                '}' => return Err(malformed(start, "unmatched `}`")),
                _ => literal.push(ch),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The template as written, defaults included.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parsed segments, in order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Placeholders as `(name, default)` pairs, in order.
    pub fn placeholders(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder { name, default } => Some((name.as_str(), default.as_deref())),
            Segment::Literal(_) => None,
        })
    }

    /// Default literal of the named placeholder, if any.
    #[must_use]
    pub fn default_of(&self, name: &str) -> Option<&str> {
        self.placeholders()
            .find(|(candidate, _)| *candidate == name)
            .and_then(|(_, default)| default)
    }

    /// The template with placeholders intact and defaults stripped.
    #[must_use]
    pub fn raw(&self) -> String {
        let mut raw = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => raw.push_str(text),
                Segment::Placeholder { name, .. } => {
                    raw.push('{');
                    raw.push_str(name);
                    raw.push('}');
                }
            }
        }
        raw
    }

    /// Substitute bound values into the template.
    ///
    /// Each binding is `(name, value)`. A `Some` value is percent-encoded and
    /// substituted. A `None` value falls back to the default, or to an empty
    /// segment when there is none. A placeholder with no binding at all uses
    /// its default.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Unbound`] when a placeholder has neither a
    /// binding nor a default, and [`TemplateError::DotSegment`] when a value
    /// is `.` or `..`.
    pub fn resolve(&self, bindings: &[(&str, Option<String>)]) -> Result<String, TemplateError> {
        let mut path = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Placeholder { name, default } => {
                    let bound = bindings.iter().find(|(candidate, _)| candidate == name);
                    let value = match (bound, default) {
                        (Some((_, Some(value))), _) => value.as_str(),
                        (_, Some(default)) => default.as_str(),
                        (Some((_, None)), None) => "",
                        (None, None) => {
                            return Err(TemplateError::Unbound { name: name.clone() });
                        }
                    };
                    if is_dot_segment(value) {
                        return Err(TemplateError::DotSegment {
                            name: name.clone(),
                            value: value.to_string(),
                        });
                    }
                    path.push_str(&encode_path_segment(value));
                }
            }
        }
        Ok(path)
    }
}

impl std::str::FromStr for Template {
    type Err = TemplateError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::parse(source)
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    #[test]
    fn parse_segments() {
        let template = Template::parse("/posts/{id=2}/comments").expect("valid");
        insta::assert_debug_snapshot!(template.segments(), @r#"
        [
            Literal(
                "/posts/",
            ),
            Placeholder {
                name: "id",
                default: Some(
                    "2",
                ),
            },
            Literal(
                "/comments",
            ),
        ]
        "#);
    }

    #[test]
    fn raw_strips_defaults() {
        let template = Template::parse("/posts/{id=4}/comments/{comment_id=2}").expect("valid");
        check!(template.raw() == "/posts/{id}/comments/{comment_id}");
        check!(template.source() == "/posts/{id=4}/comments/{comment_id=2}");
        check!(template.default_of("comment_id") == Some("2"));
        check!(template.default_of("missing").is_none());
    }

    #[test]
    fn defaulted_equals_explicit_default() {
        let template = Template::parse("/posts/{id=2}/comments").expect("valid");
        let defaulted = template.resolve(&[]).expect("defaulted");
        let explicit = template
            .resolve(&[("id", Some("2".to_string()))])
            .expect("explicit");
        check!(defaulted == explicit);
        check!(defaulted == "/posts/2/comments");
    }

    #[test]
    fn none_value_uses_default_or_empty() {
        let template = Template::parse("/posts/{id}").expect("valid");
        check!(template.resolve(&[("id", None)]).expect("resolved") == "/posts/");

        let template = Template::parse("/posts/{id=7}").expect("valid");
        check!(template.resolve(&[("id", None)]).expect("resolved") == "/posts/7");
    }

    #[test]
    fn values_are_escaped() {
        let template = Template::parse("/users/{name}/files/{path}").expect("valid");
        let path = template
            .resolve(&[
                ("name", Some("John Doe".to_string())),
                ("path", Some("a/b?c".to_string())),
            ])
            .expect("resolved");
        check!(path == "/users/John%20Doe/files/a%2Fb%3Fc");
    }

    #[test]
    fn dot_segment_values_are_rejected() {
        let template = Template::parse("/users/{id}/profile").expect("valid");
        for value in [".", ".."] {
            let_assert!(
                Err(TemplateError::DotSegment { name, value: rejected }) =
                    template.resolve(&[("id", Some(value.to_string()))])
            );
            check!(name == "id");
            check!(rejected == value);
        }
        check!(template.resolve(&[("id", Some("...".to_string()))]).expect("resolved") == "/users/.../profile");
        check!(template.resolve(&[("id", Some("%2E%2E".to_string()))]).expect("resolved") == "/users/%252E%252E/profile");

        check!(matches!(
            Template::parse("/users/{id=..}/profile"),
            Err(TemplateError::UnsupportedDefault { .. })
        ));
    }

    #[test]
    fn unbound_placeholder() {
        let template = Template::parse("/posts/{id}").expect("valid");
        let_assert!(Err(TemplateError::Unbound { name }) = template.resolve(&[]));
        check!(name == "id");
    }

    #[test]
    fn unclosed_brace_is_malformed() {
        let_assert!(
            Err(TemplateError::Malformed { position, reason, .. }) = Template::parse("/posts/{id")
        );
        check!(position == 7);
        check!(reason == "unclosed `{`");
    }

    #[test]
    fn stray_and_empty_are_malformed() {
        check!(matches!(
            Template::parse("/posts/}"),
            Err(TemplateError::Malformed { .. })
        ));
        check!(matches!(
            Template::parse("/posts/{}"),
            Err(TemplateError::Malformed { .. })
        ));
        check!(matches!(
            Template::parse("/posts/{a-b}"),
            Err(TemplateError::Malformed { .. })
        ));
    }

    #[test]
    fn nested_default_is_unsupported() {
        let_assert!(
            Err(TemplateError::UnsupportedDefault { name, default }) =
                Template::parse("/posts/{id={other}}")
        );
        check!(name == "id");
        check!(default == "{other");

        check!(matches!(
            Template::parse("/posts/{id=}"),
            Err(TemplateError::UnsupportedDefault { .. })
        ));
    }

    #[test]
    fn literal_only() {
        let template: Template = "/posts/".parse().expect("valid");
        check!(template.placeholders().count() == 0);
        check!(template.resolve(&[]).expect("resolved") == "/posts/");
        check!(template.to_string() == "/posts/");
    }
}
