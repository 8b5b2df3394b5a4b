//! Response decoding.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{Error, Result};

/// How object keys in a response are mapped before deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyDecoding {
    /// Keys are used as-is.
    #[default]
    AsIs,
    /// `snake_case` keys are rewritten to `camelCase` first.
    FromSnakeCase,
}

/// JSON decoder shared by every operation of a service.
///
/// Errors carry the path of the offending field, courtesy of `serde_path_to_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decoder {
    keys: KeyDecoding,
}

impl Decoder {
    /// Decoder with the given key strategy.
    #[must_use]
    pub const fn new(keys: KeyDecoding) -> Self {
        Self { keys }
    }

    /// Key strategy in use.
    #[must_use]
    pub const fn key_decoding(&self) -> KeyDecoding {
        self.keys
    }

    /// Decode a required value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FailedToMapResponse`] when the body is not valid JSON
    /// or does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        match self.keys {
            KeyDecoding::AsIs => {
                let mut deserializer = serde_json::Deserializer::from_slice(bytes);
                serde_path_to_error::deserialize(&mut deserializer)
                    .map_err(|e| Error::failed_to_map(e.path().to_string(), e.inner().to_string()))
            }
            KeyDecoding::FromSnakeCase => {
                let value: Value = serde_json::from_slice(bytes)
                    .map_err(|e| Error::failed_to_map(".", e.to_string()))?;
                serde_path_to_error::deserialize(camelize_keys(value))
                    .map_err(|e| Error::failed_to_map(e.path().to_string(), e.inner().to_string()))
            }
        }
    }

    /// Decode an optional value: an empty body or `null` yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FailedToMapResponse`] when a non-empty body does not match `T`.
    pub fn decode_optional<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<Option<T>> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        self.decode(bytes)
    }
}

fn camelize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (snake_to_camel(&key), camelize_keys(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(camelize_keys).collect()),
        other => other,
    }
}

fn snake_to_camel(key: &str) -> String {
    let mut camel = String::with_capacity(key.len());
    let mut upper_next = false;
    for (index, ch) in key.chars().enumerate() {
        if ch == '_' && index > 0 {
            upper_next = true;
        } else if upper_next {
            camel.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            camel.push(ch);
        }
    }
    camel
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    #[derive(Debug, PartialEq, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Comment {
        post_id: u32,
        id: u32,
        email: String,
    }

    #[test]
    fn decode_as_is() {
        let comment: Comment = Decoder::default()
            .decode(br#"{"postId":1,"id":2,"email":"a@b.c"}"#)
            .expect("decode");
        check!(comment.post_id == 1);
    }

    #[test]
    fn decode_from_snake_case() {
        let decoder = Decoder::new(KeyDecoding::FromSnakeCase);
        let comments: Vec<Comment> = decoder
            .decode(br#"[{"post_id":1,"id":2,"email":"a@b.c"}]"#)
            .expect("decode");
        check!(comments == vec![Comment { post_id: 1, id: 2, email: "a@b.c".to_string() }]);
    }

    #[test]
    fn snake_to_camel_cases() {
        check!(snake_to_camel("post_id") == "postId");
        check!(snake_to_camel("user_id_value") == "userIdValue");
        check!(snake_to_camel("_private") == "_private");
        check!(snake_to_camel("plain") == "plain");
    }

    #[test]
    fn decode_error_has_path() {
        let_assert!(
            Err(Error::FailedToMapResponse { path, message }) =
                Decoder::default().decode::<Comment>(br#"{"postId":"one","id":2,"email":"x"}"#)
        );
        check!(path == "postId");
        check!(message.contains("invalid type"));
    }

    #[test]
    fn decode_optional_empty_and_null() {
        let decoder = Decoder::default();
        check!(decoder.decode_optional::<Comment>(b"").expect("empty").is_none());
        check!(decoder.decode_optional::<Comment>(b"  \n").expect("blank").is_none());
        check!(decoder.decode_optional::<Comment>(b"null").expect("null").is_none());
        check!(
            decoder
                .decode_optional::<Comment>(br#"{"postId":1,"id":2,"email":"x"}"#)
                .expect("value")
                .is_some()
        );
    }
}
