//! Query items appended to resolved URLs.

use url::Url;

/// A single `key=value` pair of a query string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryItem {
    key: String,
    value: String,
}

impl QueryItem {
    /// Creates a query item from anything displayable.
    ///
    /// ```
    /// use sprig_core::QueryItem;
    ///
    /// let item = QueryItem::new("test", true);
    /// assert_eq!(item.value(), "true");
    /// ```
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl ToString) -> Self {
        Self {
            key: key.into(),
            value: value.to_string(),
        }
    }

    /// Query key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Query value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl<K: Into<String>, V: ToString> From<(K, V)> for QueryItem {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}

/// Append items to the URL query, preserving order.
///
/// An empty slice leaves the URL untouched, so no bare `?` is ever produced.
pub fn append_query_items(url: &mut Url, items: &[QueryItem]) {
    if items.is_empty() {
        return;
    }
    let mut pairs = url.query_pairs_mut();
    for item in items {
        pairs.append_pair(&item.key, &item.value);
    }
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;

    fn base() -> Url {
        Url::parse("https://jsonplaceholder.typicode.com/posts/12").expect("valid URL")
    }

    #[test]
    fn empty_items_leave_no_question_mark() {
        let mut url = base();
        append_query_items(&mut url, &[]);
        check!(!url.as_str().contains('?'));
    }

    #[test]
    fn items_keep_order() {
        let mut url = base();
        append_query_items(
            &mut url,
            &[
                QueryItem::new("boolVal", true),
                QueryItem::new("intVal", 5),
                QueryItem::new("stringVal", "five"),
            ],
        );
        check!(
            url.as_str()
                == "https://jsonplaceholder.typicode.com/posts/12?boolVal=true&intVal=5&stringVal=five"
        );
    }

    #[test]
    fn items_are_encoded() {
        let mut url = base();
        append_query_items(&mut url, &[QueryItem::from(("q", "a b&c"))]);
        check!(url.query() == Some("q=a+b%26c"));
    }
}
