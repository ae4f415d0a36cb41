use std::collections::BTreeMap;
use std::fmt;

/// Ordered list query parameters for `GET /{resource}`.
///
/// Empty values are never sent: an empty search or filter means
/// "no constraint", not "match empty".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Free-text search term, sent as `search=`.
    pub fn search(self, term: &str) -> Self {
        self.param("search", term)
    }

    /// Add one equality filter. Empty values are dropped.
    pub fn param(mut self, key: &str, value: &str) -> Self {
        if !value.is_empty() {
            self.pairs.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// Add every non-empty filter, in key order.
    pub fn filters(self, filters: &BTreeMap<String, String>) -> Self {
        filters.iter().fold(self, |q, (k, v)| q.param(k, v))
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Unencoded `k=v&k=v` form, for logs.
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        Ok(())
    }
}
