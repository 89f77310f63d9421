use std::collections::HashMap;

/// Title replacement table.
///
/// Keys are normalized (trimmed, lowercased) when the table is built and the
/// probe is normalized the same way on lookup, so callers never normalize.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    entries: HashMap<String, String>,
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

impl Overrides {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(key, value)| (normalize_key(key.as_ref()), value.into()))
                .collect(),
        }
    }

    pub fn get(&self, title: &str) -> Option<&str> {
        self.entries.get(&normalize_key(title)).map(String::as_str)
    }

    /// The replacement for `title`, or `title` itself when there is none.
    pub fn apply(&self, title: &str) -> String {
        self.get(title).unwrap_or(title).to_string()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
