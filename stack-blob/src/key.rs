use std::fmt;

/// Slash-delimited object name relative to a store's root.
///
/// Keys are normalized on construction by trimming leading `/` and `\`, so
/// `"/a/b.jpg"` and `"a/b.jpg"` name the same object. Hierarchy is purely
/// lexical: no key implies that a directory exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobKey(String);

impl BlobKey {
    pub fn new<S: AsRef<str>>(raw: S) -> Self {
        Self(raw.as_ref().trim_start_matches(['/', '\\']).to_string())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Path segments, skipping empty ones produced by doubled slashes.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(['/', '\\']).filter(|s| !s.is_empty())
    }

    /// True when any segment is `..`.
    pub fn escapes_root(&self) -> bool {
        self.segments().any(|s| s == "..")
    }

    /// Join this key under `prefix`, trimming the leading slash of the result.
    pub fn with_prefix(&self, prefix: &str) -> String {
        let prefix = prefix.trim_matches('/');
        if prefix.is_empty() {
            self.0.clone()
        } else {
            format!("{}/{}", prefix, self.0)
        }
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BlobKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for BlobKey {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl AsRef<str> for BlobKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
