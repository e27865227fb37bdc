//! Classification of external references
//!
//! An external `$ref` either names a schema resource that should be loaded
//! and embedded, or it is an opaque link (a website, a documentation URL) that must
//! be left exactly as written.

use url::Url;

/// How the embedder treats an external reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// Load the document and embed it
    Embeddable,
    /// Leave the reference untouched
    Opaque,
}

/// Strategy deciding whether an external url is a schema resource
pub trait ReferenceClassifier: Send + Sync {
    fn classify(&self, url: &str) -> RefKind;
}

impl<F> ReferenceClassifier for F
where
    F: Fn(&str) -> RefKind + Send + Sync,
{
    fn classify(&self, url: &str) -> RefKind {
        self(url)
    }
}

/// Default suffixes treated as schema resources
pub const DEFAULT_SUFFIXES: &[&str] = &[".json", ".yaml", ".yml"];

/// Classifies by file suffix of the url path
#[derive(Debug, Clone)]
pub struct SuffixClassifier {
    suffixes: Vec<String>,
}

impl SuffixClassifier {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes
                .into_iter()
                .map(|s| s.into().to_lowercase())
                .collect(),
        }
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    fn matches(&self, path: &str) -> bool {
        let path = path.to_lowercase();
        self.suffixes.iter().any(|suffix| path.ends_with(suffix.as_str()))
    }
}

impl Default for SuffixClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_SUFFIXES.iter().copied())
    }
}

impl ReferenceClassifier for SuffixClassifier {
    fn classify(&self, url: &str) -> RefKind {
        // Absolute urls: only the path counts, query strings never do
        let path = match Url::parse(url) {
            Ok(parsed) => parsed.path().to_string(),
            Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
        };

        if self.matches(&path) {
            RefKind::Embeddable
        } else {
            RefKind::Opaque
        }
    }
}
