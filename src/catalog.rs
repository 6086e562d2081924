//! Message catalogs: the key → template store consulted by message leaves.
//!
//! The engine only ever calls [`Catalog::lookup`]. A `None` result is reported
//! as [`Error::CatalogMiss`](crate::Error::CatalogMiss) by the caller, so a
//! missing key is never confused with "no mapping configured".

use std::borrow::Cow;
use std::collections::HashMap;

/// Key → template lookup.
pub trait Catalog: Send + Sync {
    fn lookup(&self, key: &str) -> Option<Cow<'_, str>>;
}

impl Catalog for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).map(|s| Cow::Borrowed(s.as_str()))
    }
}

impl<F> Catalog for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn lookup(&self, key: &str) -> Option<Cow<'_, str>> {
        self(key).map(Cow::Owned)
    }
}

/// In-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct MapCatalog {
    entries: HashMap<String, String>,
}

impl MapCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, template: impl Into<String>) -> &mut Self {
        self.entries.insert(key.into(), template.into());
        self
    }

    pub fn with(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.insert(key, template);
        self
    }

    /// Load `KEY = template` lines.
    ///
    /// Blank lines and lines starting with `#` are skipped, whitespace around
    /// the key and the template is trimmed, later keys overwrite earlier ones.
    /// Lines without `=` are ignored.
    pub fn parse(text: &str) -> Self {
        let mut catalog = MapCatalog::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, template)) = line.split_once('=') else {
                tracing::debug!(line, "skipping catalog line without `=`");
                continue;
            };
            catalog.insert(key.trim(), template.trim());
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Catalog for MapCatalog {
    fn lookup(&self, key: &str) -> Option<Cow<'_, str>> {
        self.entries.get(key).map(|s| Cow::Borrowed(s.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapCatalog {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        MapCatalog { entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}
