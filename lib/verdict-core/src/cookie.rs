//! Cookie extraction from successful responses.

use std::sync::{Arc, PoisonError, RwLock};

use crate::config::DEFAULT_COOKIE_HEADER;

/// Shared single-slot cookie store. Last write wins.
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct CookieStore {
    inner: Arc<RwLock<Option<String>>>,
}

impl CookieStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored cookie.
    pub fn set(&self, cookie: impl Into<String>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(cookie.into());
    }

    /// The stored cookie.
    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Removes the stored cookie.
    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Republishes one response header to a [`CookieStore`].
#[derive(Debug, Clone)]
pub struct CookieExtractor {
    header_name: String,
    store: CookieStore,
}

impl CookieExtractor {
    /// Creates an extractor for the `Set-Cookie` header.
    #[must_use]
    pub fn new(store: CookieStore) -> Self {
        Self::with_header(DEFAULT_COOKIE_HEADER, store)
    }

    /// Creates an extractor for a custom header name.
    #[must_use]
    pub fn with_header(header_name: impl Into<String>, store: CookieStore) -> Self {
        Self {
            header_name: header_name.into(),
            store,
        }
    }

    /// Header name matched (exactly, case-sensitive).
    #[must_use]
    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    /// The store cookies are published to.
    #[must_use]
    pub const fn store(&self) -> &CookieStore {
        &self.store
    }

    /// Value of the first header whose name matches exactly.
    #[must_use]
    pub fn find<'h>(&self, headers: &'h [(String, String)]) -> Option<&'h str> {
        headers
            .iter()
            .find(|(name, _)| *name == self.header_name)
            .map(|(_, value)| value.as_str())
    }

    /// Publishes the matching header value, if present and non-empty.
    ///
    /// Returns `true` when the store was updated.
    pub fn extract(&self, headers: &[(String, String)]) -> bool {
        match self.find(headers) {
            Some(value) if !value.is_empty() => {
                tracing::debug!(header = %self.header_name, cookie = value, "cookie received");
                self.store.set(value);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn first_match_is_published() {
        let store = CookieStore::new();
        let extractor = CookieExtractor::new(store.clone());

        let updated = extractor.extract(&headers(&[
            ("Content-Type", "application/json"),
            ("Set-Cookie", "session=abc"),
            ("Set-Cookie", "theme=dark"),
        ]));

        assert!(updated);
        assert_eq!(store.get().as_deref(), Some("session=abc"));
    }

    #[test]
    fn name_match_is_case_sensitive() {
        let store = CookieStore::new();
        let extractor = CookieExtractor::new(store.clone());

        assert!(!extractor.extract(&headers(&[("set-cookie", "session=abc")])));
        assert!(store.get().is_none());
    }

    #[test]
    fn empty_or_missing_value_is_ignored() {
        let store = CookieStore::new();
        store.set("session=old");
        let extractor = CookieExtractor::new(store.clone());

        assert!(!extractor.extract(&headers(&[("Set-Cookie", "")])));
        assert!(!extractor.extract(&[]));
        assert_eq!(store.get().as_deref(), Some("session=old"));
    }

    #[test]
    fn last_write_wins() {
        let store = CookieStore::new();
        let extractor = CookieExtractor::with_header("X-Session", store.clone());

        extractor.extract(&headers(&[("X-Session", "one")]));
        extractor.extract(&headers(&[("X-Session", "two")]));
        assert_eq!(store.get().as_deref(), Some("two"));

        store.clear();
        assert!(store.get().is_none());
    }
}
