//! Whole-page cache for rendered HTML.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use axum::http::Uri;

struct CachedPage {
    stored_at: Instant,
    html: String,
}

/// Rendered pages keyed by request URI and viewer. Entries live for a fixed
/// TTL; a zero TTL disables caching.
pub struct PageCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedPage>>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn key(uri: &Uri, viewer: Option<i64>) -> String {
        let path = uri
            .path_and_query()
            .map(|p| p.as_str())
            .unwrap_or_else(|| uri.path());
        match viewer {
            Some(id) => format!("{}#user={}", path, id),
            None => format!("{}#anonymous", path),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if self.ttl.is_zero() {
            return None;
        }
        let mut entries = self.entries();
        match entries.get(key) {
            Some(page) if page.stored_at.elapsed() < self.ttl => Some(page.html.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, html: String) {
        if self.ttl.is_zero() {
            return;
        }
        let mut entries = self.entries();
        entries.retain(|_, page| page.stored_at.elapsed() < self.ttl);
        entries.insert(
            key,
            CachedPage {
                stored_at: Instant::now(),
                html,
            },
        );
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CachedPage>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_separate_viewers_and_queries() {
        let uri: Uri = "/?page=2".parse().unwrap();
        assert_eq!(PageCache::key(&uri, None), "/?page=2#anonymous");
        assert_eq!(PageCache::key(&uri, Some(4)), "/?page=2#user=4");
    }

    #[test]
    fn stored_page_is_returned_until_cleared() {
        let cache = PageCache::new(Duration::from_secs(60));
        cache.insert("/".into(), "<p>hello</p>".into());
        assert_eq!(cache.get("/").as_deref(), Some("<p>hello</p>"));
        cache.clear();
        assert!(cache.get("/").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn expired_page_is_dropped() {
        let cache = PageCache::new(Duration::from_millis(10));
        cache.insert("/".into(), "old".into());
        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.get("/").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn zero_ttl_disables_cache() {
        let cache = PageCache::new(Duration::ZERO);
        cache.insert("/".into(), "page".into());
        assert!(cache.get("/").is_none());
        assert!(cache.is_empty());
    }
}
