use std::sync::Arc;

use chrono::{DateTime, Local};
use madori_ipc::{ThemeColors, ThemeSource};
use parking_lot::RwLock;

#[derive(Debug, Clone)]
struct Entry {
    colors: Arc<ThemeColors>,
    source: ThemeSource,
    hash: Option<String>,
    updated_at: Option<DateTime<Local>>,
}

/// The current colour dictionary.
///
/// The whole entry is swapped under one write lock, so readers always see
/// either the previous palette or the new one.
#[derive(Debug)]
pub struct ColorCache {
    entry: RwLock<Entry>,
}

impl ColorCache {
    pub fn new(colors: ThemeColors, source: ThemeSource, hash: Option<String>) -> Self {
        Self {
            entry: RwLock::new(Entry {
                colors: Arc::new(colors),
                source,
                hash,
                updated_at: None,
            }),
        }
    }

    pub fn current(&self) -> Arc<ThemeColors> {
        self.entry.read().colors.clone()
    }

    pub fn source(&self) -> ThemeSource {
        self.entry.read().source.clone()
    }

    pub fn hash(&self) -> Option<String> {
        self.entry.read().hash.clone()
    }

    pub fn updated_at(&self) -> Option<DateTime<Local>> {
        self.entry.read().updated_at
    }

    /// Replace the palette with one freshly read from the theme file.
    pub fn replace(&self, colors: ThemeColors, hash: String) -> Arc<ThemeColors> {
        let colors = Arc::new(colors);
        *self.entry.write() = Entry {
            colors: colors.clone(),
            source: ThemeSource::ThemeFile,
            hash: Some(hash),
            updated_at: Some(Local::now()),
        };
        colors
    }

    /// Remember the hash of a rewrite whose colours did not change.
    pub fn set_hash(&self, hash: String) {
        self.entry.write().hash = Some(hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::loader::test_support::theme_json;

    #[test]
    fn test_replace_swaps_everything_at_once() {
        let cache = ColorCache::new(ThemeColors::fallback(), ThemeSource::Defaults, None);
        let before = cache.current();
        assert_eq!(cache.source(), ThemeSource::Defaults);
        assert!(cache.updated_at().is_none());

        let next: ThemeColors = serde_json::from_str(&theme_json(9)).unwrap();
        cache.replace(next.clone(), "abc".to_string());

        assert_eq!(*cache.current(), next);
        assert_eq!(cache.source(), ThemeSource::ThemeFile);
        assert_eq!(cache.hash().as_deref(), Some("abc"));
        assert!(cache.updated_at().is_some());

        // Readers holding the old Arc still see the complete old palette
        assert_eq!(*before, ThemeColors::fallback());
    }

    #[test]
    fn test_set_hash_keeps_colors() {
        let cache = ColorCache::new(ThemeColors::fallback(), ThemeSource::ThemeFile, None);
        cache.set_hash("def".to_string());
        assert_eq!(cache.hash().as_deref(), Some("def"));
        assert_eq!(*cache.current(), ThemeColors::fallback());
    }
}
