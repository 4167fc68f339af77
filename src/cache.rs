use std::collections::HashMap;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct RenderKey {
    package: String,
    alias: String,
}

impl RenderKey {
    fn new(package: &str, alias: &str) -> Self {
        Self {
            package: package.to_string(),
            alias: alias.to_string(),
        }
    }
}

/// Rendered markup memoized per (package, alias).
///
/// Unbounded: the key space is the set of tags a site actually emits.
#[derive(Debug, Default)]
pub struct RenderCache {
    entries: HashMap<RenderKey, String>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, package: &str, alias: &str) -> Option<&str> {
        self.entries
            .get(&RenderKey::new(package, alias))
            .map(String::as_str)
    }

    pub fn insert(&mut self, package: &str, alias: &str, markup: String) {
        self.entries.insert(RenderKey::new(package, alias), markup);
    }

    /// Drops every cached tag for `package`, returning how many were removed.
    pub fn invalidate_package(&mut self, package: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.package != package);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_keyed_by_package_and_alias() {
        let mut cache = RenderCache::new();
        cache.insert("jquery", "js", "<script>".into());
        assert_eq!(cache.lookup("jquery", "js"), Some("<script>"));
        assert_eq!(cache.lookup("jquery", "css"), None);
        assert_eq!(cache.lookup("bootstrap", "js"), None);
    }

    #[test]
    fn invalidate_package_leaves_other_packages() {
        let mut cache = RenderCache::new();
        cache.insert("jquery", "js", "a".into());
        cache.insert("jquery", "css", "b".into());
        cache.insert("bootstrap", "js", "c".into());

        assert_eq!(cache.invalidate_package("jquery"), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup("bootstrap", "js"), Some("c"));

        cache.clear();
        assert!(cache.is_empty());
    }
}
