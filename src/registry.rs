use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

/// Source ecosystem segment of every CDN URL this crate builds.
pub const REPOSITORY: &str = "npm";

/// A file resolved to a concrete path and integrity hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDescriptor {
    pub name: String,
    pub package: String,
    pub version: String,
    pub repository: &'static str,
    pub hash: String,
}

impl FileDescriptor {
    pub fn npm(
        package: impl Into<String>,
        version: impl Into<String>,
        name: impl Into<String>,
        hash: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            version: version.into(),
            repository: REPOSITORY,
            hash: hash.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageEntry {
    pub requested_version: String,
    pub resolved_version: Option<String>,
    pub files: BTreeMap<String, FileDescriptor>,
    /// Aliases whose file could not be located during registration.
    pub missing: Vec<String>,
}

impl PackageEntry {
    pub fn pending(requested_version: impl Into<String>) -> Self {
        Self {
            requested_version: requested_version.into(),
            ..Self::default()
        }
    }
}

/// Registered packages keyed by name. Inserting replaces; nothing merges.
#[derive(Debug, Default)]
pub struct PackageRegistry {
    packages: HashMap<String, PackageEntry>,
}

impl PackageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, package: impl Into<String>, entry: PackageEntry) {
        self.packages.insert(package.into(), entry);
    }

    pub fn entry(&self, package: &str) -> Option<&PackageEntry> {
        self.packages.get(package)
    }

    pub fn descriptor(&self, package: &str, alias: &str) -> Option<&FileDescriptor> {
        self.packages.get(package)?.files.get(alias)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with(alias: &str, name: &str) -> PackageEntry {
        let mut entry = PackageEntry::pending("latest");
        entry.resolved_version = Some("1.0.0".into());
        entry.files.insert(
            alias.into(),
            FileDescriptor::npm("demo", "1.0.0", name, "hash"),
        );
        entry
    }

    #[test]
    fn insert_replaces_previous_entry() {
        let mut registry = PackageRegistry::new();
        registry.insert("demo", entry_with("js", "/dist/demo.js"));
        registry.insert("demo", entry_with("css", "/dist/demo.css"));

        assert_eq!(registry.len(), 1);
        assert!(registry.descriptor("demo", "js").is_none());
        assert_eq!(
            registry.descriptor("demo", "css").map(|d| d.name.as_str()),
            Some("/dist/demo.css")
        );
    }

    #[test]
    fn descriptors_carry_npm_repository() {
        let descriptor = FileDescriptor::npm("demo", "1.0.0", "/a.js", "h");
        assert_eq!(descriptor.repository, "npm");
    }

    #[test]
    fn unknown_package_has_no_descriptor() {
        let registry = PackageRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.descriptor("nope", "js").is_none());
    }
}
