//! Registration and tag lookup.
//!
//! [`CdnHtmlHelper`] owns the package registry and the render cache. Packages
//! are registered with [`CdnHtmlHelper::use_package`], which hits the metadata
//! service; tags are then served from [`CdnHtmlHelper::get`] without further
//! network traffic.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use crate::cache::RenderCache;
use crate::config::{HelperConfig, MissingFilePolicy};
use crate::error::{HelperError, Result};
use crate::metadata::{MetadataClient, MetadataSource};
use crate::registry::{FileDescriptor, PackageEntry, PackageRegistry};
use crate::render::{DEFAULT_CDN_URL, FILE_NOT_FOUND, OutputMode, TemplateSet};

pub const LATEST: &str = "latest";

/// Outcome of one registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub package: String,
    pub requested_version: String,
    pub resolved_version: String,
    pub files: BTreeMap<String, FileDescriptor>,
    pub missing: Vec<String>,
}

impl Registration {
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

pub struct CdnHtmlHelper {
    cdn_url: String,
    output: OutputMode,
    missing_files: MissingFilePolicy,
    templates: TemplateSet,
    source: Box<dyn MetadataSource>,
    registry: RwLock<PackageRegistry>,
    cache: Mutex<RenderCache>,
}

impl std::fmt::Debug for CdnHtmlHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CdnHtmlHelper")
            .field("cdn_url", &self.cdn_url)
            .field("output", &self.output)
            .field("missing_files", &self.missing_files)
            .field("templates", &self.templates)
            .finish_non_exhaustive()
    }
}

impl CdnHtmlHelper {
    /// Helper against the public jsDelivr endpoints with default settings.
    pub fn new() -> anyhow::Result<Self> {
        Self::from_config(&HelperConfig::default())
    }

    pub fn from_config(config: &HelperConfig) -> anyhow::Result<Self> {
        let client = MetadataClient::new(&config.metadata)?;
        let mut helper = Self::with_source(client)
            .with_cdn_url(&config.cdn.url)
            .with_output(config.render.output)
            .with_missing_files(config.render.missing_files);
        for (extension, template) in &config.templates {
            helper.templates.insert(extension, template);
        }
        Ok(helper)
    }

    pub fn with_source(source: impl MetadataSource + 'static) -> Self {
        Self {
            cdn_url: DEFAULT_CDN_URL.to_string(),
            output: OutputMode::default(),
            missing_files: MissingFilePolicy::default(),
            templates: TemplateSet::default(),
            source: Box::new(source),
            registry: RwLock::new(PackageRegistry::new()),
            cache: Mutex::new(RenderCache::new()),
        }
    }

    pub fn with_cdn_url(mut self, cdn_url: &str) -> Self {
        self.cdn_url = cdn_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn with_missing_files(mut self, policy: MissingFilePolicy) -> Self {
        self.missing_files = policy;
        self
    }

    pub fn with_template(mut self, extension: &str, template: &str) -> Self {
        self.templates.insert(extension, template);
        self
    }

    /// Registers `package` at the latest version using its default entrypoints.
    pub fn use_latest(&self, package: &str) -> Result<Registration> {
        self.use_package(package, LATEST, &BTreeMap::new())
    }

    /// Resolves `specifier` and the hashes for `files` (alias -> path suffix),
    /// replacing whatever was registered for `package` before. An empty map
    /// selects the package's default entrypoints.
    pub fn use_package(
        &self,
        package: &str,
        specifier: &str,
        files: &BTreeMap<String, String>,
    ) -> Result<Registration> {
        let evicted = self.store_entry(package, PackageEntry::pending(specifier));
        if evicted > 0 {
            tracing::debug!(package, evicted, "evicted cached tags");
        }

        let version = self.source.resolve_version(package, specifier)?;

        let defaults;
        let files = if files.is_empty() {
            defaults = self.source.default_entrypoints(package, &version)?;
            if defaults.is_empty() {
                tracing::warn!(package, %version, "no default entrypoints reported");
            }
            &defaults
        } else {
            files
        };

        let mut entry = PackageEntry::pending(specifier);
        entry.resolved_version = Some(version.clone());
        for (alias, suffix) in files {
            match self.source.find_file(package, &version, suffix)? {
                Some(found) => {
                    let descriptor = FileDescriptor::npm(package, &version, found.name, found.hash);
                    entry.files.insert(alias.clone(), descriptor);
                }
                None if self.missing_files == MissingFilePolicy::Fail => {
                    return Err(HelperError::FileNotFound {
                        package: package.to_string(),
                        version,
                        suffix: suffix.clone(),
                    });
                }
                None => {
                    tracing::warn!(package, %version, alias, suffix, "file not found; skipping alias");
                    entry.missing.push(alias.clone());
                }
            }
        }

        let registration = Registration {
            package: package.to_string(),
            requested_version: specifier.to_string(),
            resolved_version: version,
            files: entry.files.clone(),
            missing: entry.missing.clone(),
        };
        self.store_entry(package, entry);
        tracing::info!(
            package,
            version = %registration.resolved_version,
            files = registration.files.len(),
            missing = registration.missing.len(),
            "registered package"
        );
        Ok(registration)
    }

    /// Markup for `alias` of `package`. Unknown packages or aliases yield an
    /// HTML comment rather than an error.
    pub fn get(&self, package: &str, alias: &str) -> String {
        self.output.apply(&self.render_cached(package, alias))
    }

    fn render_cached(&self, package: &str, alias: &str) -> String {
        // Lock order is cache then registry, matching `store_entry`.
        let mut cache = self.cache();
        if let Some(hit) = cache.lookup(package, alias) {
            return hit.to_string();
        }

        let markup = match self.registry().descriptor(package, alias) {
            Some(descriptor) => self.templates.render(&self.cdn_url, descriptor),
            None => FILE_NOT_FOUND.to_string(),
        };
        cache.insert(package, alias, markup.clone());
        markup
    }

    /// Replaces the registry entry and evicts the package's cached tags under
    /// the cache lock, so no `get` can cache markup for the replaced entry.
    fn store_entry(&self, package: &str, entry: PackageEntry) -> usize {
        let mut cache = self.cache();
        self.registry_mut().insert(package, entry);
        cache.invalidate_package(package)
    }

    /// Snapshot of the current registration state for `package`.
    pub fn entry(&self, package: &str) -> Option<PackageEntry> {
        self.registry().entry(package).cloned()
    }

    pub fn cached_tags(&self) -> usize {
        self.cache().len()
    }

    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    fn registry(&self) -> RwLockReadGuard<'_, PackageRegistry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn registry_mut(&self) -> RwLockWriteGuard<'_, PackageRegistry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn cache(&self) -> MutexGuard<'_, RenderCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
