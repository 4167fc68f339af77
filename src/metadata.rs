use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::MetadataSettings;
use crate::error::{HelperError, MetadataServiceError, Result};

pub const DEFAULT_DATA_URL: &str = "https://data.jsdelivr.com";

/// One file in a flat version listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub hash: String,
}

/// Lookups the registration flow needs from a package metadata service.
pub trait MetadataSource: Send + Sync {
    fn resolve_version(&self, package: &str, specifier: &str) -> Result<String>;

    fn list_files(&self, package: &str, version: &str) -> Result<Vec<FileRecord>>;

    /// Entrypoint key -> file path, limited to entrypoints that name a file.
    fn default_entrypoints(&self, package: &str, version: &str)
    -> Result<BTreeMap<String, String>>;

    /// First listed file whose full path ends with `suffix`.
    fn find_file(&self, package: &str, version: &str, suffix: &str) -> Result<Option<FileRecord>> {
        Ok(self
            .list_files(package, version)?
            .into_iter()
            .find(|file| file.name.ends_with(suffix)))
    }
}

#[derive(Debug, Deserialize)]
struct ResolvedBody {
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FlatListingBody {
    #[serde(default)]
    files: Vec<FileRecord>,
}

#[derive(Debug, Deserialize)]
struct EntrypointsBody {
    #[serde(default)]
    entrypoints: BTreeMap<String, EntrypointBody>,
}

#[derive(Debug, Deserialize)]
struct EntrypointBody {
    #[serde(default)]
    file: Option<String>,
}

impl EntrypointsBody {
    fn into_files(self) -> BTreeMap<String, String> {
        self.entrypoints
            .into_iter()
            .filter_map(|(key, entry)| entry.file.map(|file| (key, file)))
            .collect()
    }
}

/// Blocking client for the jsDelivr data API.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    base_url: String,
    max_retries: u32,
    retry_backoff: Duration,
    http: Client,
}

impl MetadataClient {
    pub fn new(settings: &MetadataSettings) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .user_agent(format!("cdn-html-helper/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: settings.url.trim_end_matches('/').to_string(),
            max_retries: settings.max_retries,
            retry_backoff: Duration::from_millis(settings.retry_backoff_ms),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn package_url(&self, package: &str) -> String {
        format!("{}/v1/packages/npm/{package}", self.base_url)
    }

    fn version_url(&self, package: &str, version: &str) -> String {
        format!("{}/v1/packages/npm/{package}@{version}", self.base_url)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, MetadataServiceError> {
        let response = self.send_with_retry(url, query)?;
        response
            .json::<T>()
            .map_err(|source| MetadataServiceError::InvalidResponse {
                url: url.to_string(),
                source,
            })
    }

    fn send_with_retry(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Response, MetadataServiceError> {
        let mut attempt = 0;
        loop {
            match self.send_once(url, query) {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(%url, attempt, error = %err, "retrying metadata request");
                    thread::sleep(self.retry_backoff * attempt);
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn send_once(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Response, MetadataServiceError> {
        tracing::debug!(%url, ?query, "metadata request");
        let mut builder = self.http.get(url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        let response = builder
            .send()
            .map_err(|source| MetadataServiceError::Http {
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().ok();
            return Err(MetadataServiceError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }
        Ok(response)
    }
}

impl MetadataSource for MetadataClient {
    fn resolve_version(&self, package: &str, specifier: &str) -> Result<String> {
        let url = format!("{}/resolved", self.package_url(package));
        let body: ResolvedBody = match self.get_json(&url, &[("specifier", specifier)]) {
            Ok(body) => body,
            Err(err) if err.status() == Some(StatusCode::NOT_FOUND) => {
                return Err(HelperError::package_not_found(package, specifier));
            }
            Err(err) => return Err(err.into()),
        };
        match body.version {
            Some(version) if !version.trim().is_empty() => Ok(version),
            _ => Err(HelperError::package_not_found(package, specifier)),
        }
    }

    fn list_files(&self, package: &str, version: &str) -> Result<Vec<FileRecord>> {
        let url = self.version_url(package, version);
        let body: FlatListingBody = self.get_json(&url, &[("structure", "flat")])?;
        Ok(body.files)
    }

    fn default_entrypoints(
        &self,
        package: &str,
        version: &str,
    ) -> Result<BTreeMap<String, String>> {
        let url = format!("{}/entrypoints", self.version_url(package, version));
        let body: EntrypointsBody = self.get_json(&url, &[])?;
        Ok(body.into_files())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Listing(Vec<FileRecord>);

    impl MetadataSource for Listing {
        fn resolve_version(&self, _package: &str, _specifier: &str) -> Result<String> {
            Ok("1.0.0".into())
        }

        fn list_files(&self, _package: &str, _version: &str) -> Result<Vec<FileRecord>> {
            Ok(self.0.clone())
        }

        fn default_entrypoints(
            &self,
            _package: &str,
            _version: &str,
        ) -> Result<BTreeMap<String, String>> {
            Ok(BTreeMap::new())
        }
    }

    fn record(name: &str, hash: &str) -> FileRecord {
        FileRecord {
            name: name.into(),
            hash: hash.into(),
        }
    }

    #[test]
    fn find_file_returns_first_suffix_match() {
        let source = Listing(vec![
            record("/src/jquery.js", "src"),
            record("/dist/jquery.js", "dist"),
            record("/dist/jquery.min.js", "min"),
        ]);
        let found = source.find_file("jquery", "1.0.0", "jquery.js").unwrap();
        assert_eq!(found, Some(record("/src/jquery.js", "src")));

        let found = source.find_file("jquery", "1.0.0", "/dist/jquery.js").unwrap();
        assert_eq!(found.map(|f| f.hash), Some("dist".to_string()));
    }

    #[test]
    fn find_file_misses_are_none() {
        let source = Listing(vec![record("/dist/jquery.js", "dist")]);
        assert!(source.find_file("jquery", "1.0.0", ".css").unwrap().is_none());
    }

    #[test]
    fn entrypoints_without_file_are_dropped() {
        let body: EntrypointsBody = serde_json::from_value(serde_json::json!({
            "entrypoints": {
                "js": { "file": "/dist/app.js", "guessed": false },
                "types": { "guessed": true }
            }
        }))
        .unwrap();
        let files = body.into_files();
        assert_eq!(files.len(), 1);
        assert_eq!(files["js"], "/dist/app.js");
    }

    #[test]
    fn client_trims_trailing_slash_from_base_url() {
        let settings = MetadataSettings {
            url: "http://localhost:9/".into(),
            ..MetadataSettings::default()
        };
        let client = MetadataClient::new(&settings).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9");
        assert_eq!(
            client.version_url("jquery", "3.6.0"),
            "http://localhost:9/v1/packages/npm/jquery@3.6.0"
        );
    }
}
