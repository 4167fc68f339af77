use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by registration. Rendering never fails; it degrades to
/// HTML comment markers instead.
#[derive(Debug, Error)]
pub enum HelperError {
    #[error("package `{package}` not found (specifier `{specifier}`)")]
    PackageNotFound { package: String, specifier: String },

    #[error("no file ending with `{suffix}` in {package}@{version}")]
    FileNotFound {
        package: String,
        version: String,
        suffix: String,
    },

    #[error(transparent)]
    MetadataService(#[from] MetadataServiceError),
}

impl HelperError {
    pub fn package_not_found(package: impl Into<String>, specifier: impl Into<String>) -> Self {
        Self::PackageNotFound {
            package: package.into(),
            specifier: specifier.into(),
        }
    }
}

/// Failures talking to the package metadata service.
#[derive(Debug, Error)]
pub enum MetadataServiceError {
    #[error("http error requesting {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status {status} from {url}{}", body_suffix(.body))]
    Status {
        url: String,
        status: StatusCode,
        body: Option<String>,
    },

    #[error("invalid response from {url}: {source}")]
    InvalidResponse {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl MetadataServiceError {
    /// Whether a fresh attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            MetadataServiceError::Http { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            MetadataServiceError::Status { status, .. } => status.is_server_error(),
            MetadataServiceError::InvalidResponse { .. } => false,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            MetadataServiceError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn body_suffix(body: &Option<String>) -> String {
    match body.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => format!(": {text}"),
        _ => String::new(),
    }
}

pub type Result<T, E = HelperError> = std::result::Result<T, E>;
