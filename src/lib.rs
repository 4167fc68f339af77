pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod helper;
pub mod integration;
pub mod metadata;
pub mod registry;
pub mod render;

pub use error::{HelperError, MetadataServiceError};
pub use helper::{CdnHtmlHelper, Registration};
