use serde::Deserialize;

use crate::registry::FileDescriptor;

pub const DEFAULT_CDN_URL: &str = "https://cdn.jsdelivr.net";

pub const FILE_NOT_FOUND: &str = "<!-- File not found -->";

const CSS_TEMPLATE: &str = concat!(
    r#"<link rel="stylesheet""#,
    r#" href="{cdn_url}/{repo}/{package}@{version}{name}""#,
    r#" integrity="sha256-{hash}" crossorigin="anonymous"/>"#,
);

const JS_TEMPLATE: &str = concat!(
    r#"<script src="{cdn_url}/{repo}/{package}@{version}{name}""#,
    r#" integrity="sha256-{hash}""#,
    r#" crossorigin="anonymous"></script>"#,
);

/// Marker emitted when no template matches a file's extension.
pub fn template_not_found(name: &str) -> String {
    format!("<!-- Template string not found for file type [{name}] -->")
}

/// Extension -> markup template table. The longest matching extension wins.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    templates: Vec<(String, String)>,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self {
            templates: vec![
                (".css".to_string(), CSS_TEMPLATE.to_string()),
                (".js".to_string(), JS_TEMPLATE.to_string()),
            ],
        }
    }
}

impl TemplateSet {
    /// Adds a template, replacing any existing one for the same extension.
    pub fn insert(&mut self, extension: impl Into<String>, template: impl Into<String>) {
        let extension = extension.into();
        let template = template.into();
        match self.templates.iter_mut().find(|(ext, _)| *ext == extension) {
            Some(slot) => slot.1 = template,
            None => self.templates.push((extension, template)),
        }
    }

    pub fn select(&self, path: &str) -> Option<&str> {
        self.templates
            .iter()
            .filter(|(ext, _)| path.ends_with(ext.as_str()))
            .max_by_key(|(ext, _)| ext.len())
            .map(|(_, template)| template.as_str())
    }

    pub fn render(&self, cdn_url: &str, file: &FileDescriptor) -> String {
        let Some(template) = self.select(&file.name) else {
            return template_not_found(&file.name);
        };
        fill(template, cdn_url, file)
    }
}

fn fill(template: &str, cdn_url: &str, file: &FileDescriptor) -> String {
    let mut out = String::with_capacity(template.len() + 96);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let Some(close) = tail.find('}') else {
            rest = tail;
            break;
        };
        let value = match &tail[1..close] {
            "cdn_url" => Some(cdn_url),
            "repo" => Some(file.repository),
            "package" => Some(file.package.as_str()),
            "version" => Some(file.version.as_str()),
            "name" => Some(file.name.as_str()),
            "hash" => Some(file.hash.as_str()),
            _ => None,
        };
        match value {
            Some(value) => out.push_str(value),
            None => out.push_str(&tail[..=close]),
        }
        rest = &tail[close + 1..];
    }
    out.push_str(rest);
    out
}

/// How `get` hands markup back to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Markup is returned verbatim for engines told to treat it as safe.
    #[default]
    Trusted,
    /// Markup is HTML-escaped before it is returned.
    Escaped,
}

impl OutputMode {
    pub fn apply(self, markup: &str) -> String {
        match self {
            OutputMode::Trusted => markup.to_string(),
            OutputMode::Escaped => escape_html(markup),
        }
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + raw.len() / 4);
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
