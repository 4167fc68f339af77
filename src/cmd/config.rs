use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use cdn_html_helper::cli::{ConfigCommand, ConfigSetArgs};
use cdn_html_helper::config;
use toml_edit::{DocumentMut, Item, Table, Value};

pub fn run(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Set(args) => set_value(&args),
    }
}

fn set_value(args: &ConfigSetArgs) -> Result<()> {
    let path = match &args.file {
        Some(path) => path.clone(),
        None => config::config_path().ok_or_else(|| {
            anyhow!("failed to resolve ~/.cdn-html-helper/config.toml (no home directory found)")
        })?,
    };

    ensure_parent(&path)?;

    let mut doc = if path.exists() {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if raw.trim().is_empty() {
            DocumentMut::new()
        } else {
            raw.parse::<DocumentMut>()
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
    } else {
        DocumentMut::new()
    };

    apply_key(&mut doc, &args.key, &args.value)?;

    let rendered = doc.to_string();
    toml::from_str::<config::HelperConfig>(&rendered)
        .with_context(|| format!("`{}` = `{}` is not a valid setting", args.key, args.value))?;

    fs::write(&path, rendered).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Updated {}", path.display());
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

fn typed_value(raw: &str) -> Value {
    if let Ok(number) = raw.parse::<i64>() {
        return Value::from(number);
    }
    match raw {
        "true" => Value::from(true),
        "false" => Value::from(false),
        _ => Value::from(raw),
    }
}

fn apply_key(doc: &mut DocumentMut, key: &str, value_str: &str) -> Result<()> {
    let segments = key
        .split('.')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>();
    let Some((last, parents)) = segments.split_last() else {
        bail!("config key cannot be empty");
    };

    let mut current = doc.as_table_mut();
    for segment in parents {
        current = current
            .entry(segment)
            .or_insert(Item::Table(Table::new()))
            .as_table_mut()
            .ok_or_else(|| anyhow!("path `{segment}` is not a table in the config"))?;
    }

    current.insert(last, Item::Value(typed_value(value_str)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn set(path: &Path, key: &str, value: &str) -> Result<()> {
        set_value(&ConfigSetArgs {
            key: key.into(),
            value: value.into(),
            file: Some(path.to_path_buf()),
        })
    }

    #[test]
    fn creates_new_document() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/config.toml");
        set(&path, "cdn.url", "https://cdn.example").unwrap();
        let written = fs::read_to_string(path).unwrap();
        assert!(written.contains("[cdn]"));
        assert!(written.contains("url = \"https://cdn.example\""));
    }

    #[test]
    fn keeps_integer_types_and_existing_tables() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[metadata]
url = "http://127.0.0.1:9000"
"#,
        )
        .unwrap();

        set(&path, "metadata.max_retries", "5").unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("max_retries = 5"));
        assert!(written.contains("url = \"http://127.0.0.1:9000\""));

        let loaded = config::load_from(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(loaded.metadata.max_retries, 5);
    }

    #[test]
    fn rejects_values_the_config_cannot_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let err = set(&path, "render.missing_files", "sometimes").unwrap_err();
        assert!(err.to_string().contains("render.missing_files"));
        assert!(!path.exists());
    }

    #[test]
    fn empty_key_is_rejected() {
        let mut doc = DocumentMut::new();
        assert!(apply_key(&mut doc, "..", "x").is_err());
    }
}
