use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cdn-html")]
#[command(version)]
#[command(about = "Render integrity-pinned jsDelivr tags for npm packages")]
pub struct Cli {
    /// Log metadata requests and registration details to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a package and print its <script>/<link> tags
    Tags(TagsArgs),
    /// Resolve a package and show the files and hashes it resolved to
    Inspect(InspectArgs),
    /// Manage cdn-html configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args, Debug, Clone)]
pub struct PackageArgs {
    /// npm package name (e.g. jquery, @popperjs/core)
    pub package: String,
    /// Version specifier resolved by the metadata service
    #[arg(long = "version", default_value = "latest")]
    pub version: String,
    /// File to register as ALIAS=SUFFIX; repeatable. Defaults to the package entrypoints.
    #[arg(long = "file", value_name = "ALIAS=SUFFIX", value_parser = parse_file_pair)]
    pub files: Vec<(String, String)>,
    /// Override the config file location
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct TagsArgs {
    #[command(flatten)]
    pub package: PackageArgs,
    /// Only print these aliases, in order (default: every registered alias)
    #[arg(long = "alias")]
    pub aliases: Vec<String>,
    /// HTML-escape the printed markup
    #[arg(long = "escape")]
    pub escape: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub package: PackageArgs,
    /// Emit the registration as JSON
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Set a key in the cdn-html config (e.g. metadata.max_retries)
    Set(ConfigSetArgs),
}

#[derive(Args, Debug)]
pub struct ConfigSetArgs {
    /// Config key path (e.g. render.missing_files)
    pub key: String,
    /// Value to assign; integers and booleans keep their type
    pub value: String,
    /// Override config file path (default: $XDG_CONFIG_HOME/cdn-html-helper/config.toml)
    #[arg(long = "file")]
    pub file: Option<PathBuf>,
}

fn parse_file_pair(raw: &str) -> Result<(String, String), String> {
    let (alias, suffix) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ALIAS=SUFFIX, got `{raw}`"))?;
    let alias = alias.trim();
    let suffix = suffix.trim();
    if alias.is_empty() || suffix.is_empty() {
        return Err(format!("alias and suffix must be non-empty in `{raw}`"));
    }
    Ok((alias.to_string(), suffix.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tags_invocation() {
        let cli = Cli::parse_from([
            "cdn-html",
            "tags",
            "jquery",
            "--version",
            "3.6.0",
            "--file",
            "js=/dist/jquery.js",
            "--alias",
            "js",
        ]);
        let Command::Tags(args) = cli.command else {
            panic!("expected tags command");
        };
        assert_eq!(args.package.package, "jquery");
        assert_eq!(args.package.version, "3.6.0");
        assert_eq!(
            args.package.files,
            vec![("js".to_string(), "/dist/jquery.js".to_string())]
        );
        assert_eq!(args.aliases, ["js"]);
        assert!(!args.escape);
    }

    #[test]
    fn version_defaults_to_latest() {
        let cli = Cli::parse_from(["cdn-html", "inspect", "bootstrap", "--json"]);
        let Command::Inspect(args) = cli.command else {
            panic!("expected inspect command");
        };
        assert_eq!(args.package.version, "latest");
        assert!(args.package.files.is_empty());
        assert!(args.json);
    }

    #[test]
    fn rejects_malformed_file_pairs() {
        assert!(parse_file_pair("js").is_err());
        assert!(parse_file_pair("=/dist/a.js").is_err());
        assert_eq!(
            parse_file_pair(" css = /dist/a.css ").unwrap(),
            ("css".to_string(), "/dist/a.css".to_string())
        );
    }
}
