use std::collections::BTreeMap;

use anyhow::{Context, Result};
use cdn_html_helper::cli::{InspectArgs, PackageArgs, TagsArgs};
use cdn_html_helper::config;
use cdn_html_helper::render::OutputMode;
use cdn_html_helper::{CdnHtmlHelper, Registration};

fn build_helper(args: &PackageArgs) -> Result<CdnHtmlHelper> {
    let config = match &args.config {
        Some(path) => config::load_from(Some(path.to_string_lossy().as_ref()))?,
        None => config::load()?,
    };
    CdnHtmlHelper::from_config(&config)
}

fn register(helper: &CdnHtmlHelper, args: &PackageArgs) -> Result<Registration> {
    let files: BTreeMap<String, String> = args.files.iter().cloned().collect();
    helper
        .use_package(&args.package, &args.version, &files)
        .with_context(|| format!("failed to register {}@{}", args.package, args.version))
}

pub fn run_tags(args: &TagsArgs) -> Result<()> {
    let mut helper = build_helper(&args.package)?;
    if args.escape {
        helper = helper.with_output(OutputMode::Escaped);
    }
    let registration = register(&helper, &args.package)?;

    let aliases: Vec<&str> = if args.aliases.is_empty() {
        registration.aliases().collect()
    } else {
        args.aliases.iter().map(String::as_str).collect()
    };
    for alias in aliases {
        println!("{}", helper.get(&registration.package, alias));
    }
    report_missing(&registration);
    Ok(())
}

pub fn run_inspect(args: &InspectArgs) -> Result<()> {
    let helper = build_helper(&args.package)?;
    let registration = register(&helper, &args.package)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&registration)?);
        return Ok(());
    }

    println!(
        "{} {} -> {}",
        registration.package, registration.requested_version, registration.resolved_version
    );
    for (alias, file) in &registration.files {
        println!("  {alias:<12} {}  sha256-{}", file.name, file.hash);
    }
    report_missing(&registration);
    Ok(())
}

fn report_missing(registration: &Registration) {
    for alias in &registration.missing {
        eprintln!("warning: no file found for alias `{alias}`");
    }
}
