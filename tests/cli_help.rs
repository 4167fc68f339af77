use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

#[test]
fn top_level_help_lists_subcommands() {
    let mut cmd = cargo_bin_cmd!("cdn-html");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(contains("tags"))
        .stdout(contains("inspect"))
        .stdout(contains("config"));
}

#[test]
fn tags_help_documents_file_pairs() {
    let mut cmd = cargo_bin_cmd!("cdn-html");
    cmd.args(["tags", "--help"])
        .assert()
        .success()
        .stdout(contains("ALIAS=SUFFIX"))
        .stdout(contains("--escape"));
}

#[test]
fn malformed_file_pair_is_rejected() {
    let mut cmd = cargo_bin_cmd!("cdn-html");
    cmd.args(["tags", "jquery", "--file", "no-separator"])
        .assert()
        .failure()
        .stderr(contains("expected ALIAS=SUFFIX"));
}

#[test]
fn config_set_writes_requested_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("config.toml");
    let mut cmd = cargo_bin_cmd!("cdn-html");
    cmd.args(["config", "set", "render.output", "escaped", "--file"])
        .arg(&path)
        .assert()
        .success()
        .stdout(contains("Updated"));
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("output = \"escaped\""));
}
