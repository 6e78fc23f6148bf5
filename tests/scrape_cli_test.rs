use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn unknown_county_filter_fails_before_any_browser_work() {
    let tmp = tempdir().expect("tempdir");

    assert_cmd::cargo::cargo_bin_cmd!("jdi-scrape")
        .current_dir(tmp.path())
        .env("JDI_OUTPUT_DIR", tmp.path().join("data"))
        .args(["scrape", "--county", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "no configured county matches the --county filter",
        ));
}

#[test]
fn inverted_date_range_is_rejected() {
    let tmp = tempdir().expect("tempdir");

    assert_cmd::cargo::cargo_bin_cmd!("jdi-scrape")
        .current_dir(tmp.path())
        .env("JDI_OUTPUT_DIR", tmp.path().join("data"))
        .args([
            "scrape",
            "--county",
            "tulsa",
            "--start-date",
            "2025-06-02",
            "--end-date",
            "2025-06-01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid date range"));
}

#[test]
fn missing_credentials_abort_the_run() {
    let tmp = tempdir().expect("tempdir");

    assert_cmd::cargo::cargo_bin_cmd!("jdi-scrape")
        .current_dir(tmp.path())
        .env("JDI_OUTPUT_DIR", tmp.path().join("data"))
        .env_remove("JDI_EMAIL")
        .env_remove("JDI_PASSWORD")
        .args([
            "scrape",
            "--county",
            "tulsa",
            "--start-date",
            "2025-06-01",
            "--end-date",
            "2025-06-01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("JDI_EMAIL is not set"));
}

#[test]
fn unparseable_config_file_is_reported() {
    let tmp = tempdir().expect("tempdir");
    let config = tmp.path().join("jdi.toml");
    fs::write(&config, "counties = \"not a list\"").expect("write config");

    assert_cmd::cargo::cargo_bin_cmd!("jdi-scrape")
        .current_dir(tmp.path())
        .args(["scrape", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"));
}

#[test]
fn config_file_counties_replace_the_defaults() {
    let tmp = tempdir().expect("tempdir");
    let config = tmp.path().join("jdi.toml");
    fs::write(
        &config,
        r#"
start_date = "2025-06-01"
end_date = "2025-06-01"

[[counties]]
name = "Testville"
slug = "testville"
"#,
    )
    .expect("write config");

    // The tulsa filter matches nothing once the config replaces the county
    // table, which proves the file was loaded and merged.
    assert_cmd::cargo::cargo_bin_cmd!("jdi-scrape")
        .current_dir(tmp.path())
        .args(["scrape", "--county", "tulsa", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "no configured county matches the --county filter",
        ));
}
