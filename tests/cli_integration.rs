//! Purpose: End-to-end tests for the `dbrest` binary against a mock workspace.
//! Exports: None (integration test module).
//! Role: Validate flag/env/profile resolution, JSON output, error envelopes and exit codes.
//! Invariants: Child processes never see the developer's DATABRICKS_* environment or ~/.databrickscfg.

mod support;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use support::{MockWorkspace, TestResult};

const ISOLATED_VARS: [&str; 5] = [
    "DATABRICKS_HOST",
    "DATABRICKS_TOKEN",
    "DATABRICKS_CONFIG_PROFILE",
    "DATABRICKS_CONFIG_FILE",
    "RUST_LOG",
];

fn cmd(home: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_dbrest"));
    for var in ISOLATED_VARS {
        command.env_remove(var);
    }
    command
        .env("HOME", home)
        .env("DATABRICKS_CONFIG_FILE", home.join("databrickscfg"));
    command
}

fn stdout_json(output: &Output) -> TestResult<Value> {
    Ok(serde_json::from_slice(&output.stdout)?)
}

fn stderr_json(output: &Output) -> TestResult<Value> {
    let text = String::from_utf8_lossy(&output.stderr);
    let line = text
        .lines()
        .rev()
        .find(|line| line.starts_with('{'))
        .ok_or("no json on stderr")?;
    Ok(serde_json::from_str(line)?)
}

#[test]
fn missing_host_is_a_usage_error() -> TestResult<()> {
    let home = tempfile::tempdir()?;
    let output = cmd(home.path()).args(["clusters", "list"]).output()?;
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let err = stderr_json(&output)?;
    assert_eq!(err["error"]["kind"], "Usage");
    assert!(err["error"]["hint"].as_str().is_some());
    Ok(())
}

#[test]
fn clusters_get_prints_compact_json() -> TestResult<()> {
    let home = tempfile::tempdir()?;
    let mock = MockWorkspace::start()?;
    mock.respond(
        "GET",
        "/api/2.0/clusters/get",
        200,
        json!({"cluster_id": "c-1", "state": "TERMINATED", "start_time": 1666369196203i64,
               "spark_version": "13.3.x-scala2.12"}),
    );

    let output = cmd(home.path())
        .args(["--host", mock.base_url(), "--token", "dapi-cli"])
        .args(["clusters", "get", "c-1"])
        .output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let text = String::from_utf8(output.stdout.clone())?;
    assert_eq!(text.lines().count(), 1);
    let value = stdout_json(&output)?;
    assert_eq!(value["cluster_id"], "c-1");
    assert_eq!(value["state"], "TERMINATED");
    assert_eq!(value["start_time"], json!(1666369196203i64));

    let request = mock.only_request();
    assert_eq!(request.authorization.as_deref(), Some("Bearer dapi-cli"));
    Ok(())
}

#[test]
fn remote_not_found_maps_to_exit_code_and_envelope() -> TestResult<()> {
    let home = tempfile::tempdir()?;
    let mock = MockWorkspace::start()?;
    mock.respond(
        "GET",
        "/api/2.1/unity-catalog/catalogs/missing",
        404,
        json!({"error_code": "CATALOG_DOES_NOT_EXIST", "message": "Catalog 'missing' does not exist."}),
    );

    let output = cmd(home.path())
        .env("DATABRICKS_HOST", mock.base_url())
        .args(["catalogs", "get", "missing"])
        .output()?;
    assert_eq!(output.status.code(), Some(3));
    let err = stderr_json(&output)?;
    assert_eq!(err["error"]["kind"], "NotFound");
    assert_eq!(err["error"]["status"], 404);
    assert_eq!(err["error"]["error_code"], "CATALOG_DOES_NOT_EXIST");
    assert_eq!(err["error"]["endpoint"], "/api/2.1/unity-catalog/catalogs/missing");
    assert_eq!(err["error"]["message"], "Catalog 'missing' does not exist.");
    Ok(())
}

#[test]
fn run_now_merges_positional_job_id_into_body() -> TestResult<()> {
    let home = tempfile::tempdir()?;
    let mock = MockWorkspace::start()?;
    mock.respond("POST", "/api/2.1/jobs/run-now", 200, json!({"run_id": 5}));

    let output = cmd(home.path())
        .args(["--host", mock.base_url()])
        .args(["jobs", "run-now", "77", "--json", r#"{"notebook_params": {"day": "mon"}}"#])
        .output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_json(&output)?, json!({"run_id": 5}));

    let request = mock.only_request();
    assert_eq!(
        request.body,
        Some(json!({"job_id": 77, "notebook_params": {"day": "mon"}}))
    );
    assert_eq!(request.authorization, None);
    Ok(())
}

#[test]
fn request_body_can_come_from_stdin() -> TestResult<()> {
    let home = tempfile::tempdir()?;
    let mock = MockWorkspace::start()?;
    mock.respond(
        "POST",
        "/api/2.1/unity-catalog/catalogs",
        200,
        json!({"name": "sandbox", "catalog_type": "MANAGED_CATALOG"}),
    );

    let mut child = cmd(home.path())
        .args(["--host", mock.base_url()])
        .args(["catalogs", "create", "--json-file", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    child
        .stdin
        .take()
        .ok_or("stdin")?
        .write_all(br#"{"name": "sandbox", "comment": "scratch"}"#)?;
    let output = child.wait_with_output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_json(&output)?["catalog_type"], "MANAGED_CATALOG");
    assert_eq!(
        mock.only_request().body,
        Some(json!({"name": "sandbox", "comment": "scratch"}))
    );
    Ok(())
}

#[test]
fn invalid_body_fails_before_any_request() -> TestResult<()> {
    let home = tempfile::tempdir()?;
    let mock = MockWorkspace::start()?;

    let output = cmd(home.path())
        .args(["--host", mock.base_url()])
        .args(["clusters", "create", "--json", "{\"spark_version\": "])
        .output()?;
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stderr_json(&output)?["error"]["message"], "invalid request json");
    assert!(mock.requests().is_empty());
    Ok(())
}

#[test]
fn profile_supplies_host_and_token() -> TestResult<()> {
    let home = tempfile::tempdir()?;
    let mock = MockWorkspace::start()?;
    mock.respond("GET", "/api/2.0/secrets/scopes/list", 200, json!({}));
    std::fs::write(
        home.path().join("databrickscfg"),
        format!(
            "[DEFAULT]\nhost = http://127.0.0.1:9\n\n[mock]\nhost = {}\ntoken = dapi-profile\n",
            mock.base_url()
        ),
    )?;

    let output = cmd(home.path())
        .env("DATABRICKS_CONFIG_PROFILE", "mock")
        .args(["secrets", "list-scopes"])
        .output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_json(&output)?, json!([]));
    assert_eq!(
        mock.only_request().authorization.as_deref(),
        Some("Bearer dapi-profile")
    );
    Ok(())
}

#[test]
fn environment_token_beats_profile_token() -> TestResult<()> {
    let home = tempfile::tempdir()?;
    let mock = MockWorkspace::start()?;
    mock.respond("GET", "/api/2.0/clusters/list", 200, json!({"clusters": []}));
    std::fs::write(
        home.path().join("databrickscfg"),
        format!("host = {}\ntoken = dapi-profile\n", mock.base_url()),
    )?;

    let output = cmd(home.path())
        .env("DATABRICKS_TOKEN", "dapi-env")
        .args(["clusters", "list"])
        .output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        mock.only_request().authorization.as_deref(),
        Some("Bearer dapi-env")
    );
    Ok(())
}

#[test]
fn unknown_profile_is_not_found() -> TestResult<()> {
    let home = tempfile::tempdir()?;
    std::fs::write(home.path().join("databrickscfg"), "[dev]\nhost = example.com\n")?;
    let output = cmd(home.path())
        .args(["--profile", "prod", "clusters", "list"])
        .output()?;
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(stderr_json(&output)?["error"]["kind"], "NotFound");
    Ok(())
}

#[test]
fn token_and_token_file_conflict() -> TestResult<()> {
    let home = tempfile::tempdir()?;
    let token_file = home.path().join("token");
    std::fs::write(&token_file, "dapi-file\n")?;
    let output = cmd(home.path())
        .args(["--host", "example.cloud.databricks.com", "--token", "dapi-flag"])
        .arg("--token-file")
        .arg(&token_file)
        .args(["clusters", "list"])
        .output()?;
    assert_eq!(output.status.code(), Some(2));
    let err = stderr_json(&output)?;
    assert_eq!(
        err["error"]["message"],
        "--token cannot be combined with --token-file"
    );
    Ok(())
}

#[test]
fn unit_commands_print_nothing() -> TestResult<()> {
    let home = tempfile::tempdir()?;
    let mock = MockWorkspace::start()?;
    mock.respond_raw("POST", "/api/2.0/clusters/start", 200, "");

    let output = cmd(home.path())
        .args(["--host", mock.base_url(), "clusters", "start", "c-9"])
        .output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(output.stdout.is_empty());
    assert_eq!(mock.only_request().body, Some(json!({"cluster_id": "c-9"})));
    Ok(())
}

#[test]
fn dbfs_cat_writes_raw_bytes() -> TestResult<()> {
    let home = tempfile::tempdir()?;
    let mock = MockWorkspace::start()?;
    mock.respond(
        "GET",
        "/api/2.0/dbfs/read",
        200,
        json!({"bytes_read": 6, "data": STANDARD.encode(b"a,b\n1,")}),
    );
    mock.respond("GET", "/api/2.0/dbfs/read", 200, json!({"bytes_read": 0, "data": ""}));

    let output = cmd(home.path())
        .args(["--host", mock.base_url(), "dbfs", "cat", "dbfs:/tmp/x.csv"])
        .output()?;
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(output.stdout, b"a,b\n1,");
    Ok(())
}

#[test]
fn grants_reject_unknown_securable_type() -> TestResult<()> {
    let home = tempfile::tempdir()?;
    let mock = MockWorkspace::start()?;
    let output = cmd(home.path())
        .args(["--host", mock.base_url(), "grants", "get", "warehouse", "w1"])
        .output()?;
    assert_eq!(output.status.code(), Some(2));
    assert!(mock.requests().is_empty());
    Ok(())
}

#[test]
fn clap_errors_use_the_json_envelope() -> TestResult<()> {
    let home = tempfile::tempdir()?;
    let output = cmd(home.path()).args(["clusterz"]).output()?;
    assert_eq!(output.status.code(), Some(2));
    let err = stderr_json(&output)?;
    assert_eq!(err["error"]["kind"], "Usage");
    assert_eq!(err["error"]["hint"], "Try `dbrest --help`.");
    Ok(())
}

#[test]
fn version_and_completion_need_no_workspace() -> TestResult<()> {
    let home = tempfile::tempdir()?;
    let version = cmd(home.path()).arg("version").output()?;
    assert!(version.status.success());
    let value = stdout_json(&version)?;
    assert_eq!(value["name"], "dbrest");
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));

    let completion = cmd(home.path()).args(["completion", "bash"]).output()?;
    assert!(completion.status.success());
    assert!(String::from_utf8_lossy(&completion.stdout).contains("dbrest"));
    Ok(())
}
