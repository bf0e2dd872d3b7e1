use std::{
    path::{Path, PathBuf},
    process::{Command as StdCommand, Output},
    sync::OnceLock,
};

use anyhow::{Context, Result, bail};
use assert_cmd::Command;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const BUILD_ID: u32 = 4242;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reports_green_build() -> Result<()> {
    let server = MockServer::start().await;
    mount_submission(&server).await;
    mount_status(&server, true).await;

    let output = run_cli(&server, &["--envVars", "DEPLOY=1"]).await?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stderr:\n{}", stderr(&output));
    assert!(stdout.contains("Janky build Succeeded!"), "stdout:\n{stdout}");
    assert!(stdout.contains("DEPLOY=1"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn exits_non_zero_on_red_build() -> Result<()> {
    let server = MockServer::start().await;
    mount_submission(&server).await;
    mount_status(&server, false).await;

    let output = run_cli(&server, &[]).await?;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("https://janky.example/4242/output"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn exits_non_zero_on_unknown_job() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/builds"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_cli(&server, &[]).await?;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("is not the name of a Janky job"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_flags_fail_without_network() -> Result<()> {
    let server = MockServer::start().await;

    let binary = cli_binary()?;
    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || {
        Command::new(binary)
            .env_clear()
            .args(["--job", "my-job", "--url", uri.as_str()])
            .output()
    })
    .await??;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("job, token and branch flags must be specified"));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
    Ok(())
}

async fn mount_submission(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/builds"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "Result": format!("Build #{BUILD_ID} (/{BUILD_ID}/) of my-job/main queued"),
            "Url": format!("https://janky.example/{BUILD_ID}/output"),
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, green: bool) {
    Mock::given(method("GET"))
        .and(path(format!("/api/{BUILD_ID}/status")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Id": BUILD_ID.to_string(),
            "Green": green,
            "Completed": true,
            "Sha": "abc123",
            "BuildableName": "my-job",
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn run_cli(server: &MockServer, extra: &[&str]) -> Result<Output> {
    let binary = cli_binary()?;
    let mut args: Vec<String> = [
        "--job",
        "my-job",
        "--branch",
        "main",
        "--token",
        "token",
        "--poll-interval",
        "1",
        "--timeout",
        "30",
        "--url",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(server.uri());
    args.extend(extra.iter().map(|s| s.to_string()));

    println!("Running {} {}", binary.display(), args.join(" "));
    let output = tokio::task::spawn_blocking(move || {
        Command::new(binary).env_clear().args(&args).output()
    })
    .await
    .context("join CLI run")?
    .context("run janky-trigger")?;

    Ok(output)
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn workspace_root() -> Result<PathBuf> {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(Path::parent)
        .context("determine workspace root")
        .map(|p| p.to_path_buf())
}

fn cli_binary() -> Result<PathBuf> {
    ensure_binary_built()?;

    let mut path = workspace_root()?;
    path.push("target");
    path.push("debug");
    path.push(if cfg!(windows) {
        "janky-trigger.exe"
    } else {
        "janky-trigger"
    });
    Ok(path)
}

fn ensure_binary_built() -> Result<()> {
    static BUILT: OnceLock<Result<()>> = OnceLock::new();
    let res: &Result<()> = BUILT.get_or_init(|| {
        let workspace_root = workspace_root()?;
        let status = StdCommand::new(env!("CARGO"))
            .arg("build")
            .arg("-p")
            .arg("janky-trigger")
            .current_dir(&workspace_root)
            .status()
            .context("build janky-trigger for e2e test")?;

        if status.success() {
            Ok(())
        } else {
            bail!("cargo build -p janky-trigger failed with {status}");
        }
    });
    res.as_ref()
        .map(|_| ())
        .map_err(|e| anyhow::anyhow!(e.to_string()))
}
