use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn intel_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_intel"))
}

fn setup_test_env(base_url: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("intel.toml");
    let config_content = format!(
        r#"[store]
base_url = "{}"
timeout_secs = 5

[import]
line_numbering = "compacted"
"#,
        base_url
    );
    fs::write(&config_path, config_content).unwrap();
    (tmp, config_path)
}

fn run_intel(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = intel_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run intel binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

async fn create_post(Json(body): Json<Value>) -> impl IntoResponse {
    if body["title"] == "reject" {
        return (StatusCode::UNPROCESSABLE_ENTITY, "rejected").into_response();
    }
    (StatusCode::CREATED, Json(json!({ "id": "new" }))).into_response()
}

async fn search() -> Json<Value> {
    Json(json!({
        "forum-posts": [
            { "id": "p1", "title": "Zero Day Sale", "author_username": "bob" },
            { "id": "p2", "title": "Combo list", "author_username": "eve" },
        ],
        "sources": [{ "id": "s1", "name": "zero forum" }],
    }))
}

async fn forums() -> Json<Value> {
    Json(json!([{ "id": "f1", "name": "Breach Forum" }]))
}

/// Starts a mock record store in this process and returns its base URL.
async fn start_mock_store() -> String {
    let app = Router::new()
        .route("/forum-posts/", post(create_post))
        .route("/search", get(search))
        .route("/forums", get(forums));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[test]
fn test_fields_needs_no_config() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("absent.toml");

    let (stdout, stderr, success) = run_intel(&missing, &["fields", "--entity", "ransomware"]);
    assert!(success, "fields failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("BreachName"));
    assert!(stdout.contains("DetectionDate"));
    assert!(!stdout.contains("channel_username"));
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("absent.toml");

    let (_, stderr, success) = run_intel(&missing, &["forums"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"), "{}", stderr);
}

#[test]
fn test_import_missing_file_is_top_level_failure() {
    let (tmp, config_path) = setup_test_env("http://127.0.0.1:9");
    let missing = tmp.path().join("nope.csv");

    let (_, stderr, success) = run_intel(
        &config_path,
        &["import", missing.to_str().unwrap(), "--forum", "f1"],
    );
    assert!(!success);
    assert!(stderr.contains("Failed to read import file"), "{}", stderr);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_import_logs_every_line() {
    let base = start_mock_store().await;
    let (tmp, config_path) = setup_test_env(&base);
    let csv_path = tmp.path().join("posts.csv");
    fs::write(
        &csv_path,
        "http://x/1,First,alice,body,news,[],0,2024-05-20T10:00:00+0000\r\n\
         \r\n\
         a,b,c\r\n\
         http://x/2,reject,alice,body,news,[],0,2024-05-21\r\n\
         http://x/3,Third,alice,,news,[],0,2024-05-22\r\n\
         http://x/4,Fourth,alice,body,news,\"[{\"\"author\"\":\"\"bob\"\"}]\",1,2024-05-23\r\n",
    )
    .unwrap();

    let csv = csv_path.to_str().unwrap().to_string();
    let (stdout, stderr, success) = tokio::task::spawn_blocking(move || {
        run_intel(&config_path, &["import", &csv, "--forum", "f1", "--json"])
    })
    .await
    .unwrap();
    assert!(success, "import failed: stdout={}, stderr={}", stdout, stderr);

    let report: Value = serde_json::from_str(&stdout).unwrap();
    let messages: Vec<(u64, &str)> = report["log"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| (e["line_number"].as_u64().unwrap(), e["message"].as_str().unwrap()))
        .collect();
    assert_eq!(
        messages,
        vec![
            (1, "imported"),
            (2, "wrong field count"),
            (3, "import failed (HTTP 422)"),
            (4, "required field empty: content"),
            (5, "imported"),
        ]
    );
    assert_eq!(report["summary"]["imported"], 2);
    assert_eq!(report["summary"]["failed"], 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_search_json_view() {
    let base = start_mock_store().await;
    let (_tmp, config_path) = setup_test_env(&base);

    let (stdout, stderr, success) = tokio::task::spawn_blocking(move || {
        run_intel(&config_path, &["search", "zero", "--json"])
    })
    .await
    .unwrap();
    assert!(success, "search failed: stdout={}, stderr={}", stdout, stderr);

    let view: Value = serde_json::from_str(&stdout).unwrap();
    let rows = view["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["preview"], "Zero Day Sale");
    assert_eq!(rows[0]["matched_fields"], json!(["title"]));
    assert_eq!(view["tabs"][2]["id"], "sources");
    assert_eq!(view["tabs"][2]["count"], 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_forums_lists_destinations() {
    let base = start_mock_store().await;
    let (_tmp, config_path) = setup_test_env(&base);

    let (stdout, stderr, success) =
        tokio::task::spawn_blocking(move || run_intel(&config_path, &["forums"]))
            .await
            .unwrap();
    assert!(success, "forums failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("f1"));
    assert!(stdout.contains("Breach Forum"));
}
