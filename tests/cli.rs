//! Process-level checks for the `send-pdf` binary.
//!
//! The binary always targets localhost:3333. The end-to-end case binds that
//! port itself and skips when something else already holds it.

use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use serde_json::json;
use std::path::Path;
use std::process::Command;

fn send_pdf() -> Command {
    Command::new(env!("CARGO_BIN_EXE_send-pdf"))
}

#[test]
fn missing_file_exits_1_with_access_diagnostic() {
    let tmp = tempfile::tempdir().unwrap();
    let out = send_pdf()
        .arg("/definitely/not/a/real/file.pdf")
        .args(["true", "1"])
        .current_dir(tmp.path())
        .output()
        .expect("binary runs");

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert_eq!(stderr.matches("Cannot access file").count(), 1, "stderr: {stderr}");
    // Nothing downstream of the pre-flight check ran.
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(!stdout.contains("Sending"), "stdout: {stdout}");
    assert!(!tmp.path().join("extracted_images").exists());
}

#[test]
fn directory_argument_exits_1() {
    let tmp = tempfile::tempdir().unwrap();
    let out = send_pdf().arg(tmp.path()).output().expect("binary runs");
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn no_arguments_prints_usage_and_exits_1() {
    let out = send_pdf().output().expect("binary runs");
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.to_lowercase().contains("usage"), "stderr: {stderr}");
}

#[test]
fn help_exits_0() {
    let out = send_pdf().arg("--help").output().expect("binary runs");
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("localhost:3333"), "stdout: {stdout}");
}

#[test]
fn hyphenated_extract_images_is_not_a_usage_error() {
    let tmp = tempfile::tempdir().unwrap();
    let out = send_pdf()
        .args(["/definitely/not/a/real/file.pdf", "-x"])
        .current_dir(tmp.path())
        .output()
        .expect("binary runs");

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(!stderr.contains("unexpected argument"), "stderr: {stderr}");
    assert!(!stderr.to_lowercase().contains("usage"), "stderr: {stderr}");
    assert!(stderr.contains("Cannot access file"), "stderr: {stderr}");
}

// ── Against a local conversion server ────────────────────────────────────────

/// Replies 500 for `broken.pdf`, otherwise a full conversion with one image.
async fn convert(mut mp: Multipart) -> (StatusCode, String) {
    let mut file_name = String::new();
    while let Ok(Some(f)) = mp.next_field().await {
        if f.name() == Some("pdf_file") {
            file_name = f.file_name().unwrap_or_default().to_string();
        }
        let _ = f.bytes().await;
    }
    if file_name == "broken.pdf" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "server error".to_string());
    }
    let body = json!({
        "markdown": "# Hi",
        "metadata": { "pages": 1 },
        "images": { "fig1": "data:image/png;base64,QUJD" },
    });
    (StatusCode::OK, body.to_string())
}

async fn run_in(dir: &Path, args: &[&str]) -> std::process::Output {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_send-pdf"))
        .args(args)
        .current_dir(dir)
        .output()
        .await
        .expect("binary runs")
}

#[tokio::test]
async fn converts_against_local_server() {
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:3333").await else {
        eprintln!("port 3333 busy, skipping");
        return;
    };
    tokio::spawn(async move {
        let app = Router::new().route("/convert", post(convert));
        axum::serve(listener, app).await.unwrap();
    });

    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("ok.pdf"), b"%PDF-1.4 ok").unwrap();
    std::fs::write(tmp.path().join("broken.pdf"), b"%PDF-1.4 broken").unwrap();

    // Success: markdown, metadata and images relative to the working directory.
    let out = run_in(tmp.path(), &["ok.pdf", "true", "30"]).await;
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(out.status.code(), Some(0), "stdout: {stdout}");
    assert!(stdout.contains("File size: 0.00 MB"), "{stdout}");
    assert!(stdout.contains("Uploading: 100.0%"), "{stdout}");
    assert!(stdout.contains("# Hi"), "{stdout}");
    assert!(stdout.contains("Metadata:"), "{stdout}");
    assert!(stdout.contains("\"pages\": 1"), "{stdout}");
    assert!(stdout.contains("Found 1 images"), "{stdout}");
    assert!(stdout.contains("Saved ./extracted_images/fig1.png"), "{stdout}");
    assert_eq!(
        std::fs::read(tmp.path().join("extracted_images/fig1.png")).unwrap(),
        b"ABC"
    );

    // Error status: reported, exit 0 unless --strict.
    let out = run_in(tmp.path(), &["broken.pdf", "true", "30"]).await;
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert_eq!(out.status.code(), Some(0), "stderr: {stderr}");
    assert!(stderr.contains("status code 500"), "{stderr}");
    assert!(stderr.contains("server error"), "{stderr}");

    let out = run_in(tmp.path(), &["--strict", "broken.pdf", "true", "30"]).await;
    assert_eq!(out.status.code(), Some(1));
}
