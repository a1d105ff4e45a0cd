use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use marketa::config::{BackendConfig, Config};

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Backend configuration pointing at a mock server
#[allow(dead_code)]
pub fn backend_config(base_url: &str) -> BackendConfig {
    BackendConfig {
        url: base_url.to_string(),
        anon_key: "anon-key".to_string(),
        request_timeout_seconds: 5,
    }
}

/// Full configuration pointing at a mock server
#[allow(dead_code)]
pub fn config_for(base_url: &str) -> Config {
    Config {
        backend: backend_config(base_url),
        ..Config::default()
    }
}

/// Event-stream body carrying `deltas` followed by the end sentinel
#[allow(dead_code)]
pub fn sse_body(deltas: &[&str]) -> String {
    let mut body = String::new();
    for delta in deltas {
        let event = serde_json::json!({ "choices": [{ "delta": { "content": delta } }] });
        body.push_str(&format!("data: {}\n\n", event));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

/// A stored conversation row as the REST interface returns it
#[allow(dead_code)]
pub fn conversation_row(id: i64, prompt: &str, response: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "Prompt": prompt,
        "Response": response,
        "user_id": "user-1",
        "campaign_id": null,
        "created_at": "2025-01-15T10:00:00Z"
    })
}
