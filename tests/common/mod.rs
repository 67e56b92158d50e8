use std::fs;
use std::path::PathBuf;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Unsigned token carrying `claims`.
#[allow(dead_code)]
pub fn token_with(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.c2lnbmF0dXJl", header, payload)
}

/// Unsigned token for `role` that expires in an hour.
#[allow(dead_code)]
pub fn live_token(role: &str) -> String {
    let exp = chrono::Utc::now().timestamp() + 3600;
    token_with(&json!({"id": 7, "role": role, "exp": exp}))
}

/// Success envelope around `data`.
#[allow(dead_code)]
pub fn success(data: Value) -> Value {
    json!({"status": "success", "message": "ok", "data": data})
}

/// Error envelope with `message`.
#[allow(dead_code)]
pub fn failure(message: &str) -> Value {
    json!({"status": "error", "message": message, "data": null})
}
