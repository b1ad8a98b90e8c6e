use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use requestdesk_cli::commands::{config, report, seed, submit};
use serde_json::Value;
use tempfile::TempDir;

#[test]
fn seed_writes_reference_data_and_an_empty_request_collection() {
    let data_dir = TempDir::new().expect("temp dir");
    with_env(&[("REQUESTDESK_DATA_DIR", path_str(data_dir.path()))], || {
        let result = seed::run(None, false);
        assert_eq!(result.exit_code, 0, "expected successful seed");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");

        let products = read_json(&data_dir.path().join("products.json"));
        assert_eq!(products.as_array().map(Vec::len), Some(4));
        let cost_centers = read_json(&data_dir.path().join("cost-centers.json"));
        assert_eq!(cost_centers[0]["value"], "CC100");
        let requests = read_json(&data_dir.path().join("requests.json"));
        assert_eq!(requests, Value::Array(Vec::new()));
    });
}

#[test]
fn seed_never_overwrites_existing_documents() {
    let data_dir = TempDir::new().expect("temp dir");
    fs::write(data_dir.path().join("products.json"), r#"[{"id":9,"label":"Desk","price":250.0}]"#)
        .expect("existing products");

    with_env(&[("REQUESTDESK_DATA_DIR", path_str(data_dir.path()))], || {
        let first = seed::run(None, false);
        assert_eq!(first.exit_code, 0);
        let message = parse_payload(&first.output)["message"].as_str().unwrap_or("").to_string();
        assert!(message.contains("skipped (already present): products.json"));

        let second = seed::run(None, true);
        assert_eq!(second.exit_code, 0);
        let message = parse_payload(&second.output)["message"].as_str().unwrap_or("").to_string();
        assert!(!message.contains("written"));

        let products = read_json(&data_dir.path().join("products.json"));
        assert_eq!(products[0]["label"], "Desk");
    });
}

#[test]
fn report_summarizes_seeded_sample_requests() {
    let data_dir = TempDir::new().expect("temp dir");
    with_env(&[("REQUESTDESK_DATA_DIR", path_str(data_dir.path()))], || {
        assert_eq!(seed::run(None, true).exit_code, 0);

        let result = report::run(None);
        assert_eq!(result.exit_code, 0, "expected successful report");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "report");
        assert_eq!(payload["data"]["metrics"]["totalRequests"], 3);
        let timeline = payload["data"]["timeline"]["timeline"].as_array().expect("timeline");
        assert!(!timeline.is_empty());
        assert_eq!(
            payload["data"]["timeline"]["summary"]["totalRequests"],
            payload["data"]["metrics"]["totalRequests"]
        );
    });
}

#[test]
fn report_on_missing_store_is_empty_not_an_error() {
    let data_dir = TempDir::new().expect("temp dir");
    with_env(&[("REQUESTDESK_DATA_DIR", path_str(data_dir.path()))], || {
        let result = report::run(None);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["metrics"]["totalRequests"], 0);
        assert_eq!(payload["data"]["timeline"]["summary"]["peakMonth"], "N/A");
    });
}

#[test]
fn config_output_redacts_the_api_key() {
    with_env(
        &[("REQUESTDESK_LLM_ENABLED", "true"), ("REQUESTDESK_LLM_API_KEY", "sk-very-secret")],
        || {
            let output = config::run(None);

            assert!(output.contains("- llm.api_key = sk-*** (source: env (REQUESTDESK_LLM_API_KEY))"));
            assert!(!output.contains("very-secret"));
            assert!(output.contains("- server.port = 5000 (source: default)"));
        },
    );
}

#[test]
fn invalid_configuration_is_reported_with_exit_code_two() {
    with_env(&[("REQUESTDESK_SERVER_PORT", "eighty")], || {
        let result = report::run(None);
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn submit_rejects_an_unreadable_draft_file() {
    let dir = TempDir::new().expect("temp dir");
    with_env(&[], || {
        let result = submit::run(None, &dir.path().join("missing.json"));
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "submit");
        assert_eq!(payload["error_class"], "draft_file");
    });
}

#[test]
fn submit_reports_an_unreachable_api() {
    let dir = TempDir::new().expect("temp dir");
    let draft = dir.path().join("draft.json");
    fs::write(&draft, r#"{"draft": {"requestorName": "Ada"}, "products": [{"label": "Laptop"}]}"#)
        .expect("draft file");

    with_env(&[("REQUESTDESK_API_BASE_URL", "http://127.0.0.1:9")], || {
        let result = submit::run(None, &draft);
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "reference_data");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn read_json(path: &Path) -> Value {
    let raw = fs::read_to_string(path).expect("collection document");
    serde_json::from_str(&raw).expect("collection JSON")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);

    let keys = [
        "REQUESTDESK_DATA_DIR",
        "REQUESTDESK_SERVER_BIND_ADDRESS",
        "REQUESTDESK_SERVER_PORT",
        "REQUESTDESK_SERVER_CORS_ALLOW_ANY",
        "REQUESTDESK_LLM_ENABLED",
        "REQUESTDESK_LLM_PROVIDER",
        "REQUESTDESK_LLM_API_KEY",
        "OPENAI_API_KEY",
        "REQUESTDESK_LLM_BASE_URL",
        "REQUESTDESK_LLM_MODEL",
        "REQUESTDESK_LLM_TIMEOUT_SECS",
        "REQUESTDESK_API_BASE_URL",
        "REQUESTDESK_NOTIFICATION_TIMEOUT_MS",
        "REQUESTDESK_REDIRECT_DELAY_MS",
        "REQUESTDESK_LOGGING_LEVEL",
        "REQUESTDESK_LOGGING_FORMAT",
        "REQUESTDESK_LOG_LEVEL",
        "REQUESTDESK_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
