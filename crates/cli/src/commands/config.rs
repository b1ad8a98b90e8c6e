use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use requestdesk_core::config::AppConfig;
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::load_config;

struct FieldSpec<'a> {
    key: &'static str,
    value: String,
    env_keys: &'a [&'static str],
}

pub fn run(config_path: Option<&Path>) -> String {
    let config = match load_config("config", config_path) {
        Ok(config) => config,
        Err(failure) => return failure.output,
    };

    let config_file_path = detect_config_path(config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec![
        "effective config (source precedence: overrides > env > file > default):".to_string()
    ];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<FieldSpec<'static>> {
    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map_or_else(|| "<unset>".to_string(), |key| redact_token(key.expose_secret()));

    vec![
        FieldSpec {
            key: "storage.data_dir",
            value: config.storage.data_dir.display().to_string(),
            env_keys: &["REQUESTDESK_DATA_DIR"],
        },
        FieldSpec {
            key: "server.bind_address",
            value: config.server.bind_address.clone(),
            env_keys: &["REQUESTDESK_SERVER_BIND_ADDRESS"],
        },
        FieldSpec {
            key: "server.port",
            value: config.server.port.to_string(),
            env_keys: &["REQUESTDESK_SERVER_PORT"],
        },
        FieldSpec {
            key: "server.cors_allow_any",
            value: config.server.cors_allow_any.to_string(),
            env_keys: &["REQUESTDESK_SERVER_CORS_ALLOW_ANY"],
        },
        FieldSpec {
            key: "llm.enabled",
            value: config.llm.enabled.to_string(),
            env_keys: &["REQUESTDESK_LLM_ENABLED"],
        },
        FieldSpec {
            key: "llm.provider",
            value: format!("{:?}", config.llm.provider),
            env_keys: &["REQUESTDESK_LLM_PROVIDER"],
        },
        FieldSpec {
            key: "llm.api_key",
            value: api_key,
            env_keys: &["REQUESTDESK_LLM_API_KEY", "OPENAI_API_KEY"],
        },
        FieldSpec {
            key: "llm.base_url",
            value: config.llm.base_url.clone(),
            env_keys: &["REQUESTDESK_LLM_BASE_URL"],
        },
        FieldSpec {
            key: "llm.model",
            value: config.llm.model.clone(),
            env_keys: &["REQUESTDESK_LLM_MODEL"],
        },
        FieldSpec {
            key: "llm.timeout_secs",
            value: config.llm.timeout_secs.to_string(),
            env_keys: &["REQUESTDESK_LLM_TIMEOUT_SECS"],
        },
        FieldSpec {
            key: "wizard.api_base_url",
            value: config.wizard.api_base_url.clone(),
            env_keys: &["REQUESTDESK_API_BASE_URL"],
        },
        FieldSpec {
            key: "wizard.notification_timeout_ms",
            value: config.wizard.notification_timeout_ms.to_string(),
            env_keys: &["REQUESTDESK_NOTIFICATION_TIMEOUT_MS"],
        },
        FieldSpec {
            key: "wizard.redirect_delay_ms",
            value: config.wizard.redirect_delay_ms.to_string(),
            env_keys: &["REQUESTDESK_REDIRECT_DELAY_MS"],
        },
        FieldSpec {
            key: "wizard.success_route",
            value: config.wizard.success_route.clone(),
            env_keys: &[],
        },
        FieldSpec {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["REQUESTDESK_LOGGING_LEVEL", "REQUESTDESK_LOG_LEVEL"],
        },
        FieldSpec {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["REQUESTDESK_LOGGING_FORMAT", "REQUESTDESK_LOG_FORMAT"],
        },
    ]
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    [PathBuf::from("requestdesk.toml"), PathBuf::from("config/requestdesk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
