use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use tallerbot_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields: Vec<(&str, &str, String)> = vec![
        ("database.url", "TALLERBOT_DATABASE_URL", config.database.url.clone()),
        (
            "database.max_connections",
            "TALLERBOT_DATABASE_MAX_CONNECTIONS",
            config.database.max_connections.to_string(),
        ),
        (
            "database.timeout_secs",
            "TALLERBOT_DATABASE_TIMEOUT_SECS",
            config.database.timeout_secs.to_string(),
        ),
        (
            "server.bind_address",
            "TALLERBOT_SERVER_BIND_ADDRESS",
            config.server.bind_address.clone(),
        ),
        ("server.port", "TALLERBOT_SERVER_PORT", config.server.port.to_string()),
        (
            "server.health_check_port",
            "TALLERBOT_SERVER_HEALTH_CHECK_PORT",
            config.server.health_check_port.to_string(),
        ),
        (
            "llm.openai_api_key",
            "TALLERBOT_OPENAI_API_KEY",
            redact_secret(config.llm.openai_api_key.as_ref()),
        ),
        ("llm.openai_base_url", "TALLERBOT_OPENAI_BASE_URL", config.llm.openai_base_url.clone()),
        (
            "llm.anthropic_api_key",
            "TALLERBOT_ANTHROPIC_API_KEY",
            redact_secret(config.llm.anthropic_api_key.as_ref()),
        ),
        (
            "llm.anthropic_base_url",
            "TALLERBOT_ANTHROPIC_BASE_URL",
            config.llm.anthropic_base_url.clone(),
        ),
        ("llm.timeout_secs", "TALLERBOT_LLM_TIMEOUT_SECS", config.llm.timeout_secs.to_string()),
        ("llm.max_retries", "TALLERBOT_LLM_MAX_RETRIES", config.llm.max_retries.to_string()),
        (
            "whatsapp.twilio_account_sid",
            "TALLERBOT_TWILIO_ACCOUNT_SID",
            plain_value(config.whatsapp.twilio_account_sid.as_deref()),
        ),
        (
            "whatsapp.twilio_auth_token",
            "TALLERBOT_TWILIO_AUTH_TOKEN",
            redact_secret(config.whatsapp.twilio_auth_token.as_ref()),
        ),
        (
            "whatsapp.twilio_from_phone",
            "TALLERBOT_TWILIO_FROM_PHONE",
            plain_value(config.whatsapp.twilio_from_phone.as_deref()),
        ),
        (
            "whatsapp.meta_access_token",
            "TALLERBOT_META_ACCESS_TOKEN",
            redact_secret(config.whatsapp.meta_access_token.as_ref()),
        ),
        (
            "whatsapp.meta_phone_number_id",
            "TALLERBOT_META_PHONE_NUMBER_ID",
            plain_value(config.whatsapp.meta_phone_number_id.as_deref()),
        ),
        (
            "whatsapp.meta_app_secret",
            "TALLERBOT_META_APP_SECRET",
            redact_secret(config.whatsapp.meta_app_secret.as_ref()),
        ),
        (
            "whatsapp.meta_verify_token",
            "TALLERBOT_META_VERIFY_TOKEN",
            plain_value(config.whatsapp.meta_verify_token.as_deref()),
        ),
        ("logging.level", "TALLERBOT_LOGGING_LEVEL", config.logging.level.clone()),
        ("logging.format", "TALLERBOT_LOGGING_FORMAT", format!("{:?}", config.logging.format)),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, env_key, value) in fields {
        let source = field_source(
            key,
            env_key,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(format!("- {key} = {value} (source: {source})"));
    }

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("tallerbot.toml"), PathBuf::from("config/tallerbot.toml")]
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
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
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

fn plain_value(value: Option<&str>) -> String {
    value.unwrap_or("<unset>").to_string()
}

fn redact_secret(secret: Option<&SecretString>) -> String {
    let Some(secret) = secret else {
        return "<unset>".to_string();
    };

    let raw = secret.expose_secret().trim();
    if raw.is_empty() {
        return "<empty>".to_string();
    }
    if let Some((prefix, _)) = raw.split_once('-') {
        return format!("{prefix}-***");
    }
    "<redacted>".to_string()
}
