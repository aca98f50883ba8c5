use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub whatsapp: WhatsAppConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
}

/// Credentials for the model vendors tenants may select. A tenant whose
/// config names a vendor without a key here fails the turn as a
/// configuration error before any provider call.
#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub openai_api_key: Option<SecretString>,
    pub openai_base_url: String,
    pub anthropic_api_key: Option<SecretString>,
    pub anthropic_base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Clone, Debug)]
pub struct WhatsAppConfig {
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<SecretString>,
    pub twilio_from_phone: Option<String>,
    pub meta_access_token: Option<SecretString>,
    pub meta_phone_number_id: Option<String>,
    pub meta_app_secret: Option<SecretString>,
    pub meta_verify_token: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://tallerbot.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 8080,
                health_check_port: 8081,
            },
            llm: LlmConfig {
                openai_api_key: None,
                openai_base_url: "https://api.openai.com/v1".to_string(),
                anthropic_api_key: None,
                anthropic_base_url: "https://api.anthropic.com".to_string(),
                timeout_secs: 30,
                max_retries: 1,
            },
            whatsapp: WhatsAppConfig {
                twilio_account_sid: None,
                twilio_auth_token: None,
                twilio_from_phone: None,
                meta_access_token: None,
                meta_phone_number_id: None,
                meta_app_secret: None,
                meta_verify_token: None,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl AppConfig {
    /// Precedence: built-in defaults, then the TOML file (with `${ENV}`
    /// interpolation), then `TALLERBOT_*` environment variables, then
    /// programmatic overrides. Validation runs last on the merged result.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("tallerbot.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(openai_api_key_value) = llm.openai_api_key {
                self.llm.openai_api_key = Some(secret_value(openai_api_key_value));
            }
            if let Some(openai_base_url) = llm.openai_base_url {
                self.llm.openai_base_url = openai_base_url;
            }
            if let Some(anthropic_api_key_value) = llm.anthropic_api_key {
                self.llm.anthropic_api_key = Some(secret_value(anthropic_api_key_value));
            }
            if let Some(anthropic_base_url) = llm.anthropic_base_url {
                self.llm.anthropic_base_url = anthropic_base_url;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = llm.max_retries {
                self.llm.max_retries = max_retries;
            }
        }

        if let Some(whatsapp) = patch.whatsapp {
            if let Some(twilio_account_sid) = whatsapp.twilio_account_sid {
                self.whatsapp.twilio_account_sid = Some(twilio_account_sid);
            }
            if let Some(twilio_auth_token_value) = whatsapp.twilio_auth_token {
                self.whatsapp.twilio_auth_token = Some(secret_value(twilio_auth_token_value));
            }
            if let Some(twilio_from_phone) = whatsapp.twilio_from_phone {
                self.whatsapp.twilio_from_phone = Some(twilio_from_phone);
            }
            if let Some(meta_access_token_value) = whatsapp.meta_access_token {
                self.whatsapp.meta_access_token = Some(secret_value(meta_access_token_value));
            }
            if let Some(meta_phone_number_id) = whatsapp.meta_phone_number_id {
                self.whatsapp.meta_phone_number_id = Some(meta_phone_number_id);
            }
            if let Some(meta_app_secret_value) = whatsapp.meta_app_secret {
                self.whatsapp.meta_app_secret = Some(secret_value(meta_app_secret_value));
            }
            if let Some(meta_verify_token) = whatsapp.meta_verify_token {
                self.whatsapp.meta_verify_token = Some(meta_verify_token);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("TALLERBOT_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("TALLERBOT_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("TALLERBOT_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("TALLERBOT_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("TALLERBOT_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("TALLERBOT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("TALLERBOT_SERVER_PORT") {
            self.server.port = parse_u16("TALLERBOT_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("TALLERBOT_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("TALLERBOT_SERVER_HEALTH_CHECK_PORT", &value)?;
        }

        if let Some(value) = read_env("TALLERBOT_OPENAI_API_KEY") {
            self.llm.openai_api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("TALLERBOT_OPENAI_BASE_URL") {
            self.llm.openai_base_url = value;
        }
        if let Some(value) = read_env("TALLERBOT_ANTHROPIC_API_KEY") {
            self.llm.anthropic_api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("TALLERBOT_ANTHROPIC_BASE_URL") {
            self.llm.anthropic_base_url = value;
        }
        if let Some(value) = read_env("TALLERBOT_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("TALLERBOT_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("TALLERBOT_LLM_MAX_RETRIES") {
            self.llm.max_retries = parse_u32("TALLERBOT_LLM_MAX_RETRIES", &value)?;
        }

        if let Some(value) = read_env("TALLERBOT_TWILIO_ACCOUNT_SID") {
            self.whatsapp.twilio_account_sid = Some(value);
        }
        if let Some(value) = read_env("TALLERBOT_TWILIO_AUTH_TOKEN") {
            self.whatsapp.twilio_auth_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("TALLERBOT_TWILIO_FROM_PHONE") {
            self.whatsapp.twilio_from_phone = Some(value);
        }
        if let Some(value) = read_env("TALLERBOT_META_ACCESS_TOKEN") {
            self.whatsapp.meta_access_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("TALLERBOT_META_PHONE_NUMBER_ID") {
            self.whatsapp.meta_phone_number_id = Some(value);
        }
        if let Some(value) = read_env("TALLERBOT_META_APP_SECRET") {
            self.whatsapp.meta_app_secret = Some(secret_value(value));
        }
        if let Some(value) = read_env("TALLERBOT_META_VERIFY_TOKEN") {
            self.whatsapp.meta_verify_token = Some(value);
        }

        let log_level =
            read_env("TALLERBOT_LOGGING_LEVEL").or_else(|| read_env("TALLERBOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("TALLERBOT_LOGGING_FORMAT").or_else(|| read_env("TALLERBOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(openai_api_key) = overrides.openai_api_key {
            self.llm.openai_api_key = Some(secret_value(openai_api_key));
        }
        if let Some(anthropic_api_key) = overrides.anthropic_api_key {
            self.llm.anthropic_api_key = Some(secret_value(anthropic_api_key));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_llm(&self.llm)?;
        validate_whatsapp(&self.whatsapp)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("tallerbot.toml"), PathBuf::from("config/tallerbot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }
    if server.port == server.health_check_port {
        return Err(ConfigError::Validation(
            "server.port and server.health_check_port must differ".to_string(),
        ));
    }
    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }
    if llm.max_retries > 5 {
        return Err(ConfigError::Validation("llm.max_retries must be at most 5".to_string()));
    }
    for (label, key) in
        [("llm.openai_api_key", &llm.openai_api_key), ("llm.anthropic_api_key", &llm.anthropic_api_key)]
    {
        if let Some(secret) = key {
            if secret.expose_secret().trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{label} is set but empty; unset it or provide a real key"
                )));
            }
        }
    }
    Ok(())
}

fn validate_whatsapp(whatsapp: &WhatsAppConfig) -> Result<(), ConfigError> {
    // Credentials come in pairs per transport. Half-configured transports are
    // caught here instead of failing the first customer turn.
    let twilio_fields = [
        whatsapp.twilio_account_sid.is_some(),
        whatsapp.twilio_auth_token.is_some(),
        whatsapp.twilio_from_phone.is_some(),
    ];
    if twilio_fields.iter().any(|set| *set) && !twilio_fields.iter().all(|set| *set) {
        return Err(ConfigError::Validation(
            "whatsapp.twilio_account_sid, whatsapp.twilio_auth_token, and \
             whatsapp.twilio_from_phone must be set together"
                .to_string(),
        ));
    }
    match (&whatsapp.meta_access_token, &whatsapp.meta_phone_number_id) {
        (Some(_), None) | (None, Some(_)) => {
            return Err(ConfigError::Validation(
                "whatsapp.meta_access_token and whatsapp.meta_phone_number_id must be set together"
                    .to_string(),
            ));
        }
        _ => {}
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
    let level = logging.level.trim().to_ascii_lowercase();
    if !LEVELS.contains(&level.as_str()) {
        return Err(ConfigError::Validation(format!(
            "logging.level must be one of {LEVELS:?}, got `{}`",
            logging.level
        )));
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    llm: Option<LlmPatch>,
    whatsapp: Option<WhatsAppPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    openai_api_key: Option<String>,
    openai_base_url: Option<String>,
    anthropic_api_key: Option<String>,
    anthropic_base_url: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct WhatsAppPatch {
    twilio_account_sid: Option<String>,
    twilio_auth_token: Option<String>,
    twilio_from_phone: Option<String>,
    meta_access_token: Option<String>,
    meta_phone_number_id: Option<String>,
    meta_app_secret: Option<String>,
    meta_verify_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;

    use super::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(Mutex::default)
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            std::env::remove_var(var);
        }
    }

    const TOUCHED_VARS: &[&str] = &[
        "TALLERBOT_DATABASE_URL",
        "TALLERBOT_OPENAI_API_KEY",
        "TALLERBOT_LOG_LEVEL",
        "TALLERBOT_LOGGING_FORMAT",
        "TEST_INTERPOLATED_KEY",
    ];

    #[test]
    fn defaults_validate_without_any_input() {
        let _guard = env_lock().lock().expect("env lock");
        clear_vars(TOUCHED_VARS);

        let config = AppConfig::load(LoadOptions::default()).expect("defaults should load");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(config.llm.openai_api_key.is_none());
    }

    #[test]
    fn file_load_supports_env_interpolation() {
        let _guard = env_lock().lock().expect("env lock");
        clear_vars(TOUCHED_VARS);
        std::env::set_var("TEST_INTERPOLATED_KEY", "sk-from-env");

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[llm]\nopenai_api_key = \"${{TEST_INTERPOLATED_KEY}}\"\n\n[logging]\nlevel = \"debug\""
        )
        .expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            ..LoadOptions::default()
        })
        .expect("file config should load");

        assert_eq!(
            config.llm.openai_api_key.as_ref().map(|key| key.expose_secret().to_string()),
            Some("sk-from-env".to_string())
        );
        assert_eq!(config.logging.level, "debug");
        clear_vars(TOUCHED_VARS);
    }

    #[test]
    fn env_overrides_beat_file_values() {
        let _guard = env_lock().lock().expect("env lock");
        clear_vars(TOUCHED_VARS);
        std::env::set_var("TALLERBOT_DATABASE_URL", "sqlite::memory:");
        std::env::set_var("TALLERBOT_LOG_LEVEL", "warn");

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[database]\nurl = \"sqlite://file-config.db\"").expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            ..LoadOptions::default()
        })
        .expect("config should load");

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.logging.level, "warn");
        clear_vars(TOUCHED_VARS);
    }

    #[test]
    fn programmatic_overrides_win_over_env() {
        let _guard = env_lock().lock().expect("env lock");
        clear_vars(TOUCHED_VARS);
        std::env::set_var("TALLERBOT_DATABASE_URL", "sqlite://env.db");

        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("config should load");

        assert_eq!(config.database.url, "sqlite::memory:");
        clear_vars(TOUCHED_VARS);
    }

    #[test]
    fn validation_rejects_half_configured_twilio() {
        let _guard = env_lock().lock().expect("env lock");
        clear_vars(TOUCHED_VARS);

        let mut config = AppConfig::default();
        config.whatsapp.twilio_account_sid = Some("AC123".to_string());
        let error = config.validate().expect_err("should fail");
        assert!(error.to_string().contains("twilio"));
    }

    #[test]
    fn validation_rejects_unknown_log_level() {
        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();
        let error = config.validate().expect_err("should fail");
        assert!(error.to_string().contains("logging.level"));
    }

    #[test]
    fn secrets_are_not_leaked_by_debug() {
        let mut config = AppConfig::default();
        config.llm.openai_api_key = Some("sk-super-secret".to_string().into());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-super-secret"));
    }
}
