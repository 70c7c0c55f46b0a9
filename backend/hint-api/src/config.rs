use std::{
    env, fmt,
    net::SocketAddr,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use crate::models::hint::OutputMode;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

#[derive(Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub upstream_timeout_secs: u64,
    pub upstream_max_attempts: usize,
    pub output_mode: OutputMode,
    pub server_host: String,
    pub server_port: u16,
}

// Hand-written so the API key never ends up in logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("gemini_api_key", &"<redacted>")
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("upstream_timeout_secs", &self.upstream_timeout_secs)
            .field("upstream_max_attempts", &self.upstream_max_attempts)
            .field("output_mode", &self.output_mode)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .finish()
    }
}

/// Loads `.env` into the process environment without overriding variables
/// that are already set. Tries the repository root first, then the working
/// directory. Must run before anything reads the environment.
pub fn load_dotenv() {
    let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
    if skip_root_env || load_dotenv_from(Path::new("../../.env")).is_none() {
        dotenvy::dotenv().ok();
    }
}

/// Loads a specific env file; returns the path when it was found and parsed.
pub fn load_dotenv_from(path: &Path) -> Option<PathBuf> {
    dotenvy::from_path(path).ok().map(|_| path.to_path_buf())
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        load_dotenv();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        let file = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .build()?;

        // APP_GEMINI__MODEL -> gemini.model
        let overrides = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Self::from_layers(&overrides, &file)
    }

    /// Resolves every field from `APP_*` overrides, then the plain env var,
    /// then the profile file, then a default.
    pub fn from_layers(
        overrides: &config::Config,
        file: &config::Config,
    ) -> Result<Self, config::ConfigError> {
        let sources = Sources { overrides, file };

        let gemini_api_key = sources.lookup("gemini.api_key", "GEMINI_API_KEY").ok_or_else(
            || config::ConfigError::Message("GEMINI_API_KEY must be set".to_string()),
        )?;

        let gemini_model = sources
            .lookup("gemini.model", "GEMINI_MODEL")
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        let gemini_base_url = sources
            .lookup("gemini.base_url", "GEMINI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());
        validate_base_url(&gemini_base_url)?;

        let temperature: f32 = sources.parse_or("gemini.temperature", "GEMINI_TEMPERATURE", 0.2)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(config::ConfigError::Message(format!(
                "temperature must be within 0.0..=2.0, got {}",
                temperature
            )));
        }

        let max_output_tokens: u32 =
            sources.parse_or("gemini.max_output_tokens", "GEMINI_MAX_OUTPUT_TOKENS", 150)?;
        let upstream_timeout_secs: u64 =
            sources.parse_or("gemini.timeout_secs", "GEMINI_TIMEOUT_SECS", 20)?;
        let upstream_max_attempts: usize =
            sources.parse_or("gemini.max_attempts", "GEMINI_MAX_ATTEMPTS", 2)?;

        if max_output_tokens == 0 || upstream_timeout_secs == 0 || upstream_max_attempts == 0 {
            return Err(config::ConfigError::Message(
                "max_output_tokens, timeout_secs and max_attempts must be positive".to_string(),
            ));
        }

        let output_mode: OutputMode =
            sources.parse_or("hints.output_mode", "HINT_OUTPUT_MODE", OutputMode::Lenient)?;

        let server_host = sources
            .lookup("server.host", "HOST")
            .unwrap_or_else(|| "0.0.0.0".to_string());
        let server_port: u16 = sources.parse_or("server.port", "PORT", 8000)?;

        Ok(Config {
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            temperature,
            max_output_tokens,
            upstream_timeout_secs,
            upstream_max_attempts,
            output_mode,
            server_host,
            server_port,
        })
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server_host, self.server_port).parse()
    }
}

struct Sources<'a> {
    overrides: &'a config::Config,
    file: &'a config::Config,
}

impl Sources<'_> {
    // Blank values count as unset at every layer.
    fn lookup(&self, key: &str, env_var: &str) -> Option<String> {
        let non_empty = |value: &String| !value.trim().is_empty();

        self.overrides
            .get_string(key)
            .ok()
            .filter(non_empty)
            .or_else(|| env::var(env_var).ok().filter(non_empty))
            .or_else(|| self.file.get_string(key).ok().filter(non_empty))
    }

    fn parse_or<T>(&self, key: &str, env_var: &str, default: T) -> Result<T, config::ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.lookup(key, env_var) {
            Some(raw) => raw.trim().parse::<T>().map_err(|e| {
                config::ConfigError::Message(format!("invalid value for {}: {} ({})", key, raw, e))
            }),
            None => Ok(default),
        }
    }
}

fn validate_base_url(raw: &str) -> Result<(), config::ConfigError> {
    let parsed = url::Url::parse(raw).map_err(|e| {
        config::ConfigError::Message(format!("invalid gemini.base_url {}: {}", raw, e))
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(config::ConfigError::Message(format!(
            "gemini.base_url must use http or https, got {}",
            other
        ))),
    }
}
