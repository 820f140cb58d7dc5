use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Resolved daemon settings, secrets included.
#[derive(Debug, Clone)]
pub struct OracleSettings {
    pub ephemeris: EphemerisSettings,
    pub llm: LlmSettings,
    pub telegram: Option<TelegramSettings>,
    pub http: HttpSettings,
    pub store: StoreSettings,
    pub geocoding: GeocodingSettings,
}

#[derive(Debug, Clone)]
pub struct EphemerisSettings {
    pub path: Option<PathBuf>,
    pub house_system: String,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Earlier conversation turns replayed into each prompt
    pub history_turns: usize,
}

#[derive(Debug, Clone)]
pub struct TelegramSettings {
    pub token: String,
    pub api_url: String,
    pub poll_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub listen: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Directory for chart documents and conversation logs; in-memory when unset
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct GeocodingSettings {
    pub search_url: String,
    pub timezone_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct EphemerisToml {
    #[serde(default)]
    path: Option<PathBuf>,
    #[serde(default = "default_house_system")]
    house_system: String,
}

#[derive(Debug, Clone, Deserialize)]
struct LlmToml {
    #[serde(default = "default_llm_base_url")]
    base_url: String,
    model: String,
    #[serde(default = "default_llm_key_env")]
    api_key_env: String,
    #[serde(default = "default_temperature")]
    temperature: f32,
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,
    #[serde(default = "default_llm_timeout")]
    timeout_secs: u64,
    #[serde(default = "default_history_turns")]
    history_turns: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct TelegramToml {
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_telegram_token_env")]
    token_env: String,
    #[serde(default = "default_telegram_api_url")]
    api_url: String,
    #[serde(default = "default_poll_timeout")]
    poll_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct HttpToml {
    #[serde(default = "default_listen")]
    listen: String,
}

impl Default for HttpToml {
    fn default() -> Self {
        Self { listen: default_listen() }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StoreToml {
    #[serde(default)]
    dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeocodingToml {
    #[serde(default = "default_search_url")]
    search_url: String,
    #[serde(default = "default_timezone_url")]
    timezone_url: String,
}

impl Default for GeocodingToml {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            timezone_url: default_timezone_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RootConfigToml {
    #[serde(default)]
    ephemeris: EphemerisToml,
    llm: Option<LlmToml>,
    #[serde(default)]
    telegram: Option<TelegramToml>,
    #[serde(default)]
    http: HttpToml,
    #[serde(default)]
    store: StoreToml,
    #[serde(default)]
    geocoding: GeocodingToml,
}

fn default_house_system() -> String {
    "placidus".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_key_env() -> String {
    "LLM_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    800
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_history_turns() -> usize {
    6
}

fn default_true() -> bool {
    true
}

fn default_telegram_token_env() -> String {
    "TELEGRAM_BOT_TOKEN".to_string()
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_listen() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_search_url() -> String {
    "https://geocoding-api.open-meteo.com/v1/search".to_string()
}

fn default_timezone_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

/// Try common relative paths for `configs/oracle.toml`.
pub fn read_oracle_toml_text() -> anyhow::Result<String> {
    let paths = ["configs/oracle.toml", "../../configs/oracle.toml"];
    for p in &paths {
        if let Ok(c) = fs::read_to_string(p) {
            return Ok(c);
        }
    }
    anyhow::bail!("Could not load oracle.toml from {:?}", paths);
}

/// Load settings from `path` (or the default locations), reading secrets
/// from the process environment after loading any `.env` file.
pub fn load_oracle_settings(path: Option<&Path>) -> anyhow::Result<OracleSettings> {
    if let Ok(env_file) = dotenvy::dotenv() {
        log::debug!("loaded environment from {}", env_file.display());
    }
    let text = match path {
        Some(p) => fs::read_to_string(p)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", p.display()))?,
        None => read_oracle_toml_text()?,
    };
    parse_oracle_settings(&text, |key| std::env::var(key).ok())
}

/// Parse settings text; `env` supplies the secret values by variable name.
pub fn parse_oracle_settings(
    text: &str,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<OracleSettings> {
    let root: RootConfigToml = toml::from_str(text)
        .map_err(|e| anyhow::anyhow!("Failed to parse oracle.toml: {e}"))?;

    let llm = root
        .llm
        .ok_or_else(|| anyhow::anyhow!("Missing [llm] config in oracle.toml (needs model)"))?;
    let api_key = env(&llm.api_key_env)
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("LLM API key not set (expected env var {})", llm.api_key_env))?;
    if !(0.0..=2.0).contains(&llm.temperature) {
        anyhow::bail!("llm.temperature must be within 0.0..=2.0, got {}", llm.temperature);
    }

    let telegram = match root.telegram {
        Some(t) if t.enabled => {
            let token = env(&t.token_env)
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "telegram is enabled but {} is not set (disable with telegram.enabled = false)",
                        t.token_env
                    )
                })?;
            Some(TelegramSettings {
                token,
                api_url: t.api_url.trim_end_matches('/').to_string(),
                poll_timeout_secs: t.poll_timeout_secs,
            })
        }
        _ => None,
    };

    let listen: SocketAddr = root
        .http
        .listen
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid http.listen address {:?}: {e}", root.http.listen))?;

    Ok(OracleSettings {
        ephemeris: EphemerisSettings {
            path: root.ephemeris.path,
            house_system: root.ephemeris.house_system,
        },
        llm: LlmSettings {
            base_url: llm.base_url.trim_end_matches('/').to_string(),
            model: llm.model,
            api_key,
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            timeout_secs: llm.timeout_secs,
            history_turns: llm.history_turns,
        },
        telegram,
        http: HttpSettings { listen },
        store: StoreSettings { dir: root.store.dir },
        geocoding: GeocodingSettings {
            search_url: root.geocoding.search_url,
            timezone_url: root.geocoding.timezone_url,
        },
    })
}
