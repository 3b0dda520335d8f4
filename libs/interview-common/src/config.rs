// Application configuration
//
// Everything is read from the environment once at startup. Optional
// integrations (Gemini, Azure Speech, Redis) may be absent; the routes that
// need them answer with a configuration error instead.

use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_PISTON_URL: &str = "https://emkc.org/api/v2/piston/execute";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: '{value}' ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SandboxConfig {
    pub url: String,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    pub default_run_timeout_ms: u64,
    pub max_parallel_tests: usize,
    pub test_fetch_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub system_prompt: String,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AzureSpeechConfig {
    pub key: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
}

impl AzureSpeechConfig {
    /// A key plus either a region or an endpoint
    pub fn is_configured(&self) -> bool {
        self.key.is_some() && (self.region.is_some() || self.endpoint.is_some())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextConfig {
    /// Unset means the in-process cache
    pub redis_url: Option<String>,
    pub ttl_secs: usize,
    pub capacity: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_addr: String,
    pub frontend_origin: String,
    pub sandbox: SandboxConfig,
    pub gemini: GeminiConfig,
    pub azure: AzureSpeechConfig,
    pub context: ContextConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:5000".to_string()),
            frontend_origin: get("FRONTEND_ORIGIN").unwrap_or_else(|| "*".to_string()),
            sandbox: SandboxConfig {
                url: get("PISTON_URL").unwrap_or_else(|| DEFAULT_PISTON_URL.to_string()),
                connect_timeout_ms: parse_or(&get, "SANDBOX_CONNECT_TIMEOUT_MS", 10_000)?,
                read_timeout_ms: parse_or(&get, "SANDBOX_READ_TIMEOUT_MS", 60_000)?,
                default_run_timeout_ms: parse_or(&get, "DEFAULT_RUN_TIMEOUT_MS", 10_000)?,
                max_parallel_tests: parse_or(&get, "MAX_PARALLEL_TESTS", 1usize)?.max(1),
                test_fetch_timeout_ms: parse_or(&get, "TEST_FETCH_TIMEOUT_MS", 10_000)?,
            },
            gemini: GeminiConfig {
                api_key: get("GEMINI_API_KEY"),
                api_base: get("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
                model: get("GEMINI_MODEL").unwrap_or_else(|| "gemini-1.5-flash".to_string()),
                system_prompt: get("GEMINI_SYSTEM_PROMPT").unwrap_or_default(),
                temperature: parse_opt(&get, "GEMINI_TEMPERATURE")?,
                top_p: parse_opt(&get, "GEMINI_TOP_P")?,
                top_k: parse_opt(&get, "GEMINI_TOP_K")?,
                max_tokens: parse_opt(&get, "GEMINI_MAX_TOKENS")?,
            },
            azure: AzureSpeechConfig {
                key: get("AZURE_SPEECH_KEY"),
                region: get("AZURE_SPEECH_REGION"),
                endpoint: get("AZURE_SPEECH_ENDPOINT"),
            },
            context: ContextConfig {
                redis_url: get("REDIS_URL"),
                ttl_secs: parse_or(&get, "CONTEXT_TTL_SECS", 86_400)?,
                capacity: parse_or(&get, "CONTEXT_CAPACITY", 1024)?,
            },
        })
    }
}

fn parse_opt<T, G>(get: &G, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                name,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(get, name)?.unwrap_or(default))
}
