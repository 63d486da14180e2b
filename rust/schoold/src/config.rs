use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_AI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";

#[derive(Clone)]
pub struct Config {
    pub ai_api_key: Option<String>,
    pub ai_base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub ai_timeout: Duration,
    pub seed_demo: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("ai_api_key", &self.ai_api_key.as_ref().map(|_| "<redacted>"))
            .field("ai_base_url", &self.ai_base_url)
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("ai_timeout", &self.ai_timeout)
            .field("seed_demo", &self.seed_demo)
            .finish()
    }
}

fn parsed_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(key, value = %raw, "invalid config value, using default");
                default
            }
        },
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let seed_demo = match non_empty("SCHOOLD_SEED_DEMO") {
            None => true,
            Some(raw) => parse_bool(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "invalid SCHOOLD_SEED_DEMO, using default");
                true
            }),
        };

        Self {
            ai_api_key: non_empty("SCHOOLD_AI_API_KEY").or_else(|| non_empty("API_KEY")),
            ai_base_url: non_empty("SCHOOLD_AI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_AI_BASE_URL.to_string()),
            text_model: non_empty("SCHOOLD_TEXT_MODEL")
                .unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            image_model: non_empty("SCHOOLD_IMAGE_MODEL")
                .unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            temperature: parsed_or(&non_empty, "SCHOOLD_AI_TEMPERATURE", 0.7),
            top_p: parsed_or(&non_empty, "SCHOOLD_AI_TOP_P", 0.9),
            ai_timeout: Duration::from_secs(parsed_or(&non_empty, "SCHOOLD_AI_TIMEOUT_SECS", 30)),
            seed_demo,
        }
    }
}
