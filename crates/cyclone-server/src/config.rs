//! Server configuration from environment.

use cyclone_providers::{MessagingCredentials, DEFAULT_OPENWEATHER_URL, DEFAULT_TWILIO_URL};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub model_path: String,
    pub tracks_path: String,
    pub tracks_limit: usize,
    pub tracks_seed: u64,
    /// Default for requests that do not say whether alerting is on
    pub alerts_enabled: bool,
    pub http_timeout_s: u64,
    pub send_timeout_s: u64,
    pub openweather_url: String,
    pub openweather_api_key: Option<String>,
    pub twilio_url: String,
    pub messaging: MessagingCredentials,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: parse_env("CYCLONE_PORT").unwrap_or(3000),
            model_path: env::var("CYCLONE_MODEL_PATH")
                .unwrap_or_else(|_| "cyclone_model.json".to_string()),
            tracks_path: env::var("CYCLONE_TRACKS_PATH")
                .unwrap_or_else(|_| "ibtracs.NI.list.v04r01.zip".to_string()),
            tracks_limit: parse_env("CYCLONE_TRACKS_LIMIT").unwrap_or(1000),
            tracks_seed: parse_env("CYCLONE_TRACKS_SEED").unwrap_or(42),
            alerts_enabled: parse_bool_env("CYCLONE_ALERTS_ENABLED").unwrap_or(true),
            http_timeout_s: parse_env("CYCLONE_HTTP_TIMEOUT_S").unwrap_or(10),
            send_timeout_s: parse_env("CYCLONE_SEND_TIMEOUT_S").unwrap_or(15),
            openweather_url: env::var("OPENWEATHER_URL")
                .unwrap_or_else(|_| DEFAULT_OPENWEATHER_URL.to_string()),
            openweather_api_key: env::var("OPENWEATHER_API_KEY").ok(),
            twilio_url: env::var("TWILIO_API_URL").unwrap_or_else(|_| DEFAULT_TWILIO_URL.to_string()),
            messaging: MessagingCredentials::from_parts(
                env::var("TWILIO_ACCOUNT_SID").ok(),
                env::var("TWILIO_AUTH_TOKEN").ok(),
                env::var("TWILIO_FROM_NUMBER").ok(),
            ),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_s.max(1))
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_s.max(1))
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn parse_bool_env(key: &str) -> Option<bool> {
    env::var(key).ok().and_then(|value| parse_bool(&value))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
