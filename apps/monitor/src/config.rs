use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use smartbite_core::constants::{DEFAULT_POLL_INTERVAL_SECS, SENSOR_READING_TOPIC};

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_MQTT_PORT: u16 = 1883;
const DEFAULT_PREFS_PATH: &str = "smartbite-prefs.json";

#[derive(Debug, Clone, PartialEq)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub topic: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    /// `None` runs on REST polling alone.
    pub mqtt: Option<MqttConfig>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub prefs_path: PathBuf,
    pub poll_interval: Duration,
    pub clear_sample_after_commit: bool,
}

impl Config {
    /// Read `SMARTBITE_*` variables, loading a `.env` file first if present.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mqtt = match var("SMARTBITE_MQTT_HOST") {
            Some(host) => Some(MqttConfig {
                host,
                port: match var("SMARTBITE_MQTT_PORT") {
                    Some(port) => port
                        .trim()
                        .parse()
                        .with_context(|| format!("Invalid SMARTBITE_MQTT_PORT: {}", port))?,
                    None => DEFAULT_MQTT_PORT,
                },
                username: var("SMARTBITE_MQTT_USERNAME"),
                password: var("SMARTBITE_MQTT_PASSWORD"),
                topic: var("SMARTBITE_MQTT_TOPIC")
                    .unwrap_or_else(|| SENSOR_READING_TOPIC.to_string()),
            }),
            None => None,
        };

        let poll_secs = match var("SMARTBITE_POLL_INTERVAL_SECS") {
            Some(secs) => secs
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .with_context(|| format!("Invalid SMARTBITE_POLL_INTERVAL_SECS: {}", secs))?,
            None => DEFAULT_POLL_INTERVAL_SECS,
        };

        let clear_sample_after_commit = match var("SMARTBITE_CLEAR_SAMPLE_AFTER_COMMIT") {
            Some(flag) => parse_flag(&flag)
                .with_context(|| format!("Invalid SMARTBITE_CLEAR_SAMPLE_AFTER_COMMIT: {}", flag))?,
            None => false,
        };

        Ok(Self {
            api_url: var("SMARTBITE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            mqtt,
            email: var("SMARTBITE_EMAIL"),
            password: var("SMARTBITE_PASSWORD"),
            prefs_path: var("SMARTBITE_PREFS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFS_PATH)),
            poll_interval: Duration::from_secs(poll_secs),
            clear_sample_after_commit,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
