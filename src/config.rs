use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
  #[serde(default = "default_api_url")]
  pub api_url: String,
  /// Session cookie captured at login, kept out of the saved file when
  /// absent.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub session_cookie: Option<String>,
  #[serde(default)]
  pub logs_dir: String,
}

fn default_api_url() -> String {
  DEFAULT_API_URL.to_string()
}

impl Default for AppConfig {
  fn default() -> AppConfig {
    AppConfig {
      api_url: default_api_url(),
      session_cookie: None,
      logs_dir: String::new(),
    }
  }
}

pub fn repo_root() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn config_path() -> PathBuf {
  repo_root().join("config.json")
}

pub fn logs_dir(config: &AppConfig) -> PathBuf {
  let raw = config.logs_dir.trim();
  if raw.is_empty() {
    repo_root().join("logs")
  } else {
    PathBuf::from(raw)
  }
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

pub fn apply_env_defaults(mut config: AppConfig) -> AppConfig {
  if let Some(value) = env_default("BRACKET_API_URL") {
    config.api_url = value;
  }
  if config.session_cookie.is_none() {
    config.session_cookie = env_default("BRACKET_SESSION_COOKIE");
  }
  config
}

pub fn load_config() -> Result<AppConfig, String> {
  let path = config_path();
  if !path.is_file() {
    return Ok(apply_env_defaults(AppConfig::default()));
  }
  let data =
    fs::read_to_string(&path).map_err(|e| format!("read config {}: {e}", path.display()))?;
  let config = serde_json::from_str::<AppConfig>(&data)
    .map_err(|e| format!("parse config {}: {e}", path.display()))?;
  Ok(apply_env_defaults(config))
}

pub fn save_config(config: &AppConfig) -> Result<(), String> {
  let path = config_path();
  let payload = serde_json::to_string_pretty(config).map_err(|e| e.to_string())?;
  fs::write(&path, payload).map_err(|e| format!("write config {}: {e}", path.display()))
}

pub fn load_env_file() {
  let env_path = repo_root().join(".env");
  if !env_path.is_file() {
    return;
  }
  let contents = match fs::read_to_string(&env_path) {
    Ok(data) => data,
    Err(_) => return,
  };
  for line in contents.lines() {
    if let Some((key, value)) = parse_env_line(line) {
      if env::var_os(&key).is_none() {
        env::set_var(key, value);
      }
    }
  }
}

pub fn parse_env_line(line: &str) -> Option<(String, String)> {
  let trimmed = line.trim();
  if trimmed.is_empty() || trimmed.starts_with('#') {
    return None;
  }
  let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
  let (key, raw_value) = trimmed.split_once('=')?;
  let key = key.trim();
  if key.is_empty() {
    return None;
  }
  let mut value = raw_value.trim();
  if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
    value = &value[1..value.len() - 1];
  } else if value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2 {
    value = &value[1..value.len() - 1];
  } else if let Some(idx) = value.find('#') {
    value = value[..idx].trim_end();
  }
  Some((key.to_string(), value.to_string()))
}
