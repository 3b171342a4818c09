//! Runtime configuration: an optional TOML file layered with `YATUBE_*`
//! environment variables.

use std::{path::{Path, PathBuf}, time::Duration};

use serde::Deserialize;

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:           String,
  pub port:           u16,
  pub database_path:  PathBuf,
  /// Uploaded images are written below this directory and served at
  /// `/media/`.
  pub media_dir:      PathBuf,
  pub cache_ttl_secs: u64,
  pub mail:           MailConfig,
}

impl ServerConfig {
  pub fn cache_ttl(&self) -> Duration {
    Duration::from_secs(self.cache_ttl_secs)
  }
}

/// Outgoing mail settings. An empty `smtp_host` means messages are only
/// logged.
#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
  pub smtp_host:     String,
  pub smtp_port:     u16,
  pub smtp_username: Option<String>,
  pub smtp_password: Option<String>,
  pub starttls:      bool,
  pub from:          String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:           "127.0.0.1".to_string(),
      port:           8000,
      database_path:  PathBuf::from("yatube.sqlite3"),
      media_dir:      PathBuf::from("media"),
      cache_ttl_secs: 20,
      mail:           MailConfig::default(),
    }
  }
}

impl Default for MailConfig {
  fn default() -> Self {
    Self {
      smtp_host:     String::new(),
      smtp_port:     587,
      smtp_username: None,
      smtp_password: None,
      starttls:      true,
      from:          "Yatube.ru <admin@yatube.ru>".to_string(),
    }
  }
}

/// Read `path` (if it exists) and the environment on top of the defaults.
pub fn load(path: &Path) -> Result<ServerConfig, config::ConfigError> {
  let defaults = ServerConfig::default();
  config::Config::builder()
    .set_default("host", defaults.host)?
    .set_default("port", i64::from(defaults.port))?
    .set_default("database_path", defaults.database_path.to_string_lossy().into_owned())?
    .set_default("media_dir", defaults.media_dir.to_string_lossy().into_owned())?
    .set_default("cache_ttl_secs", defaults.cache_ttl_secs as i64)?
    .set_default("mail.smtp_host", defaults.mail.smtp_host)?
    .set_default("mail.smtp_port", i64::from(defaults.mail.smtp_port))?
    .set_default("mail.starttls", defaults.mail.starttls)?
    .set_default("mail.from", defaults.mail.from)?
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("YATUBE")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()?
    .try_deserialize()
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
