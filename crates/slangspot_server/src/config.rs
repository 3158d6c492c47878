//! Server configuration.
//!
//! # Responsibility
//! - Load settings from an optional TOML file; missing keys take defaults.
//! - Resolve service redirect targets into `Location` URLs.
//!
//! # Invariants
//! - Redirect base paths always end with `/`.
//! - Command-line and environment overrides are applied by the caller after
//!   loading, so the file is never the last word.

use serde::{Deserialize, Serialize};
use slangspot_core::RedirectTarget;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_DATABASE_PATH: &str = "slangspot.sqlite3";
pub const DEFAULT_ACTOR_HEADER: &str = "x-slangspot-user";
pub const DEFAULT_LOGIN_URL: &str = "/accounts/login/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file `{path}`: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config value for `{key}`: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the HTTP listener binds to.
    pub bind: String,
    pub database_path: PathBuf,
    /// `None` selects the build-mode default.
    pub log_level: Option<String>,
    /// Absolute directory for rolling log files; `None` uses `logs/` under
    /// the working directory.
    pub log_dir: Option<PathBuf>,
    pub log_to_stderr: bool,
    /// Request header carrying the acting user's id.
    pub actor_header: String,
    /// Where anonymous requests to protected pages are sent.
    pub login_url: String,
    pub redirects: RedirectConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            log_level: None,
            log_dir: None,
            log_to_stderr: false,
            actor_header: DEFAULT_ACTOR_HEADER.to_string(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
            redirects: RedirectConfig::default(),
        }
    }
}

/// Base paths used to build success redirects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedirectConfig {
    pub lessons: String,
    pub forum: String,
    pub blog: String,
    pub practice: String,
    pub profile: String,
    pub notifications: String,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            lessons: "/lessons/".to_string(),
            forum: "/forum/".to_string(),
            blog: "/blog/".to_string(),
            practice: "/practice/".to_string(),
            profile: "/profile/".to_string(),
            notifications: "/notifications/".to_string(),
        }
    }
}

impl ServerConfig {
    /// Loads `path` when given, otherwise returns defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "bind",
                message: "cannot be empty".to_string(),
            });
        }
        if self.actor_header.trim().is_empty()
            || axum::http::HeaderName::from_bytes(self.actor_header.as_bytes()).is_err()
        {
            return Err(ConfigError::Invalid {
                key: "actor_header",
                message: format!("`{}` is not a valid header name", self.actor_header),
            });
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid {
                    key: "log_dir",
                    message: format!("must be absolute, got `{}`", dir.display()),
                });
            }
        }
        Ok(())
    }

    /// Login redirect carrying the originally requested path.
    pub fn login_location(&self, next: &str) -> String {
        let separator = if self.login_url.contains('?') { '&' } else { '?' };
        format!("{}{separator}next={}", self.login_url, encode_query_value(next))
    }

    pub fn location(&self, target: &RedirectTarget) -> String {
        let paths = &self.redirects;
        match target {
            RedirectTarget::LessonList => with_slash(&paths.lessons),
            RedirectTarget::LessonDetail(id) => format!("{}{id}/", with_slash(&paths.lessons)),
            RedirectTarget::ForumIndex => with_slash(&paths.forum),
            RedirectTarget::ForumCategories => format!("{}categories/", with_slash(&paths.forum)),
            RedirectTarget::PostDetail(id) => format!("{}post/{id}/", with_slash(&paths.forum)),
            RedirectTarget::BlogList => with_slash(&paths.blog),
            RedirectTarget::BlogDetail(slug) => format!("{}{slug}/", with_slash(&paths.blog)),
            RedirectTarget::PracticeList => with_slash(&paths.practice),
            RedirectTarget::PracticeDetail(id) => {
                format!("{}{id}/", with_slash(&paths.practice))
            }
            RedirectTarget::Profile => with_slash(&paths.profile),
            RedirectTarget::PublicProfile(user_id) => {
                format!("{}{user_id}/", with_slash(&paths.profile))
            }
            RedirectTarget::Notifications => with_slash(&paths.notifications),
        }
    }
}

fn with_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// Percent-encodes everything but unreserved characters and `/`.
fn encode_query_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                encoded.push(char::from(byte));
            }
            other => encoded.push_str(&format!("%{other:02X}")),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ServerConfig, DEFAULT_ACTOR_HEADER};
    use slangspot_core::RedirectTarget;
    use std::path::Path;
    use uuid::Uuid;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = ServerConfig::from_toml_str(
            r#"
            bind = "0.0.0.0:9000"

            [redirects]
            blog = "/articulos"
            "#,
        )
        .unwrap();

        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.actor_header, DEFAULT_ACTOR_HEADER);
        assert_eq!(config.redirects.forum, "/forum/");
        assert_eq!(
            config.location(&RedirectTarget::BlogDetail("hola".to_string())),
            "/articulos/hola/"
        );
    }

    #[test]
    fn locations_follow_route_layout() {
        let config = ServerConfig::default();
        let id = Uuid::nil();

        assert_eq!(config.location(&RedirectTarget::LessonList), "/lessons/");
        assert_eq!(
            config.location(&RedirectTarget::PostDetail(id)),
            format!("/forum/post/{id}/")
        );
        assert_eq!(
            config.location(&RedirectTarget::ForumCategories),
            "/forum/categories/"
        );
    }

    #[test]
    fn login_location_encodes_next() {
        let config = ServerConfig::default();
        assert_eq!(
            config.login_location("/lessons/?q=a b"),
            "/accounts/login/?next=/lessons/%3Fq%3Da%20b"
        );
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let config = ServerConfig {
            log_dir: Some("logs".into()),
            ..ServerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "log_dir", .. })
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = ServerConfig::load(Some(Path::new("/nonexistent/slangspot.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
