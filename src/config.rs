use crate::{
    help::AuthorIdentity,
    permissions::PermissionsConfig,
};
use anyhow::Context;
use camino::{
    Utf8Path,
    Utf8PathBuf,
};
use serde::{
    Deserialize,
    Serialize,
};
use serenity::{
    model::Colour,
    utils::validate_token,
};
use std::collections::HashMap;

const DEFAULT_ANONYMOUS_ICON_URL: &str = "https://cdn.discordapp.com/embed/avatars/0.png";

fn default_prefix() -> String {
    "?".to_string()
}

fn default_main_color() -> u32 {
    0x7289DA
}

fn default_anonymous_name() -> String {
    "Support Agent".to_string()
}

fn default_anonymous_icon_url() -> String {
    DEFAULT_ANONYMOUS_ICON_URL.to_string()
}

#[derive(Deserialize, Debug)]
pub struct Config {
    pub token: String,

    #[serde(default = "default_prefix")]
    pub prefix: String,

    pub status: Option<StatusConfig>,

    pub data_dir: Utf8PathBuf,

    #[serde(default = "default_main_color")]
    pub main_color: u32,

    #[serde(default)]
    pub anonymous: AnonymousConfig,

    #[serde(default)]
    pub permissions: PermissionsConfig,

    #[serde(default)]
    pub configuration: ConfigurationHelpConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(flatten)]
    pub extra: HashMap<String, toml::Value>,
}

/// The persona used for anonymous relays
#[derive(Deserialize, Debug)]
pub struct AnonymousConfig {
    #[serde(default = "default_anonymous_name")]
    pub name: String,

    #[serde(default = "default_anonymous_icon_url")]
    pub icon_url: String,

    #[serde(flatten)]
    pub extra: HashMap<String, toml::Value>,
}

impl Default for AnonymousConfig {
    fn default() -> Self {
        Self {
            name: default_anonymous_name(),
            icon_url: default_anonymous_icon_url(),
            extra: HashMap::new(),
        }
    }
}

/// Where config key documentation comes from
#[derive(Deserialize, Debug, Default)]
pub struct ConfigurationHelpConfig {
    /// A json schema file. The built-in schema is used if missing.
    pub schema: Option<Utf8PathBuf>,

    pub public_keys: Option<Vec<String>>,
    pub protected_keys: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: HashMap<String, toml::Value>,
}

#[derive(Deserialize, Debug, Default)]
pub struct LogConfig {
    /// Extra tracing directives, like `serenity=warn`
    #[serde(default)]
    pub directives: Vec<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, toml::Value>,
}

impl Config {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn status_name(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.name.as_str())
    }

    pub fn status_url(&self) -> Option<&str> {
        self.status.as_ref().and_then(|s| s.url.as_deref())
    }

    pub fn status_type(&self) -> Option<ActivityKind> {
        self.status.as_ref().and_then(|s| s.kind)
    }

    pub fn main_color(&self) -> Colour {
        Colour::new(self.main_color)
    }

    /// The dir where log files go
    pub fn log_file_dir(&self) -> Utf8PathBuf {
        self.data_dir.join("logs")
    }

    /// The identity anonymous relays are sent with
    pub fn anonymous_identity(&self) -> AuthorIdentity {
        AuthorIdentity::new(
            self.anonymous.name.as_str(),
            Some(self.anonymous.icon_url.clone()),
        )
    }

    /// Load a config from a path
    pub fn load_from_path(path: &Utf8Path) -> anyhow::Result<Self> {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from `{path}`"))
            .and_then(|s| Self::load_from_str(&s))
    }

    /// Load a config from a str
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("failed to parse config")
    }

    /// Validate a config
    pub fn validate(&mut self) -> Vec<ValidationMessage> {
        let mut errors = Vec::new();

        if let Err(_e) = validate_token(&self.token) {
            errors.push(ValidationMessage {
                severity: Severity::Error,
                error: ValidationError::InvalidToken,
            });
        }

        if let Some(config) = &self.status {
            if let (Some(ActivityKind::Streaming), None) = (config.kind, &config.url) {
                errors.push(ValidationMessage {
                    severity: Severity::Error,
                    error: ValidationError::MissingStreamUrl,
                });
            }

            if let (None, _) = (config.kind, &config.url) {
                errors.push(ValidationMessage {
                    severity: Severity::Warn,
                    error: ValidationError::MissingStatusType,
                });
            }
        }

        if let Err(e) = url::Url::parse(&self.anonymous.icon_url) {
            errors.push(ValidationMessage {
                severity: Severity::Error,
                error: ValidationError::InvalidAnonymousIconUrl(e),
            });
        }

        if !self.permissions.has_supporters() {
            errors.push(ValidationMessage {
                severity: Severity::Warn,
                error: ValidationError::NoSupporters,
            });
        }

        errors.extend(
            self.unknown_keys()
                .into_iter()
                .map(|key| ValidationMessage {
                    severity: Severity::Warn,
                    error: ValidationError::UnknownKey(key),
                }),
        );

        errors
    }

    /// Get the dotted paths of all keys that were not recognized, sorted.
    pub fn unknown_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.extra.keys().cloned().collect();
        let mut add_section = |section: &str, extra: &HashMap<String, toml::Value>| {
            keys.extend(extra.keys().map(|key| format!("{section}.{key}")));
        };

        if let Some(status) = self.status.as_ref() {
            add_section("status", &status.extra);
        }
        add_section("anonymous", &self.anonymous.extra);
        add_section("configuration", &self.configuration.extra);
        add_section("log", &self.log.extra);

        keys.sort();
        keys
    }
}

#[derive(Deserialize, Debug)]
pub struct StatusConfig {
    #[serde(rename = "type")]
    #[serde(default)]
    kind: Option<ActivityKind>,
    name: String,
    url: Option<String>,

    #[serde(flatten)]
    extra: HashMap<String, toml::Value>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize, Serialize, Default)]
pub enum ActivityKind {
    Listening,
    #[default]
    Playing,
    Streaming,
}

#[derive(Debug)]
pub struct ValidationMessage {
    severity: Severity,
    error: ValidationError,
}

impl ValidationMessage {
    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn error(&self) -> &ValidationError {
        &self.error
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid token")]
    InvalidToken,

    #[error("missing status type")]
    MissingStatusType,

    #[error("missing stream url")]
    MissingStreamUrl,

    #[error("invalid anonymous icon url")]
    InvalidAnonymousIconUrl(#[source] url::ParseError),

    #[error("no supporters, moderators or administrators are configured, only owners can relay help")]
    NoSupporters,

    #[error("unknown config key `{0}`")]
    UnknownKey(String),
}

#[derive(Copy, Clone, Debug)]
pub enum Severity {
    Warn,
    Error,
}
