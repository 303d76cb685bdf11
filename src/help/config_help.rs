use super::{
    BuildError,
    HelpDocument,
    PlaceholderFormatter,
};
use anyhow::Context as _;
use camino::Utf8Path;
use serde::Deserialize;
use std::collections::{
    HashMap,
    HashSet,
};
use tracing::warn;

/// The prefix that marks an identifier as a configuration key
pub const CONFIG_PREFIX: &str = "config_";

/// The schema that ships with the bot
const DEFAULT_SCHEMA: &str = include_str!("../../assets/config_help.json");

/// Keys that any operator may look at and change
pub const DEFAULT_PUBLIC_KEYS: &[&str] = &[
    "prefix",
    "main_color",
    "error_color",
    "user_typing",
    "mod_typing",
    "account_age",
    "guild_age",
    "thread_auto_close",
    "thread_auto_close_response",
    "thread_creation_response",
    "thread_cooldown",
    "anon_username",
    "anon_avatar_url",
    "anon_reply_without_command",
    "recipient_color",
    "mod_color",
];

/// Keys that exist but should be handled carefully
pub const DEFAULT_PROTECTED_KEYS: &[&str] = &[
    "modmail_guild_id",
    "guild_id",
    "log_url",
    "log_level",
    "enable_plugins",
];

/// The documentation of a single configuration key.
///
/// All strings may contain `{prefix}` and `{bot}` placeholders.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ConfigSchemaEntry {
    pub default: String,
    pub description: String,

    #[serde(default)]
    pub examples: Vec<String>,

    #[serde(default)]
    pub notes: Vec<String>,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// The configuration keys and their documentation.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    public_keys: HashSet<String>,
    protected_keys: HashSet<String>,
    schema: HashMap<String, ConfigSchemaEntry>,
}

impl ConfigStore {
    /// Make a new [`ConfigStore`].
    pub fn new(
        public_keys: impl IntoIterator<Item = impl Into<String>>,
        protected_keys: impl IntoIterator<Item = impl Into<String>>,
        schema: HashMap<String, ConfigSchemaEntry>,
    ) -> Self {
        Self {
            public_keys: public_keys.into_iter().map(Into::into).collect(),
            protected_keys: protected_keys.into_iter().map(Into::into).collect(),
            schema,
        }
    }

    /// Parse a schema from json.
    pub fn parse_schema(json: &str) -> anyhow::Result<HashMap<String, ConfigSchemaEntry>> {
        serde_json::from_str(json).context("failed to parse config schema")
    }

    /// Load a store.
    ///
    /// Uses the built-in schema if no path is given, and the built-in key sets for any missing set.
    pub fn load(
        schema_path: Option<&Utf8Path>,
        public_keys: Option<&[String]>,
        protected_keys: Option<&[String]>,
    ) -> anyhow::Result<Self> {
        let schema = match schema_path {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config schema from `{path}`"))?;
                Self::parse_schema(&json)?
            }
            None => Self::parse_schema(DEFAULT_SCHEMA)?,
        };

        let public_keys: Vec<String> = match public_keys {
            Some(keys) => keys.to_vec(),
            None => DEFAULT_PUBLIC_KEYS.iter().map(|key| key.to_string()).collect(),
        };
        let protected_keys: Vec<String> = match protected_keys {
            Some(keys) => keys.to_vec(),
            None => DEFAULT_PROTECTED_KEYS
                .iter()
                .map(|key| key.to_string())
                .collect(),
        };

        let store = Self::new(public_keys, protected_keys, schema);
        for key in store.undocumented_keys() {
            warn!("config key \"{key}\" has no schema entry");
        }

        Ok(store)
    }

    /// Whether a key is public or protected
    pub fn is_visible(&self, key: &str) -> bool {
        self.public_keys.contains(key) || self.protected_keys.contains(key)
    }

    /// Look up the documentation of a visible key.
    pub fn lookup(&self, key: &str) -> Option<&ConfigSchemaEntry> {
        if !self.is_visible(key) {
            return None;
        }

        self.schema.get(key)
    }

    /// Get visible keys that lack documentation, sorted.
    pub fn undocumented_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .public_keys
            .iter()
            .chain(self.protected_keys.iter())
            .filter(|key| !self.schema.contains_key(*key))
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }
}

/// Strip the [`CONFIG_PREFIX`] from an identifier.
pub fn strip_config_prefix(identifier: &str) -> &str {
    identifier
        .strip_prefix(CONFIG_PREFIX)
        .unwrap_or(identifier)
}

/// Render items as a bulleted list, skipping blank items.
///
/// Returns `None` if nothing is left.
fn bullet_list<I>(items: I) -> Option<String>
where
    I: Iterator<Item = String>,
{
    let lines: Vec<String> = items
        .filter(|item| !item.trim().is_empty())
        .map(|item| format!("- {item}"))
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn or_fallback(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

/// Builds help documents for configuration keys.
#[derive(Debug)]
pub struct ConfigDocumentBuilder<'a> {
    store: &'a ConfigStore,
    formatter: PlaceholderFormatter<'a>,
}

impl<'a> ConfigDocumentBuilder<'a> {
    /// Make a new [`ConfigDocumentBuilder`].
    pub fn new(store: &'a ConfigStore, formatter: PlaceholderFormatter<'a>) -> Self {
        Self { store, formatter }
    }

    /// Build the help document for a configuration key.
    ///
    /// The identifier may still carry the [`CONFIG_PREFIX`].
    ///
    /// # Errors
    /// Returns [`BuildError::NotFound`] if the key is not visible or not documented.
    pub fn build(&self, identifier: &str) -> Result<HelpDocument, BuildError> {
        let key = strip_config_prefix(identifier);
        let entry = self.store.lookup(key).ok_or_else(|| BuildError::NotFound {
            identifier: key.to_string(),
        })?;
        let fmt = |value: &str| self.formatter.format(value);

        let mut document = HelpDocument::new(key)
            .field("Default", or_fallback(fmt(&entry.default), "None"), false)
            .field(
                "Description",
                or_fallback(fmt(&entry.description), "No description provided."),
                false,
            );

        if let Some(examples) = bullet_list(entry.examples.iter().map(|example| fmt(example))) {
            document = document.field("Examples", examples, false);
        }

        if let Some(notes) = bullet_list(entry.notes.iter().map(|note| fmt(note))) {
            document = document.field("Notes", notes, false);
        }

        if let Some(image) = entry.image.as_deref() {
            document = document.image(fmt(image));
        }

        if let Some(thumbnail) = entry.thumbnail.as_deref() {
            document = document.thumbnail(fmt(thumbnail));
        }

        Ok(document)
    }
}
