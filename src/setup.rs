use crate::config::{
    Config,
    Severity,
    ValidationMessage,
};
use anyhow::{
    ensure,
    Context,
};
use camino::Utf8Path;

/// Load a config.
///
/// This prints to the stderr directly.
/// It is intended to be called BEFORE the loggers are set up.
pub(crate) fn load_config(path: &Utf8Path) -> anyhow::Result<Config> {
    eprintln!("loading `{path}`...");
    let mut config =
        Config::load_from_path(path).with_context(|| format!("failed to load `{path}`"))?;

    eprintln!("validating config...");
    let messages = config.validate();
    for message in messages.iter() {
        match message.severity() {
            Severity::Warn => eprintln!("validation warning: {}", message.error()),
            Severity::Error => eprintln!("validation error: {}", message.error()),
        }
    }

    let (warn_count, error_count) = count_severities(&messages);
    ensure!(
        error_count == 0,
        "validation failed with {error_count} errors and {warn_count} warnings."
    );

    for line in describe_config(&config) {
        eprintln!("{line}");
    }

    Ok(config)
}

/// Count warnings and errors
fn count_severities(messages: &[ValidationMessage]) -> (usize, usize) {
    messages
        .iter()
        .fold((0, 0), |(warn, error), message| match message.severity() {
            Severity::Warn => (warn + 1, error),
            Severity::Error => (warn, error + 1),
        })
}

/// Summarize who can relay help and where config docs come from.
fn describe_config(config: &Config) -> Vec<String> {
    let permissions = &config.permissions;
    let configuration = &config.configuration;

    let schema = match configuration.schema.as_deref() {
        Some(path) => format!("`{path}`"),
        None => "built-in".to_string(),
    };
    let key_set = |keys: Option<&[String]>| match keys {
        Some(keys) => format!("{} configured", keys.len()),
        None => "default".to_string(),
    };

    vec![
        format!("using prefix \"{}\"", config.prefix()),
        format!(
            "permissions: {} owner(s), {} administrator(s), {} moderator(s), {} supporter(s)",
            permissions.owners.len(),
            permissions.administrators.len(),
            permissions.moderators.len(),
            permissions.supporters.len(),
        ),
        format!(
            "config docs: {schema} schema, {} public keys, {} protected keys",
            key_set(configuration.public_keys.as_deref()),
            key_set(configuration.protected_keys.as_deref()),
        ),
        format!("anonymous replies are sent as \"{}\"", config.anonymous.name),
    ]
}
