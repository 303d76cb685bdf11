use crate::{
    config::Config,
    help::{
        ConfigStore,
        FrameworkRegistry,
    },
};
use anyhow::Context;
use serenity::framework::standard::{
    CommandGroup,
    HelpCommand,
};
use std::sync::Arc;

/// The [`ClientData`].
#[derive(Debug)]
pub struct ClientData {
    /// The config
    pub config: Arc<Config>,

    /// The documented configuration keys
    pub config_store: Arc<ConfigStore>,

    /// The registered commands
    pub registry: Arc<FrameworkRegistry>,
}

impl ClientData {
    /// Init this client data
    pub fn init(
        config: Arc<Config>,
        groups: &[&'static CommandGroup],
        help: &'static HelpCommand,
    ) -> anyhow::Result<Self> {
        let configuration = &config.configuration;
        let config_store = ConfigStore::load(
            configuration.schema.as_deref(),
            configuration.public_keys.as_deref(),
            configuration.protected_keys.as_deref(),
        )
        .context("failed to load config schema")?;
        let registry = FrameworkRegistry::new(groups, config.prefix()).with_help(help);

        Ok(ClientData {
            config,
            config_store: Arc::new(config_store),
            registry: Arc::new(registry),
        })
    }
}
