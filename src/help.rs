//! Building help documents for commands and configuration keys,
//! and relaying them to the recipient of a support thread.

pub mod command_help;
pub mod config_help;
pub mod document;
pub mod formatter;
pub mod framework_registry;
#[cfg(test)]
pub(crate) mod mock;
pub mod registry;
pub mod relay;

pub use self::{
    command_help::{
        render_sub_command_list,
        HelpContext,
        HelpDocumentBuilder,
    },
    config_help::{
        strip_config_prefix,
        ConfigDocumentBuilder,
        ConfigSchemaEntry,
        ConfigStore,
        CONFIG_PREFIX,
    },
    document::{
        truncate_chars,
        AuthorIdentity,
        DocumentField,
        HelpDocument,
    },
    formatter::PlaceholderFormatter,
    framework_registry::FrameworkRegistry,
    registry::{
        CommandInfo,
        CommandResolver,
        PermissionLevel,
        RegistryEntry,
        ResolvedCommand,
    },
    relay::{
        HelpKind,
        RelayDispatcher,
        RelayMode,
        RelayOutcome,
        SupportThread,
    },
};

/// An error building a help document
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The identifier does not name anything that can be documented
    #[error("`{identifier}` not found")]
    NotFound { identifier: String },

    /// The host failed to render help
    #[error("failed to render help for `{identifier}`")]
    RenderFailed { identifier: String },
}
