use super::{
    strip_config_prefix,
    AuthorIdentity,
    BuildError,
    CommandResolver,
    ConfigDocumentBuilder,
    ConfigStore,
    HelpContext,
    HelpDocument,
    HelpDocumentBuilder,
    PlaceholderFormatter,
    RegistryEntry,
    CONFIG_PREFIX,
};
use std::time::Duration;
use tracing::{
    error,
    info,
    warn,
};

/// How long the operator's confirmation stays up
pub const CONFIRMATION_LIFETIME: Duration = Duration::from_secs(10);

/// How long until the operator's command message is removed
pub const INVOCATION_CLEANUP_DELAY: Duration = Duration::from_secs(15);

/// The messaging side of a support thread.
#[serenity::async_trait]
pub trait SupportThread: Send + Sync {
    /// The identity of the operator who invoked the relay
    fn operator(&self) -> AuthorIdentity;

    /// Send a message to the operator in the thread channel.
    async fn notify_operator(&self, content: &str) -> anyhow::Result<()>;

    /// Send a message to the operator that deletes itself after a delay.
    async fn notify_operator_transient(
        &self,
        content: &str,
        delete_after: Duration,
    ) -> anyhow::Result<()>;

    /// Reply to the recipient, logging the reply in the thread.
    async fn reply_in_thread(
        &self,
        content: &str,
        author: &AuthorIdentity,
        anonymous: bool,
    ) -> anyhow::Result<()>;

    /// Send a document to the recipient by DM.
    async fn send_to_recipient(&self, document: &HelpDocument) -> anyhow::Result<()>;

    /// Remove the operator's command message after a delay, if possible.
    ///
    /// Failures are not reported.
    fn schedule_invocation_cleanup(&self, delay: Duration);
}

/// Who the relayed help appears to come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMode {
    /// The operator's own identity
    Attributed,

    /// The fixed support agent persona
    Anonymous,
}

impl RelayMode {
    /// The name of the command that relays in this mode
    pub fn command_name(self) -> &'static str {
        match self {
            Self::Attributed => "rhelp",
            Self::Anonymous => "arhelp",
        }
    }

    pub fn is_anonymous(self) -> bool {
        matches!(self, Self::Anonymous)
    }
}

/// What is being relayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpKind {
    Command,
    Configuration,
}

impl HelpKind {
    /// Get a human readable name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command help",
            Self::Configuration => "configuration option help",
        }
    }
}

/// The result of a relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The document reached the recipient
    Delivered { kind: HelpKind, target: String },

    /// The identifier did not resolve to anything that can be documented
    NotFound { kind: HelpKind, target: String },

    /// The document could not be built
    RenderFailed { kind: HelpKind, target: String },

    /// Sending to the recipient failed
    DeliveryFailed { kind: HelpKind, target: String },
}

/// Relays command and configuration help to the recipient of a support thread.
#[derive(Debug)]
pub struct RelayDispatcher<'a, R: ?Sized> {
    resolver: &'a R,
    config_store: &'a ConfigStore,
    formatter: PlaceholderFormatter<'a>,
    prefix: &'a str,
    anonymous_identity: &'a AuthorIdentity,
}

impl<'a, R> RelayDispatcher<'a, R>
where
    R: CommandResolver + ?Sized,
{
    /// Make a new [`RelayDispatcher`].
    pub fn new(
        resolver: &'a R,
        config_store: &'a ConfigStore,
        formatter: PlaceholderFormatter<'a>,
        prefix: &'a str,
        anonymous_identity: &'a AuthorIdentity,
    ) -> Self {
        Self {
            resolver,
            config_store,
            formatter,
            prefix,
            anonymous_identity,
        }
    }

    /// Build the document for an identifier, without any author.
    fn build_document(&self, identifier: &str) -> (HelpKind, String, Result<HelpDocument, Rejection>) {
        if identifier.starts_with(CONFIG_PREFIX) {
            let key = strip_config_prefix(identifier).to_string();
            let result = ConfigDocumentBuilder::new(self.config_store, self.formatter)
                .build(identifier)
                .map_err(|error| match error {
                    BuildError::NotFound { identifier } => {
                        Rejection::NotFound(format!("Configuration key `{identifier}` not found."))
                    }
                    BuildError::RenderFailed { identifier } => Rejection::RenderFailed(format!(
                        "Something went wrong while generating the help embed for the configuration key `{identifier}`."
                    )),
                });
            return (HelpKind::Configuration, key, result);
        }

        let result = match self.resolver.find_command(identifier) {
            None => Err(Rejection::NotFound(format!(
                "Bot Command `{identifier}` not found."
            ))),
            Some(RegistryEntry::Category(_)) => Err(Rejection::NotFound(format!(
                "`{identifier}` is a command category, not a command."
            ))),
            Some(RegistryEntry::Command(_)) => {
                // Shared by both modes.
                let context = HelpContext::new(self.prefix, RelayMode::Attributed.command_name());
                HelpDocumentBuilder::new(self.resolver, context)
                    .build(identifier)
                    .map_err(|error| match error {
                        BuildError::NotFound { identifier } => Rejection::NotFound(format!(
                            "Bot Command `{identifier}` not found."
                        )),
                        BuildError::RenderFailed { identifier } => Rejection::RenderFailed(format!(
                            "Something went wrong while generating the help embed for the command `{identifier}`."
                        )),
                    })
            }
        };

        (HelpKind::Command, identifier.to_string(), result)
    }

    /// Relay help for an identifier to the thread recipient.
    ///
    /// The operator receives at most one message on failure.
    /// Nothing is retried.
    pub async fn dispatch<T>(&self, identifier: &str, mode: RelayMode, thread: &T) -> RelayOutcome
    where
        T: SupportThread + ?Sized,
    {
        let identifier = identifier.trim().to_lowercase();
        let (kind, target, result) = self.build_document(&identifier);

        let document = match result {
            Ok(document) => document,
            Err(rejection) => {
                let message = rejection.message();
                info!("not relaying {} for \"{target}\": {message}", kind.as_str());
                if let Err(error) = thread.notify_operator(message).await {
                    error!("failed to notify operator: {error:?}");
                }

                return match rejection {
                    Rejection::NotFound(_) => RelayOutcome::NotFound { kind, target },
                    Rejection::RenderFailed(_) => RelayOutcome::RenderFailed { kind, target },
                };
            }
        };

        let author = match mode {
            RelayMode::Attributed => thread.operator(),
            RelayMode::Anonymous => self.anonymous_identity.clone(),
        };
        let document = document.with_author(author.clone());

        let result: anyhow::Result<()> = async {
            let intro = format!(
                "Please read below, there you will find the {} for `{target}`:",
                kind.as_str()
            );
            thread
                .reply_in_thread(&intro, &author, mode.is_anonymous())
                .await?;
            thread.send_to_recipient(&document).await?;

            let confirmation = if mode.is_anonymous() {
                format!(
                    "{} for `{target}` sent anonymously to the user.",
                    capitalize(kind.as_str())
                )
            } else {
                format!("{} for `{target}` sent to the user.", capitalize(kind.as_str()))
            };
            thread
                .notify_operator_transient(&confirmation, CONFIRMATION_LIFETIME)
                .await?;

            Ok(())
        }
        .await;

        match result {
            Ok(()) => {
                thread.schedule_invocation_cleanup(INVOCATION_CLEANUP_DELAY);
                info!("relayed {} for \"{target}\" ({mode:?})", kind.as_str());
                RelayOutcome::Delivered { kind, target }
            }
            Err(error) => {
                warn!("failed to relay {} for \"{target}\": {error:?}", kind.as_str());
                let message = format!(
                    "Something failed during sending the {} to the user.",
                    kind.as_str()
                );
                if let Err(error) = thread.notify_operator(&message).await {
                    error!("failed to notify operator: {error:?}");
                }

                RelayOutcome::DeliveryFailed { kind, target }
            }
        }
    }
}

/// Why a document was not built, with the message for the operator
#[derive(Debug)]
enum Rejection {
    NotFound(String),
    RenderFailed(String),
}

impl Rejection {
    fn message(&self) -> &str {
        match self {
            Self::NotFound(message) | Self::RenderFailed(message) => message,
        }
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
