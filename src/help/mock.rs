//! Fakes for testing help building and relaying without discord.

use super::{
    AuthorIdentity,
    CommandInfo,
    CommandResolver,
    HelpDocument,
    PermissionLevel,
    RegistryEntry,
    ResolvedCommand,
    SupportThread,
};
use anyhow::bail;
use parking_lot::Mutex;
use std::{
    collections::HashSet,
    time::Duration,
};

pub(crate) fn command_info(name: &str, short_doc: &str, level: PermissionLevel) -> CommandInfo {
    CommandInfo {
        name: name.to_string(),
        qualified_name: name.to_string(),
        aliases: Vec::new(),
        short_doc: short_doc.to_string(),
        description: format!("{short_doc}\n\nMore details."),
        usage: None,
        examples: Vec::new(),
        permission_level: level,
        help_available: true,
    }
}

/// A fixed command registry
#[derive(Debug, Default)]
pub(crate) struct FakeRegistry {
    entries: Vec<(String, RegistryEntry)>,
    failing_render: HashSet<String>,
}

impl FakeRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn command(mut self, command: CommandInfo) -> Self {
        self.entries.push((
            command.qualified_name.clone(),
            RegistryEntry::Command(ResolvedCommand::Command(command)),
        ));
        self
    }

    pub(crate) fn group(mut self, command: CommandInfo, children: Vec<CommandInfo>) -> Self {
        let children: Vec<_> = children
            .into_iter()
            .map(|mut child| {
                child.qualified_name = format!("{} {}", command.qualified_name, child.name);
                child
            })
            .collect();
        for child in children.iter() {
            self.entries.push((
                child.qualified_name.clone(),
                RegistryEntry::Command(ResolvedCommand::Command(child.clone())),
            ));
        }

        self.entries.push((
            command.qualified_name.clone(),
            RegistryEntry::Command(ResolvedCommand::Group { command, children }),
        ));
        self
    }

    pub(crate) fn category(mut self, name: &str) -> Self {
        self.entries
            .push((name.to_string(), RegistryEntry::Category(name.to_string())));
        self
    }

    pub(crate) fn failing_render(mut self, name: &str) -> Self {
        self.failing_render.insert(name.to_string());
        self
    }
}

impl CommandResolver for FakeRegistry {
    fn find_command(&self, name: &str) -> Option<RegistryEntry> {
        self.entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, entry)| entry.clone())
    }

    fn render_help(&self, command: &CommandInfo) -> Option<(HelpDocument, PermissionLevel)> {
        if self.failing_render.contains(&command.qualified_name) {
            return None;
        }

        let document = HelpDocument::new(format!("`?{}`", command.qualified_name))
            .description(command.description.as_str());
        Some((document, command.permission_level))
    }

    fn filter_visible(&self, children: &[CommandInfo]) -> Vec<CommandInfo> {
        children
            .iter()
            .filter(|child| child.help_available)
            .cloned()
            .collect()
    }
}

/// Something that happened to a [`FakeThread`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ThreadEvent {
    Operator(String),
    Transient(String, Duration),
    Reply {
        content: String,
        author: AuthorIdentity,
        anonymous: bool,
    },
    Recipient(HelpDocument),
    Cleanup(Duration),
}

/// A support thread that records everything sent through it.
#[derive(Debug)]
pub(crate) struct FakeThread {
    operator: AuthorIdentity,
    fail_delivery: bool,
    events: Mutex<Vec<ThreadEvent>>,
}

impl FakeThread {
    pub(crate) fn new() -> Self {
        Self {
            operator: AuthorIdentity::new(
                "operator",
                Some("https://cdn.example.com/operator.png".to_string()),
            ),
            fail_delivery: false,
            events: Mutex::new(Vec::new()),
        }
    }

    /// Make every send to the recipient fail.
    pub(crate) fn failing() -> Self {
        Self {
            fail_delivery: true,
            ..Self::new()
        }
    }

    pub(crate) fn events(&self) -> Vec<ThreadEvent> {
        self.events.lock().clone()
    }

    pub(crate) fn operator_messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ThreadEvent::Operator(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn recipient_documents(&self) -> Vec<HelpDocument> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ThreadEvent::Recipient(document) => Some(document),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ThreadEvent) {
        self.events.lock().push(event);
    }
}

#[serenity::async_trait]
impl SupportThread for FakeThread {
    fn operator(&self) -> AuthorIdentity {
        self.operator.clone()
    }

    async fn notify_operator(&self, content: &str) -> anyhow::Result<()> {
        self.push(ThreadEvent::Operator(content.to_string()));
        Ok(())
    }

    async fn notify_operator_transient(
        &self,
        content: &str,
        delete_after: Duration,
    ) -> anyhow::Result<()> {
        self.push(ThreadEvent::Transient(content.to_string(), delete_after));
        Ok(())
    }

    async fn reply_in_thread(
        &self,
        content: &str,
        author: &AuthorIdentity,
        anonymous: bool,
    ) -> anyhow::Result<()> {
        if self.fail_delivery {
            bail!("recipient unreachable");
        }

        self.push(ThreadEvent::Reply {
            content: content.to_string(),
            author: author.clone(),
            anonymous,
        });
        Ok(())
    }

    async fn send_to_recipient(&self, document: &HelpDocument) -> anyhow::Result<()> {
        if self.fail_delivery {
            bail!("recipient unreachable");
        }

        self.push(ThreadEvent::Recipient(document.clone()));
        Ok(())
    }

    fn schedule_invocation_cleanup(&self, delay: Duration) {
        self.push(ThreadEvent::Cleanup(delay));
    }
}
