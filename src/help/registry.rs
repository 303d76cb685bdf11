use super::HelpDocument;
use std::fmt::Display;

/// The permission level needed to run a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PermissionLevel {
    Regular,
    Supporter,
    Moderator,
    Administrator,
    Owner,
}

impl PermissionLevel {
    /// Get the level that a framework check with the given name requires, if any.
    pub fn from_check_name(name: &str) -> Option<Self> {
        match name {
            "Regular" => Some(Self::Regular),
            "Supporter" => Some(Self::Supporter),
            "Moderator" => Some(Self::Moderator),
            "Administrator" => Some(Self::Administrator),
            "Owner" => Some(Self::Owner),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "Regular",
            Self::Supporter => "Supporter",
            Self::Moderator => "Moderator",
            Self::Administrator => "Administrator",
            Self::Owner => "Owner",
        }
    }
}

impl Display for PermissionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A snapshot of a registered command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    /// The primary name
    pub name: String,

    /// The space-separated path of names from the top level command
    pub qualified_name: String,

    /// Other names this command answers to
    pub aliases: Vec<String>,

    /// The first line of the description
    pub short_doc: String,

    /// The full description
    pub description: String,

    pub usage: Option<String>,
    pub examples: Vec<String>,

    /// The level needed to run this command
    pub permission_level: PermissionLevel,

    /// Whether this command is listed in help output
    pub help_available: bool,
}

/// A command resolved from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedCommand {
    /// A command without sub commands
    Command(CommandInfo),

    /// A command with sub commands, in registration order
    Group {
        command: CommandInfo,
        children: Vec<CommandInfo>,
    },
}

impl ResolvedCommand {
    /// Get the info of the command itself
    pub fn info(&self) -> &CommandInfo {
        match self {
            Self::Command(command) | Self::Group { command, .. } => command,
        }
    }
}

/// The result of a registry lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEntry {
    /// Something that can be invoked
    Command(ResolvedCommand),

    /// A named grouping of commands, which cannot be invoked itself
    Category(String),
}

/// Read-only access to the host's command registry.
pub trait CommandResolver: Send + Sync {
    /// Look up a command by its (possibly space-separated) name.
    fn find_command(&self, name: &str) -> Option<RegistryEntry>;

    /// Render the host's own help document for a command, along with its permission level.
    ///
    /// Returns `None` if the host fails to render help for this command.
    fn render_help(&self, command: &CommandInfo) -> Option<(HelpDocument, PermissionLevel)>;

    /// Filter sub commands down to the ones that would show up in the host's help.
    fn filter_visible(&self, children: &[CommandInfo]) -> Vec<CommandInfo>;
}
