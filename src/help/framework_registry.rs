use super::{
    CommandInfo,
    CommandResolver,
    HelpDocument,
    PermissionLevel,
    RegistryEntry,
    ResolvedCommand,
};
use serenity::framework::standard::{
    Check,
    Command,
    CommandGroup,
    HelpCommand,
};

const HELP_COMMAND_DESCRIPTION: &str =
    "Shows the list of commands, or the details of a single command.";
const HELP_COMMAND_USAGE: &str = "[command]";

/// A [`CommandResolver`] over the standard framework's command groups.
///
/// Group names and group prefixes are categories.
/// The permission level of a command comes from the names of its checks and the checks of its groups.
/// The framework's help command, if registered, resolves as an ungrouped leaf command.
#[derive(Clone)]
pub struct FrameworkRegistry {
    groups: Vec<&'static CommandGroup>,
    help: Option<&'static HelpCommand>,
    prefix: String,
}

impl std::fmt::Debug for FrameworkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let group_names: Vec<&str> = self.groups.iter().map(|group| group.name).collect();
        f.debug_struct("FrameworkRegistry")
            .field("groups", &group_names)
            .field("help", &self.help.map(|help| help.options.names))
            .field("prefix", &self.prefix)
            .finish()
    }
}

fn matches_name(command: &Command, name: &str) -> bool {
    command
        .options
        .names
        .iter()
        .any(|command_name| command_name.eq_ignore_ascii_case(name))
}

fn checks_level(checks: &[&Check]) -> Option<PermissionLevel> {
    checks
        .iter()
        .filter_map(|check| PermissionLevel::from_check_name(check.name))
        .max()
}

fn command_info(command: &Command, path: &[String], inherited: PermissionLevel) -> CommandInfo {
    let options = command.options;
    let name = options.names.first().copied().unwrap_or_default().to_string();
    let aliases = options
        .names
        .iter()
        .skip(1)
        .map(|alias| alias.to_string())
        .collect();
    let description = options.desc.unwrap_or_default().to_string();
    let short_doc = description.lines().next().unwrap_or_default().to_string();

    let mut permission_level = checks_level(options.checks)
        .map_or(inherited, |level| level.max(inherited));
    if options.owners_only {
        permission_level = PermissionLevel::Owner;
    }

    let mut qualified_name = path.join(" ");
    if !qualified_name.is_empty() {
        qualified_name.push(' ');
    }
    qualified_name.push_str(&name);

    CommandInfo {
        name,
        qualified_name,
        aliases,
        short_doc,
        description,
        usage: options.usage.map(String::from),
        examples: options.examples.iter().map(|example| example.to_string()).collect(),
        permission_level,
        help_available: options.help_available,
    }
}

impl FrameworkRegistry {
    /// Make a new [`FrameworkRegistry`].
    pub fn new(groups: &[&'static CommandGroup], prefix: impl Into<String>) -> Self {
        Self {
            groups: groups.to_vec(),
            help: None,
            prefix: prefix.into(),
        }
    }

    /// Also resolve the framework's help command.
    pub fn with_help(mut self, help: &'static HelpCommand) -> Self {
        self.help = Some(help);
        self
    }

    fn help_info(help: &HelpCommand) -> CommandInfo {
        let mut names = help.options.names.iter().map(|name| name.to_string());
        let name = names.next().unwrap_or_else(|| "help".to_string());

        CommandInfo {
            qualified_name: name.clone(),
            name,
            aliases: names.collect(),
            short_doc: HELP_COMMAND_DESCRIPTION.to_string(),
            description: HELP_COMMAND_DESCRIPTION.to_string(),
            usage: Some(HELP_COMMAND_USAGE.to_string()),
            examples: Vec::new(),
            permission_level: PermissionLevel::Regular,
            help_available: true,
        }
    }

    fn find_help(&self, tokens: &[&str]) -> Option<RegistryEntry> {
        let help = self.help?;
        let [token] = tokens else {
            return None;
        };

        let info = Self::help_info(help);
        let matches = std::iter::once(&info.name)
            .chain(info.aliases.iter())
            .any(|name| name.eq_ignore_ascii_case(token));

        matches.then(|| RegistryEntry::Command(ResolvedCommand::Command(info)))
    }

    fn resolve_command(
        command: &'static Command,
        rest: &[&str],
        path: &[String],
        inherited: PermissionLevel,
    ) -> Option<RegistryEntry> {
        let mut command = command;
        let mut path = path.to_vec();
        let mut inherited = inherited;

        for token in rest {
            let info = command_info(command, &path, inherited);
            let sub_command = command
                .options
                .sub_commands
                .iter()
                .copied()
                .find(|sub_command| matches_name(sub_command, token))?;

            path.push(info.name);
            inherited = info.permission_level;
            command = sub_command;
        }

        let info = command_info(command, &path, inherited);
        if command.options.sub_commands.is_empty() {
            return Some(RegistryEntry::Command(ResolvedCommand::Command(info)));
        }

        path.push(info.name.clone());
        let children = command
            .options
            .sub_commands
            .iter()
            .map(|sub_command| command_info(sub_command, &path, info.permission_level))
            .collect();

        Some(RegistryEntry::Command(ResolvedCommand::Group {
            command: info,
            children,
        }))
    }

    fn find_in_group(
        group: &'static CommandGroup,
        tokens: &[&str],
        path: &[String],
        inherited: PermissionLevel,
    ) -> Option<RegistryEntry> {
        let options = group.options;
        let inherited = checks_level(options.checks).map_or(inherited, |level| level.max(inherited));

        let mut path = path.to_vec();
        let tokens = if options.prefixes.is_empty() {
            tokens
        } else {
            let (first, rest) = tokens.split_first()?;
            let prefix = options
                .prefixes
                .iter()
                .find(|prefix| prefix.eq_ignore_ascii_case(first))?;

            if rest.is_empty() {
                return Some(RegistryEntry::Category(group.name.to_string()));
            }

            path.push(prefix.to_string());
            rest
        };

        let (first, rest) = tokens.split_first()?;
        if let Some(command) = options
            .commands
            .iter()
            .copied()
            .find(|command| matches_name(command, first))
        {
            return Self::resolve_command(command, rest, &path, inherited);
        }

        options
            .sub_groups
            .iter()
            .copied()
            .find_map(|sub_group| Self::find_in_group(sub_group, tokens, &path, inherited))
    }

    fn find_category(groups: &[&'static CommandGroup], name: &str) -> Option<&'static str> {
        groups.iter().find_map(|group| {
            if group.name.eq_ignore_ascii_case(name) {
                Some(group.name)
            } else {
                Self::find_category(group.options.sub_groups, name)
            }
        })
    }
}

impl CommandResolver for FrameworkRegistry {
    fn find_command(&self, name: &str) -> Option<RegistryEntry> {
        let tokens: Vec<&str> = name.split_whitespace().collect();
        if tokens.is_empty() {
            return None;
        }

        self.groups
            .iter()
            .copied()
            .find_map(|group| Self::find_in_group(group, &tokens, &[], PermissionLevel::Regular))
            .or_else(|| self.find_help(&tokens))
            .or_else(|| {
                Self::find_category(&self.groups, name.trim())
                    .map(|category| RegistryEntry::Category(category.to_string()))
            })
    }

    fn render_help(&self, command: &CommandInfo) -> Option<(HelpDocument, PermissionLevel)> {
        if command.name.is_empty() {
            return None;
        }

        let title = match command.usage.as_deref() {
            Some(usage) => format!("`{}{} {usage}`", self.prefix, command.qualified_name),
            None => format!("`{}{}`", self.prefix, command.qualified_name),
        };
        let description = if command.description.is_empty() {
            "No description provided."
        } else {
            command.description.as_str()
        };

        let mut document = HelpDocument::new(title).description(description);

        if !command.aliases.is_empty() {
            let aliases = command
                .aliases
                .iter()
                .map(|alias| format!("`{alias}`"))
                .collect::<Vec<_>>()
                .join(", ");
            document = document.field("Aliases", aliases, false);
        }

        if !command.examples.is_empty() {
            let examples = command
                .examples
                .iter()
                .map(|example| format!("`{}{} {example}`", self.prefix, command.qualified_name))
                .collect::<Vec<_>>()
                .join("\n");
            document = document.field("Example(s)", examples, false);
        }

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

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        commands::{
            ARHELP_COMMAND,
            RHELP_COMMAND,
        },
        help::{
            mock::FakeThread,
            AuthorIdentity,
            ConfigStore,
            HelpContext,
            HelpDocumentBuilder,
            HelpKind,
            PlaceholderFormatter,
            RelayDispatcher,
            RelayMode,
            RelayOutcome,
        },
        HELP,
        SUPPORT_GROUP,
    };

    #[allow(unreachable_pub)]
    mod moderation {
        use serenity::{
            client::Context,
            framework::standard::{
                macros::{
                    check,
                    command,
                    group,
                },
                Args,
                CommandOptions,
                CommandResult,
                Reason,
            },
            model::prelude::*,
        };

        #[check]
        #[name("Moderator")]
        async fn moderator_check(
            _ctx: &Context,
            _msg: &Message,
            _args: &mut Args,
            _opts: &CommandOptions,
        ) -> Result<(), Reason> {
            Ok(())
        }

        #[command]
        #[description("Ban users")]
        #[sub_commands(remove, add, secret)]
        async fn ban(_ctx: &Context, _msg: &Message, _args: Args) -> CommandResult {
            Ok(())
        }

        #[command]
        #[description("Ban a user")]
        async fn add(_ctx: &Context, _msg: &Message, _args: Args) -> CommandResult {
            Ok(())
        }

        #[command]
        #[description("Unban a user")]
        async fn remove(_ctx: &Context, _msg: &Message, _args: Args) -> CommandResult {
            Ok(())
        }

        #[command]
        #[description("Ban a user without telling anyone")]
        #[help_available(false)]
        async fn secret(_ctx: &Context, _msg: &Message, _args: Args) -> CommandResult {
            Ok(())
        }

        #[command]
        #[description("Stop the bot")]
        #[owners_only]
        async fn shutdown(_ctx: &Context, _msg: &Message, _args: Args) -> CommandResult {
            Ok(())
        }

        #[command]
        #[description("Delete recent messages")]
        async fn purge(_ctx: &Context, _msg: &Message, _args: Args) -> CommandResult {
            Ok(())
        }

        #[group]
        #[commands(purge)]
        struct Tools;

        #[group]
        #[prefixes("mod")]
        #[checks(Moderator)]
        #[commands(ban, shutdown)]
        #[sub_groups(Tools)]
        pub struct Moderation;
    }

    use self::moderation::MODERATION_GROUP;

    fn registry() -> FrameworkRegistry {
        FrameworkRegistry::new(&[&SUPPORT_GROUP], "?")
    }

    fn full_registry() -> FrameworkRegistry {
        FrameworkRegistry::new(&[&SUPPORT_GROUP, &MODERATION_GROUP], "?").with_help(&HELP)
    }

    fn leaf(registry: &FrameworkRegistry, name: &str) -> CommandInfo {
        match registry.find_command(name) {
            Some(RegistryEntry::Command(ResolvedCommand::Command(command))) => command,
            entry => panic!("unexpected entry for \"{name}\": {entry:?}"),
        }
    }

    #[test]
    fn finds_relay_commands() {
        let registry = registry();

        for name in ["rhelp", "arhelp", "RHelp"] {
            let command = leaf(&registry, name);
            assert_eq!(command.permission_level, PermissionLevel::Supporter);
            assert!(command.help_available);
        }
    }

    #[test]
    fn relay_commands_look_up_the_thread_in_the_body() {
        for command in [&RHELP_COMMAND, &ARHELP_COMMAND] {
            let checks: Vec<&str> = command.options.checks.iter().map(|check| check.name).collect();
            assert_eq!(checks, ["Supporter"]);
        }
    }

    #[test]
    fn group_name_is_category() {
        let registry = registry();
        assert_eq!(
            registry.find_command("support"),
            Some(RegistryEntry::Category("Support".to_string()))
        );
    }

    #[test]
    fn unknown_is_none() {
        let registry = full_registry();
        assert_eq!(registry.find_command("unknownthing"), None);
        assert_eq!(registry.find_command("rhelp nope"), None);
        assert_eq!(registry.find_command("help rhelp"), None);
        assert_eq!(registry.find_command("   "), None);

        // Prefixed commands need their prefix.
        assert_eq!(registry.find_command("ban"), None);
    }

    #[test]
    fn renders_native_help() {
        let registry = registry();
        let command = leaf(&registry, "rhelp");
        let (document, level) = registry.render_help(&command).expect("failed to render");

        assert_eq!(level, PermissionLevel::Supporter);
        assert!(document.title.starts_with("`?rhelp"));
        assert!(document.description.is_some());
        assert!(document.get_field("Example(s)").is_some());
    }

    #[test]
    fn help_command_resolves() {
        let registry = full_registry();
        let command = leaf(&registry, "HELP");

        assert_eq!(command.name, "help");
        assert_eq!(command.permission_level, PermissionLevel::Regular);

        let (document, _level) = registry.render_help(&command).expect("failed to render");
        assert_eq!(document.title, "`?help [command]`");

        assert_eq!(self::registry().find_command("help"), None);
    }

    #[tokio::test]
    async fn help_command_is_relayed() {
        let registry = full_registry();
        let store = ConfigStore::default();
        let persona = AuthorIdentity::new("Support Agent", None);
        let thread = FakeThread::new();

        let outcome = RelayDispatcher::new(
            &registry,
            &store,
            PlaceholderFormatter::new("?", "Modbot"),
            "?",
            &persona,
        )
        .dispatch("help", RelayMode::Attributed, &thread)
        .await;

        assert_eq!(
            outcome,
            RelayOutcome::Delivered {
                kind: HelpKind::Command,
                target: "help".to_string()
            }
        );
        assert!(thread.operator_messages().is_empty());
        assert_eq!(thread.recipient_documents().len(), 1);
    }

    #[test]
    fn group_prefix_is_category() {
        let registry = full_registry();

        for name in ["mod", "MOD", "moderation"] {
            assert_eq!(
                registry.find_command(name),
                Some(RegistryEntry::Category("Moderation".to_string())),
                "{name}"
            );
        }
        assert_eq!(
            registry.find_command("tools"),
            Some(RegistryEntry::Category("Tools".to_string()))
        );
    }

    #[test]
    fn sub_command_tree() {
        let registry = full_registry();
        let (command, children) = match registry.find_command("mod ban") {
            Some(RegistryEntry::Command(ResolvedCommand::Group { command, children })) => {
                (command, children)
            }
            entry => panic!("unexpected entry {entry:?}"),
        };

        assert_eq!(command.qualified_name, "mod ban");
        assert_eq!(command.permission_level, PermissionLevel::Moderator);
        assert_eq!(children.len(), 3);
        assert!(children
            .iter()
            .all(|child| child.permission_level == PermissionLevel::Moderator));

        let mut visible: Vec<String> = registry
            .filter_visible(&children)
            .into_iter()
            .map(|child| child.qualified_name)
            .collect();
        visible.sort();
        assert_eq!(visible, ["mod ban add", "mod ban remove"]);

        let document = HelpDocumentBuilder::new(&registry, HelpContext::new("?", "rhelp"))
            .build("mod ban")
            .expect("failed to build");
        assert_eq!(
            document
                .get_field("Sub Command(s)")
                .map(|field| field.value.as_str()),
            Some("`├─ add` - Ban a user\n`└─ remove` - Unban a user")
        );
        assert_eq!(
            document
                .get_field("Permission Level")
                .map(|field| field.value.as_str()),
            Some("Moderator")
        );
        assert_eq!(
            document.footer.as_deref(),
            Some("Type \"?rhelp mod ban <child>\" to relay the help for a sub command.")
        );
    }

    #[test]
    fn sub_command_leaf() {
        let registry = full_registry();
        let command = leaf(&registry, "mod ban add");

        assert_eq!(command.qualified_name, "mod ban add");
        assert_eq!(command.short_doc, "Ban a user");
        assert_eq!(command.permission_level, PermissionLevel::Moderator);

        let hidden = leaf(&registry, "mod ban secret");
        assert!(!hidden.help_available);
    }

    #[test]
    fn owners_only_is_owner() {
        let registry = full_registry();
        let command = leaf(&registry, "mod shutdown");
        assert_eq!(command.permission_level, PermissionLevel::Owner);
    }

    #[test]
    fn sub_groups_inherit_prefix_and_level() {
        let registry = full_registry();
        let command = leaf(&registry, "mod purge");

        assert_eq!(command.qualified_name, "mod purge");
        assert_eq!(command.permission_level, PermissionLevel::Moderator);
    }
}
