use super::{
    BuildError,
    CommandInfo,
    CommandResolver,
    HelpDocument,
    RegistryEntry,
    ResolvedCommand,
};

/// The max length of the rendered sub command list, in chars.
pub const SUB_COMMAND_LIST_LIMIT: usize = 1024;

const BRANCH_CONNECTOR: &str = "├─";
const TERMINAL_CONNECTOR: &str = "└─";

/// Where the help is being requested from.
#[derive(Debug, Clone, Copy)]
pub struct HelpContext<'a> {
    /// The prefix the operator used
    pub prefix: &'a str,

    /// The name of the relay command, used to explain how to get help for sub commands
    pub invocation: &'a str,
}

impl<'a> HelpContext<'a> {
    pub fn new(prefix: &'a str, invocation: &'a str) -> Self {
        Self { prefix, invocation }
    }
}

/// Builds help documents for registered commands.
#[derive(Debug)]
pub struct HelpDocumentBuilder<'a, R: ?Sized> {
    resolver: &'a R,
    context: HelpContext<'a>,
}

impl<'a, R> HelpDocumentBuilder<'a, R>
where
    R: CommandResolver + ?Sized,
{
    /// Make a new [`HelpDocumentBuilder`].
    pub fn new(resolver: &'a R, context: HelpContext<'a>) -> Self {
        Self { resolver, context }
    }

    /// Build the help document for a command.
    ///
    /// # Errors
    /// Returns [`BuildError::NotFound`] if the identifier does not name an invocable command,
    /// and [`BuildError::RenderFailed`] if the registry could not render its help.
    pub fn build(&self, identifier: &str) -> Result<HelpDocument, BuildError> {
        let command = match self.resolver.find_command(identifier) {
            Some(RegistryEntry::Command(command)) => command,
            Some(RegistryEntry::Category(_)) | None => {
                return Err(BuildError::NotFound {
                    identifier: identifier.to_string(),
                });
            }
        };

        let (document, permission_level) = self
            .resolver
            .render_help(command.info())
            .ok_or_else(|| BuildError::RenderFailed {
                identifier: identifier.to_string(),
            })?;

        let document = match &command {
            ResolvedCommand::Group { command, children } => {
                let mut visible = self.resolver.filter_visible(children);
                visible.sort_by(|a, b| a.name.cmp(&b.name));

                let mut document =
                    document.field("Permission Level", permission_level.as_str(), false);
                if !visible.is_empty() {
                    document = document.field(
                        "Sub Command(s)",
                        render_sub_command_list(&visible),
                        false,
                    );
                }

                document.footer(format!(
                    "Type \"{}{} {} <child>\" to relay the help for a sub command.",
                    self.context.prefix, self.context.invocation, command.qualified_name
                ))
            }
            ResolvedCommand::Command(_) => {
                document.footer(format!("Permission level: {permission_level}"))
            }
        };

        Ok(document)
    }
}

fn render_sub_command_line(connector: &str, command: &CommandInfo) -> String {
    if command.short_doc.is_empty() {
        format!("`{connector} {}`", command.name)
    } else {
        format!("`{connector} {}` - {}", command.name, command.short_doc)
    }
}

/// Render sub commands as a tree.
///
/// The output is limited to [`SUB_COMMAND_LIST_LIMIT`] chars.
/// Only whole lines are kept, and the last kept line always uses the terminal connector.
pub fn render_sub_command_list(commands: &[CommandInfo]) -> String {
    let mut output = String::new();
    let mut output_len = 0;
    let mut kept = 0;

    for (i, command) in commands.iter().enumerate() {
        let connector = if i + 1 == commands.len() {
            TERMINAL_CONNECTOR
        } else {
            BRANCH_CONNECTOR
        };
        let line = render_sub_command_line(connector, command);
        let line_len = line.chars().count() + usize::from(kept > 0);

        if output_len + line_len > SUB_COMMAND_LIST_LIMIT {
            break;
        }

        if kept > 0 {
            output.push('\n');
        }
        output.push_str(&line);
        output_len += line_len;
        kept += 1;
    }

    match (kept, commands.first()) {
        (0, Some(command)) => {
            // Not even one line fits.
            let line = render_sub_command_line(TERMINAL_CONNECTOR, command);
            output = super::truncate_chars(&line, SUB_COMMAND_LIST_LIMIT);
        }
        (kept, _) if kept < commands.len() => {
            let start = output.rfind('\n').map_or(0, |i| i + 1) + 1;
            output.replace_range(start..start + BRANCH_CONNECTOR.len(), TERMINAL_CONNECTOR);
        }
        _ => {}
    }

    output
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::help::{
        mock::{
            command_info,
            FakeRegistry,
        },
        PermissionLevel,
    };

    fn builder(registry: &FakeRegistry) -> HelpDocumentBuilder<'_, FakeRegistry> {
        HelpDocumentBuilder::new(registry, HelpContext::new("?", "rhelp"))
    }

    #[test]
    fn leaf_footer_is_permission_level() {
        let registry = FakeRegistry::new()
            .command(command_info("close", "Close the thread", PermissionLevel::Supporter))
            .command(command_info("ping", "Pong", PermissionLevel::Regular));

        let document = builder(&registry).build("close").expect("failed to build");
        assert_eq!(document.footer.as_deref(), Some("Permission level: Supporter"));
        assert!(document.get_field("Sub Command(s)").is_none());
        assert!(document.get_field("Permission Level").is_none());

        let document = builder(&registry).build("ping").expect("failed to build");
        assert_eq!(document.footer.as_deref(), Some("Permission level: Regular"));
    }

    #[test]
    fn group_renders_tree() {
        let registry = FakeRegistry::new().group(
            command_info("ban", "Ban users", PermissionLevel::Moderator),
            vec![
                command_info("remove", "Unban a user", PermissionLevel::Moderator),
                command_info("add", "Ban a user", PermissionLevel::Moderator),
            ],
        );

        let document = builder(&registry).build("ban").expect("failed to build");
        let list = &document
            .get_field("Sub Command(s)")
            .expect("missing sub commands")
            .value;
        let lines: Vec<&str> = list.lines().collect();
        assert_eq!(lines, ["`├─ add` - Ban a user", "`└─ remove` - Unban a user"]);

        let footer = document.footer.as_deref().expect("missing footer");
        assert!(footer.contains("rhelp ban <child>"), "{footer}");
        assert_eq!(
            document
                .get_field("Permission Level")
                .map(|field| field.value.as_str()),
            Some("Moderator")
        );
    }

    #[test]
    fn group_hides_invisible_children() {
        let mut hidden = command_info("secret", "Hidden", PermissionLevel::Owner);
        hidden.help_available = false;
        let registry = FakeRegistry::new().group(
            command_info("snippet", "Snippets", PermissionLevel::Supporter),
            vec![
                command_info("add", "Add a snippet", PermissionLevel::Supporter),
                hidden,
                command_info("remove", "Remove a snippet", PermissionLevel::Supporter),
            ],
        );

        let document = builder(&registry).build("snippet").expect("failed to build");
        let list = &document
            .get_field("Sub Command(s)")
            .expect("missing sub commands")
            .value;
        assert_eq!(list.lines().count(), 2);
        assert!(!list.contains("secret"));
        assert!(list.lines().last().expect("no lines").starts_with("`└─"));
    }

    #[test]
    fn tree_connectors() {
        for n in 1..30 {
            let children: Vec<_> = (0..n)
                .map(|i| command_info(&format!("sub{i:02}"), "Does a thing", PermissionLevel::Regular))
                .collect();
            let list = render_sub_command_list(&children);
            let lines: Vec<&str> = list.lines().collect();

            assert_eq!(lines.len(), n);
            assert!(list.chars().count() <= SUB_COMMAND_LIST_LIMIT);
            let (last, rest) = lines.split_last().expect("no lines");
            assert!(last.starts_with("`└─ "));
            assert!(rest.iter().all(|line| line.starts_with("`├─ ")));
        }
    }

    #[test]
    fn tree_truncates_on_line_boundaries() {
        let long_doc = "x".repeat(100);
        let children: Vec<_> = (0..40)
            .map(|i| command_info(&format!("sub{i:02}"), &long_doc, PermissionLevel::Regular))
            .collect();

        let list = render_sub_command_list(&children);
        assert!(list.chars().count() <= SUB_COMMAND_LIST_LIMIT);

        let lines: Vec<&str> = list.lines().collect();
        assert!(lines.len() < children.len());
        let (last, rest) = lines.split_last().expect("no lines");
        assert!(last.starts_with("`└─ "));
        assert!(last.ends_with(&long_doc));
        assert!(rest.iter().all(|line| line.starts_with("`├─ ")));
    }

    #[test]
    fn tree_truncates_single_huge_line() {
        let children = vec![command_info(
            "huge",
            &"y".repeat(5000),
            PermissionLevel::Regular,
        )];
        let list = render_sub_command_list(&children);
        assert_eq!(list.chars().count(), SUB_COMMAND_LIST_LIMIT);
        assert!(list.starts_with("`└─ huge`"));
    }

    #[test]
    fn unknown_and_category_are_not_found() {
        let registry = FakeRegistry::new()
            .command(command_info("close", "Close the thread", PermissionLevel::Supporter))
            .category("utility");

        let error = builder(&registry).build("unknownthing").unwrap_err();
        assert!(matches!(error, BuildError::NotFound { ref identifier } if identifier == "unknownthing"));

        let error = builder(&registry).build("utility").unwrap_err();
        assert!(matches!(error, BuildError::NotFound { .. }));
    }

    #[test]
    fn render_failure() {
        let registry = FakeRegistry::new()
            .command(command_info("broken", "Broken", PermissionLevel::Regular))
            .failing_render("broken");

        let error = builder(&registry).build("broken").unwrap_err();
        assert!(matches!(error, BuildError::RenderFailed { .. }));
    }

    #[test]
    fn build_is_idempotent() {
        let registry = FakeRegistry::new().group(
            command_info("ban", "Ban users", PermissionLevel::Moderator),
            vec![
                command_info("add", "Ban a user", PermissionLevel::Moderator),
                command_info("remove", "Unban a user", PermissionLevel::Moderator),
            ],
        );

        let builder = builder(&registry);
        let first = builder.build("ban").expect("failed to build");
        let second = builder.build("ban").expect("failed to build");
        assert_eq!(first, second);
    }
}
