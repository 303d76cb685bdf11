/// Substitutes `{prefix}` and `{bot}` in schema-authored text.
///
/// Unknown placeholders and stray braces are kept as written,
/// so formatting never fails. `{{` and `}}` produce literal braces.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderFormatter<'a> {
    prefix: &'a str,
    bot: &'a str,
}

impl<'a> PlaceholderFormatter<'a> {
    /// Make a new [`PlaceholderFormatter`].
    pub fn new(prefix: &'a str, bot: &'a str) -> Self {
        Self { prefix, bot }
    }

    fn lookup(&self, name: &str) -> Option<&'a str> {
        match name {
            "prefix" => Some(self.prefix),
            "bot" => Some(self.bot),
            _ => None,
        }
    }

    /// Format a template.
    pub fn format(&self, template: &str) -> String {
        let mut output = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(index) = rest.find(['{', '}']) {
            output.push_str(&rest[..index]);
            rest = &rest[index..];

            if rest.starts_with("{{") || rest.starts_with("}}") {
                output.push_str(&rest[..1]);
                rest = &rest[2..];
                continue;
            }

            if rest.starts_with('}') {
                output.push('}');
                rest = &rest[1..];
                continue;
            }

            // `rest` starts with a single `{`.
            let replacement = rest[1..].find(['{', '}']).and_then(|end| {
                let end = end + 1;
                if !rest[end..].starts_with('}') {
                    return None;
                }

                let value = self.lookup(&rest[1..end])?;
                Some((value, end + 1))
            });

            match replacement {
                Some((value, consumed)) => {
                    output.push_str(value);
                    rest = &rest[consumed..];
                }
                None => {
                    output.push('{');
                    rest = &rest[1..];
                }
            }
        }

        output.push_str(rest);
        output
    }
}
