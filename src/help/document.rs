use serenity::{
    builder::{
        CreateEmbed,
        CreateEmbedAuthor,
        CreateEmbedFooter,
    },
    model::Colour,
};

/// The max length of an embed field value, in chars.
pub const FIELD_VALUE_LIMIT: usize = 1024;

/// The name and icon shown as the author of a relayed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorIdentity {
    /// The display name
    pub name: String,

    /// The icon url
    pub icon_url: Option<String>,
}

impl AuthorIdentity {
    /// Make a new [`AuthorIdentity`].
    pub fn new(name: impl Into<String>, icon_url: Option<String>) -> Self {
        Self {
            name: name.into(),
            icon_url,
        }
    }

    /// Make an embed author from this identity.
    pub fn to_embed_author(&self) -> CreateEmbedAuthor {
        let author = CreateEmbedAuthor::new(self.name.as_str());
        match self.icon_url.as_deref() {
            Some(icon_url) => author.icon_url(icon_url),
            None => author,
        }
    }
}

/// A named field of a [`HelpDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// A rendered help document, sent to a thread recipient as an embed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelpDocument {
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<DocumentField>,
    pub footer: Option<String>,
    pub author: Option<AuthorIdentity>,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
}

impl HelpDocument {
    /// Make a new document with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(DocumentField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(url.into());
        self
    }

    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }

    /// Set the author identity.
    ///
    /// This is the only thing that differs between attributed and anonymous relays.
    pub fn with_author(mut self, author: AuthorIdentity) -> Self {
        self.author = Some(author);
        self
    }

    /// Get a field by name
    pub fn get_field(&self, name: &str) -> Option<&DocumentField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Convert this document into a serenity embed.
    ///
    /// Field values that are too long are cut down to [`FIELD_VALUE_LIMIT`].
    pub fn to_embed(&self, colour: Colour) -> CreateEmbed {
        let mut embed = CreateEmbed::new().title(self.title.as_str()).colour(colour);

        if let Some(description) = self.description.as_deref() {
            embed = embed.description(description);
        }

        for field in self.fields.iter() {
            embed = embed.field(
                field.name.as_str(),
                truncate_chars(&field.value, FIELD_VALUE_LIMIT),
                field.inline,
            );
        }

        if let Some(footer) = self.footer.as_deref() {
            embed = embed.footer(CreateEmbedFooter::new(footer));
        }

        if let Some(author) = self.author.as_ref() {
            embed = embed.author(author.to_embed_author());
        }

        if let Some(image) = self.image.as_deref() {
            embed = embed.image(image);
        }

        if let Some(thumbnail) = self.thumbnail.as_deref() {
            embed = embed.thumbnail(thumbnail);
        }

        embed
    }
}

/// Cut a string down to at most `limit` chars, marking the cut with an ellipsis.
pub fn truncate_chars(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }

    let mut truncated: String = value.chars().take(limit.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn with_author_only_touches_author() {
        let document = HelpDocument::new("ban")
            .description("Ban a user")
            .field("Permission Level", "Moderator", false)
            .footer("footer");

        let attributed = document
            .clone()
            .with_author(AuthorIdentity::new("operator", None));
        let anonymous = document.with_author(AuthorIdentity::new(
            "Support Agent",
            Some("https://example.com/icon.png".to_string()),
        ));

        assert_ne!(attributed.author, anonymous.author);
        assert_eq!(
            HelpDocument {
                author: None,
                ..attributed
            },
            HelpDocument {
                author: None,
                ..anonymous
            }
        );
    }

    #[test]
    fn truncate_chars_respects_limit() {
        assert_eq!(truncate_chars("short", 10), "short");

        let long = "├".repeat(2000);
        let truncated = truncate_chars(&long, FIELD_VALUE_LIMIT);
        assert_eq!(truncated.chars().count(), FIELD_VALUE_LIMIT);
        assert!(truncated.ends_with('…'));
    }
}
