use crate::help::{
    AuthorIdentity,
    HelpDocument,
    SupportThread,
};
use anyhow::Context as _;
use once_cell::sync::Lazy;
use regex::Regex;
use serenity::{
    builder::{
        CreateEmbed,
        CreateEmbedFooter,
        CreateMessage,
    },
    client::Context,
    http::Http,
    model::{
        prelude::*,
        Colour,
    },
};
use std::{
    sync::Arc,
    time::Duration,
};
use tracing::debug;

/// Thread channels carry their recipient in the topic.
static RECIPIENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"User ID:\s*(\d+)").expect("invalid recipient regex"));

/// Parse the recipient of a thread from a channel topic.
pub fn parse_topic_recipient(topic: &str) -> Option<UserId> {
    let captures = RECIPIENT_REGEX.captures(topic)?;
    let id: u64 = captures.get(1)?.as_str().parse().ok()?;
    if id == 0 {
        return None;
    }

    Some(UserId::new(id))
}

/// Find the recipient of the thread in a channel, if the channel is a thread.
async fn find_recipient(ctx: &Context, channel_id: ChannelId) -> anyhow::Result<Option<UserId>> {
    let channel = channel_id
        .to_channel(ctx)
        .await
        .context("failed to get channel")?;

    Ok(match channel {
        Channel::Guild(channel) => channel.topic.as_deref().and_then(parse_topic_recipient),
        _ => None,
    })
}

fn bot_can_manage_messages(ctx: &Context, msg: &Message) -> bool {
    let bot_id = ctx.cache.current_user().id;
    msg.guild(&ctx.cache).map_or(false, |guild| {
        match (guild.channels.get(&msg.channel_id), guild.members.get(&bot_id)) {
            (Some(channel), Some(member)) => guild.user_permissions_in(channel, member).manage_messages(),
            _ => false,
        }
    })
}

fn spawn_delayed_delete(http: Arc<Http>, channel_id: ChannelId, message_id: MessageId, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(error) = channel_id.delete_message(&http, message_id).await {
            debug!("failed to delete message {message_id} in {channel_id}: {error}");
        }
    });
}

/// A support thread, backed by discord.
pub struct SerenityThread {
    http: Arc<Http>,
    channel_id: ChannelId,
    message_id: MessageId,
    recipient: UserId,
    operator: AuthorIdentity,
    colour: Colour,
    can_manage_messages: bool,
}

impl std::fmt::Debug for SerenityThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerenityThread")
            .field("channel_id", &self.channel_id)
            .field("message_id", &self.message_id)
            .field("recipient", &self.recipient)
            .field("operator", &self.operator)
            .field("can_manage_messages", &self.can_manage_messages)
            .finish()
    }
}

impl SerenityThread {
    /// Get the thread that a message was sent in.
    ///
    /// Returns `None` if the message was not sent in a thread channel.
    pub async fn locate(ctx: &Context, msg: &Message, colour: Colour) -> anyhow::Result<Option<Self>> {
        let recipient = match find_recipient(ctx, msg.channel_id).await? {
            Some(recipient) => recipient,
            None => return Ok(None),
        };

        let operator_name = msg
            .author
            .global_name
            .clone()
            .unwrap_or_else(|| msg.author.name.clone());

        Ok(Some(Self {
            http: ctx.http.clone(),
            channel_id: msg.channel_id,
            message_id: msg.id,
            recipient,
            operator: AuthorIdentity::new(operator_name, Some(msg.author.face())),
            colour,
            can_manage_messages: bot_can_manage_messages(ctx, msg),
        }))
    }

    fn reply_embed(&self, content: &str, author: &AuthorIdentity, footer: &str) -> CreateEmbed {
        CreateEmbed::new()
            .description(content)
            .author(author.to_embed_author())
            .footer(CreateEmbedFooter::new(footer))
            .colour(self.colour)
    }
}

#[serenity::async_trait]
impl SupportThread for SerenityThread {
    fn operator(&self) -> AuthorIdentity {
        self.operator.clone()
    }

    async fn notify_operator(&self, content: &str) -> anyhow::Result<()> {
        self.channel_id
            .say(&self.http, content)
            .await
            .context("failed to send message to thread channel")?;
        Ok(())
    }

    async fn notify_operator_transient(
        &self,
        content: &str,
        delete_after: Duration,
    ) -> anyhow::Result<()> {
        let message = self
            .channel_id
            .say(&self.http, content)
            .await
            .context("failed to send message to thread channel")?;
        spawn_delayed_delete(self.http.clone(), self.channel_id, message.id, delete_after);
        Ok(())
    }

    async fn reply_in_thread(
        &self,
        content: &str,
        author: &AuthorIdentity,
        anonymous: bool,
    ) -> anyhow::Result<()> {
        let embed = self.reply_embed(content, author, "Response");
        self.recipient
            .direct_message(&self.http, CreateMessage::new().embed(embed))
            .await
            .context("failed to reply to recipient")?;

        let footer = if anonymous { "Anonymous Reply" } else { "Reply" };
        let embed = self.reply_embed(content, author, footer);
        self.channel_id
            .send_message(&self.http, CreateMessage::new().embed(embed))
            .await
            .context("failed to log reply in thread channel")?;

        Ok(())
    }

    async fn send_to_recipient(&self, document: &HelpDocument) -> anyhow::Result<()> {
        self.recipient
            .direct_message(
                &self.http,
                CreateMessage::new().embed(document.to_embed(self.colour)),
            )
            .await
            .context("failed to send document to recipient")?;
        Ok(())
    }

    fn schedule_invocation_cleanup(&self, delay: Duration) {
        if self.can_manage_messages {
            spawn_delayed_delete(self.http.clone(), self.channel_id, self.message_id, delay);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn topic_recipient() {
        assert_eq!(
            parse_topic_recipient("User ID: 618805150756110336"),
            Some(UserId::new(618805150756110336))
        );
        assert_eq!(
            parse_topic_recipient("Opened by a bot. User ID:123 (other data)"),
            Some(UserId::new(123))
        );
    }

    #[test]
    fn topic_without_recipient() {
        assert_eq!(parse_topic_recipient("general chat"), None);
        assert_eq!(parse_topic_recipient("User ID: 0"), None);
        assert_eq!(parse_topic_recipient("User ID: 99999999999999999999999"), None);
        assert_eq!(parse_topic_recipient(""), None);
    }
}
