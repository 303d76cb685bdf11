use crate::{
    checks::SUPPORTER_CHECK,
    help::{
        PlaceholderFormatter,
        RelayDispatcher,
        RelayMode,
    },
    thread::SerenityThread,
    ClientDataKey,
};
use anyhow::Context as _;
use serenity::{
    framework::standard::{
        macros::command,
        Args,
        CommandResult,
    },
    model::prelude::*,
    prelude::*,
};

#[command]
#[description(
    "Sends help for a specific command to the user in the current thread.\n\nPrefix a configuration key with `config_` to send its documentation instead."
)]
#[usage("<command|config_key>")]
#[example("close")]
#[example("config_prefix")]
#[min_args(1)]
#[checks(Supporter)]
#[bucket("default")]
pub async fn rhelp(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    relay_help(ctx, msg, args, RelayMode::Attributed).await
}

#[command]
#[description(
    "Sends help for a specific command to the user in the current thread, anonymously.\n\nPrefix a configuration key with `config_` to send its documentation instead."
)]
#[usage("<command|config_key>")]
#[example("close")]
#[example("config_prefix")]
#[min_args(1)]
#[checks(Supporter)]
#[bucket("default")]
pub async fn arhelp(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    relay_help(ctx, msg, args, RelayMode::Anonymous).await
}

#[tracing::instrument(skip(ctx, msg, args), fields(author = %msg.author.id, channel = %msg.channel_id, content = %msg.content))]
async fn relay_help(ctx: &Context, msg: &Message, args: Args, mode: RelayMode) -> CommandResult {
    let data_lock = ctx.data.read().await;
    let client_data = data_lock
        .get::<ClientDataKey>()
        .expect("missing client data");
    let config = client_data.config.clone();
    let config_store = client_data.config_store.clone();
    let registry = client_data.registry.clone();
    drop(data_lock);

    // Channels without a recipient are not threads.
    let thread = match SerenityThread::locate(ctx, msg, config.main_color())
        .await
        .context("failed to locate thread")?
    {
        Some(thread) => thread,
        None => {
            msg.channel_id
                .say(&ctx.http, "This command can only be used in a support thread.")
                .await?;
            return Ok(());
        }
    };

    let bot_name = ctx.cache.current_user().name.clone();
    let anonymous_identity = config.anonymous_identity();
    let dispatcher = RelayDispatcher::new(
        &*registry,
        &config_store,
        PlaceholderFormatter::new(config.prefix(), &bot_name),
        config.prefix(),
        &anonymous_identity,
    );

    dispatcher.dispatch(args.rest(), mode, &thread).await;

    Ok(())
}
