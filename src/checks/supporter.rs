use crate::{
    help::PermissionLevel,
    ClientDataKey,
};
use serenity::{
    client::Context,
    framework::standard::{
        macros::check,
        Args,
        CommandOptions,
        Reason,
    },
    model::prelude::*,
};

#[check]
#[name("Supporter")]
pub async fn supporter_check(
    ctx: &Context,
    msg: &Message,
    _args: &mut Args,
    _opts: &CommandOptions,
) -> Result<(), Reason> {
    let data_lock = ctx.data.read().await;
    let client_data = data_lock
        .get::<ClientDataKey>()
        .expect("missing client data");
    let config = client_data.config.clone();
    drop(data_lock);

    let roles = msg
        .member
        .as_ref()
        .map(|member| member.roles.as_slice())
        .unwrap_or_default();
    let level = config.permissions.level_for(msg.author.id, roles);

    if level >= PermissionLevel::Supporter {
        Ok(())
    } else {
        Err(Reason::User(
            "You need to be a supporter or above to use this command.".to_string(),
        ))
    }
}
