pub mod general;
pub mod levels;
pub mod moderation;
pub mod owner;
pub mod permissions;
pub mod tickets;

pub use general::{help, ping};
pub use moderation::{
    ban, clear, kick, lock, memberinfo, slowmode, timeout, unban, unlock, untimeout, warn,
};
pub use owner::{
    blacklistserver, blacklistuser, botstats, maintenance, unblacklistserver, unblacklistuser,
};
pub use permissions::{
    addadmin, addgs, addmod, addowner, addsupport, delrole, mylevel, permissions, removeadmin,
    removegs, removemod, removeowner, removesupport, setrole,
};
pub use tickets::{ticket, ticketsetup};

use poise::serenity_prelude as serenity;

use crate::embeds::error_embed;
use crate::error::BotError;
use crate::managers::MemberSnapshot;
use crate::{Context, Error};

/// Snapshot of the command author, for level resolution and hierarchy
/// checks. Fails outside a guild.
pub(crate) async fn author_snapshot(ctx: Context<'_>) -> Result<MemberSnapshot, Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;
    let http = ctx.serenity_context().http.as_ref();

    let guild = guild_id.to_partial_guild(http).await?;
    let member = guild_id.member(http, ctx.author().id).await?;
    Ok(MemberSnapshot::capture(&guild, &member))
}

/// The author's resolved trust level in the current guild.
pub(crate) async fn author_level(ctx: Context<'_>) -> Result<u8, Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;
    let snapshot = author_snapshot(ctx).await?;
    Ok(ctx.data().permissions.level_of(guild_id, &snapshot).await)
}

/// Report a recovered operation failure to the invoking user.
pub(crate) async fn reply_error(ctx: Context<'_>, err: &BotError) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .embed(error_embed(&err.user_message()))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Non-ephemeral embed reply.
pub(crate) async fn reply_embed(
    ctx: Context<'_>,
    embed: serenity::CreateEmbed,
) -> Result<(), Error> {
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
