use poise::serenity_prelude as serenity;
use tracing::{info, warn};

use crate::{Data, Error};

/// Leave blacklisted guilds as soon as we learn we are in them.
pub async fn handle_guild_create(
    ctx: &serenity::Context,
    guild: &serenity::Guild,
    data: &Data,
) -> Result<(), Error> {
    if data.runtime.is_guild_blacklisted(guild.id.get()) {
        warn!(
            "Guild '{}' ({}) is blacklisted, leaving",
            guild.name, guild.id
        );
        guild.id.leave(&ctx.http).await?;
        return Ok(());
    }

    info!("Active in guild '{}' ({})", guild.name, guild.id);
    Ok(())
}
