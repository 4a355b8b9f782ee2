use tracing::info;

use super::reply_embed;
use crate::embeds::{self, base_embed};
use crate::{Context, Error};

/// Check if the bot is running
#[poise::command(prefix_command, slash_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    info!("Ping command called by {}", ctx.author().name);
    ctx.send(poise::CreateReply::default()
        .content("Pong! Bot is working!")
        .ephemeral(true))
        .await?;
    Ok(())
}

/// Show help information
#[poise::command(prefix_command, slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let embed = base_embed(
        "📖 Commands",
        "Moderation commands follow the bot's trust tiers; use `mylevel` to see yours.",
        embeds::COLOR_PRIMARY,
    )
    .field(
        "🎫 Tickets",
        "`ticketsetup`, `ticket setrole`, `ticket close [reason]`, `ticket claim`, \
         `ticket add`, `ticket remove`, `ticket stats`, `ticket panel`",
        false,
    )
    .field(
        "🔨 Moderation",
        "`warn`, `kick`, `ban`, `unban`, `timeout`, `untimeout`, `clear`, `slowmode`, \
         `lock`, `unlock`, `memberinfo`",
        false,
    )
    .field(
        "🔐 Permissions",
        "`addowner`/`addadmin`/`addgs`/`addmod`/`addsupport` (+ `remove…`), \
         `setrole`, `delrole`, `permissions`, `mylevel`",
        false,
    )
    .field(
        "⚙️ Misc",
        "`ping`, `help`, `botstats`, `maintenance on|off`",
        false,
    );

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true)).await?;
    Ok(())
}
