use poise::serenity_prelude as serenity;
use tracing::warn;

use super::{reply_embed, reply_error};
use crate::embeds::{self, base_embed};
use crate::error::BotError;
use crate::{Context, Error};

/// Blacklist a user from using the bot
#[poise::command(prefix_command, slash_command, guild_only, aliases("bl"))]
pub async fn blacklistuser(
    ctx: Context<'_>,
    user: serenity::User,
    #[rest] reason: Option<String>,
) -> Result<(), Error> {
    if !ctx.data().runtime.blacklist_user(user.id.get()) {
        return reply_error(ctx, &BotError::denied("that user is already blacklisted")).await;
    }

    warn!(
        "User {} blacklisted by {} ({})",
        user.id,
        ctx.author().name,
        reason.as_deref().unwrap_or("no reason")
    );
    let embed = base_embed(
        "🚫 User blacklisted",
        &format!(
            "<@{}> can no longer use the bot.\n**Reason:** {}",
            user.id,
            reason.unwrap_or_else(|| "No reason given".to_string())
        ),
        embeds::COLOR_DANGER,
    );
    reply_embed(ctx, embed).await
}

/// Remove a user from the blacklist
#[poise::command(prefix_command, slash_command, guild_only, aliases("unbl"))]
pub async fn unblacklistuser(ctx: Context<'_>, user: serenity::User) -> Result<(), Error> {
    if !ctx.data().runtime.unblacklist_user(user.id.get()) {
        return reply_error(ctx, &BotError::denied("that user is not blacklisted")).await;
    }

    let embed = base_embed(
        "✅ User unblacklisted",
        &format!("<@{}> can use the bot again.", user.id),
        embeds::COLOR_SUCCESS,
    );
    reply_embed(ctx, embed).await
}

/// Blacklist a server; the bot leaves it immediately if present
#[poise::command(prefix_command, slash_command, guild_only, aliases("bls"))]
pub async fn blacklistserver(
    ctx: Context<'_>,
    guild_id: String,
    #[rest] reason: Option<String>,
) -> Result<(), Error> {
    let Ok(raw_id) = guild_id.parse::<u64>() else {
        return reply_error(
            ctx,
            &BotError::InvalidArgument {
                message: "expected a numeric server ID".to_string(),
            },
        )
        .await;
    };

    if !ctx.data().runtime.blacklist_guild(raw_id) {
        return reply_error(ctx, &BotError::denied("that server is already blacklisted")).await;
    }

    // Leave right away if we are in it; GuildCreate covers future joins.
    let target = serenity::GuildId::new(raw_id);
    if ctx
        .serenity_context()
        .cache
        .guilds()
        .contains(&target)
    {
        if let Err(e) = target.leave(ctx.serenity_context()).await {
            warn!("Could not leave blacklisted guild {}: {}", target, e);
        }
    }

    let embed = base_embed(
        "🚫 Server blacklisted",
        &format!(
            "Server `{}` is blacklisted.\n**Reason:** {}",
            raw_id,
            reason.unwrap_or_else(|| "No reason given".to_string())
        ),
        embeds::COLOR_DANGER,
    );
    reply_embed(ctx, embed).await
}

/// Remove a server from the blacklist
#[poise::command(prefix_command, slash_command, guild_only, aliases("unbls"))]
pub async fn unblacklistserver(ctx: Context<'_>, guild_id: String) -> Result<(), Error> {
    let Ok(raw_id) = guild_id.parse::<u64>() else {
        return reply_error(
            ctx,
            &BotError::InvalidArgument {
                message: "expected a numeric server ID".to_string(),
            },
        )
        .await;
    };

    if !ctx.data().runtime.unblacklist_guild(raw_id) {
        return reply_error(ctx, &BotError::denied("that server is not blacklisted")).await;
    }

    let embed = base_embed(
        "✅ Server unblacklisted",
        &format!("Server `{}` may invite the bot again.", raw_id),
        embeds::COLOR_SUCCESS,
    );
    reply_embed(ctx, embed).await
}

/// Toggle maintenance mode (on/off)
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn maintenance(ctx: Context<'_>, state: String) -> Result<(), Error> {
    let on = match state.to_lowercase().as_str() {
        "on" => true,
        "off" => false,
        _ => {
            return reply_error(
                ctx,
                &BotError::InvalidArgument {
                    message: "expected `on` or `off`".to_string(),
                },
            )
            .await;
        }
    };

    ctx.data().runtime.set_maintenance(on);
    warn!("Maintenance mode set to {} by {}", on, ctx.author().name);

    let embed = if on {
        base_embed(
            "🛠️ Maintenance enabled",
            "Only Bot Owners can use commands until maintenance ends.",
            embeds::COLOR_WARNING,
        )
    } else {
        base_embed("✅ Maintenance over", "All commands are available again.", embeds::COLOR_SUCCESS)
    };
    reply_embed(ctx, embed).await
}

/// Bot statistics
#[poise::command(prefix_command, slash_command, aliases("stats", "botinfo"))]
pub async fn botstats(ctx: Context<'_>) -> Result<(), Error> {
    let runtime = &ctx.data().runtime;
    let guild_count = ctx.serenity_context().cache.guilds().len();

    let uptime = runtime.uptime();
    let hours = uptime.num_hours();
    let minutes = uptime.num_minutes() % 60;

    let embed = base_embed("🤖 Bot statistics", "", embeds::COLOR_PRIMARY)
        .field("Servers", format!("`{}`", guild_count), true)
        .field("Uptime", format!("`{}h {}m`", hours, minutes), true)
        .field(
            "Blacklists",
            format!(
                "`{}` users, `{}` servers",
                runtime.blacklisted_users().len(),
                runtime.blacklisted_guilds().len()
            ),
            true,
        )
        .field(
            "Maintenance",
            if runtime.maintenance() { "`on`" } else { "`off`" },
            true,
        );
    reply_embed(ctx, embed).await
}
