use poise::serenity_prelude::{self as serenity, Mentionable};

use super::{reply_embed, reply_error};
use crate::embeds::{self, base_embed};
use crate::{Context, Error};

/// Bootstrap the ticket system: category, log channel, panel
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn ticketsetup(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;

    ctx.defer().await?;

    match ctx
        .data()
        .tickets
        .setup_infrastructure(ctx.serenity_context().http.as_ref(), guild_id)
        .await
    {
        Ok(summary) => {
            reply_embed(
                ctx,
                base_embed("✅ Ticket system configured", &summary.format(), embeds::COLOR_SUCCESS),
            )
            .await
        }
        Err(e) => reply_error(ctx, &e).await,
    }
}

/// Ticket management
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    subcommands("setrole", "close", "claim", "add", "remove", "stats", "panel")
)]
pub async fn ticket(ctx: Context<'_>) -> Result<(), Error> {
    let embed = base_embed(
        "🎫 Ticket system",
        "Per-user support channels with a button panel.",
        embeds::COLOR_PRIMARY,
    )
    .field(
        "⚙️ Configuration (Admin)",
        "`ticketsetup` • bootstrap everything\n\
         `ticket setrole @role` • set the support role\n\
         `ticket panel` • re-post the panel\n\
         `ticket stats` • statistics",
        false,
    )
    .field(
        "🎫 Inside a ticket",
        "`ticket close [reason]` • close the ticket\n\
         `ticket claim` • take over the ticket\n\
         `ticket add @user` • add a participant\n\
         `ticket remove @user` • remove a participant",
        false,
    );
    reply_embed(ctx, embed).await
}

/// Set the role with standing access to all tickets
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn setrole(ctx: Context<'_>, role: serenity::Role) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;

    match ctx.data().tickets.set_support_role(guild_id, role.id).await {
        Ok(()) => {
            reply_embed(
                ctx,
                base_embed(
                    "✅ Support role set",
                    &format!("{} now has access to all tickets.", role.mention()),
                    embeds::COLOR_SUCCESS,
                ),
            )
            .await
        }
        Err(e) => reply_error(ctx, &e).await,
    }
}

/// Close the current ticket
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn close(ctx: Context<'_>, #[rest] reason: Option<String>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;

    // The closure announcement lands in the channel itself; the deletion
    // runs after the grace delay, so acknowledge the slash path first.
    if let Context::Application(_) = ctx {
        ctx.defer_ephemeral().await?;
        ctx.say("🔒 Closing this ticket…").await?;
    }

    if let Err(e) = ctx
        .data()
        .tickets
        .close_ticket(
            ctx.serenity_context().http.as_ref(),
            guild_id,
            ctx.channel_id(),
            ctx.author(),
            reason,
        )
        .await
    {
        return reply_error(ctx, &e).await;
    }
    Ok(())
}

/// Take over the current ticket
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn claim(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;
    let http = ctx.serenity_context().http.as_ref();
    let actor = guild_id.member(http, ctx.author().id).await?;

    match ctx
        .data()
        .tickets
        .claim_ticket(http, guild_id, ctx.channel_id(), &actor)
        .await
    {
        Ok(()) => {
            if let Context::Application(_) = ctx {
                ctx.send(
                    poise::CreateReply::default()
                        .content("✋ You claimed this ticket.")
                        .ephemeral(true),
                )
                .await?;
            }
            Ok(())
        }
        Err(e) => reply_error(ctx, &e).await,
    }
}

/// Add a user to the current ticket
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn add(ctx: Context<'_>, user: serenity::User) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;

    match ctx
        .data()
        .tickets
        .add_participant(
            ctx.serenity_context().http.as_ref(),
            guild_id,
            ctx.channel_id(),
            ctx.author().id,
            user.id,
        )
        .await
    {
        Ok(()) => {
            reply_embed(
                ctx,
                base_embed(
                    "➕ User added",
                    &format!(
                        "{} was added to the ticket by {}.",
                        user.mention(),
                        ctx.author().mention()
                    ),
                    embeds::COLOR_SUCCESS,
                ),
            )
            .await
        }
        Err(e) => reply_error(ctx, &e).await,
    }
}

/// Remove a user from the current ticket
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn remove(ctx: Context<'_>, user: serenity::User) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;

    match ctx
        .data()
        .tickets
        .remove_participant(
            ctx.serenity_context().http.as_ref(),
            guild_id,
            ctx.channel_id(),
            ctx.author().id,
            user.id,
        )
        .await
    {
        Ok(()) => {
            reply_embed(
                ctx,
                base_embed(
                    "➖ User removed",
                    &format!(
                        "{} was removed from the ticket by {}.",
                        user.mention(),
                        ctx.author().mention()
                    ),
                    embeds::COLOR_WARNING,
                ),
            )
            .await
        }
        Err(e) => reply_error(ctx, &e).await,
    }
}

/// Ticket statistics for this server
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn stats(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;
    let stats = ctx.data().tickets.stats(guild_id).await;

    let mut embed = base_embed("📊 Ticket statistics", "", embeds::COLOR_PRIMARY)
        .field("🟢 Open", format!("`{}`", stats.open), true)
        .field("📈 Total created", format!("`{}`", stats.total), true)
        .field(
            "🔒 Total closed",
            format!("`{}`", stats.total.saturating_sub(stats.open as u64)),
            true,
        );
    if let Some(role) = stats.support_role_id {
        embed = embed.field("👥 Support role", format!("<@&{}>", role), false);
    }

    reply_embed(ctx, embed).await
}

/// Re-post the ticket panel message
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn panel(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;

    match ctx
        .data()
        .tickets
        .repost_panel(ctx.serenity_context().http.as_ref(), guild_id)
        .await
    {
        Ok(channel) => {
            reply_embed(
                ctx,
                base_embed(
                    "✅ Panel posted",
                    &format!("The ticket panel is live in <#{}>.", channel),
                    embeds::COLOR_SUCCESS,
                ),
            )
            .await
        }
        Err(e) => reply_error(ctx, &e).await,
    }
}
