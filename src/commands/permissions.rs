use poise::serenity_prelude as serenity;

use super::{author_level, author_snapshot, reply_embed, reply_error};
use crate::embeds::{self, base_embed};
use crate::managers::{level_label, Tier};
use crate::{Context, Error};

fn tier_emoji(tier: Tier) -> &'static str {
    match tier {
        Tier::Owner => "👑",
        Tier::Admin => "🔴",
        Tier::Gs => "🔵",
        Tier::Moderator => "🟠",
        Tier::Support => "🟢",
    }
}

fn tier_color(tier: Tier) -> u32 {
    match tier {
        Tier::Owner => embeds::COLOR_GOLD,
        Tier::Admin => embeds::COLOR_DANGER,
        Tier::Gs => embeds::COLOR_PRIMARY,
        Tier::Moderator => 0xE67E22,
        Tier::Support => embeds::COLOR_SUCCESS,
    }
}

/// Shared body for the ten grant/revoke commands.
async fn apply_tier_change(
    ctx: Context<'_>,
    user: serenity::User,
    tier: Tier,
    grant: bool,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;
    let caller_level = author_level(ctx).await?;

    let result = if grant {
        ctx.data()
            .permissions
            .grant(guild_id, caller_level, user.id, tier)
            .await
    } else {
        ctx.data()
            .permissions
            .revoke(guild_id, caller_level, user.id, tier)
            .await
    };

    match result {
        Ok(()) if grant => {
            let embed = base_embed(
                &format!("{} {} added", tier_emoji(tier), tier.label()),
                &format!("<@{}> → **{} (level {})**", user.id, tier.label(), tier.level()),
                tier_color(tier),
            );
            reply_embed(ctx, embed).await
        }
        Ok(()) => {
            let embed = base_embed(
                "✅ Tier removed",
                &format!("<@{}> no longer holds **{}**.", user.id, tier.label()),
                embeds::COLOR_SUCCESS,
            );
            reply_embed(ctx, embed).await
        }
        Err(e) => reply_error(ctx, &e).await,
    }
}

/// Add a Bot Owner (level 5)
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn addowner(ctx: Context<'_>, user: serenity::User) -> Result<(), Error> {
    apply_tier_change(ctx, user, Tier::Owner, true).await
}

/// Remove a Bot Owner
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn removeowner(ctx: Context<'_>, user: serenity::User) -> Result<(), Error> {
    apply_tier_change(ctx, user, Tier::Owner, false).await
}

/// Add an Administrator (level 4)
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn addadmin(ctx: Context<'_>, user: serenity::User) -> Result<(), Error> {
    apply_tier_change(ctx, user, Tier::Admin, true).await
}

/// Remove an Administrator
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn removeadmin(ctx: Context<'_>, user: serenity::User) -> Result<(), Error> {
    apply_tier_change(ctx, user, Tier::Admin, false).await
}

/// Add a Management member (level 3)
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn addgs(ctx: Context<'_>, user: serenity::User) -> Result<(), Error> {
    apply_tier_change(ctx, user, Tier::Gs, true).await
}

/// Remove a Management member
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn removegs(ctx: Context<'_>, user: serenity::User) -> Result<(), Error> {
    apply_tier_change(ctx, user, Tier::Gs, false).await
}

/// Add a Moderator (level 2)
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn addmod(ctx: Context<'_>, user: serenity::User) -> Result<(), Error> {
    apply_tier_change(ctx, user, Tier::Moderator, true).await
}

/// Remove a Moderator
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn removemod(ctx: Context<'_>, user: serenity::User) -> Result<(), Error> {
    apply_tier_change(ctx, user, Tier::Moderator, false).await
}

/// Add a Support member (level 1)
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn addsupport(ctx: Context<'_>, user: serenity::User) -> Result<(), Error> {
    apply_tier_change(ctx, user, Tier::Support, true).await
}

/// Remove a Support member
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn removesupport(ctx: Context<'_>, user: serenity::User) -> Result<(), Error> {
    apply_tier_change(ctx, user, Tier::Support, false).await
}

/// Map a Discord role to a permission level (0-4)
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn setrole(ctx: Context<'_>, role: serenity::Role, level: u8) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;
    let caller_level = author_level(ctx).await?;

    match ctx
        .data()
        .permissions
        .set_role_level(guild_id, caller_level, role.id, level)
        .await
    {
        Ok(()) => {
            let embed = base_embed(
                "✅ Role configured",
                &format!(
                    "<@&{}> → **{}** (level {})",
                    role.id,
                    level_label(level),
                    level
                ),
                embeds::COLOR_PRIMARY,
            );
            reply_embed(ctx, embed).await
        }
        Err(e) => reply_error(ctx, &e).await,
    }
}

/// Remove a role's permission level mapping
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn delrole(ctx: Context<'_>, role: serenity::Role) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;
    let caller_level = author_level(ctx).await?;

    match ctx
        .data()
        .permissions
        .clear_role_level(guild_id, caller_level, role.id)
        .await
    {
        Ok(()) => {
            let embed = base_embed(
                "✅ Role cleared",
                &format!("<@&{}> no longer maps to a permission level.", role.id),
                embeds::COLOR_SUCCESS,
            );
            reply_embed(ctx, embed).await
        }
        Err(e) => reply_error(ctx, &e).await,
    }
}

/// Show a member's permissions, or the guild's whole configuration
#[poise::command(prefix_command, slash_command, guild_only, aliases("perms"))]
pub async fn permissions(
    ctx: Context<'_>,
    member: Option<serenity::Member>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;
    let http = ctx.serenity_context().http.as_ref();
    let record = ctx.data().permissions.guild_record(guild_id).await;

    let embed = if let Some(member) = member {
        let guild = guild_id.to_partial_guild(http).await?;
        let snapshot = crate::managers::MemberSnapshot::capture(&guild, &member);
        let level = ctx.data().permissions.level_of(guild_id, &snapshot).await;

        base_embed(
            &format!("🔐 Permissions for {}", member.display_name()),
            &format!("**{}** (level {})", level_label(level), level),
            embeds::COLOR_PRIMARY,
        )
    } else {
        let mut embed = base_embed(
            "🔐 Permission configuration",
            "Members granted a tier on this server",
            embeds::COLOR_PRIMARY,
        );

        for (list, tier) in [
            (&record.owners, Tier::Owner),
            (&record.admins, Tier::Admin),
            (&record.gs_users, Tier::Gs),
            (&record.moderators, Tier::Moderator),
            (&record.supports, Tier::Support),
        ] {
            if list.is_empty() {
                continue;
            }
            let mentions: Vec<String> = list.iter().map(|id| format!("<@{}>", id)).collect();
            embed = embed.field(
                format!(
                    "{} {} ({})",
                    tier_emoji(tier),
                    tier.label(),
                    tier.level()
                ),
                mentions.join("\n"),
                false,
            );
        }

        if !record.role_levels.is_empty() {
            let mut lines: Vec<String> = record
                .role_levels
                .iter()
                .map(|(role, level)| format!("<@&{}> → level {}", role, level))
                .collect();
            lines.sort();
            embed = embed.field("🎭 Role levels", lines.join("\n"), false);
        }

        embed
    };

    reply_embed(ctx, embed).await
}

/// Show your own permission level
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn mylevel(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;
    let snapshot = author_snapshot(ctx).await?;
    let level = ctx.data().permissions.level_of(guild_id, &snapshot).await;

    let available = super::levels::COMMAND_LEVELS
        .iter()
        .filter(|(_, required)| **required <= level)
        .count();

    let embed = base_embed(
        "🔐 Your level",
        &format!(
            "**{}** (level {})\n\n**{}** gated commands available to you",
            level_label(level),
            level,
            available
        ),
        embeds::COLOR_PRIMARY,
    );
    reply_embed(ctx, embed).await
}
