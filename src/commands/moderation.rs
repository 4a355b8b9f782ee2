use poise::serenity_prelude::{self as serenity, Mentionable};
use tracing::{info, warn};

use super::{reply_embed, reply_error};
use crate::embeds::{self, base_embed, denied_embed};
use crate::error::BotError;
use crate::managers::{find_member, level_label, MemberSnapshot};
use crate::{Context, Error};

/// Longest timeout Discord accepts, in minutes (28 days).
const MAX_TIMEOUT_MINUTES: u64 = 28 * 24 * 60;

/// Resolve a sanction target and verify the author may act on them. Replies
/// with the failure notice itself and returns None when the action must not
/// proceed.
async fn sanction_target(
    ctx: Context<'_>,
    input: &str,
) -> Result<Option<serenity::Member>, Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;
    let http = ctx.serenity_context().http.as_ref();

    let Some(target) = find_member(http, guild_id, input).await? else {
        reply_error(ctx, &BotError::not_found("Member", input)).await?;
        return Ok(None);
    };

    let guild = guild_id.to_partial_guild(http).await?;
    let author = guild_id.member(http, ctx.author().id).await?;
    let actor_snapshot = MemberSnapshot::capture(&guild, &author);
    let target_snapshot = MemberSnapshot::capture(&guild, &target);

    if let Err(reason) = ctx
        .data()
        .permissions
        .check_moderate(guild_id, &actor_snapshot, &target_snapshot)
        .await
    {
        ctx.send(
            poise::CreateReply::default()
                .embed(denied_embed(&reason))
                .ephemeral(true),
        )
        .await?;
        return Ok(None);
    }

    Ok(Some(target))
}

/// Best-effort DM to a sanctioned member; failure only earns a notice.
async fn notify_target(
    ctx: Context<'_>,
    target: &serenity::User,
    title: &str,
    reason: &str,
) -> Result<(), Error> {
    let guild_name = ctx
        .partial_guild()
        .await
        .map(|g| g.name)
        .unwrap_or_else(|| "this server".to_string());

    let embed = base_embed(
        title,
        &format!(
            "Sanction received on **{}**.\n**Reason:** {}\n**Moderator:** {}",
            guild_name,
            reason,
            ctx.author().name
        ),
        embeds::COLOR_WARNING,
    );

    if target
        .dm(ctx.serenity_context(), serenity::CreateMessage::new().embed(embed))
        .await
        .is_err()
    {
        warn!("Could not DM {} about a sanction", target.name);
        ctx.send(
            poise::CreateReply::default()
                .content("⚠️ Could not send a DM to the member.")
                .ephemeral(true),
        )
        .await?;
    }
    Ok(())
}

/// Ban a member (mention, ID, or name)
#[poise::command(prefix_command, slash_command, guild_only, aliases("b"))]
pub async fn ban(
    ctx: Context<'_>,
    user: String,
    #[rest] reason: Option<String>,
) -> Result<(), Error> {
    let Some(target) = sanction_target(ctx, &user).await? else {
        return Ok(());
    };
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;
    let reason = reason.unwrap_or_else(|| "No reason given".to_string());

    // DM before the ban lands; afterwards the member is unreachable.
    notify_target(ctx, &target.user, "🔨 Ban", &reason).await?;

    if let Err(e) = guild_id
        .ban_with_reason(ctx.serenity_context(), target.user.id, 0, &reason)
        .await
    {
        return reply_error(ctx, &e.into()).await;
    }

    info!("{} banned {} ({})", ctx.author().name, target.user.name, reason);
    let embed = base_embed(
        "🔨 Member banned",
        &format!("{} has been banned.\n**Reason:** {}", target.user.mention(), reason),
        embeds::COLOR_DANGER,
    );
    reply_embed(ctx, embed).await
}

/// Unban a user by ID
#[poise::command(prefix_command, slash_command, guild_only, aliases("ub"))]
pub async fn unban(
    ctx: Context<'_>,
    user_id: String,
    #[rest] _reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;

    let Some(user_id) = crate::managers::member_resolver::parse_user_id(&user_id) else {
        return reply_error(
            ctx,
            &BotError::InvalidArgument {
                message: "expected a numeric user ID".to_string(),
            },
        )
        .await;
    };

    if let Err(e) = guild_id.unban(ctx.serenity_context(), user_id).await {
        return reply_error(ctx, &e.into()).await;
    }

    let embed = base_embed(
        "✅ Member unbanned",
        &format!("<@{}> is no longer banned.", user_id),
        embeds::COLOR_SUCCESS,
    );
    reply_embed(ctx, embed).await
}

/// Kick a member (mention, ID, or name)
#[poise::command(prefix_command, slash_command, guild_only, aliases("k"))]
pub async fn kick(
    ctx: Context<'_>,
    user: String,
    #[rest] reason: Option<String>,
) -> Result<(), Error> {
    let Some(target) = sanction_target(ctx, &user).await? else {
        return Ok(());
    };
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;
    let reason = reason.unwrap_or_else(|| "No reason given".to_string());

    notify_target(ctx, &target.user, "👢 Kick", &reason).await?;

    if let Err(e) = guild_id
        .kick_with_reason(ctx.serenity_context(), target.user.id, &reason)
        .await
    {
        return reply_error(ctx, &e.into()).await;
    }

    info!("{} kicked {} ({})", ctx.author().name, target.user.name, reason);
    let embed = base_embed(
        "👢 Member kicked",
        &format!("{} has been kicked.\n**Reason:** {}", target.user.mention(), reason),
        embeds::COLOR_WARNING,
    );
    reply_embed(ctx, embed).await
}

/// Time a member out for a number of minutes
#[poise::command(prefix_command, slash_command, guild_only, aliases("to"))]
pub async fn timeout(
    ctx: Context<'_>,
    user: String,
    duration_minutes: u64,
    #[rest] reason: Option<String>,
) -> Result<(), Error> {
    if duration_minutes == 0 || duration_minutes > MAX_TIMEOUT_MINUTES {
        return reply_error(
            ctx,
            &BotError::InvalidArgument {
                message: format!("duration must be 1-{} minutes", MAX_TIMEOUT_MINUTES),
            },
        )
        .await;
    }

    let Some(target) = sanction_target(ctx, &user).await? else {
        return Ok(());
    };
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;
    let reason = reason.unwrap_or_else(|| "No reason given".to_string());

    let until = chrono::Utc::now() + chrono::Duration::minutes(duration_minutes as i64);
    let until = serenity::Timestamp::from_unix_timestamp(until.timestamp())
        .map_err(|e| format!("invalid timeout timestamp: {}", e))?;

    if let Err(e) = guild_id
        .edit_member(
            ctx.serenity_context(),
            target.user.id,
            serenity::EditMember::new().disable_communication_until_datetime(until),
        )
        .await
    {
        return reply_error(ctx, &e.into()).await;
    }

    let embed = base_embed(
        "🔇 Member timed out",
        &format!(
            "{} is timed out for **{} min**.\n**Reason:** {}",
            target.user.mention(),
            duration_minutes,
            reason
        ),
        embeds::COLOR_WARNING,
    );
    reply_embed(ctx, embed).await
}

/// Lift a member's timeout
#[poise::command(prefix_command, slash_command, guild_only, aliases("uto"))]
pub async fn untimeout(ctx: Context<'_>, user: String) -> Result<(), Error> {
    let Some(target) = sanction_target(ctx, &user).await? else {
        return Ok(());
    };
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;

    if let Err(e) = guild_id
        .edit_member(
            ctx.serenity_context(),
            target.user.id,
            serenity::EditMember::new().enable_communication(),
        )
        .await
    {
        return reply_error(ctx, &e.into()).await;
    }

    let embed = base_embed(
        "🔊 Timeout lifted",
        &format!("{} can speak again.", target.user.mention()),
        embeds::COLOR_SUCCESS,
    );
    reply_embed(ctx, embed).await
}

/// Warn a member (mention, ID, or name)
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn warn(
    ctx: Context<'_>,
    user: String,
    #[rest] reason: Option<String>,
) -> Result<(), Error> {
    let Some(target) = sanction_target(ctx, &user).await? else {
        return Ok(());
    };
    let reason = reason.unwrap_or_else(|| "No reason given".to_string());

    let embed = base_embed(
        "⚠️ Warning",
        &format!(
            "{} received a warning.\n**Reason:** {}\n**Moderator:** {}",
            target.user.mention(),
            reason,
            ctx.author().mention()
        ),
        embeds::COLOR_GOLD,
    );
    reply_embed(ctx, embed).await?;

    notify_target(ctx, &target.user, "⚠️ Warning", &reason).await
}

/// Bulk-delete recent messages in this channel (1-100)
#[poise::command(prefix_command, slash_command, guild_only, aliases("purge"))]
pub async fn clear(ctx: Context<'_>, amount: u8) -> Result<(), Error> {
    if amount == 0 || amount > 100 {
        return reply_error(
            ctx,
            &BotError::InvalidArgument {
                message: "amount must be 1-100".to_string(),
            },
        )
        .await;
    }

    let http = ctx.serenity_context().http.as_ref();
    let channel_id = ctx.channel_id();
    let messages = channel_id
        .messages(http, serenity::GetMessages::new().limit(amount))
        .await?;

    let ids: Vec<serenity::MessageId> = messages.iter().map(|m| m.id).collect();
    let deleted = ids.len();
    match deleted {
        0 => {}
        1 => channel_id.delete_message(http, ids[0]).await?,
        _ => channel_id.delete_messages(http, ids).await?,
    }

    info!("{} cleared {} messages in {}", ctx.author().name, deleted, channel_id);
    ctx.send(
        poise::CreateReply::default()
            .content(format!("🧹 Deleted **{}** messages.", deleted))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Set this channel's slowmode, in seconds (0 disables)
#[poise::command(prefix_command, slash_command, guild_only, aliases("slow"))]
pub async fn slowmode(ctx: Context<'_>, seconds: u16) -> Result<(), Error> {
    const MAX_SLOWMODE_SECONDS: u16 = 21600;
    if seconds > MAX_SLOWMODE_SECONDS {
        return reply_error(
            ctx,
            &BotError::InvalidArgument {
                message: format!("slowmode caps at {} seconds", MAX_SLOWMODE_SECONDS),
            },
        )
        .await;
    }

    ctx.channel_id()
        .edit(
            ctx.serenity_context(),
            serenity::EditChannel::new().rate_limit_per_user(seconds),
        )
        .await?;

    let text = if seconds == 0 {
        "🐇 Slowmode disabled.".to_string()
    } else {
        format!("🐢 Slowmode set to **{}s**.", seconds)
    };
    ctx.say(text).await?;
    Ok(())
}

/// Lock this channel for @everyone
#[poise::command(prefix_command, slash_command, guild_only, aliases("lockdown"))]
pub async fn lock(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;

    ctx.channel_id()
        .create_permission(
            ctx.serenity_context(),
            serenity::PermissionOverwrite {
                allow: serenity::Permissions::empty(),
                deny: serenity::Permissions::SEND_MESSAGES,
                kind: serenity::PermissionOverwriteType::Role(guild_id.everyone_role()),
            },
        )
        .await?;

    reply_embed(
        ctx,
        base_embed("🔒 Channel locked", "Members can no longer send messages here.", embeds::COLOR_DANGER),
    )
    .await
}

/// Unlock this channel
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn unlock(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;

    ctx.channel_id()
        .delete_permission(
            ctx.serenity_context(),
            serenity::PermissionOverwriteType::Role(guild_id.everyone_role()),
        )
        .await?;

    reply_embed(
        ctx,
        base_embed("🔓 Channel unlocked", "Members can send messages again.", embeds::COLOR_SUCCESS),
    )
    .await
}

/// Show information about a member
#[poise::command(prefix_command, slash_command, guild_only, aliases("mi", "whois"))]
pub async fn memberinfo(ctx: Context<'_>, user: Option<String>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;
    let http = ctx.serenity_context().http.as_ref();

    let member = match user {
        Some(input) => match find_member(http, guild_id, &input).await? {
            Some(member) => member,
            None => {
                return reply_error(ctx, &BotError::not_found("Member", input)).await;
            }
        },
        None => guild_id.member(http, ctx.author().id).await?,
    };

    let guild = guild_id.to_partial_guild(http).await?;
    let snapshot = MemberSnapshot::capture(&guild, &member);
    let level = ctx.data().permissions.level_of(guild_id, &snapshot).await;

    let joined = member
        .joined_at
        .map(|t| format!("<t:{}:R>", t.unix_timestamp()))
        .unwrap_or_else(|| "unknown".to_string());
    let created = format!("<t:{}:R>", member.user.created_at().unix_timestamp());

    let embed = base_embed(
        &format!("👤 {}", member.display_name()),
        &format!(
            "**ID:** `{}`\n**Level:** {} ({})\n**Joined:** {}\n**Account created:** {}\n**Roles:** {}",
            member.user.id,
            level_label(level),
            level,
            joined,
            created,
            member.roles.len()
        ),
        embeds::COLOR_PRIMARY,
    );
    reply_embed(ctx, embed).await
}
