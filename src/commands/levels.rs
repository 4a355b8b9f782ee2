use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::info;

use crate::embeds::{denied_embed, error_embed};
use crate::managers::{level_label, MemberSnapshot};
use crate::{Context, Error};

/// Required trust level per command, keyed by qualified command name.
/// Commands not listed here require nothing beyond the blacklist and
/// maintenance screens.
pub static COMMAND_LEVELS: Lazy<HashMap<&'static str, u8>> = Lazy::new(|| {
    HashMap::from([
        // Support (level 1) — info only
        ("warn", 1),
        ("memberinfo", 1),
        // Moderator (level 2) — basic moderation
        ("kick", 2),
        ("timeout", 2),
        ("untimeout", 2),
        ("clear", 2),
        ("lock", 2),
        ("unlock", 2),
        ("slowmode", 2),
        // Management (level 3)
        ("ban", 3),
        ("unban", 3),
        // Administrator (level 4) — permission and ticket configuration
        ("addmod", 4),
        ("removemod", 4),
        ("addsupport", 4),
        ("removesupport", 4),
        ("setrole", 4),
        ("delrole", 4),
        ("ticketsetup", 4),
        ("ticket setrole", 4),
        ("ticket stats", 4),
        ("ticket panel", 4),
        // Bot owner (level 5) — full control
        ("addgs", 5),
        ("removegs", 5),
        ("addadmin", 5),
        ("removeadmin", 5),
        ("addowner", 5),
        ("removeowner", 5),
        ("blacklistuser", 5),
        ("unblacklistuser", 5),
        ("blacklistserver", 5),
        ("unblacklistserver", 5),
        ("maintenance", 5),
        ("botstats", 5),
    ])
});

pub fn required_level(command: &str) -> u8 {
    COMMAND_LEVELS.get(command).copied().unwrap_or(0)
}

/// Global command gate, installed as the framework-wide check. Screens
/// blacklisted users/guilds (silently), the maintenance flag, and the
/// command's required tier.
pub async fn gate(ctx: Context<'_>) -> Result<bool, Error> {
    let runtime = &ctx.data().runtime;

    if runtime.is_user_blacklisted(ctx.author().id.get()) {
        return Ok(false);
    }
    if let Some(guild_id) = ctx.guild_id() {
        if runtime.is_guild_blacklisted(guild_id.get()) {
            return Ok(false);
        }
    }

    let command = ctx.command().qualified_name.clone();
    let required = required_level(&command);
    let maintenance = runtime.maintenance();

    // Fast path: nothing to resolve for unprivileged commands in normal
    // operation.
    if required == 0 && !maintenance {
        return Ok(true);
    }

    let Some(guild_id) = ctx.guild_id() else {
        // Privileged commands are guild-bound; during maintenance DMs are
        // shut out entirely.
        return Ok(required == 0 && !maintenance);
    };

    let http = ctx.serenity_context().http.as_ref();
    let guild = guild_id.to_partial_guild(http).await?;
    let member = guild_id.member(http, ctx.author().id).await?;
    let snapshot = MemberSnapshot::capture(&guild, &member);
    let level = ctx.data().permissions.level_of(guild_id, &snapshot).await;

    if maintenance && level < 5 {
        ctx.send(
            poise::CreateReply::default()
                .embed(error_embed("The bot is under maintenance, try again later."))
                .ephemeral(true),
        )
        .await?;
        return Ok(false);
    }

    if level < required {
        info!(
            "Denied '{}' for {} (level {}, requires {})",
            command,
            ctx.author().name,
            level,
            required
        );
        ctx.send(
            poise::CreateReply::default()
                .embed(denied_embed(&format!(
                    "This command requires the **{}** tier or higher (you are **{}**).",
                    level_label(required),
                    level_label(level)
                )))
                .ephemeral(true),
        )
        .await?;
        return Ok(false);
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlisted_commands_require_nothing() {
        assert_eq!(required_level("ping"), 0);
        assert_eq!(required_level("help"), 0);
        assert_eq!(required_level("ticket close"), 0);
    }

    #[test]
    fn test_table_matches_grant_thresholds() {
        // Granting moderator/support takes an administrator; granting
        // gs/admin/owner takes a bot owner.
        assert_eq!(required_level("addmod"), 4);
        assert_eq!(required_level("addsupport"), 4);
        assert_eq!(required_level("addgs"), 5);
        assert_eq!(required_level("addadmin"), 5);
        assert_eq!(required_level("addowner"), 5);
    }

    #[test]
    fn test_subcommands_are_keyed_by_qualified_name() {
        assert_eq!(required_level("ticket setrole"), 4);
        assert_eq!(required_level("ticket stats"), 4);
        assert_eq!(required_level("ticket"), 0);
    }
}
