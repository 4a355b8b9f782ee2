use poise::serenity_prelude::{
    self as serenity, ChannelId, GuildId, Http, Mentionable, MessageId, Permissions, RoleId,
    UserId,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::embeds::{self, base_embed};
use crate::error::{BotError, Result};
use crate::state::{GuildLocks, GuildTicketRecord, SharedTicketStore};

/// How long a closed ticket channel lingers before deletion.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

const CATEGORY_NAME: &str = "🎫 Tickets";
const LOG_CHANNEL_NAME: &str = "ticket-logs";
const PANEL_CHANNEL_NAME: &str = "open-a-ticket";

/// Stable panel order for the ticket-type buttons.
const TYPE_ORDER: [&str; 4] = ["support", "report", "partnership", "other"];

/// A ticket log event.
#[derive(Debug, Clone, Copy)]
pub enum TicketAction {
    Created,
    Closed,
    Claimed,
    Added,
    Removed,
}

impl TicketAction {
    fn title(self) -> &'static str {
        match self {
            TicketAction::Created => "🎫 Ticket Created",
            TicketAction::Closed => "🔒 Ticket Closed",
            TicketAction::Claimed => "✋ Ticket Claimed",
            TicketAction::Added => "➕ User Added",
            TicketAction::Removed => "➖ User Removed",
        }
    }

    fn color(self) -> u32 {
        match self {
            TicketAction::Created | TicketAction::Added => embeds::COLOR_SUCCESS,
            TicketAction::Closed => embeds::COLOR_DANGER,
            TicketAction::Claimed => embeds::COLOR_PRIMARY,
            TicketAction::Removed => embeds::COLOR_WARNING,
        }
    }
}

/// Result of a successful ticket creation.
#[derive(Debug, Clone)]
pub struct TicketOpened {
    pub channel_id: ChannelId,
    pub number: u64,
}

/// Snapshot returned by `stats`.
#[derive(Debug, Clone)]
pub struct TicketStats {
    pub open: usize,
    pub total: u64,
    pub support_role_id: Option<RoleId>,
}

/// What `setup_infrastructure` created vs. reused.
#[derive(Debug, Default, Clone)]
pub struct SetupSummary {
    pub category_created: bool,
    pub log_channel_created: bool,
    pub log_channel_missing: bool,
    pub panel_channel_created: bool,
    pub category_id: Option<ChannelId>,
    pub panel_channel_id: Option<ChannelId>,
    pub log_channel_id: Option<ChannelId>,
}

impl SetupSummary {
    /// Format the summary as a human-readable string.
    pub fn format(&self) -> String {
        let mut lines = Vec::new();

        if let Some(id) = self.category_id {
            let verb = if self.category_created { "created" } else { "reused" };
            lines.push(format!("**Category:** <#{}> ({})", id, verb));
        }
        if let Some(id) = self.panel_channel_id {
            let verb = if self.panel_channel_created { "created" } else { "reused" };
            lines.push(format!("**Panel:** <#{}> ({})", id, verb));
        }
        match self.log_channel_id {
            Some(id) => {
                let verb = if self.log_channel_created { "created" } else { "reused" };
                lines.push(format!("**Logs:** <#{}> ({})", id, verb));
            }
            None if self.log_channel_missing => {
                lines.push("**Logs:** not available (creation failed)".to_string());
            }
            None => {}
        }

        lines.push(String::new());
        lines.push("**Next step:** use `ticket setrole @role` to set the support role".to_string());
        lines.join("\n")
    }
}

fn parse_channel(id: &Option<String>) -> Option<ChannelId> {
    id.as_ref()?.parse::<u64>().ok().map(ChannelId::new)
}

fn parse_role(id: &Option<String>) -> Option<RoleId> {
    id.as_ref()?.parse::<u64>().ok().map(RoleId::new)
}

async fn guild_channel_exists(http: &Http, channel_id: ChannelId) -> bool {
    match http.get_channel(channel_id).await {
        Ok(channel) => channel.guild().is_some(),
        Err(_) => false,
    }
}

/// Creates, tracks, and tears down per-user support channels.
pub struct TicketManager {
    store: SharedTicketStore,
    locks: Arc<GuildLocks>,
}

impl TicketManager {
    pub fn new(store: SharedTicketStore, locks: Arc<GuildLocks>) -> Self {
        Self { store, locks }
    }

    // ========== Ticket lifecycle ==========

    /// Open a ticket for `requester`. Enforces one open ticket per user,
    /// self-healing stale bookkeeping whose channel no longer exists.
    pub async fn open_ticket(
        &self,
        http: &Http,
        guild_id: GuildId,
        requester: &serenity::User,
        category_key: &str,
    ) -> Result<TicketOpened> {
        let lock = self.locks.for_guild(guild_id);
        let _guard = lock.lock().await;

        let guild_key = guild_id.to_string();
        let user_key = requester.id.to_string();

        // Duplicate check + config gathering. No counter allocation yet: an
        // unconfigured guild must not burn a number.
        let (category_id, support_role, type_emoji, type_name) = {
            let store = self.store.read().await;
            let record = store.get(&guild_key).cloned().unwrap_or_default();

            if let Some(existing) = record.open_ticket_for(&user_key) {
                let existing_id = existing
                    .parse::<u64>()
                    .ok()
                    .map(ChannelId::new)
                    .ok_or_else(|| BotError::not_found("Channel", existing))?;
                if guild_channel_exists(http, existing_id).await {
                    return Err(BotError::DuplicateTicket {
                        existing: existing_id,
                    });
                }
                // Stale entry: the channel is gone, treat as no open ticket.
                info!(
                    "Dropping stale ticket entry for user {} in guild {}",
                    user_key, guild_key
                );
            }

            let category_id = parse_channel(&record.category_id)
                .ok_or_else(|| BotError::not_configured("run `ticketsetup` first"))?;

            let ticket_type = record
                .ticket_types
                .get(category_key)
                .filter(|t| t.enabled)
                .ok_or_else(|| BotError::InvalidArgument {
                    message: format!("unknown or disabled ticket type `{}`", category_key),
                })?;

            (
                category_id,
                parse_role(&record.support_role_id),
                ticket_type.emoji.clone(),
                ticket_type.name.clone(),
            )
        };

        if !guild_channel_exists(http, category_id).await {
            return Err(BotError::not_configured(
                "the ticket category no longer exists, run `ticketsetup` again",
            ));
        }

        // Allocate the sequence number. From here on a failure burns it;
        // numbers are never reissued.
        let number = {
            let mut store = self.store.write().await;
            let record = store.get_or_create(&guild_key);
            record.clear_open(&user_key);
            record.next_ticket_number()
        };

        let bot_id = http.get_current_user().await?.id;
        let overwrites = ticket_overwrites(guild_id, requester.id, bot_id, support_role);

        let channel = guild_id
            .create_channel(
                http,
                serenity::CreateChannel::new(format!("ticket-{:04}", number))
                    .kind(serenity::ChannelType::Text)
                    .category(category_id)
                    .topic(format!("Ticket for {} • type: {}", requester.name, type_name))
                    .permissions(overwrites),
            )
            .await?;

        // Record and persist before anything user-visible happens.
        {
            let mut store = self.store.write().await;
            let record = store.get_or_create(&guild_key);
            record.record_open(&user_key, &channel.id.to_string());
            store.save().await?;
        }

        self.send_welcome(http, &channel, requester, support_role, number, &type_emoji, &type_name)
            .await?;

        self.log_action(
            http,
            guild_id,
            TicketAction::Created,
            requester.id,
            Some(channel.id),
            None,
        )
        .await;

        info!(
            "Opened ticket #{:04} ({}) for {} in guild {}",
            number, channel.id, requester.name, guild_id
        );

        Ok(TicketOpened {
            channel_id: channel.id,
            number,
        })
    }

    /// Close the ticket living in `channel_id`. Bookkeeping clears and
    /// persists immediately; the channel itself is deleted after a short
    /// grace delay, tolerating a channel that vanished in the meantime.
    pub async fn close_ticket(
        &self,
        http: &Http,
        guild_id: GuildId,
        channel_id: ChannelId,
        actor: &serenity::User,
        reason: Option<String>,
    ) -> Result<()> {
        {
            let lock = self.locks.for_guild(guild_id);
            let _guard = lock.lock().await;

            let guild_key = guild_id.to_string();

            // The channel must live under the configured category.
            let category_id = {
                let store = self.store.read().await;
                store
                    .get(&guild_key)
                    .and_then(|r| parse_channel(&r.category_id))
                    .ok_or(BotError::NotATicket)?
            };
            let channel = http.get_channel(channel_id).await?;
            let parent = channel.guild().and_then(|c| c.parent_id);
            if parent != Some(category_id) {
                return Err(BotError::NotATicket);
            }

            let mut store = self.store.write().await;
            let record = store.get_or_create(&guild_key);
            if let Some(owner) = record.remove_by_channel(&channel_id.to_string()) {
                info!(
                    "Closing ticket {} (owner {}) in guild {}",
                    channel_id, owner, guild_id
                );
            } else {
                warn!(
                    "Closing ticket {} with no bookkeeping entry in guild {}",
                    channel_id, guild_id
                );
            }
            store.save().await?;
        }

        let description = match &reason {
            Some(reason) => format!(
                "This ticket was closed by {}\n**Reason:** {}\n\nThe channel will be deleted in {} seconds…",
                actor.mention(),
                reason,
                CLOSE_GRACE.as_secs()
            ),
            None => format!(
                "This ticket was closed by {}\n\nThe channel will be deleted in {} seconds…",
                actor.mention(),
                CLOSE_GRACE.as_secs()
            ),
        };
        channel_id
            .send_message(
                http,
                serenity::CreateMessage::new()
                    .embed(base_embed("🔒 Ticket Closed", &description, embeds::COLOR_DANGER)),
            )
            .await?;

        self.log_action(
            http,
            guild_id,
            TicketAction::Closed,
            actor.id,
            Some(channel_id),
            reason,
        )
        .await;

        // Grace delay, then delete. The channel disappearing first is fine.
        tokio::time::sleep(CLOSE_GRACE).await;
        if let Err(e) = channel_id.delete(http).await {
            info!("Ticket channel {} already gone: {}", channel_id, e);
        }

        Ok(())
    }

    /// Claim a ticket: an announcement plus a log entry, nothing persisted.
    /// Multiple claims are allowed; the last announcement wins.
    pub async fn claim_ticket(
        &self,
        http: &Http,
        guild_id: GuildId,
        channel_id: ChannelId,
        actor: &serenity::Member,
    ) -> Result<()> {
        let support_role = {
            let store = self.store.read().await;
            store
                .get(&guild_id.to_string())
                .and_then(|r| parse_role(&r.support_role_id))
        };

        if let Some(role_id) = support_role {
            if !actor.roles.contains(&role_id) {
                return Err(BotError::denied(
                    "you need the support role to claim a ticket",
                ));
            }
        }

        channel_id
            .send_message(
                http,
                serenity::CreateMessage::new().embed(base_embed(
                    "✋ Ticket Claimed",
                    &format!("{} is now handling this ticket", actor.mention()),
                    embeds::COLOR_PRIMARY,
                )),
            )
            .await?;

        self.log_action(
            http,
            guild_id,
            TicketAction::Claimed,
            actor.user.id,
            Some(channel_id),
            None,
        )
        .await;

        Ok(())
    }

    /// Grant a user read/write access to a ticket channel. Participants are
    /// not persisted; the channel's overwrite list is the only record.
    pub async fn add_participant(
        &self,
        http: &Http,
        guild_id: GuildId,
        channel_id: ChannelId,
        actor: UserId,
        user: UserId,
    ) -> Result<()> {
        channel_id
            .create_permission(
                http,
                serenity::PermissionOverwrite {
                    allow: Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES,
                    deny: Permissions::empty(),
                    kind: serenity::PermissionOverwriteType::Member(user),
                },
            )
            .await?;

        self.log_action(http, guild_id, TicketAction::Added, user, Some(channel_id), None)
            .await;
        info!("{} added {} to ticket {}", actor, user, channel_id);
        Ok(())
    }

    /// Revoke a user's access to a ticket channel.
    pub async fn remove_participant(
        &self,
        http: &Http,
        guild_id: GuildId,
        channel_id: ChannelId,
        actor: UserId,
        user: UserId,
    ) -> Result<()> {
        channel_id
            .delete_permission(http, serenity::PermissionOverwriteType::Member(user))
            .await?;

        self.log_action(http, guild_id, TicketAction::Removed, user, Some(channel_id), None)
            .await;
        info!("{} removed {} from ticket {}", actor, user, channel_id);
        Ok(())
    }

    // ========== Configuration ==========

    /// Set the support role granted standing access to all tickets.
    pub async fn set_support_role(&self, guild_id: GuildId, role: RoleId) -> Result<()> {
        let lock = self.locks.for_guild(guild_id);
        let _guard = lock.lock().await;

        let mut store = self.store.write().await;
        let record = store.get_or_create(&guild_id.to_string());
        record.support_role_id = Some(role.to_string());
        store.save().await?;

        info!("Support role for guild {} set to {}", guild_id, role);
        Ok(())
    }

    /// Ticket statistics for a guild.
    pub async fn stats(&self, guild_id: GuildId) -> TicketStats {
        let store = self.store.read().await;
        let record = store.get(&guild_id.to_string()).cloned().unwrap_or_default();
        TicketStats {
            open: record.open_tickets.len(),
            total: record.ticket_counter,
            support_role_id: parse_role(&record.support_role_id),
        }
    }

    // ========== Infrastructure ==========

    /// Idempotent bootstrap: reuse category/log/panel channels that are
    /// still resolvable, create whatever is missing, and (re)post the panel
    /// message. Category creation failure is fatal; log-channel failure is
    /// tolerated.
    pub async fn setup_infrastructure(
        &self,
        http: &Http,
        guild_id: GuildId,
    ) -> Result<SetupSummary> {
        let lock = self.locks.for_guild(guild_id);
        let _guard = lock.lock().await;

        let guild_key = guild_id.to_string();
        let mut summary = SetupSummary::default();
        let bot_id = http.get_current_user().await?.id;
        let everyone = guild_id.everyone_role();

        let mut record = {
            let store = self.store.read().await;
            store.get(&guild_key).cloned().unwrap_or_default()
        };

        // Category is foundational: bail out if it cannot be ensured.
        let category_id = match parse_channel(&record.category_id) {
            Some(id) if guild_channel_exists(http, id).await => id,
            _ => {
                let overwrites = vec![
                    serenity::PermissionOverwrite {
                        allow: Permissions::empty(),
                        deny: Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES,
                        kind: serenity::PermissionOverwriteType::Role(everyone),
                    },
                    serenity::PermissionOverwrite {
                        allow: Permissions::VIEW_CHANNEL
                            | Permissions::SEND_MESSAGES
                            | Permissions::MANAGE_CHANNELS
                            | Permissions::MANAGE_MESSAGES,
                        deny: Permissions::empty(),
                        kind: serenity::PermissionOverwriteType::Member(bot_id),
                    },
                ];
                let category = guild_id
                    .create_channel(
                        http,
                        serenity::CreateChannel::new(CATEGORY_NAME)
                            .kind(serenity::ChannelType::Category)
                            .permissions(overwrites),
                    )
                    .await?;
                summary.category_created = true;
                info!("Created ticket category {} in guild {}", category.id, guild_id);
                category.id
            }
        };
        record.category_id = Some(category_id.to_string());
        summary.category_id = Some(category_id);

        // Log channel is best-effort.
        let log_channel_id = match parse_channel(&record.log_channel_id) {
            Some(id) if guild_channel_exists(http, id).await => Some(id),
            _ => match guild_id
                .create_channel(
                    http,
                    serenity::CreateChannel::new(LOG_CHANNEL_NAME)
                        .kind(serenity::ChannelType::Text)
                        .category(category_id)
                        .topic("Ticket system logs"),
                )
                .await
            {
                Ok(channel) => {
                    summary.log_channel_created = true;
                    Some(channel.id)
                }
                Err(e) => {
                    warn!("Could not create ticket log channel: {}", e);
                    summary.log_channel_missing = true;
                    None
                }
            },
        };
        record.log_channel_id = log_channel_id.map(|id| id.to_string());
        summary.log_channel_id = log_channel_id;

        // Panel channel: everyone may read, only the bot writes.
        let panel_channel_id = match parse_channel(&record.panel_channel_id) {
            Some(id) if guild_channel_exists(http, id).await => id,
            _ => {
                let overwrites = vec![
                    serenity::PermissionOverwrite {
                        allow: Permissions::VIEW_CHANNEL,
                        deny: Permissions::SEND_MESSAGES,
                        kind: serenity::PermissionOverwriteType::Role(everyone),
                    },
                    serenity::PermissionOverwrite {
                        allow: Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES,
                        deny: Permissions::empty(),
                        kind: serenity::PermissionOverwriteType::Member(bot_id),
                    },
                ];
                let channel = guild_id
                    .create_channel(
                        http,
                        serenity::CreateChannel::new(PANEL_CHANNEL_NAME)
                            .kind(serenity::ChannelType::Text)
                            .category(category_id)
                            .topic("Click a button below to open a ticket")
                            .permissions(overwrites),
                    )
                    .await?;
                summary.panel_channel_created = true;
                channel.id
            }
        };
        record.panel_channel_id = Some(panel_channel_id.to_string());
        summary.panel_channel_id = Some(panel_channel_id);

        // Best-effort removal of the previous panel message, then re-post.
        if let Some(old_id) = record
            .panel_message_id
            .as_ref()
            .and_then(|s| s.parse::<u64>().ok())
        {
            let _ = panel_channel_id
                .delete_message(http, MessageId::new(old_id))
                .await;
        }
        let panel_message = post_panel_message(http, panel_channel_id, &record).await?;
        record.panel_message_id = Some(panel_message.to_string());

        {
            let mut store = self.store.write().await;
            *store.get_or_create(&guild_key) = record;
            store.save().await?;
        }

        info!("Ticket infrastructure ready for guild {}", guild_id);
        Ok(summary)
    }

    /// Re-post the panel message into the configured panel channel.
    pub async fn repost_panel(&self, http: &Http, guild_id: GuildId) -> Result<ChannelId> {
        let lock = self.locks.for_guild(guild_id);
        let _guard = lock.lock().await;

        let guild_key = guild_id.to_string();
        let mut record = {
            let store = self.store.read().await;
            store.get(&guild_key).cloned().unwrap_or_default()
        };

        let panel_channel_id = parse_channel(&record.panel_channel_id)
            .ok_or_else(|| BotError::not_configured("run `ticketsetup` first"))?;

        if let Some(old_id) = record
            .panel_message_id
            .as_ref()
            .and_then(|s| s.parse::<u64>().ok())
        {
            let _ = panel_channel_id
                .delete_message(http, MessageId::new(old_id))
                .await;
        }

        let panel_message = post_panel_message(http, panel_channel_id, &record).await?;
        record.panel_message_id = Some(panel_message.to_string());

        let mut store = self.store.write().await;
        *store.get_or_create(&guild_key) = record;
        store.save().await?;

        Ok(panel_channel_id)
    }

    // ========== Logging ==========

    /// Emit a ticket log embed. Best-effort: a missing or broken log channel
    /// never fails the operation that triggered the log.
    async fn log_action(
        &self,
        http: &Http,
        guild_id: GuildId,
        action: TicketAction,
        user: UserId,
        channel: Option<ChannelId>,
        reason: Option<String>,
    ) {
        let log_channel = {
            let store = self.store.read().await;
            store
                .get(&guild_id.to_string())
                .and_then(|r| parse_channel(&r.log_channel_id))
        };
        let Some(log_channel) = log_channel else {
            return;
        };

        let mut description = format!("**User:** <@{}>\n", user);
        match channel {
            Some(channel) => description.push_str(&format!("**Ticket:** <#{}>\n", channel)),
            None => description.push_str("**Ticket:** N/A\n"),
        }
        if let Some(reason) = reason {
            description.push_str(&format!("**Reason:** {}", reason));
        }

        let embed = base_embed(action.title(), &description, action.color());
        if let Err(e) = log_channel
            .send_message(http, serenity::CreateMessage::new().embed(embed))
            .await
        {
            warn!("Failed to send ticket log to {}: {}", log_channel, e);
        }
    }

    async fn send_welcome(
        &self,
        http: &Http,
        channel: &serenity::GuildChannel,
        requester: &serenity::User,
        support_role: Option<RoleId>,
        number: u64,
        type_emoji: &str,
        type_name: &str,
    ) -> Result<()> {
        let content = match support_role {
            Some(role) => format!("{} <@&{}>", requester.mention(), role),
            None => requester.mention().to_string(),
        };

        let embed = base_embed(
            &format!("{} Ticket #{:04}", type_emoji, number),
            &format!(
                "Welcome {}!\n\n**Type:** {}\n**Status:** 🟢 Open\n\n\
                 Thanks for opening a ticket. A staff member will be with you \
                 shortly; in the meantime, describe your request in as much \
                 detail as you can.",
                requester.mention(),
                type_name
            ),
            embeds::COLOR_SUCCESS,
        );

        channel
            .send_message(
                http,
                serenity::CreateMessage::new()
                    .content(content)
                    .embed(embed)
                    .components(vec![serenity::CreateActionRow::Buttons(vec![
                        serenity::CreateButton::new("ticket_close")
                            .label("Close")
                            .style(serenity::ButtonStyle::Danger)
                            .emoji(serenity::ReactionType::Unicode("🔒".to_string())),
                        serenity::CreateButton::new("ticket_claim")
                            .label("Claim")
                            .style(serenity::ButtonStyle::Primary)
                            .emoji(serenity::ReactionType::Unicode("✋".to_string())),
                    ])]),
            )
            .await?;
        Ok(())
    }
}

/// Overwrite set for a fresh ticket channel: invisible by default, visible
/// to the requester, the bot, and the support role if configured.
fn ticket_overwrites(
    guild_id: GuildId,
    requester: UserId,
    bot_id: UserId,
    support_role: Option<RoleId>,
) -> Vec<serenity::PermissionOverwrite> {
    let member_allow = Permissions::VIEW_CHANNEL
        | Permissions::SEND_MESSAGES
        | Permissions::ATTACH_FILES
        | Permissions::EMBED_LINKS;

    let mut overwrites = vec![
        serenity::PermissionOverwrite {
            allow: Permissions::empty(),
            deny: Permissions::VIEW_CHANNEL,
            kind: serenity::PermissionOverwriteType::Role(guild_id.everyone_role()),
        },
        serenity::PermissionOverwrite {
            allow: member_allow,
            deny: Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Member(requester),
        },
        serenity::PermissionOverwrite {
            allow: Permissions::VIEW_CHANNEL
                | Permissions::SEND_MESSAGES
                | Permissions::MANAGE_CHANNELS
                | Permissions::MANAGE_MESSAGES,
            deny: Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Member(bot_id),
        },
    ];

    if let Some(role) = support_role {
        overwrites.push(serenity::PermissionOverwrite {
            allow: member_allow,
            deny: Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Role(role),
        });
    }

    overwrites
}

/// Post the panel embed with one button per enabled ticket type.
async fn post_panel_message(
    http: &Http,
    channel_id: ChannelId,
    record: &GuildTicketRecord,
) -> Result<MessageId> {
    let mut type_lines = Vec::new();
    let mut buttons = Vec::new();

    for key in TYPE_ORDER {
        let Some(ticket_type) = record.ticket_types.get(key) else {
            continue;
        };
        if !ticket_type.enabled {
            continue;
        }
        type_lines.push(format!("{} **{}**", ticket_type.emoji, ticket_type.name));
        buttons.push(
            serenity::CreateButton::new(format!("ticket_open:{}", key))
                .label(ticket_type.name.clone())
                .style(serenity::ButtonStyle::Secondary)
                .emoji(serenity::ReactionType::Unicode(ticket_type.emoji.clone())),
        );
    }

    let embed = base_embed(
        "🎫 Ticket System",
        &format!(
            "Welcome to the support system!\n\n\
             **How do I open a ticket?**\n\
             Click the button matching your request below.\n\n\
             **Available ticket types:**\n{}\n\n\
             A staff member will answer as soon as possible.",
            type_lines.join("\n")
        ),
        embeds::COLOR_PRIMARY,
    );

    let message = channel_id
        .send_message(
            http,
            serenity::CreateMessage::new()
                .embed(embed)
                .components(vec![serenity::CreateActionRow::Buttons(buttons)]),
        )
        .await?;

    Ok(message.id)
}

/// Shared ticket manager type
pub type SharedTicketManager = Arc<TicketManager>;

pub fn create_shared_ticket_manager(
    store: SharedTicketStore,
    locks: Arc<GuildLocks>,
) -> SharedTicketManager {
    Arc::new(TicketManager::new(store, locks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TicketType;

    #[test]
    fn test_ticket_overwrites_without_support_role() {
        let overwrites = ticket_overwrites(GuildId::new(1), UserId::new(2), UserId::new(3), None);
        assert_eq!(overwrites.len(), 3);

        // @everyone is denied visibility
        assert!(matches!(
            &overwrites[0].kind,
            serenity::PermissionOverwriteType::Role(_)
        ));
        assert!(overwrites[0].deny.contains(Permissions::VIEW_CHANNEL));

        // Requester can read, write, attach, embed
        assert!(overwrites[1].allow.contains(
            Permissions::VIEW_CHANNEL
                | Permissions::SEND_MESSAGES
                | Permissions::ATTACH_FILES
                | Permissions::EMBED_LINKS
        ));

        // Bot can manage
        assert!(overwrites[2].allow.contains(Permissions::MANAGE_CHANNELS));
    }

    #[test]
    fn test_ticket_overwrites_with_support_role() {
        let overwrites = ticket_overwrites(
            GuildId::new(1),
            UserId::new(2),
            UserId::new(3),
            Some(RoleId::new(4)),
        );
        assert_eq!(overwrites.len(), 4);
        assert!(matches!(
            &overwrites[3].kind,
            serenity::PermissionOverwriteType::Role(r) if *r == RoleId::new(4)
        ));
        assert!(!overwrites[3].allow.contains(Permissions::MANAGE_CHANNELS));
    }

    #[test]
    fn test_setup_summary_reports_missing_logs() {
        let summary = SetupSummary {
            category_id: Some(ChannelId::new(1)),
            panel_channel_id: Some(ChannelId::new(2)),
            log_channel_missing: true,
            ..Default::default()
        };
        let text = summary.format();
        assert!(text.contains("not available"));
        assert!(text.contains("reused"));
    }

    #[test]
    fn test_disabled_types_are_skipped_in_panel_order() {
        let mut record = GuildTicketRecord::default();
        record.ticket_types.insert(
            "report".to_string(),
            TicketType {
                emoji: "⚠️".to_string(),
                name: "Report".to_string(),
                enabled: false,
            },
        );

        let enabled: Vec<&str> = TYPE_ORDER
            .iter()
            .copied()
            .filter(|key| record.ticket_types.get(*key).map(|t| t.enabled).unwrap_or(false))
            .collect();
        assert_eq!(enabled, vec!["support", "partnership", "other"]);
    }
}
