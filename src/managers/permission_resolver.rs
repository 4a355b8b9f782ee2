use poise::serenity_prelude::{self as serenity, GuildId, Permissions, RoleId, UserId};
use std::sync::Arc;
use tracing::info;

use crate::error::{BotError, Result};
use crate::state::{GuildLocks, GuildPermissionRecord, SharedPermissionStore};

/// A grantable trust tier. Level 0 ("Member") is the implicit default and
/// is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Support,
    Moderator,
    Gs,
    Admin,
    Owner,
}

impl Tier {
    pub fn level(self) -> u8 {
        match self {
            Tier::Support => 1,
            Tier::Moderator => 2,
            Tier::Gs => 3,
            Tier::Admin => 4,
            Tier::Owner => 5,
        }
    }

    pub fn label(self) -> &'static str {
        level_label(self.level())
    }

    /// Minimum resolved level a caller needs to grant or revoke this tier.
    pub fn required_caller_level(self) -> u8 {
        match self {
            Tier::Support | Tier::Moderator => 4,
            Tier::Gs | Tier::Admin | Tier::Owner => 5,
        }
    }
}

/// Human-facing name for a level.
pub fn level_label(level: u8) -> &'static str {
    match level {
        5 => "Bot Owner",
        4 => "Administrator",
        3 => "Management",
        2 => "Moderator",
        1 => "Support",
        _ => "Member",
    }
}

/// The slice of a member's Discord-side state that level resolution needs.
/// Captured once per command so resolution itself stays a pure function.
#[derive(Debug, Clone)]
pub struct MemberSnapshot {
    pub user_id: UserId,
    pub is_guild_owner: bool,
    pub has_native_admin: bool,
    pub role_ids: Vec<RoleId>,
    pub top_role_position: u16,
}

impl MemberSnapshot {
    pub fn capture(guild: &serenity::PartialGuild, member: &serenity::Member) -> Self {
        // Base permissions are enough here; channel overwrites never grant
        // ADMINISTRATOR.
        #[allow(deprecated)]
        let permissions = guild.member_permissions(member);

        let mut top_role_position = 0u16;
        for role_id in &member.roles {
            if let Some(role) = guild.roles.get(role_id) {
                top_role_position = top_role_position.max(role.position);
            }
        }

        Self {
            user_id: member.user.id,
            is_guild_owner: member.user.id == guild.owner_id,
            has_native_admin: permissions.contains(Permissions::ADMINISTRATOR),
            role_ids: member.roles.clone(),
            top_role_position,
        }
    }
}

/// Resolve a member's trust level. Strict waterfall, first match wins, so
/// overlapping stored grants still resolve to a single well-defined level.
pub fn resolve_level(record: &GuildPermissionRecord, member: &MemberSnapshot) -> u8 {
    let user_id = member.user_id.to_string();

    if record.holds_tier(5, &user_id) {
        return 5;
    }
    if member.is_guild_owner {
        return 5;
    }
    if record.holds_tier(4, &user_id) {
        return 4;
    }
    if member.has_native_admin {
        return 4;
    }
    if record.holds_tier(3, &user_id) {
        return 3;
    }
    if record.holds_tier(2, &user_id) {
        return 2;
    }
    if record.holds_tier(1, &user_id) {
        return 1;
    }

    member
        .role_ids
        .iter()
        .filter_map(|role_id| record.role_levels.get(&role_id.to_string()).copied())
        .max()
        .unwrap_or(0)
}

/// Whether `actor` may apply a sanction to `target`. Two layers: the bot's
/// tier ladder first, then Discord's native role ordering — which only a
/// tier-5 actor bypasses.
pub fn can_moderate(
    record: &GuildPermissionRecord,
    actor: &MemberSnapshot,
    target: &MemberSnapshot,
) -> std::result::Result<(), String> {
    if actor.user_id == target.user_id {
        return Err("You cannot sanction yourself!".to_string());
    }

    if target.is_guild_owner {
        return Err("You cannot sanction the server owner!".to_string());
    }

    let actor_level = resolve_level(record, actor);
    let target_level = resolve_level(record, target);

    if target_level >= actor_level {
        return Err(format!(
            "You cannot sanction a {} member (you are {})!",
            level_label(target_level),
            level_label(actor_level)
        ));
    }

    if actor_level == 5 {
        return Ok(());
    }

    if target.top_role_position >= actor.top_role_position {
        return Err("You cannot sanction someone with an equal or higher Discord role!".to_string());
    }

    Ok(())
}

/// Resolves trust tiers and owns all mutations of the permission store.
pub struct PermissionResolver {
    store: SharedPermissionStore,
    locks: Arc<GuildLocks>,
}

impl PermissionResolver {
    pub fn new(store: SharedPermissionStore, locks: Arc<GuildLocks>) -> Self {
        Self { store, locks }
    }

    /// Resolve a member's level against the current record. Read-only: an
    /// unknown guild resolves against an empty record without creating one.
    pub async fn level_of(&self, guild_id: GuildId, member: &MemberSnapshot) -> u8 {
        let store = self.store.read().await;
        match store.get(&guild_id.to_string()) {
            Some(record) => resolve_level(record, member),
            None => resolve_level(&GuildPermissionRecord::default(), member),
        }
    }

    /// Moderation-eligibility check between two members.
    pub async fn check_moderate(
        &self,
        guild_id: GuildId,
        actor: &MemberSnapshot,
        target: &MemberSnapshot,
    ) -> std::result::Result<(), String> {
        let store = self.store.read().await;
        match store.get(&guild_id.to_string()) {
            Some(record) => can_moderate(record, actor, target),
            None => can_moderate(&GuildPermissionRecord::default(), actor, target),
        }
    }

    /// Snapshot of a guild's record for display purposes.
    pub async fn guild_record(&self, guild_id: GuildId) -> GuildPermissionRecord {
        let store = self.store.read().await;
        store.get(&guild_id.to_string()).cloned().unwrap_or_default()
    }

    /// Grant a tier to a user. The caller's resolved level must clear the
    /// tier's threshold; granting an already-held tier is a reported no-op.
    /// The store is persisted before success is acknowledged.
    pub async fn grant(
        &self,
        guild_id: GuildId,
        caller_level: u8,
        user: UserId,
        tier: Tier,
    ) -> Result<()> {
        if caller_level < tier.required_caller_level() {
            return Err(BotError::denied(format!(
                "granting {} requires level {}",
                tier.label(),
                tier.required_caller_level()
            )));
        }

        let lock = self.locks.for_guild(guild_id);
        let _guard = lock.lock().await;

        let mut store = self.store.write().await;
        let record = store.get_or_create(&guild_id.to_string());
        if !record.insert_tier(tier.level(), &user.to_string()) {
            return Err(BotError::denied(format!(
                "<@{}> already holds the {} tier",
                user,
                tier.label()
            )));
        }
        store.save().await?;

        info!(
            "Granted {} (level {}) to {} in guild {}",
            tier.label(),
            tier.level(),
            user,
            guild_id
        );
        Ok(())
    }

    /// Revoke a tier from a user. Revoking a non-held tier is a reported
    /// no-op that leaves the record untouched.
    pub async fn revoke(
        &self,
        guild_id: GuildId,
        caller_level: u8,
        user: UserId,
        tier: Tier,
    ) -> Result<()> {
        if caller_level < tier.required_caller_level() {
            return Err(BotError::denied(format!(
                "revoking {} requires level {}",
                tier.label(),
                tier.required_caller_level()
            )));
        }

        let lock = self.locks.for_guild(guild_id);
        let _guard = lock.lock().await;

        let mut store = self.store.write().await;
        let record = store.get_or_create(&guild_id.to_string());
        if !record.remove_tier(tier.level(), &user.to_string()) {
            return Err(BotError::denied(format!(
                "<@{}> does not hold the {} tier",
                user,
                tier.label()
            )));
        }
        store.save().await?;

        info!(
            "Revoked {} from {} in guild {}",
            tier.label(),
            user,
            guild_id
        );
        Ok(())
    }

    /// Map a Discord role to a level (0-4). Level 5 cannot be granted via
    /// role.
    pub async fn set_role_level(
        &self,
        guild_id: GuildId,
        caller_level: u8,
        role: RoleId,
        level: u8,
    ) -> Result<()> {
        if caller_level < 4 {
            return Err(BotError::denied(
                "configuring role levels requires level 4",
            ));
        }
        if level > 4 {
            return Err(BotError::InvalidArgument {
                message: "role levels go from 0 to 4".to_string(),
            });
        }

        let lock = self.locks.for_guild(guild_id);
        let _guard = lock.lock().await;

        let mut store = self.store.write().await;
        let record = store.get_or_create(&guild_id.to_string());
        record.role_levels.insert(role.to_string(), level);
        store.save().await?;

        info!("Mapped role {} to level {} in guild {}", role, level, guild_id);
        Ok(())
    }

    /// Remove a role's level mapping.
    pub async fn clear_role_level(
        &self,
        guild_id: GuildId,
        caller_level: u8,
        role: RoleId,
    ) -> Result<()> {
        if caller_level < 4 {
            return Err(BotError::denied(
                "configuring role levels requires level 4",
            ));
        }

        let lock = self.locks.for_guild(guild_id);
        let _guard = lock.lock().await;

        let mut store = self.store.write().await;
        let record = store.get_or_create(&guild_id.to_string());
        if record.role_levels.remove(&role.to_string()).is_none() {
            return Err(BotError::denied(format!(
                "<@&{}> has no configured level",
                role
            )));
        }
        store.save().await?;

        info!("Cleared role level for {} in guild {}", role, guild_id);
        Ok(())
    }
}

/// Shared permission resolver type
pub type SharedPermissionResolver = Arc<PermissionResolver>;

pub fn create_shared_permission_resolver(
    store: SharedPermissionStore,
    locks: Arc<GuildLocks>,
) -> SharedPermissionResolver {
    Arc::new(PermissionResolver::new(store, locks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{create_shared_permission_store, PermissionStore};

    fn snapshot(id: u64) -> MemberSnapshot {
        MemberSnapshot {
            user_id: UserId::new(id),
            is_guild_owner: false,
            has_native_admin: false,
            role_ids: vec![],
            top_role_position: 0,
        }
    }

    #[test]
    fn test_waterfall_priority() {
        let mut record = GuildPermissionRecord::default();
        record.insert_tier(1, "10");
        record.insert_tier(4, "10");

        // Highest tier wins even though both are stored
        assert_eq!(resolve_level(&record, &snapshot(10)), 4);
    }

    #[test]
    fn test_guild_owner_dominates_lower_grants() {
        let mut record = GuildPermissionRecord::default();
        record.insert_tier(1, "10");

        let mut member = snapshot(10);
        member.is_guild_owner = true;

        assert_eq!(resolve_level(&record, &member), 5);
    }

    #[test]
    fn test_native_admin_is_level_4() {
        let record = GuildPermissionRecord::default();
        let mut member = snapshot(10);
        member.has_native_admin = true;

        assert_eq!(resolve_level(&record, &member), 4);
    }

    #[test]
    fn test_role_levels_take_the_max() {
        let mut record = GuildPermissionRecord::default();
        record.role_levels.insert("100".to_string(), 1);
        record.role_levels.insert("200".to_string(), 3);

        let mut member = snapshot(10);
        member.role_ids = vec![RoleId::new(100), RoleId::new(200), RoleId::new(300)];

        assert_eq!(resolve_level(&record, &member), 3);
    }

    #[test]
    fn test_unknown_member_is_level_0() {
        let record = GuildPermissionRecord::default();
        assert_eq!(resolve_level(&record, &snapshot(10)), 0);
    }

    #[test]
    fn test_cannot_moderate_self() {
        let record = GuildPermissionRecord::default();
        let member = snapshot(10);
        assert!(can_moderate(&record, &member, &member).is_err());
    }

    #[test]
    fn test_cannot_moderate_guild_owner() {
        let mut record = GuildPermissionRecord::default();
        record.insert_tier(5, "10");

        let actor = snapshot(10);
        let mut target = snapshot(20);
        target.is_guild_owner = true;

        // Even a tier-5 actor cannot touch the native owner; the owner also
        // resolves to 5 so the tier rule fires first, but the outcome is a
        // denial either way.
        assert!(can_moderate(&record, &actor, &target).is_err());
    }

    #[test]
    fn test_equal_or_higher_tier_is_denied() {
        let mut record = GuildPermissionRecord::default();
        record.insert_tier(2, "10");
        record.insert_tier(3, "20");

        let reason = can_moderate(&record, &snapshot(10), &snapshot(20)).unwrap_err();
        assert!(reason.contains("Management"));
        assert!(reason.contains("Moderator"));
    }

    #[test]
    fn test_tier_5_bypasses_native_role_rank() {
        let mut record = GuildPermissionRecord::default();
        record.insert_tier(5, "10");

        let mut actor = snapshot(10);
        actor.top_role_position = 1;
        let mut target = snapshot(20);
        target.top_role_position = 50;

        assert!(can_moderate(&record, &actor, &target).is_ok());
    }

    #[test]
    fn test_native_role_rank_blocks_lower_tiers() {
        let mut record = GuildPermissionRecord::default();
        record.insert_tier(4, "10");

        let mut actor = snapshot(10);
        actor.top_role_position = 5;
        let mut target = snapshot(20);
        target.top_role_position = 5;

        let reason = can_moderate(&record, &actor, &target).unwrap_err();
        assert!(reason.contains("Discord role"));
    }

    fn test_resolver(path: &str) -> PermissionResolver {
        let store = create_shared_permission_store(PermissionStore::new(path));
        PermissionResolver::new(store, Arc::new(GuildLocks::new()))
    }

    #[tokio::test]
    async fn test_grant_requires_threshold() {
        let path = std::env::temp_dir().join("warden_resolver_threshold.json");
        let resolver = test_resolver(path.to_str().unwrap());
        let guild = GuildId::new(1);

        // Level 4 may grant moderator but not admin
        assert!(resolver
            .grant(guild, 4, UserId::new(7), Tier::Moderator)
            .await
            .is_ok());
        assert!(matches!(
            resolver.grant(guild, 4, UserId::new(7), Tier::Admin).await,
            Err(BotError::PermissionDenied { .. })
        ));

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_grant_twice_is_reported_noop() {
        let path = std::env::temp_dir().join("warden_resolver_noop.json");
        let resolver = test_resolver(path.to_str().unwrap());
        let guild = GuildId::new(1);

        resolver
            .grant(guild, 5, UserId::new(7), Tier::Admin)
            .await
            .unwrap();
        assert!(resolver
            .grant(guild, 5, UserId::new(7), Tier::Admin)
            .await
            .is_err());

        let record = resolver.guild_record(guild).await;
        assert_eq!(record.admins, vec!["7".to_string()]);

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_revoke_twice_leaves_record_unchanged() {
        let path = std::env::temp_dir().join("warden_resolver_revoke.json");
        let resolver = test_resolver(path.to_str().unwrap());
        let guild = GuildId::new(1);

        resolver
            .grant(guild, 5, UserId::new(7), Tier::Support)
            .await
            .unwrap();
        resolver
            .revoke(guild, 5, UserId::new(7), Tier::Support)
            .await
            .unwrap();

        let before = resolver.guild_record(guild).await;
        assert!(resolver
            .revoke(guild, 5, UserId::new(7), Tier::Support)
            .await
            .is_err());
        let after = resolver.guild_record(guild).await;

        assert_eq!(before.supports, after.supports);
        assert!(after.supports.is_empty());

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_role_level_5_rejected() {
        let path = std::env::temp_dir().join("warden_resolver_role5.json");
        let resolver = test_resolver(path.to_str().unwrap());

        assert!(matches!(
            resolver
                .set_role_level(GuildId::new(1), 5, RoleId::new(9), 5)
                .await,
            Err(BotError::InvalidArgument { .. })
        ));

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_grant_then_resolve() {
        let path = std::env::temp_dir().join("warden_resolver_resolve.json");
        let resolver = test_resolver(path.to_str().unwrap());
        let guild = GuildId::new(1);

        assert_eq!(resolver.level_of(guild, &snapshot(7)).await, 0);
        resolver
            .grant(guild, 5, UserId::new(7), Tier::Gs)
            .await
            .unwrap();
        assert_eq!(resolver.level_of(guild, &snapshot(7)).await, 3);

        let _ = tokio::fs::remove_file(&path).await;
    }
}
