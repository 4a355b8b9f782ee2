use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide mutable state: blacklists and the maintenance flag. Owned by
/// `Data` and passed by reference to handlers; lives exactly as long as the
/// process (nothing here is persisted).
pub struct RuntimeState {
    blacklisted_users: RwLock<HashSet<u64>>,
    blacklisted_guilds: RwLock<HashSet<u64>>,
    maintenance: AtomicBool,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self {
            blacklisted_users: RwLock::new(HashSet::new()),
            blacklisted_guilds: RwLock::new(HashSet::new()),
            maintenance: AtomicBool::new(false),
            started_at: chrono::Utc::now(),
        }
    }
}

impl RuntimeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_user_blacklisted(&self, user_id: u64) -> bool {
        self.blacklisted_users.read().contains(&user_id)
    }

    pub fn is_guild_blacklisted(&self, guild_id: u64) -> bool {
        self.blacklisted_guilds.read().contains(&guild_id)
    }

    /// Returns false if the user was already blacklisted.
    pub fn blacklist_user(&self, user_id: u64) -> bool {
        self.blacklisted_users.write().insert(user_id)
    }

    /// Returns false if the user was not blacklisted.
    pub fn unblacklist_user(&self, user_id: u64) -> bool {
        self.blacklisted_users.write().remove(&user_id)
    }

    pub fn blacklist_guild(&self, guild_id: u64) -> bool {
        self.blacklisted_guilds.write().insert(guild_id)
    }

    pub fn unblacklist_guild(&self, guild_id: u64) -> bool {
        self.blacklisted_guilds.write().remove(&guild_id)
    }

    pub fn blacklisted_users(&self) -> Vec<u64> {
        self.blacklisted_users.read().iter().copied().collect()
    }

    pub fn blacklisted_guilds(&self) -> Vec<u64> {
        self.blacklisted_guilds.read().iter().copied().collect()
    }

    pub fn maintenance(&self) -> bool {
        self.maintenance.load(Ordering::Relaxed)
    }

    pub fn set_maintenance(&self, on: bool) {
        self.maintenance.store(on, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> chrono::Duration {
        chrono::Utc::now() - self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blacklist_round_trip() {
        let state = RuntimeState::new();

        assert!(!state.is_user_blacklisted(1));
        assert!(state.blacklist_user(1));
        assert!(state.is_user_blacklisted(1));
        // Second add reports already-present
        assert!(!state.blacklist_user(1));

        assert!(state.unblacklist_user(1));
        assert!(!state.is_user_blacklisted(1));
        assert!(!state.unblacklist_user(1));
    }

    #[test]
    fn test_user_and_guild_lists_are_independent() {
        let state = RuntimeState::new();
        state.blacklist_user(5);

        assert!(!state.is_guild_blacklisted(5));
        assert!(state.blacklist_guild(5));
        assert!(state.is_guild_blacklisted(5));
    }

    #[test]
    fn test_maintenance_flag() {
        let state = RuntimeState::new();
        assert!(!state.maintenance());
        state.set_maintenance(true);
        assert!(state.maintenance());
        state.set_maintenance(false);
        assert!(!state.maintenance());
    }
}
