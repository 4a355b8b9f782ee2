use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-guild permission grants, independent of Discord's native roles.
///
/// The five member lists are a priority ladder, not disjoint sets: a user may
/// appear in several lists, and resolution always takes the highest tier.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct GuildPermissionRecord {
    /// Bot owners (level 5)
    pub owners: Vec<String>,

    /// Administrators (level 4)
    pub admins: Vec<String>,

    /// Management / GS (level 3)
    pub gs_users: Vec<String>,

    /// Moderators (level 2)
    pub moderators: Vec<String>,

    /// Supports (level 1)
    pub supports: Vec<String>,

    /// Discord role ID -> level (0-4; level 5 is never granted via role)
    pub role_levels: HashMap<String, u8>,
}

impl GuildPermissionRecord {
    /// The member list backing a given tier level, if one exists.
    pub fn tier_list(&self, level: u8) -> Option<&Vec<String>> {
        match level {
            5 => Some(&self.owners),
            4 => Some(&self.admins),
            3 => Some(&self.gs_users),
            2 => Some(&self.moderators),
            1 => Some(&self.supports),
            _ => None,
        }
    }

    fn tier_list_mut(&mut self, level: u8) -> Option<&mut Vec<String>> {
        match level {
            5 => Some(&mut self.owners),
            4 => Some(&mut self.admins),
            3 => Some(&mut self.gs_users),
            2 => Some(&mut self.moderators),
            1 => Some(&mut self.supports),
            _ => None,
        }
    }

    pub fn holds_tier(&self, level: u8, user_id: &str) -> bool {
        self.tier_list(level)
            .map(|list| list.iter().any(|id| id == user_id))
            .unwrap_or(false)
    }

    /// Add a user to a tier list. Returns false if already present.
    pub fn insert_tier(&mut self, level: u8, user_id: &str) -> bool {
        match self.tier_list_mut(level) {
            Some(list) if !list.iter().any(|id| id == user_id) => {
                list.push(user_id.to_string());
                true
            }
            _ => false,
        }
    }

    /// Remove a user from a tier list. Returns false if not present.
    pub fn remove_tier(&mut self, level: u8, user_id: &str) -> bool {
        match self.tier_list_mut(level) {
            Some(list) => {
                let before = list.len();
                list.retain(|id| id != user_id);
                list.len() != before
            }
            None => false,
        }
    }
}

/// All permission records, keyed by guild ID, persisted as one JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionStore {
    /// Schema version
    pub version: u32,

    /// Per-guild records (guild ID -> record)
    pub guilds: HashMap<String, GuildPermissionRecord>,

    /// Backing file path (not serialized)
    #[serde(skip)]
    path: String,
}

impl Default for PermissionStore {
    fn default() -> Self {
        Self {
            version: 1,
            guilds: HashMap::new(),
            path: String::new(),
        }
    }
}

impl PermissionStore {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Default::default()
        }
    }

    /// Load from file, or start empty if the file does not exist yet.
    pub async fn load(path: &str) -> crate::error::Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let mut store: Self = serde_json::from_str(&content).map_err(|e| {
                    crate::error::BotError::StateParse {
                        path: path.to_string(),
                        source: e,
                    }
                })?;
                store.path = path.to_string();
                Ok(store)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new(path)),
            Err(e) => Err(crate::error::BotError::StateLoad {
                path: path.to_string(),
                source: e,
            }),
        }
    }

    /// Save to file atomically (temp file + rename).
    pub async fn save(&self) -> crate::error::Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| crate::error::BotError::StateParse {
                path: self.path.clone(),
                source: e,
            })?;

        let temp_path = format!("{}.tmp", self.path);
        tokio::fs::write(&temp_path, &content).await.map_err(|e| {
            crate::error::BotError::StateSave {
                path: self.path.clone(),
                source: e,
            }
        })?;

        tokio::fs::rename(&temp_path, &self.path).await.map_err(|e| {
            crate::error::BotError::StateSave {
                path: self.path.clone(),
                source: e,
            }
        })?;

        Ok(())
    }

    /// Get or create the record for a guild. Creation is in-memory only;
    /// nothing touches disk until the first real mutation is saved.
    pub fn get_or_create(&mut self, guild_id: &str) -> &mut GuildPermissionRecord {
        self.guilds.entry(guild_id.to_string()).or_default()
    }

    /// Read-only record lookup.
    pub fn get(&self, guild_id: &str) -> Option<&GuildPermissionRecord> {
        self.guilds.get(guild_id)
    }
}

/// Shared permission store type
pub type SharedPermissionStore = Arc<tokio::sync::RwLock<PermissionStore>>;

pub fn create_shared_permission_store(store: PermissionStore) -> SharedPermissionStore {
    Arc::new(tokio::sync::RwLock::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_list_insert_remove() {
        let mut record = GuildPermissionRecord::default();

        assert!(record.insert_tier(2, "111"));
        assert!(record.holds_tier(2, "111"));
        // Second insert is a no-op
        assert!(!record.insert_tier(2, "111"));
        assert_eq!(record.moderators, vec!["111".to_string()]);

        assert!(record.remove_tier(2, "111"));
        assert!(!record.holds_tier(2, "111"));
        // Second removal is a no-op and leaves the record unchanged
        assert!(!record.remove_tier(2, "111"));
        assert!(record.moderators.is_empty());
    }

    #[test]
    fn test_overlapping_tiers_allowed_in_storage() {
        let mut record = GuildPermissionRecord::default();
        assert!(record.insert_tier(1, "42"));
        assert!(record.insert_tier(4, "42"));

        assert!(record.holds_tier(1, "42"));
        assert!(record.holds_tier(4, "42"));
    }

    #[test]
    fn test_get_or_create_is_lazy_and_defaulted() {
        let mut store = PermissionStore::new("unused.json");
        assert!(store.get("123").is_none());

        let record = store.get_or_create("123");
        assert!(record.owners.is_empty());
        assert!(record.role_levels.is_empty());

        assert!(store.get("123").is_some());
    }

    #[test]
    fn test_json_round_trip_preserves_grants() {
        let mut store = PermissionStore::new("unused.json");
        {
            let record = store.get_or_create("9001");
            record.insert_tier(5, "1");
            record.insert_tier(3, "2");
            record.insert_tier(3, "3");
            record.role_levels.insert("555".to_string(), 2);
        }

        let json = serde_json::to_string(&store).unwrap();
        let reloaded: PermissionStore = serde_json::from_str(&json).unwrap();

        let a = store.get("9001").unwrap();
        let b = reloaded.get("9001").unwrap();
        assert_eq!(a.owners, b.owners);
        assert_eq!(a.gs_users, b.gs_users);
        assert_eq!(a.role_levels, b.role_levels);
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir().join("warden_perm_store_test.json");
        let path = path.to_str().unwrap().to_string();
        let _ = tokio::fs::remove_file(&path).await;

        let mut store = PermissionStore::new(&path);
        store.get_or_create("77").insert_tier(4, "abc");
        store.save().await.unwrap();

        let reloaded = PermissionStore::load(&path).await.unwrap();
        assert!(reloaded.get("77").unwrap().holds_tier(4, "abc"));

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_load_missing_file_yields_empty_store() {
        let store = PermissionStore::load("/nonexistent/warden-perms.json")
            .await
            .unwrap();
        assert!(store.guilds.is_empty());
    }
}
