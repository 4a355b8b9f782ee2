use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// One selectable ticket category on the panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketType {
    pub emoji: String,
    pub name: String,
    pub enabled: bool,
}

impl TicketType {
    fn new(emoji: &str, name: &str) -> Self {
        Self {
            emoji: emoji.to_string(),
            name: name.to_string(),
            enabled: true,
        }
    }
}

/// Per-guild ticket system configuration and bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuildTicketRecord {
    /// Category channel holding all ticket channels
    pub category_id: Option<String>,

    /// Channel carrying the panel message
    pub panel_channel_id: Option<String>,

    /// The panel message itself
    pub panel_message_id: Option<String>,

    /// Channel receiving ticket log embeds
    pub log_channel_id: Option<String>,

    /// Role with standing access to all tickets
    pub support_role_id: Option<String>,

    /// Monotonic sequence number, never reused
    pub ticket_counter: u64,

    /// Requester ID -> open ticket channel ID (at most one per requester)
    pub open_tickets: HashMap<String, String>,

    /// Panel category key -> ticket type
    pub ticket_types: HashMap<String, TicketType>,
}

impl Default for GuildTicketRecord {
    fn default() -> Self {
        let mut ticket_types = HashMap::new();
        ticket_types.insert("support".to_string(), TicketType::new("💬", "General Support"));
        ticket_types.insert("report".to_string(), TicketType::new("⚠️", "Report"));
        ticket_types.insert("partnership".to_string(), TicketType::new("🤝", "Partnership"));
        ticket_types.insert("other".to_string(), TicketType::new("📝", "Other"));

        Self {
            category_id: None,
            panel_channel_id: None,
            panel_message_id: None,
            log_channel_id: None,
            support_role_id: None,
            ticket_counter: 0,
            open_tickets: HashMap::new(),
            ticket_types,
        }
    }
}

impl GuildTicketRecord {
    /// Allocate the next ticket number. Numbers are burned on failure and
    /// never reissued.
    pub fn next_ticket_number(&mut self) -> u64 {
        self.ticket_counter += 1;
        self.ticket_counter
    }

    /// The open ticket channel recorded for a requester, if any.
    pub fn open_ticket_for(&self, user_id: &str) -> Option<&str> {
        self.open_tickets.get(user_id).map(String::as_str)
    }

    /// Record a freshly created ticket channel for a requester.
    pub fn record_open(&mut self, user_id: &str, channel_id: &str) {
        self.open_tickets
            .insert(user_id.to_string(), channel_id.to_string());
    }

    /// Remove the entry pointing at `channel_id`, returning the requester ID
    /// it belonged to. Linear scan; open-ticket cardinality is tiny.
    pub fn remove_by_channel(&mut self, channel_id: &str) -> Option<String> {
        let owner = self
            .open_tickets
            .iter()
            .find(|(_, ch)| ch.as_str() == channel_id)
            .map(|(user, _)| user.clone())?;
        self.open_tickets.remove(&owner);
        Some(owner)
    }

    /// Drop a stale entry for a requester whose channel no longer exists.
    pub fn clear_open(&mut self, user_id: &str) {
        self.open_tickets.remove(user_id);
    }
}

/// All ticket records, keyed by guild ID, persisted as one JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketStore {
    /// Schema version
    pub version: u32,

    /// Per-guild records (guild ID -> record)
    pub guilds: HashMap<String, GuildTicketRecord>,

    /// Backing file path (not serialized)
    #[serde(skip)]
    path: String,
}

impl Default for TicketStore {
    fn default() -> Self {
        Self {
            version: 1,
            guilds: HashMap::new(),
            path: String::new(),
        }
    }
}

impl TicketStore {
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

    /// Get or create the record for a guild, defaulted with the four
    /// standard ticket types.
    pub fn get_or_create(&mut self, guild_id: &str) -> &mut GuildTicketRecord {
        self.guilds.entry(guild_id.to_string()).or_default()
    }

    /// Read-only record lookup.
    pub fn get(&self, guild_id: &str) -> Option<&GuildTicketRecord> {
        self.guilds.get(guild_id)
    }
}

/// Shared ticket store type
pub type SharedTicketStore = Arc<tokio::sync::RwLock<TicketStore>>;

pub fn create_shared_ticket_store(store: TicketStore) -> SharedTicketStore {
    Arc::new(tokio::sync::RwLock::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_carry_four_ticket_types() {
        let record = GuildTicketRecord::default();
        assert_eq!(record.ticket_types.len(), 4);
        assert!(record.ticket_types.contains_key("support"));
        assert!(record.ticket_types.contains_key("report"));
        assert!(record.ticket_types.contains_key("partnership"));
        assert!(record.ticket_types.contains_key("other"));
        assert!(record.ticket_types.values().all(|t| t.enabled));
    }

    #[test]
    fn test_counter_is_monotonic() {
        let mut record = GuildTicketRecord::default();
        let first = record.next_ticket_number();
        let second = record.next_ticket_number();
        let third = record.next_ticket_number();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(third, 3);
        assert_eq!(record.ticket_counter, 3);
    }

    #[test]
    fn test_one_open_ticket_per_user() {
        let mut record = GuildTicketRecord::default();
        record.record_open("10", "100");
        record.record_open("10", "200");

        assert_eq!(record.open_tickets.len(), 1);
        assert_eq!(record.open_ticket_for("10"), Some("200"));
    }

    #[test]
    fn test_remove_by_channel() {
        let mut record = GuildTicketRecord::default();
        record.record_open("10", "100");
        record.record_open("20", "200");

        assert_eq!(record.remove_by_channel("100"), Some("10".to_string()));
        assert_eq!(record.open_ticket_for("10"), None);
        assert_eq!(record.open_ticket_for("20"), Some("200"));

        // Unknown channel is a no-op
        assert_eq!(record.remove_by_channel("999"), None);
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir().join("warden_ticket_store_test.json");
        let path = path.to_str().unwrap().to_string();
        let _ = tokio::fs::remove_file(&path).await;

        let mut store = TicketStore::new(&path);
        {
            let record = store.get_or_create("55");
            record.support_role_id = Some("8".to_string());
            record.next_ticket_number();
            record.record_open("1", "2");
        }
        store.save().await.unwrap();

        let reloaded = TicketStore::load(&path).await.unwrap();
        let record = reloaded.get("55").unwrap();
        assert_eq!(record.support_role_id.as_deref(), Some("8"));
        assert_eq!(record.ticket_counter, 1);
        assert_eq!(record.open_ticket_for("1"), Some("2"));

        let _ = tokio::fs::remove_file(&path).await;
    }
}
