use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    // Permission errors
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    // Lookup errors
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    // Ticket errors
    #[error("You already have an open ticket: <#{existing}>")]
    DuplicateTicket { existing: serenity::ChannelId },

    #[error("This channel is not a ticket")]
    NotATicket,

    // Configuration errors
    #[error("Not configured: {message}")]
    ConfigurationMissing { message: String },

    // State errors
    #[error("Failed to save state to '{path}': {source}")]
    StateSave {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load state from '{path}': {source}")]
    StateLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse state file '{path}': {source}")]
    StateParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    // Discord errors
    #[error("Discord API error: {message}")]
    Transport { message: String },

    // Generic errors
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl BotError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        BotError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn denied(message: impl Into<String>) -> Self {
        BotError::PermissionDenied {
            message: message.into(),
        }
    }

    pub fn not_configured(message: impl Into<String>) -> Self {
        BotError::ConfigurationMissing {
            message: message.into(),
        }
    }

    /// Message suitable for an embed field. Transport errors carry raw API
    /// payloads, so they are truncated to a display-safe length.
    pub fn user_message(&self) -> String {
        const MAX_DISPLAY_LEN: usize = 180;

        let text = self.to_string();
        if matches!(self, BotError::Transport { .. }) && text.len() > MAX_DISPLAY_LEN {
            let cut = text
                .char_indices()
                .take_while(|(i, _)| *i < MAX_DISPLAY_LEN)
                .last()
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(0);
            format!("{}…", &text[..cut])
        } else {
            text
        }
    }
}

impl From<serenity::Error> for BotError {
    fn from(err: serenity::Error) -> Self {
        BotError::Transport {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::StateParse {
            path: String::new(),
            source: err,
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;

use poise::serenity_prelude as serenity;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_message_truncated() {
        let err = BotError::Transport {
            message: "x".repeat(400),
        };
        let shown = err.user_message();
        assert!(shown.chars().count() <= 200);
        assert!(shown.ends_with('…'));
    }

    #[test]
    fn test_short_messages_untouched() {
        let err = BotError::denied("nope");
        assert_eq!(err.user_message(), "Permission denied: nope");
    }
}
