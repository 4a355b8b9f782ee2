use poise::serenity_prelude::{self as serenity, GuildId, Http, UserId};

use crate::error::Result;

/// Ordered member lookup chain: exact ID, then mention, then
/// case-insensitive exact username/display-name, then case-insensitive
/// substring. Each step is its own function so it can be tested alone.
pub async fn find_member(
    http: &Http,
    guild_id: GuildId,
    input: &str,
) -> Result<Option<serenity::Member>> {
    let input = input.trim();

    if let Some(user_id) = parse_user_id(input).or_else(|| parse_mention(input)) {
        return Ok(guild_id.member(http, user_id).await.ok());
    }

    // Name-based lookup scans the member list. One page is plenty for the
    // community sizes this bot serves.
    let members = guild_id.members(http, None, None).await?;
    let names: Vec<(String, String)> = members
        .iter()
        .map(|m| (m.user.name.clone(), m.display_name().to_string()))
        .collect();

    Ok(best_name_match(&names, input).map(|idx| members[idx].clone()))
}

/// Step 1: a bare numeric snowflake.
pub(crate) fn parse_user_id(input: &str) -> Option<UserId> {
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    input.parse::<u64>().ok().map(UserId::new)
}

/// Step 2: a `<@123>` or `<@!123>` mention.
pub(crate) fn parse_mention(input: &str) -> Option<UserId> {
    let inner = input.strip_prefix("<@")?.strip_suffix('>')?;
    let inner = inner.strip_prefix('!').unwrap_or(inner);
    parse_user_id(inner)
}

/// Steps 3 and 4 over (username, display name) pairs: exact match first,
/// substring only if no exact hit anywhere.
pub(crate) fn best_name_match(names: &[(String, String)], input: &str) -> Option<usize> {
    let needle = input.to_lowercase();

    if let Some(idx) = names.iter().position(|(name, display)| {
        name.to_lowercase() == needle || display.to_lowercase() == needle
    }) {
        return Some(idx);
    }

    names.iter().position(|(name, display)| {
        name.to_lowercase().contains(&needle) || display.to_lowercase().contains(&needle)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<(String, String)> {
        vec![
            ("alice".to_string(), "Alice".to_string()),
            ("bobby".to_string(), "Bob the Builder".to_string()),
            ("carol".to_string(), "caro".to_string()),
        ]
    }

    #[test]
    fn test_parse_user_id() {
        assert_eq!(parse_user_id("123456"), Some(UserId::new(123456)));
        assert_eq!(parse_user_id("12a"), None);
        assert_eq!(parse_user_id(""), None);
        assert_eq!(parse_user_id("<@123>"), None);
    }

    #[test]
    fn test_parse_mention() {
        assert_eq!(parse_mention("<@123>"), Some(UserId::new(123)));
        assert_eq!(parse_mention("<@!123>"), Some(UserId::new(123)));
        assert_eq!(parse_mention("<@abc>"), None);
        assert_eq!(parse_mention("123"), None);
    }

    #[test]
    fn test_exact_name_beats_substring() {
        // "caro" is an exact display name AND a substring of "carol";
        // exact wins, and it also beats earlier substring-only entries.
        assert_eq!(best_name_match(&names(), "caro"), Some(2));
    }

    #[test]
    fn test_exact_match_case_insensitive() {
        assert_eq!(best_name_match(&names(), "ALICE"), Some(0));
        assert_eq!(best_name_match(&names(), "bob the builder"), Some(1));
    }

    #[test]
    fn test_substring_match() {
        assert_eq!(best_name_match(&names(), "builder"), Some(1));
        assert_eq!(best_name_match(&names(), "obb"), Some(1));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(best_name_match(&names(), "zzz"), None);
    }
}
