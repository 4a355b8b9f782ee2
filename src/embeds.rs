// src/embeds.rs

use poise::serenity_prelude as serenity;

pub const COLOR_PRIMARY: u32 = 0x007BFF;
pub const COLOR_SUCCESS: u32 = 0x28A745;
pub const COLOR_DANGER: u32 = 0xDC3545;
pub const COLOR_WARNING: u32 = 0xFFC107;
pub const COLOR_GOLD: u32 = 0xF1C40F;

/// Base embed with the standard footer and a current timestamp.
pub fn base_embed(title: &str, description: &str, color: u32) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(color)
        .footer(serenity::CreateEmbedFooter::new("Warden"))
        .timestamp(serenity::Timestamp::now())
}

pub fn error_embed(description: &str) -> serenity::CreateEmbed {
    base_embed("❌ Error", description, COLOR_DANGER)
}

pub fn denied_embed(description: &str) -> serenity::CreateEmbed {
    base_embed("❌ Permission denied", description, COLOR_DANGER)
}
