use poise::serenity_prelude::{self as serenity, ComponentInteraction};
use tracing::{debug, error};

use crate::{Data, Error};

/// Dispatch table for persistent message components. Custom IDs are stable
/// identifiers; handlers get their services from `Data`, nothing is captured.
///
/// - `ticket_open:<type>` — panel buttons, one per ticket type
/// - `ticket_close`       — in-ticket close button
/// - `ticket_claim`       — in-ticket claim button
pub async fn handle_component(
    ctx: &serenity::Context,
    interaction: &ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    let custom_id = interaction.data.custom_id.as_str();

    if let Some(ticket_type) = custom_id.strip_prefix("ticket_open:") {
        return open_from_panel(ctx, interaction, data, ticket_type).await;
    }

    match custom_id {
        "ticket_close" => close_from_button(ctx, interaction, data).await,
        "ticket_claim" => claim_from_button(ctx, interaction, data).await,
        other => {
            debug!("Ignoring unknown component id '{}'", other);
            Ok(())
        }
    }
}

async fn open_from_panel(
    ctx: &serenity::Context,
    interaction: &ComponentInteraction,
    data: &Data,
    ticket_type: &str,
) -> Result<(), Error> {
    let Some(guild_id) = interaction.guild_id else {
        return Ok(());
    };

    // Channel creation can outlive the 3-second interaction window.
    interaction
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Defer(
                serenity::CreateInteractionResponseMessage::new().ephemeral(true),
            ),
        )
        .await?;

    let content = match data
        .tickets
        .open_ticket(&ctx.http, guild_id, &interaction.user, ticket_type)
        .await
    {
        Ok(opened) => format!("✅ Your ticket has been created: <#{}>", opened.channel_id),
        Err(e) => {
            error!("Failed to open ticket for {}: {}", interaction.user.id, e);
            format!("❌ {}", e.user_message())
        }
    };

    interaction
        .create_followup(
            &ctx.http,
            serenity::CreateInteractionResponseFollowup::new()
                .content(content)
                .ephemeral(true),
        )
        .await?;
    Ok(())
}

async fn close_from_button(
    ctx: &serenity::Context,
    interaction: &ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    let Some(guild_id) = interaction.guild_id else {
        return Ok(());
    };

    // Acknowledge before the grace-period deletion starts.
    respond_ephemeral(ctx, interaction, "🔒 Closing this ticket…").await?;

    if let Err(e) = data
        .tickets
        .close_ticket(
            &ctx.http,
            guild_id,
            interaction.channel_id,
            &interaction.user,
            None,
        )
        .await
    {
        error!("Failed to close ticket {}: {}", interaction.channel_id, e);
        interaction
            .create_followup(
                &ctx.http,
                serenity::CreateInteractionResponseFollowup::new()
                    .content(format!("❌ {}", e.user_message()))
                    .ephemeral(true),
            )
            .await?;
    }
    Ok(())
}

async fn claim_from_button(
    ctx: &serenity::Context,
    interaction: &ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    let Some(guild_id) = interaction.guild_id else {
        return Ok(());
    };

    let actor = guild_id.member(&ctx.http, interaction.user.id).await?;

    let content = match data
        .tickets
        .claim_ticket(&ctx.http, guild_id, interaction.channel_id, &actor)
        .await
    {
        Ok(()) => "✋ You claimed this ticket.".to_string(),
        Err(e) => format!("❌ {}", e.user_message()),
    };

    respond_ephemeral(ctx, interaction, &content).await?;
    Ok(())
}

async fn respond_ephemeral(
    ctx: &serenity::Context,
    interaction: &ComponentInteraction,
    content: &str,
) -> serenity::Result<()> {
    interaction
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await
}
