use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Discord bot for community management: tiered permissions, moderation,
/// and a ticket-support workflow
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Force re-sync of slash commands to all guilds (use when commands aren't showing up)
    #[arg(long, short = 's')]
    sync_commands: bool,

    /// Register commands per-guild instead of globally (faster for testing)
    #[arg(long)]
    guild_commands: bool,

    /// Specific guild ID to sync commands to (for testing)
    #[arg(long)]
    guild_id: Option<u64>,
}

mod commands;
mod embeds;
mod error;
mod events;
mod managers;
mod runtime;
mod state;

use commands::{
    addadmin, addgs, addmod, addowner, addsupport, ban, blacklistserver, blacklistuser, botstats,
    clear, delrole, help, kick, lock, maintenance, memberinfo, mylevel, permissions, ping,
    removeadmin, removegs, removemod, removeowner, removesupport, setrole, slowmode, ticket,
    ticketsetup, timeout, unban, unblacklistserver, unblacklistuser, unlock, untimeout, warn,
};
use events::{handle_component, handle_guild_create};
use managers::{
    create_shared_permission_resolver, create_shared_ticket_manager, SharedPermissionResolver,
    SharedTicketManager,
};
use runtime::RuntimeState;
use state::{
    create_shared_permission_store, create_shared_ticket_store, GuildLocks, PermissionStore,
    TicketStore,
};

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared application state
pub struct Data {
    pub permissions: SharedPermissionResolver,
    pub tickets: SharedTicketManager,
    pub runtime: Arc<RuntimeState>,
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::InteractionCreate { interaction } => {
            if let serenity::Interaction::Component(component) = interaction {
                if let Err(e) = handle_component(ctx, component, data).await {
                    error!("Failed to handle component interaction: {}", e);
                }
            }
        }
        serenity::FullEvent::GuildCreate { guild, .. } => {
            if let Err(e) = handle_guild_create(ctx, guild, data).await {
                error!("Failed to handle guild create: {}", e);
            }
        }
        _ => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    let token = std::env::var("DISCORD_TOKEN").expect("Missing DISCORD_TOKEN environment variable");

    // Extract bot/application ID from token (first part before the dot, base64 encoded)
    if let Some(bot_id_b64) = token.split('.').next() {
        // Discord tokens use URL-safe base64 without padding
        use base64::Engine;
        match base64::engine::general_purpose::STANDARD_NO_PAD.decode(bot_id_b64) {
            Ok(decoded) => {
                if let Ok(id_str) = String::from_utf8(decoded) {
                    info!("Bot ID: {} (configure intents at https://discord.com/developers/applications/{}/bot)", id_str, id_str);
                }
            }
            Err(_) => {
                // Try URL-safe variant
                if let Ok(decoded) =
                    base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(bot_id_b64)
                {
                    if let Ok(id_str) = String::from_utf8(decoded) {
                        info!("Bot ID: {} (configure intents at https://discord.com/developers/applications/{}/bot)", id_str, id_str);
                    }
                }
            }
        }
    }

    let state_path = std::env::var("STATE_PATH").unwrap_or_else(|_| "state".to_string());
    let prefix = std::env::var("COMMAND_PREFIX").unwrap_or_else(|_| "+".to_string());

    // Ensure state directory exists
    tokio::fs::create_dir_all(&state_path).await.ok();

    info!("Loading permission store...");
    let permission_path = format!("{}/permissions.json", state_path);
    let permission_store = PermissionStore::load(&permission_path)
        .await
        .unwrap_or_else(|e| {
            warn!("Could not load permission store: {}, starting empty", e);
            PermissionStore::new(&permission_path)
        });
    let shared_permission_store = create_shared_permission_store(permission_store);

    info!("Loading ticket store...");
    let ticket_path = format!("{}/tickets.json", state_path);
    let ticket_store = TicketStore::load(&ticket_path).await.unwrap_or_else(|e| {
        warn!("Could not load ticket store: {}, starting empty", e);
        TicketStore::new(&ticket_path)
    });
    let shared_ticket_store = create_shared_ticket_store(ticket_store);

    // One keyed lock set serializes all read-modify-write cycles per guild
    let guild_locks = Arc::new(GuildLocks::new());

    let permission_resolver =
        create_shared_permission_resolver(shared_permission_store, guild_locks.clone());
    let ticket_manager = create_shared_ticket_manager(shared_ticket_store, guild_locks);
    let runtime_state = Arc::new(RuntimeState::new());

    // Extract CLI flags for use in setup
    let sync_commands = args.sync_commands;
    let guild_commands = args.guild_commands;
    let target_guild_id = args.guild_id;

    if sync_commands {
        info!("--sync-commands: Will force re-register slash commands");
    }
    if guild_commands {
        info!("--guild-commands: Will register commands per-guild (faster for testing)");
    } else {
        info!("Registering commands globally by default (takes up to 1 hour to propagate)");
    }
    if let Some(gid) = target_guild_id {
        info!("--guild-id: Targeting specific guild {}", gid);
    }

    // Build framework
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                ping(),
                help(),
                // Permissions
                addowner(),
                removeowner(),
                addadmin(),
                removeadmin(),
                addgs(),
                removegs(),
                addmod(),
                removemod(),
                addsupport(),
                removesupport(),
                setrole(),
                delrole(),
                permissions(),
                mylevel(),
                // Tickets
                ticketsetup(),
                ticket(),
                // Moderation
                ban(),
                unban(),
                kick(),
                timeout(),
                untimeout(),
                warn(),
                clear(),
                slowmode(),
                lock(),
                unlock(),
                memberinfo(),
                // Owner
                blacklistuser(),
                unblacklistuser(),
                blacklistserver(),
                unblacklistserver(),
                maintenance(),
                botstats(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(prefix),
                ..Default::default()
            },
            command_check: Some(|ctx| Box::pin(commands::levels::gate(ctx))),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            pre_command: |ctx| {
                Box::pin(async move {
                    info!(
                        "Command '{}' invoked by {} (ID: {}) in {}",
                        ctx.command().qualified_name,
                        ctx.author().name,
                        ctx.author().id,
                        ctx.guild_id().map(|g| g.to_string()).unwrap_or_else(|| "DM".to_string())
                    );
                })
            },
            post_command: |ctx| {
                Box::pin(async move {
                    info!(
                        "Command '{}' completed for {}",
                        ctx.command().qualified_name,
                        ctx.author().name
                    );
                })
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            error!("Error in command '{}': {}", ctx.command().qualified_name, error);
                            let _ = ctx.say(format!("An error occurred: {}", error)).await;
                        }
                        poise::FrameworkError::ArgumentParse { error, input, ctx, .. } => {
                            error!("Argument parse error in '{}': {} (input: {:?})", ctx.command().qualified_name, error, input);
                        }
                        poise::FrameworkError::MissingBotPermissions { missing_permissions, ctx, .. } => {
                            error!("Bot missing permissions for '{}': {:?}", ctx.command().qualified_name, missing_permissions);
                            let _ = ctx.say(format!("Bot is missing permissions: {:?}", missing_permissions)).await;
                        }
                        poise::FrameworkError::MissingUserPermissions { missing_permissions, ctx, .. } => {
                            error!("User {} missing permissions for '{}': {:?}", ctx.author().name, ctx.command().qualified_name, missing_permissions);
                        }
                        poise::FrameworkError::NotAnOwner { ctx, .. } => {
                            error!("User {} tried to use owner command '{}'", ctx.author().name, ctx.command().qualified_name);
                        }
                        poise::FrameworkError::GuildOnly { ctx, .. } => {
                            error!("Command '{}' is guild-only, used in DM by {}", ctx.command().qualified_name, ctx.author().name);
                        }
                        other => {
                            error!("Other framework error: {}", other);
                        }
                    }
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            let permission_resolver = permission_resolver.clone();
            let ticket_manager = ticket_manager.clone();
            let runtime_state = runtime_state.clone();

            Box::pin(async move {
                info!("Bot logged in as: {}", ready.user.name);

                // Determine which guilds to register commands for
                let guilds_to_register: Vec<serenity::GuildId> = if let Some(gid) = target_guild_id {
                    // Only register to specific guild
                    vec![serenity::GuildId::new(gid)]
                } else {
                    // Register to all guilds the bot is in
                    ready.guilds.iter().map(|g| g.id).collect()
                };

                if guild_commands || sync_commands {
                    // Register commands per-guild (faster for testing)
                    for guild_id in &guilds_to_register {
                        info!("Registering commands to guild: {}", guild_id);
                        if let Err(e) = poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            *guild_id,
                        ).await {
                            error!("Failed to register commands for guild {}: {}", guild_id, e);
                        } else {
                            info!("Successfully registered {} commands for guild {}",
                                  framework.options().commands.len(), guild_id);
                        }
                    }
                } else {
                    // Default: Register commands globally
                    info!("Registering commands globally...");
                    if let Err(e) = poise::builtins::register_globally(
                        ctx,
                        &framework.options().commands,
                    ).await {
                        error!("Failed to register commands globally: {}", e);
                    } else {
                        info!("Successfully registered {} commands globally (may take up to 1 hour to propagate)",
                              framework.options().commands.len());
                    }
                }

                Ok(Data {
                    permissions: permission_resolver,
                    tickets: ticket_manager,
                    runtime: runtime_state,
                })
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MEMBERS;

    // Log which privileged intents we're requesting
    let privileged_intents: Vec<&str> = vec![
        if intents.contains(serenity::GatewayIntents::MESSAGE_CONTENT) {
            Some("MESSAGE_CONTENT")
        } else {
            None
        },
        if intents.contains(serenity::GatewayIntents::GUILD_MEMBERS) {
            Some("GUILD_MEMBERS")
        } else {
            None
        },
    ]
    .into_iter()
    .flatten()
    .collect();

    info!("Requesting privileged intents: {:?}", privileged_intents);

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot...");
    if let Err(e) = client.start().await {
        // Check if it's a disallowed intents error
        let err_str = e.to_string();
        if err_str.contains("Disallowed") || err_str.contains("intents") {
            error!("Failed to start bot: {}", e);
            error!("The following privileged intents need to be enabled in the Discord Developer Portal:");
            for intent in &privileged_intents {
                error!("  - {}", intent);
            }
            error!("Go to https://discord.com/developers/applications -> Your App -> Bot -> Privileged Gateway Intents");
            return Err(anyhow::anyhow!(
                "Disallowed gateway intents. Enable these in Discord Developer Portal: {:?}",
                privileged_intents
            ));
        }
        return Err(e.into());
    }
    warn!("Bot ended.");

    Ok(())
}
