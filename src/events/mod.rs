pub mod guild;
pub mod interactions;

pub use guild::handle_guild_create;
pub use interactions::handle_component;
