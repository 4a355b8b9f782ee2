pub mod locks;
pub mod permission_store;
pub mod ticket_store;

pub use locks::GuildLocks;
pub use permission_store::{
    create_shared_permission_store, GuildPermissionRecord, PermissionStore,
    SharedPermissionStore,
};
pub use ticket_store::{
    create_shared_ticket_store, GuildTicketRecord, SharedTicketStore, TicketStore, TicketType,
};
