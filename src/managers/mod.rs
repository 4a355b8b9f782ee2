pub mod member_resolver;
pub mod permission_resolver;
pub mod ticket_manager;

pub use member_resolver::find_member;
pub use permission_resolver::{
    create_shared_permission_resolver, level_label, MemberSnapshot, PermissionResolver,
    SharedPermissionResolver, Tier,
};
pub use ticket_manager::{
    create_shared_ticket_manager, SharedTicketManager, TicketAction, TicketManager,
};
