use crate::modules::conversation::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/conversations")
            .service(list_conversations)
            .service(create_direct_conversation)
            .service(get_conversation)
            .service(mark_as_read),
    )
    .service(
        scope("/groups")
            .service(create_group)
            .service(add_member)
            .service(leave_group)
            .service(remove_member)
            .service(set_group_name)
            .service(set_group_photo),
    );
}
