use crate::modules::message::handle::*;
use actix_web::web::ServiceConfig;

/// Full-path resources; register before the `/conversations` scope so the
/// send routes are matched first.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(send_photo_message)
        .service(send_text_message)
        .service(forward_message)
        .service(delete_message);
}
