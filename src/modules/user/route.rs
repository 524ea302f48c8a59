use crate::modules::user::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn public_api_configure(cfg: &mut ServiceConfig) {
    cfg.service(login);
}

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(logout).service(
        scope("/users")
            .service(search_users)
            .service(get_profile)
            .service(set_username)
            .service(set_photo),
    );
}
