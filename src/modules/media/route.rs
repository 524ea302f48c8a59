use crate::modules::media::handle::serve_photo;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(scope("/uploads").service(serve_photo));
}
