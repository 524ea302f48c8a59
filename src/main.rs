use actix_cors::Cors;
use actix_web::{
    self,
    middleware::{from_fn, Logger},
    web, App, HttpServer,
};
use std::sync::{Arc, LazyLock};

use crate::{
    configs::{connect_database, run_migrations},
    middlewares::authentication,
    modules::{
        access::service::AccessPolicy,
        conversation::{
            repository_pg::{ConversationPgRepository, ParticipantPgRepository},
            service::ConversationService,
        },
        media::{model::UploadConfig, service::MediaService},
        message::{repository_pg::MessageRepositoryPg, service::MessageService},
        reaction::{repository_pg::ReactionRepositoryPg, service::ReactionService},
        user::{
            repository_pg::{SessionRepositoryPg, UserRepositoryPg},
            service::UserService,
        },
    },
};

mod api;
mod configs;
mod constants;
mod middlewares;
mod modules;
#[cfg(test)]
mod test;
mod utils;

pub static ENV: LazyLock<constants::Env> = LazyLock::new(|| {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Environment variables loaded from .env file");
    constants::Env::default()
});

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

/// Every route of the API; services are expected as app data.
fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| {
        api::error::Error::bad_request(err.to_string()).into()
    }))
    .service(health_check)
    .configure(modules::media::route::configure)
    .configure(modules::user::route::public_api_configure)
    .service(
        web::scope("")
            .wrap(from_fn(authentication))
            .configure(modules::user::route::configure)
            .configure(modules::reaction::route::configure)
            .configure(modules::message::route::configure)
            .configure(modules::conversation::route::configure),
    );
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let db_pool =
        connect_database().await.map_err(|_| std::io::Error::other("Database connection error"))?;
    run_migrations(&db_pool).await.map_err(|e| std::io::Error::other(e.to_string()))?;

    let user_repo = Arc::new(UserRepositoryPg::new(db_pool.clone()));
    let session_repo = Arc::new(SessionRepositoryPg::new(db_pool.clone()));
    let conversation_repo = Arc::new(ConversationPgRepository::new(db_pool.clone()));
    let participant_repo = Arc::new(ParticipantPgRepository::new(db_pool.clone()));
    let message_repo = Arc::new(MessageRepositoryPg::new(db_pool.clone()));
    let reaction_repo = Arc::new(ReactionRepositoryPg::new(db_pool.clone()));

    let policy = AccessPolicy::with_dependencies(
        participant_repo.clone(),
        message_repo.clone(),
        reaction_repo.clone(),
    );

    let user_service = UserService::with_dependencies(user_repo.clone(), session_repo);
    let conversation_service = ConversationService::with_dependencies(
        conversation_repo,
        participant_repo,
        message_repo.clone(),
        user_repo,
        policy.clone(),
    );
    let message_service = MessageService::with_dependencies(
        message_repo.clone(),
        reaction_repo.clone(),
        policy.clone(),
    );
    let reaction_service = ReactionService::with_dependencies(reaction_repo, message_repo, policy);

    let media_service =
        MediaService::new(UploadConfig::new(ENV.upload_dir.as_str(), ENV.max_upload_size));
    media_service.init_dirs().await.map_err(|e| std::io::Error::other(e.to_string()))?;

    log::info!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&ENV.frontend_url)
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(conversation_service.clone()))
            .app_data(web::Data::new(message_service.clone()))
            .app_data(web::Data::new(reaction_service.clone()))
            .app_data(web::Data::new(media_service.clone()))
            .configure(configure_api)
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(ENV.workers)
    .run()
    .await
}
