//! # Rusty-Gallery Binary
//!
//! The entry point that assembles the application from the plugins selected
//! by cargo features.

use std::io;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use rg_api::middleware::{cors_policy, standard_middleware};
use rg_api::{configure_routes, LogMailer};
use rg_config::Settings;
use rg_services::{Ports, Services};
use secrecy::ExposeSecret;

#[cfg(feature = "db-sqlite")]
use rg_db_sqlite::SqliteRepo;

#[cfg(feature = "auth-jwt")]
use rg_auth_jwt::JwtAuthProvider;

#[cfg(feature = "media-cloudinary")]
use rg_media_cloudinary::CloudinaryStore;

fn startup_error(what: &str, err: impl std::fmt::Display) -> io::Error {
    log::error!("{what}: {err}");
    io::Error::other(format!("{what}: {err}"))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::load().map_err(|e| startup_error("invalid configuration", e))?;

    // 1. Storage
    #[cfg(feature = "db-sqlite")]
    let repo = SqliteRepo::new(&settings.database_url)
        .await
        .map_err(|e| startup_error("failed to open database", e))?;

    // 2. Identity
    #[cfg(feature = "auth-jwt")]
    let auth = JwtAuthProvider::new(
        settings.jwt_secret.expose_secret().as_bytes(),
        &settings.jwt_algorithm,
        settings.access_token_minutes,
        settings.refresh_token_days,
    )
    .map_err(|e| startup_error("invalid token settings", e))?;

    // 3. Media CDN
    #[cfg(feature = "media-cloudinary")]
    let media = CloudinaryStore::new(
        &settings.cloud_name,
        &settings.cloud_api_key,
        settings.cloud_api_secret.expose_secret(),
    );

    let ports = Ports {
        users: Arc::new(repo.clone()),
        images: Arc::new(repo.clone()),
        tags: Arc::new(repo.clone()),
        comments: Arc::new(repo.clone()),
        ratings: Arc::new(repo.clone()),
        messages: Arc::new(repo.clone()),
        transforms: Arc::new(repo),
        media: Arc::new(media),
        auth: Arc::new(auth),
        mailer: Arc::new(LogMailer::new(&settings.public_url, &settings.mail_from)),
    };
    let services = web::Data::new(Services::new(ports, &settings.cloud_folder));

    log::info!("Rusty-Gallery starting on http://{}", settings.bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(services.clone())
            .wrap(cors_policy())
            .wrap(standard_middleware())
            .configure(configure_routes)
    })
    .bind(&settings.bind_addr)?
    .run()
    .await
}
