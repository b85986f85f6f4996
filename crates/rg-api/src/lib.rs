//! # rg-api
//!
//! The web routing and orchestration layer for Rusty-Gallery.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod mailer;
pub mod middleware;
pub mod upload;

use actix_web::{web, HttpRequest};

pub use error::ApiError;
pub use mailer::LogMailer;

fn bad_request<E: std::fmt::Display>(err: E, _req: &HttpRequest) -> actix_web::Error {
    ApiError::validation(err.to_string()).into()
}

/// Configures every route of the gallery API.
///
/// Expects `web::Data<rg_services::Services>` to be registered on the app.
/// Extractor failures (malformed JSON, query, form, or path) come back in
/// the same JSON error shape as domain errors.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    use handlers::*;

    cfg.app_data(web::JsonConfig::default().error_handler(bad_request))
        .app_data(web::QueryConfig::default().error_handler(bad_request))
        .app_data(web::FormConfig::default().error_handler(bad_request))
        .app_data(web::PathConfig::default().error_handler(|err, req| {
            log::debug!("unroutable path {}: {}", req.path(), err);
            ApiError(rg_core::AppError::not_found("Resource", req.path())).into()
        }))
        .route("/health", web::get().to(health))
        .service(
            web::scope("/auth")
                .route("/signup", web::post().to(auth::signup))
                .route("/login", web::post().to(auth::login))
                .route("/refresh_token", web::get().to(auth::refresh_token))
                .route("/confirmed_email/{token}", web::get().to(auth::confirmed_email))
                .route("/request_email", web::post().to(auth::request_email)),
        )
        .service(
            web::scope("/users")
                .route("/me", web::get().to(users::me))
                .route("/me", web::patch().to(users::update_me))
                .route("/avatar", web::patch().to(users::update_avatar))
                .route("/profile/{username}", web::get().to(users::profile)),
        )
        .service(
            web::scope("/access")
                .route("/block_user", web::put().to(access::block_user))
                .route("/unblock_user", web::put().to(access::unblock_user))
                .route("/role", web::put().to(access::set_role)),
        )
        .service(
            web::scope("/images")
                .route("", web::get().to(images::list))
                .route("", web::post().to(images::upload))
                .route("/{id}", web::get().to(images::get))
                .route("/{id}", web::delete().to(images::delete))
                .route("/{id}/description", web::put().to(images::update_description))
                .route("/{id}/tags", web::put().to(images::replace_tags)),
        )
        .service(
            web::scope("/comments")
                .route("", web::post().to(comments::create))
                .route("/image/{image_id}", web::get().to(comments::list_for_image))
                .route("/{id}", web::get().to(comments::get))
                .route("/{id}", web::put().to(comments::update))
                .route("/{id}", web::delete().to(comments::delete)),
        )
        .service(
            web::scope("/ratings")
                .route("/image/{image_id}/average", web::get().to(ratings::average))
                .route("/image/{image_id}", web::post().to(ratings::submit))
                .route("/{id}", web::get().to(ratings::get))
                .route("/{id}", web::put().to(ratings::update))
                .route("/{id}", web::delete().to(ratings::remove)),
        )
        .service(
            web::scope("/messages")
                .route("", web::get().to(messages::inbox))
                .route("", web::post().to(messages::send))
                .route("/{id}", web::delete().to(messages::delete)),
        )
        .service(
            web::scope("/tags")
                .route("", web::get().to(tags::list))
                .route("", web::post().to(tags::create))
                .route("/{id}", web::get().to(tags::get))
                .route("/{id}", web::put().to(tags::rename))
                .route("/{id}", web::delete().to(tags::delete)),
        )
        .service(
            web::scope("/find")
                .route("/tag", web::get().to(search::by_tag))
                .route("/words", web::get().to(search::by_keywords)),
        )
        .service(
            web::scope("/transformations")
                .route("", web::get().to(transforms::list_mine))
                .route("", web::post().to(transforms::create))
                .route("/{id}", web::get().to(transforms::get)),
        );
}
