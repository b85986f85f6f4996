use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use rg_services::Services;
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::upload::read_form;

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub username: String,
}

pub async fn me(
    services: web::Data<Services>,
    user: CurrentUser,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(services.users.me(&user.0).await?))
}

pub async fn update_me(
    services: web::Data<Services>,
    user: CurrentUser,
    body: web::Json<ProfileUpdate>,
) -> Result<HttpResponse, ApiError> {
    let updated = services.users.update_profile(&user.0, &body.username).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// Multipart with a single `file` part.
pub async fn update_avatar(
    services: web::Data<Services>,
    user: CurrentUser,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let file = read_form(payload).await?.take_file("file")?;
    let updated = services.users.update_avatar(&user.0, file.data).await?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn profile(
    services: web::Data<Services>,
    user: CurrentUser,
    username: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(services.users.profile(&user.0, &username).await?))
}
