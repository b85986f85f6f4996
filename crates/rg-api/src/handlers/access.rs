//! Admin-only account controls.

use actix_web::{web, HttpResponse};
use rg_core::Role;
use rg_services::Services;
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::handlers::auth::EmailBody;

#[derive(Debug, Deserialize)]
pub struct RoleChange {
    pub email: String,
    pub role: Role,
}

pub async fn block_user(
    services: web::Data<Services>,
    user: CurrentUser,
    body: web::Json<EmailBody>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(services.users.block(&user.0, &body.email).await?))
}

pub async fn unblock_user(
    services: web::Data<Services>,
    user: CurrentUser,
    body: web::Json<EmailBody>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(services.users.unblock(&user.0, &body.email).await?))
}

pub async fn set_role(
    services: web::Data<Services>,
    user: CurrentUser,
    body: web::Json<RoleChange>,
) -> Result<HttpResponse, ApiError> {
    let updated = services.users.set_role(&user.0, &body.email, body.role).await?;
    Ok(HttpResponse::Ok().json(updated))
}
