use actix_web::{web, HttpResponse};
use rg_services::Services;
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::CurrentUser;

#[derive(Debug, Deserialize)]
pub struct NewMessageBody {
    pub receiver_email: String,
    pub body: String,
}

pub async fn inbox(
    services: web::Data<Services>,
    user: CurrentUser,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(services.messages.inbox(&user.0).await?))
}

pub async fn send(
    services: web::Data<Services>,
    user: CurrentUser,
    body: web::Json<NewMessageBody>,
) -> Result<HttpResponse, ApiError> {
    let message = services
        .messages
        .send(&user.0, &body.receiver_email, &body.body)
        .await?;
    Ok(HttpResponse::Created().json(message))
}

pub async fn delete(
    services: web::Data<Services>,
    user: CurrentUser,
    id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(services.messages.delete(&user.0, *id).await?))
}
