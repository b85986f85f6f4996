//! Signup, login, token refresh and email confirmation.

use actix_web::{web, HttpResponse};
use rg_services::{Services, SignupRequest};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::extract::BearerToken;

/// OAuth2 password form: `username` carries the email.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailBody {
    pub email: String,
}

pub async fn signup(
    services: web::Data<Services>,
    body: web::Json<SignupRequest>,
) -> Result<HttpResponse, ApiError> {
    let user = services.users.signup(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "user": user,
        "detail": "User successfully created. Check your email for confirmation.",
    })))
}

pub async fn login(
    services: web::Data<Services>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, ApiError> {
    let pair = services.users.login(&form.username, &form.password).await?;
    Ok(HttpResponse::Ok().json(pair))
}

pub async fn refresh_token(
    services: web::Data<Services>,
    token: BearerToken,
) -> Result<HttpResponse, ApiError> {
    let pair = services.users.refresh(&token.0).await?;
    Ok(HttpResponse::Ok().json(pair))
}

pub async fn confirmed_email(
    services: web::Data<Services>,
    token: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let message = services.users.confirm_email(&token).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": message })))
}

pub async fn request_email(
    services: web::Data<Services>,
    body: web::Json<EmailBody>,
) -> Result<HttpResponse, ApiError> {
    let message = services.users.request_confirmation(&body.email).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": message })))
}
