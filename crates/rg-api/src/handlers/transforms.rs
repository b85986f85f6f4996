use actix_web::{web, HttpResponse};
use rg_core::TransformSettings;
use rg_services::Services;
use serde::Deserialize;

use crate::error::ApiError;
use crate::extract::CurrentUser;

/// `{"image_id": 3, "settings": {"effect": "sepia", "width": 300}}`
#[derive(Debug, Deserialize)]
pub struct NewTransformBody {
    pub image_id: i64,
    #[serde(default)]
    pub settings: TransformSettings,
}

pub async fn list_mine(
    services: web::Data<Services>,
    user: CurrentUser,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(services.transforms.list_mine(&user.0).await?))
}

pub async fn create(
    services: web::Data<Services>,
    user: CurrentUser,
    body: web::Json<NewTransformBody>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let transform = services
        .transforms
        .create(&user.0, body.image_id, body.settings)
        .await?;
    Ok(HttpResponse::Created().json(transform))
}

pub async fn get(
    services: web::Data<Services>,
    user: CurrentUser,
    id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(services.transforms.get(&user.0, *id).await?))
}
